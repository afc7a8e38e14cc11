/*!
 * Lock-Free Session Statistics
 */

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of coordinator counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub sessions_started: u64,
    pub sessions_succeeded: u64,
    pub checkpoint_failures: u64,
    pub restore_failures: u64,
    pub recursive_rejections: u64,
    pub unsupported_rejections: u64,
    pub engine_calls: u64,
    pub dry_runs: u64,
}

/// Atomic counters behind [`SessionStats`]
///
/// Each value is individually accurate; a snapshot taken during a session
/// may mix values from before and after an update.
#[repr(C, align(64))]
pub(crate) struct AtomicSessionStats {
    sessions_started: AtomicU64,
    sessions_succeeded: AtomicU64,
    checkpoint_failures: AtomicU64,
    restore_failures: AtomicU64,
    recursive_rejections: AtomicU64,
    unsupported_rejections: AtomicU64,
    engine_calls: AtomicU64,
    dry_runs: AtomicU64,
}

impl AtomicSessionStats {
    #[inline]
    pub const fn new() -> Self {
        Self {
            sessions_started: AtomicU64::new(0),
            sessions_succeeded: AtomicU64::new(0),
            checkpoint_failures: AtomicU64::new(0),
            restore_failures: AtomicU64::new(0),
            recursive_rejections: AtomicU64::new(0),
            unsupported_rejections: AtomicU64::new(0),
            engine_calls: AtomicU64::new(0),
            dry_runs: AtomicU64::new(0),
        }
    }

    /// Returns the 1-based number of the started session
    #[inline]
    pub fn inc_started(&self) -> u64 {
        self.sessions_started.fetch_add(1, Ordering::Relaxed) + 1
    }

    #[inline]
    pub fn inc_succeeded(&self) {
        self.sessions_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_checkpoint_failures(&self) {
        self.checkpoint_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_restore_failures(&self) {
        self.restore_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_recursive(&self) {
        self.recursive_rejections.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_unsupported(&self) {
        self.unsupported_rejections.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_engine_calls(&self, dry_run: bool) {
        self.engine_calls.fetch_add(1, Ordering::Relaxed);
        if dry_run {
            self.dry_runs.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> SessionStats {
        SessionStats {
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            sessions_succeeded: self.sessions_succeeded.load(Ordering::Relaxed),
            checkpoint_failures: self.checkpoint_failures.load(Ordering::Relaxed),
            restore_failures: self.restore_failures.load(Ordering::Relaxed),
            recursive_rejections: self.recursive_rejections.load(Ordering::Relaxed),
            unsupported_rejections: self.unsupported_rejections.load(Ordering::Relaxed),
            engine_calls: self.engine_calls.load(Ordering::Relaxed),
            dry_runs: self.dry_runs.load(Ordering::Relaxed),
        }
    }
}

impl Default for AtomicSessionStats {
    fn default() -> Self {
        Self::new()
    }
}
