/*!
 * Core Types
 * Common identifiers used across contexts, claims and the coordinator
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Priority level (lower values are notified first)
pub type Priority = u32;

/// Raw host handle value (file descriptor, socket, ...)
pub type RawHandle = i64;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a context instance
///
/// Resources registered in several contexts use it to tell the
/// notifying context apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextId(u64);

impl ContextId {
    /// Allocate a fresh, process-unique id
    pub fn next() -> Self {
        Self(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Identity of a host-level handle claimed during a checkpoint window
///
/// Negative values denote a handle that is invalid or already released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(RawHandle);

impl Handle {
    #[inline]
    pub const fn new(raw: RawHandle) -> Self {
        Self(raw)
    }

    /// Handle that refers to nothing (closed descriptor)
    #[inline]
    pub const fn invalid() -> Self {
        Self(-1)
    }

    #[inline]
    pub const fn raw(&self) -> RawHandle {
        self.0
    }

    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle {}", self.0)
    }
}

impl From<RawHandle> for Handle {
    fn from(raw: RawHandle) -> Self {
        Self(raw)
    }
}

/// Order in which an after-restore pass replays the resources notified
/// before checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreOrder {
    /// Reverse of the checkpoint order (layered teardown)
    #[default]
    Reverse,
    /// Same order as the checkpoint pass
    Forward,
}

impl RestoreOrder {
    /// Apply the order to a checkpoint snapshot
    pub fn arrange<T>(self, mut snapshot: Vec<T>) -> Vec<T> {
        if self == RestoreOrder::Reverse {
            snapshot.reverse();
        }
        snapshot
    }
}

impl std::str::FromStr for RestoreOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reverse" => Ok(RestoreOrder::Reverse),
            "forward" => Ok(RestoreOrder::Forward),
            other => Err(format!("unknown restore order '{}'", other)),
        }
    }
}
