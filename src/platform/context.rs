/*!
 * Platform Context
 * Priority context for platform-owned resources with handle-claim tracking
 */

use super::claims::{Claim, ClaimMap};
use super::kinds::PlatformResourceKind;
use crate::context::{Context, PriorityContext};
use crate::core::errors::{CheckpointError, ClaimResult, Failure, RestoreError};
use crate::core::types::{ContextId, Handle, RestoreOrder};
use crate::resource::{Resource, WeakResource};
use log::{debug, info};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Registry for the closed set of platform resource kinds
///
/// Order keys come from [`PlatformResourceKind::priority`]. A fresh claim
/// window opens with every before-checkpoint pass and is discarded once the
/// after-restore pass has completed; claims never survive a window.
pub struct PlatformContext {
    inner: PriorityContext<PlatformResourceKind>,
    claims: RwLock<Option<Arc<ClaimMap>>>,
    // serializes the passes, claims stay concurrent
    pass_lock: Mutex<()>,
}

impl PlatformContext {
    pub fn new() -> Self {
        Self {
            inner: PriorityContext::with_comparator(|a: &PlatformResourceKind, b| {
                a.priority().cmp(&b.priority())
            }),
            claims: RwLock::new(None),
            pass_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn with_restore_order(self, order: RestoreOrder) -> Self {
        Self {
            inner: self.inner.with_restore_order(order),
            ..self
        }
    }

    /// Register a platform resource; its kind fixes its priority
    pub fn register<R: WeakResource + ?Sized>(&self, resource: &R, kind: PlatformResourceKind) {
        debug!("Registering platform resource of kind {}", kind);
        self.inner.register(resource, kind);
    }

    pub fn checkpoint_snapshot(&self) -> Vec<Arc<dyn Resource>> {
        self.inner.checkpoint_snapshot()
    }

    fn window(&self) -> Option<Arc<ClaimMap>> {
        self.claims.read().clone()
    }

    /// Claim `handle` for the current window
    ///
    /// Fails if the handle was already claimed in this window. Invalid
    /// handles and calls outside a window are ignored.
    pub fn claim(&self, handle: Handle, claim: Claim) -> ClaimResult<()> {
        if !handle.is_valid() {
            return Ok(());
        }
        match self.window() {
            Some(window) => window.claim(handle, claim),
            None => {
                debug!("Ignoring claim of {} outside a checkpoint window", handle);
                Ok(())
            }
        }
    }

    /// Claim `handle` unless someone already did
    ///
    /// Returns true only if this call won an uncontested claim.
    pub fn claim_weak(&self, handle: Handle, claim: Claim) -> bool {
        if !handle.is_valid() {
            return false;
        }
        self.window()
            .map_or(false, |window| window.claim_weak(handle, claim))
    }

    /// Whether a claim window is open
    pub fn window_open(&self) -> bool {
        self.claims.read().is_some()
    }

    /// Owner of a claimed handle in the current window
    pub fn claim_owner(&self, handle: Handle) -> Option<String> {
        self.window().and_then(|window| window.owner_of(handle))
    }

    /// Handles claimed in the current window, ascending
    pub fn claimed_handles(&self) -> Vec<Handle> {
        self.window().map(|window| window.handles()).unwrap_or_default()
    }

    /// Number of claims in the current window
    pub fn claim_count(&self) -> usize {
        self.window().map_or(0, |window| window.len())
    }

    /// Failures reported by claim diagnostics, ordered by handle
    pub fn claim_failures(&self) -> Vec<Failure> {
        let Some(window) = self.window() else {
            return Vec::new();
        };
        // evaluate outside the map so a diagnostic may claim again
        window
            .entries()
            .into_iter()
            .filter_map(|(_, claim)| claim.diagnose())
            .collect()
    }
}

impl Default for PlatformContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Context for PlatformContext {
    fn id(&self) -> ContextId {
        self.inner.id()
    }

    fn before_checkpoint(&self, trigger: Option<&dyn Context>) -> Result<(), CheckpointError> {
        let _pass = self.pass_lock.lock();
        *self.claims.write() = Some(Arc::new(ClaimMap::new()));
        debug!("{}: claim window opened", self.id());
        Context::before_checkpoint(&self.inner, trigger)
    }

    fn after_restore(&self, trigger: Option<&dyn Context>) -> Result<(), RestoreError> {
        let _pass = self.pass_lock.lock();
        let result = Context::after_restore(&self.inner, trigger);
        if let Some(window) = self.claims.write().take() {
            info!("{}: claim window closed with {} claim(s)", self.id(), window.len());
        }
        result
    }

    fn live_count(&self) -> usize {
        self.inner.live_count()
    }
}

impl Resource for PlatformContext {
    fn before_checkpoint(&self, context: &dyn Context) -> Result<(), Failure> {
        Context::before_checkpoint(self, Some(context)).map_err(Failure::from)
    }

    fn after_restore(&self, context: &dyn Context) -> Result<(), Failure> {
        Context::after_restore(self, Some(context)).map_err(Failure::from)
    }

    fn name(&self) -> &str {
        "PlatformContext"
    }
}
