/*!
 * Handle Claims
 * Window-scoped map from host handle to the resource responsible for it
 */

use crate::core::errors::{ClaimError, ClaimResult, Failure};
use crate::core::types::Handle;
use ahash::RandomState;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

/// Diagnostic evaluated at checkpoint time for a claimed handle
///
/// Returning a failure reports the handle as a checkpoint cause.
pub type DiagnosticFn = Arc<dyn Fn() -> Option<Failure> + Send + Sync>;

/// A resource's assertion of responsibility for one handle
#[derive(Clone)]
pub struct Claim {
    owner: String,
    diagnostic: Option<DiagnosticFn>,
}

impl Claim {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            diagnostic: None,
        }
    }

    #[must_use]
    pub fn with_diagnostic<F>(mut self, diagnostic: F) -> Self
    where
        F: Fn() -> Option<Failure> + Send + Sync + 'static,
    {
        self.diagnostic = Some(Arc::new(diagnostic));
        self
    }

    #[inline]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Evaluate the diagnostic, if any
    pub fn diagnose(&self) -> Option<Failure> {
        self.diagnostic.as_ref().and_then(|diagnostic| diagnostic())
    }
}

impl fmt::Debug for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claim")
            .field("owner", &self.owner)
            .field("diagnostic", &self.diagnostic.is_some())
            .finish()
    }
}

/// Claims of one checkpoint window
pub(crate) struct ClaimMap {
    claims: DashMap<Handle, Claim, RandomState>,
}

impl ClaimMap {
    pub fn new() -> Self {
        Self {
            claims: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Strict claim: a second claim of the same handle is a programming error
    pub fn claim(&self, handle: Handle, claim: Claim) -> ClaimResult<()> {
        match self.claims.entry(handle) {
            Entry::Occupied(existing) => Err(ClaimError::AlreadyClaimed {
                handle,
                owner: existing.get().owner.clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(claim);
                Ok(())
            }
        }
    }

    /// Non-failing claim, true if this call won an uncontested claim
    pub fn claim_weak(&self, handle: Handle, claim: Claim) -> bool {
        match self.claims.entry(handle) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(claim);
                true
            }
        }
    }

    pub fn owner_of(&self, handle: Handle) -> Option<String> {
        self.claims.get(&handle).map(|claim| claim.owner.clone())
    }

    /// Claimed handles in ascending order
    pub fn handles(&self) -> Vec<Handle> {
        let mut handles: Vec<Handle> = self.claims.iter().map(|entry| *entry.key()).collect();
        handles.sort_unstable();
        handles
    }

    /// Snapshot of every claim, ordered by handle
    pub fn entries(&self) -> Vec<(Handle, Claim)> {
        let mut entries: Vec<(Handle, Claim)> = self
            .claims
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        entries.sort_unstable_by_key(|(handle, _)| *handle);
        entries
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }
}
