/*!
 * Critical Unordered Context
 *
 * Notification order is unspecified, but registration racing a checkpoint
 * is handled under the context's own lock:
 *
 * - registered while a before-checkpoint pass is in flight: not part of the
 *   taken snapshot, notified synchronously inside `register`, failure merged
 *   into the aggregate that pass raises
 * - registered after before-checkpoint but before after-restore: notified
 *   synchronously as well, failure raised by the next after-restore pass
 */

use super::notify::{after_restore_pass, before_checkpoint_pass};
use super::registry::WeakRegistry;
use super::Context;
use crate::aggregate::{CheckpointHolder, RestoreHolder};
use crate::core::errors::{CheckpointError, Failure, RestoreError};
use crate::core::types::ContextId;
use crate::resource::{Resource, WeakResource};
use log::{debug, warn};
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::mem;

/// Where the context stands relative to a checkpoint
enum Phase {
    Idle,
    /// before-checkpoint pass in flight; raced failures join this pass
    Checkpointing(CheckpointHolder),
    /// between the passes; raced failures are raised after restore
    Suspended(CheckpointHolder),
}

impl Phase {
    fn holder_mut(&mut self) -> Option<&mut CheckpointHolder> {
        match self {
            Phase::Idle => None,
            Phase::Checkpointing(holder) | Phase::Suspended(holder) => Some(holder),
        }
    }
}

struct CriticalState {
    registry: WeakRegistry<()>,
    phase: Phase,
}

/// Context tolerating registration during an in-flight checkpoint
///
/// The lock is reentrant: a resource notified from `register` may itself
/// register further resources into the same context.
pub struct CriticalUnorderedContext {
    id: ContextId,
    state: ReentrantMutex<RefCell<CriticalState>>,
}

impl CriticalUnorderedContext {
    pub fn new() -> Self {
        Self {
            id: ContextId::next(),
            state: ReentrantMutex::new(RefCell::new(CriticalState {
                registry: WeakRegistry::new(),
                phase: Phase::Idle,
            })),
        }
    }

    /// Register a resource, notifying it at once if a checkpoint is underway
    ///
    /// Registering an already registered resource is a no-op.
    pub fn register<R: WeakResource + ?Sized>(&self, resource: &R) {
        let weak = resource.downgrade_resource();
        let guard = self.state.lock();

        let raced = {
            let mut state = guard.borrow_mut();
            if state.registry.contains(&weak) {
                return;
            }
            state.registry.insert(weak.clone(), ());
            !matches!(state.phase, Phase::Idle)
        };
        if !raced {
            return;
        }

        let Some(resource) = weak.upgrade() else {
            return;
        };
        debug!(
            "{}: {} registered during checkpoint, notifying now",
            self.id,
            resource.name()
        );
        // RefCell is not borrowed here, so the resource may re-enter
        if let Err(failure) = resource.before_checkpoint(self) {
            warn!(
                "{}: beforeCheckpoint of raced {} failed: {}",
                self.id,
                resource.name(),
                failure
            );
            let mut state = guard.borrow_mut();
            match state.phase.holder_mut() {
                Some(holder) => holder.handle(failure),
                None => warn!("{}: checkpoint ended before raced failure was recorded", self.id),
            };
        }
    }

    /// Whether a checkpoint is between its before and after passes
    pub fn is_checkpointing(&self) -> bool {
        let guard = self.state.lock();
        let state = guard.borrow();
        !matches!(state.phase, Phase::Idle)
    }

    fn snapshot(&self) -> Vec<std::sync::Arc<dyn Resource>> {
        let guard = self.state.lock();
        let state = guard.borrow();
        state.registry.live_resources()
    }
}

impl Default for CriticalUnorderedContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Context for CriticalUnorderedContext {
    fn id(&self) -> ContextId {
        self.id
    }

    fn before_checkpoint(&self, _trigger: Option<&dyn Context>) -> Result<(), CheckpointError> {
        // Phase switch and snapshot are atomic: a registration lands either
        // in the snapshot or in the raced path, never both.
        let snapshot = {
            let guard = self.state.lock();
            let mut state = guard.borrow_mut();
            state.phase = Phase::Checkpointing(CheckpointHolder::new());
            state.registry.live_resources()
        };

        let mut holder = CheckpointHolder::new();
        before_checkpoint_pass(self, &snapshot, &mut holder);

        let raced = {
            let guard = self.state.lock();
            let mut state = guard.borrow_mut();
            let finished = mem::replace(&mut state.phase, Phase::Suspended(CheckpointHolder::new()));
            match finished {
                Phase::Checkpointing(raced) | Phase::Suspended(raced) => raced.take_if_any(),
                Phase::Idle => None,
            }
        };
        if let Some(raced) = raced {
            holder.handle(raced);
        }
        holder.throw_if_any()
    }

    fn after_restore(&self, _trigger: Option<&dyn Context>) -> Result<(), RestoreError> {
        let raced = {
            let guard = self.state.lock();
            let mut state = guard.borrow_mut();
            let finished = mem::replace(&mut state.phase, Phase::Idle);
            match finished {
                Phase::Checkpointing(raced) | Phase::Suspended(raced) => raced.take_if_any(),
                Phase::Idle => None,
            }
        };

        let mut holder = RestoreHolder::new();
        if let Some(raced) = raced {
            holder.handle(raced);
        }

        // updated set: raced registrations were already notified before checkpoint
        let snapshot = self.snapshot();
        after_restore_pass(self, &snapshot, &mut holder);
        holder.throw_if_any()
    }

    fn live_count(&self) -> usize {
        let guard = self.state.lock();
        let count = guard.borrow().registry.live_count();
        count
    }
}

impl Resource for CriticalUnorderedContext {
    fn before_checkpoint(&self, context: &dyn Context) -> Result<(), Failure> {
        Context::before_checkpoint(self, Some(context)).map_err(Failure::from)
    }

    fn after_restore(&self, context: &dyn Context) -> Result<(), Failure> {
        Context::after_restore(self, Some(context)).map_err(Failure::from)
    }

    fn name(&self) -> &str {
        "CriticalUnorderedContext"
    }
}
