/*!
 * Insertion-Ordered Context
 */

use super::priority::PriorityContext;
use super::Context;
use crate::core::errors::{CheckpointError, Failure, RestoreError};
use crate::core::types::{ContextId, RestoreOrder};
use crate::resource::{Resource, WeakResource};
use std::sync::Arc;

/// Context notifying resources in registration order
///
/// The global root context of a coordinator is one of these.
pub struct OrderedContext {
    inner: PriorityContext<()>,
}

impl OrderedContext {
    pub fn new() -> Self {
        Self {
            inner: PriorityContext::insertion_ordered(),
        }
    }

    #[must_use]
    pub fn with_restore_order(self, order: RestoreOrder) -> Self {
        Self {
            inner: self.inner.with_restore_order(order),
        }
    }

    /// Register a resource without taking ownership of it
    ///
    /// Registering the same resource twice notifies it twice.
    pub fn register<R: WeakResource + ?Sized>(&self, resource: &R) {
        self.inner.register(resource, ());
    }

    pub fn checkpoint_snapshot(&self) -> Vec<Arc<dyn Resource>> {
        self.inner.checkpoint_snapshot()
    }

    pub fn restore_order(&self) -> RestoreOrder {
        self.inner.restore_order()
    }
}

impl Default for OrderedContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Context for OrderedContext {
    fn id(&self) -> ContextId {
        self.inner.id()
    }

    fn before_checkpoint(&self, trigger: Option<&dyn Context>) -> Result<(), CheckpointError> {
        Context::before_checkpoint(&self.inner, trigger)
    }

    fn after_restore(&self, trigger: Option<&dyn Context>) -> Result<(), RestoreError> {
        Context::after_restore(&self.inner, trigger)
    }

    fn live_count(&self) -> usize {
        self.inner.live_count()
    }
}

impl Resource for OrderedContext {
    fn before_checkpoint(&self, context: &dyn Context) -> Result<(), Failure> {
        Context::before_checkpoint(self, Some(context)).map_err(Failure::from)
    }

    fn after_restore(&self, context: &dyn Context) -> Result<(), Failure> {
        Context::after_restore(self, Some(context)).map_err(Failure::from)
    }

    fn name(&self) -> &str {
        "OrderedContext"
    }
}
