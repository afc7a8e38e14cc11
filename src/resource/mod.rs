/*!
 * Resource Capability
 * The two-notification contract every checkpoint participant implements
 */

use crate::context::Context;
use crate::core::errors::Failure;
use std::sync::{Arc, Weak};

/// Checkpoint participant
///
/// Both notifications are invoked only by a [`Context`]. The `context`
/// argument is the context performing the notification, so a resource
/// registered in several contexts can tell them apart through
/// [`Context::id`]. A returned failure is aggregated by the caller and
/// never aborts the pass.
pub trait Resource: Send + Sync {
    /// Suspend before the checkpoint is taken
    fn before_checkpoint(&self, context: &dyn Context) -> Result<(), Failure>;

    /// Resume after restore (or after a failed checkpoint)
    fn after_restore(&self, context: &dyn Context) -> Result<(), Failure>;

    /// Name used in logs and diagnostics
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Anything a context can hold a non-owning reference to
///
/// Registration never extends the lifetime of the resource: contexts keep
/// only the [`Weak`] produced here.
pub trait WeakResource {
    fn downgrade_resource(&self) -> Weak<dyn Resource>;
}

impl<R: Resource + 'static> WeakResource for Arc<R> {
    fn downgrade_resource(&self) -> Weak<dyn Resource> {
        let weak: Weak<R> = Arc::downgrade(self);
        weak
    }
}

impl WeakResource for Weak<dyn Resource> {
    fn downgrade_resource(&self) -> Weak<dyn Resource> {
        self.clone()
    }
}

/// Notification callback type
pub type NotifyFn = Arc<dyn Fn(&dyn Context) -> Result<(), Failure> + Send + Sync>;

/// Resource built from a pair of callbacks
#[derive(Clone)]
pub struct FnResource {
    name: String,
    before: NotifyFn,
    after: NotifyFn,
}

impl FnResource {
    /// Resource whose notifications both succeed without doing anything
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            before: Arc::new(|_| Ok(())),
            after: Arc::new(|_| Ok(())),
        }
    }

    #[must_use]
    pub fn on_checkpoint<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn Context) -> Result<(), Failure> + Send + Sync + 'static,
    {
        self.before = Arc::new(f);
        self
    }

    #[must_use]
    pub fn on_restore<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn Context) -> Result<(), Failure> + Send + Sync + 'static,
    {
        self.after = Arc::new(f);
        self
    }
}

impl Resource for FnResource {
    fn before_checkpoint(&self, context: &dyn Context) -> Result<(), Failure> {
        (self.before)(context)
    }

    fn after_restore(&self, context: &dyn Context) -> Result<(), Failure> {
        (self.after)(context)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for FnResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnResource").field("name", &self.name).finish()
    }
}
