/*!
 * Contexts
 * Ordered notification registries
 *
 * # Variants
 *
 * - **OrderedContext**: snapshot order is registration order
 * - **PriorityContext**: stable sort over a declared order key
 * - **CriticalUnorderedContext**: unspecified order, race-safe registration
 *
 * Every context is also a [`Resource`](crate::resource::Resource), so
 * contexts nest: a child registered in a parent takes part in the parent's
 * pass as one participant and its aggregate flattens into the parent's.
 */

mod critical;
mod notify;
mod ordered;
mod priority;
mod registry;

pub use critical::CriticalUnorderedContext;
pub use ordered::OrderedContext;
pub use priority::{Comparator, PriorityContext};

use crate::core::errors::{CheckpointError, RestoreError};
use crate::core::types::ContextId;

/// Registry and notifier for a set of resources
pub trait Context: Send + Sync {
    /// Identity of this context
    fn id(&self) -> ContextId;

    /// Notify every live registrant before checkpoint
    ///
    /// Runs through the whole snapshot and raises one aggregate at the end
    /// if any resource failed.
    fn before_checkpoint(&self, trigger: Option<&dyn Context>) -> Result<(), CheckpointError>;

    /// Notify registrants after restore
    fn after_restore(&self, trigger: Option<&dyn Context>) -> Result<(), RestoreError>;

    /// Number of registrants still alive
    fn live_count(&self) -> usize;
}
