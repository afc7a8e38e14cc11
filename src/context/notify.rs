/*!
 * Notification Passes
 * Sequential traversal of a snapshot, draining every failure
 */

use super::Context;
use crate::aggregate::{CheckpointHolder, RestoreHolder};
use crate::resource::Resource;
use log::{trace, warn};
use std::sync::Arc;

/// Notify every resource of `snapshot` before checkpoint, in order
///
/// A failing resource never stops the traversal.
pub(crate) fn before_checkpoint_pass(
    context: &dyn Context,
    snapshot: &[Arc<dyn Resource>],
    holder: &mut CheckpointHolder,
) {
    for resource in snapshot {
        trace!("{}: beforeCheckpoint {}", context.id(), resource.name());
        if let Err(failure) = resource.before_checkpoint(context) {
            warn!(
                "{}: beforeCheckpoint of {} failed: {}",
                context.id(),
                resource.name(),
                failure
            );
            holder.handle(failure);
        }
    }
}

/// Notify every resource of `snapshot` after restore, in order
pub(crate) fn after_restore_pass(
    context: &dyn Context,
    snapshot: &[Arc<dyn Resource>],
    holder: &mut RestoreHolder,
) {
    for resource in snapshot {
        trace!("{}: afterRestore {}", context.id(), resource.name());
        if let Err(failure) = resource.after_restore(context) {
            warn!(
                "{}: afterRestore of {} failed: {}",
                context.id(),
                resource.name(),
                failure
            );
            holder.handle(failure);
        }
    }
}
