/*!
 * Coordinator
 * Global checkpoint/restore coordination service
 *
 * A session runs the root before-checkpoint pass, invokes the engine once,
 * runs the root after-restore pass and hands any replacement arguments to a
 * replay handler. It raises at most one aggregate: the checkpoint one when
 * execution continues in the original instance, the restore one otherwise.
 */

mod replay;
mod service;
mod session;
mod stats;

pub use replay::{ReplayHandler, RestoreReplay};
pub use service::Coordinator;
pub use session::SessionState;
pub use stats::SessionStats;
