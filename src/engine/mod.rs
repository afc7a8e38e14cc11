/*!
 * Checkpoint Engine
 * Boundary to the host operation that suspends and resumes the process image
 *
 * The engine is invoked exactly once per session, after the before-checkpoint
 * pass and before the after-restore pass. When the request is a dry run the
 * engine must not suspend anything and should return promptly.
 */

mod scripted;
mod types;
mod unsupported;

pub use scripted::ScriptedEngine;
pub use types::{DiagnosticStream, EngineRequest, EngineResponse, EngineStatus, HostFailure};
pub use unsupported::UnsupportedEngine;

/// Host suspend/resume operation
pub trait CheckpointEngine: Send + Sync {
    /// Whether a checkpoint capability is present at all
    fn is_supported(&self) -> bool {
        true
    }

    /// Suspend, then resume; returns in the restored instance (or immediately
    /// on failure or dry run)
    fn checkpoint_restore(&self, request: EngineRequest) -> EngineResponse;
}
