/*!
 * Unsupported Engine
 */

use super::types::{EngineRequest, EngineResponse};
use super::CheckpointEngine;
use log::warn;

/// Engine for hosts without a checkpoint capability
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedEngine;

impl CheckpointEngine for UnsupportedEngine {
    fn is_supported(&self) -> bool {
        false
    }

    fn checkpoint_restore(&self, _request: EngineRequest) -> EngineResponse {
        warn!("Checkpoint requested on a host without checkpoint support");
        EngineResponse::unsupported()
    }
}
