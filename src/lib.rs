/*!
 * Checkpoint/Restore Coordination Library
 * Deterministic, race-safe notification of participants around a global
 * suspend/resume event
 */

pub mod aggregate;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod core;
pub mod engine;
pub mod monitoring;
pub mod platform;
pub mod policy;
pub mod resource;

// Re-exports
pub use aggregate::{Aggregate, CheckpointHolder, FailureHolder, RestoreHolder};
pub use config::{ConfigError, ConfigResult, CoordinatorConfig};
pub use context::{Comparator, Context, CriticalUnorderedContext, OrderedContext, PriorityContext};
pub use coordinator::{Coordinator, ReplayHandler, RestoreReplay, SessionState, SessionStats};
pub use crate::core::errors::*;
pub use crate::core::interrupt;
pub use crate::core::types::*;
pub use engine::{
    CheckpointEngine, DiagnosticStream, EngineRequest, EngineResponse, EngineStatus, HostFailure,
    ScriptedEngine, UnsupportedEngine,
};
pub use monitoring::init_tracing;
pub use platform::{Claim, DiagnosticFn, PlatformContext, PlatformResourceKind};
pub use policy::{PolicyAction, PolicyError, PolicyKind, PolicyResult, ResourcePolicies};
pub use resource::{FnResource, NotifyFn, Resource, WeakResource};
