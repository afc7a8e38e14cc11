/*!
 * Coordinator Service
 * Drives one checkpoint/restore session end to end
 */

use super::replay::{ReplayHandler, RestoreReplay};
use super::session::{SessionGuard, SessionState};
use super::stats::{AtomicSessionStats, SessionStats};
use crate::aggregate::{CheckpointHolder, RestoreHolder};
use crate::config::{ConfigResult, CoordinatorConfig};
use crate::context::{Context, OrderedContext};
use crate::core::errors::{Failure, SessionError, SessionResult};
use crate::engine::{CheckpointEngine, DiagnosticStream, EngineRequest, EngineResponse, EngineStatus};
use crate::monitoring::{epoch_nanos, trace_startup, SessionSpan};
use crate::platform::PlatformContext;
use crate::policy::ResourcePolicies;
use crate::resource::WeakResource;
use parking_lot::ReentrantMutex;
use std::cell::Cell;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Checkpoint/restore coordinator
///
/// Owns the global root context, with the platform context registered as its
/// first participant. Sessions are serialized: a second thread blocks until
/// the running session ends, while a request from inside a notification on
/// the session's own thread is rejected as recursive.
///
/// # Example
///
/// ```
/// use crac_coordinator::{Coordinator, FnResource, ScriptedEngine};
/// use std::sync::Arc;
///
/// let coordinator = Coordinator::new(Arc::new(ScriptedEngine::new()));
/// let cache = Arc::new(FnResource::new("cache"));
/// coordinator.register(&cache);
///
/// coordinator.checkpoint_restore().unwrap();
/// assert_eq!(coordinator.stats().sessions_succeeded, 1);
/// ```
pub struct Coordinator {
    root: Arc<OrderedContext>,
    platform: Arc<PlatformContext>,
    engine: Arc<dyn CheckpointEngine>,
    replay: Option<Arc<dyn ReplayHandler>>,
    policies: ResourcePolicies,
    config: CoordinatorConfig,
    stats: AtomicSessionStats,
    session: ReentrantMutex<Cell<SessionState>>,
}

impl Coordinator {
    pub fn new(engine: Arc<dyn CheckpointEngine>) -> Self {
        Self::with_config(engine, CoordinatorConfig::default())
    }

    /// Coordinator with explicit configuration; the policy file is not read
    pub fn with_config(engine: Arc<dyn CheckpointEngine>, config: CoordinatorConfig) -> Self {
        let root = Arc::new(OrderedContext::new().with_restore_order(config.restore_order));
        let platform = Arc::new(PlatformContext::new().with_restore_order(config.restore_order));
        root.register(&platform);

        Self {
            root,
            platform,
            engine,
            replay: None,
            policies: ResourcePolicies::new(),
            config,
            stats: AtomicSessionStats::new(),
            session: ReentrantMutex::new(Cell::new(SessionState::Idle)),
        }
    }

    /// Coordinator with explicit configuration, loading its policy file
    pub fn from_config(engine: Arc<dyn CheckpointEngine>, config: CoordinatorConfig) -> ConfigResult<Self> {
        let policies = config.load_policies()?;
        Ok(Self::with_config(engine, config).with_policies(policies))
    }

    #[must_use]
    pub fn with_policies(mut self, policies: ResourcePolicies) -> Self {
        self.policies = policies;
        self
    }

    #[must_use]
    pub fn with_replay_handler<H>(mut self, handler: H) -> Self
    where
        H: ReplayHandler + 'static,
    {
        self.replay = Some(Arc::new(handler));
        self
    }

    /// Root context every application resource registers into
    pub fn global_context(&self) -> &Arc<OrderedContext> {
        &self.root
    }

    /// Context for platform-owned resources and handle claims
    pub fn platform(&self) -> &Arc<PlatformContext> {
        &self.platform
    }

    /// Register `resource` in the root context
    pub fn register<R: WeakResource + ?Sized>(&self, resource: &R) {
        self.root.register(resource);
    }

    pub fn policies(&self) -> &ResourcePolicies {
        &self.policies
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn stats(&self) -> SessionStats {
        self.stats.snapshot()
    }

    /// Whether the calling thread is inside a running session
    ///
    /// Blocks while another thread runs a session.
    pub fn in_session(&self) -> bool {
        self.session.lock().get() == SessionState::InProgress
    }

    /// Request a checkpoint and return once restored
    ///
    /// `Checkpoint` means execution continues in the original instance,
    /// `Restore` means the restored instance is running but some resource
    /// failed to resume. At most one of the two is raised.
    pub fn checkpoint_restore(&self) -> SessionResult<()> {
        self.run_session(None)
    }

    /// Host-triggered variant writing engine diagnostics to `stream`
    ///
    /// Returns the rendered report when execution continues in the original
    /// instance. Restore-side failures are logged instead.
    pub fn checkpoint_restore_with_diagnostics(&self, stream: DiagnosticStream) -> Option<String> {
        match self.run_session(Some(stream)) {
            Ok(()) => None,
            Err(SessionError::Checkpoint(err)) => Some(err.report()),
            Err(SessionError::Restore(err)) => {
                error!("{}", err.report());
                None
            }
            Err(other) => Some(other.to_string()),
        }
    }

    fn run_session(&self, diagnostics: Option<DiagnosticStream>) -> SessionResult<()> {
        let state = self.session.lock();
        if state.get() == SessionState::InProgress {
            warn!("Rejecting recursive checkpoint request");
            self.stats.inc_recursive();
            return Err(SessionError::Recursive);
        }
        if !self.engine.is_supported() {
            warn!("Checkpoint/restore is not supported on this host");
            self.stats.inc_unsupported();
            return Err(SessionError::Unsupported);
        }

        let _session = SessionGuard::enter(&state, self.config.trace_startup_time);
        let span = SessionSpan::new(self.stats.inc_started());
        let _entered = span.enter();

        let result = self.notify_and_suspend(&span, diagnostics);
        match &result {
            Ok(()) => {
                self.stats.inc_succeeded();
                span.record_result("success", 0);
                info!("Checkpoint/restore completed");
            }
            Err(SessionError::Checkpoint(err)) => {
                self.stats.inc_checkpoint_failures();
                span.record_result("checkpoint_failed", err.len());
                warn!(causes = err.len(), "Checkpoint failed, continuing in the original instance");
            }
            Err(SessionError::Restore(err)) => {
                self.stats.inc_restore_failures();
                span.record_result("restore_failed", err.len());
                warn!(causes = err.len(), "Restore notification failed");
            }
            Err(other) => span.record_result(&other.to_string(), 0),
        }
        result
    }

    fn notify_and_suspend(
        &self,
        span: &SessionSpan,
        diagnostics: Option<DiagnosticStream>,
    ) -> SessionResult<()> {
        debug!(epoch_nanos = %epoch_nanos(), "Starting checkpoint");

        let mut checkpoint = CheckpointHolder::new();
        if let Err(err) = Context::before_checkpoint(&*self.root, None) {
            checkpoint.handle(err);
        }

        checkpoint.absorb_causes(self.platform.claim_failures());
        let claimed_handles = self.platform.claimed_handles();
        debug!(claimed = ?claimed_handles, "Claimed handles");

        let dry_run = !checkpoint.is_empty();
        span.record_engine_call(dry_run, claimed_handles.len());
        self.stats.inc_engine_calls(dry_run);
        let response = self.engine.checkpoint_restore(EngineRequest {
            dry_run,
            claimed_handles,
            diagnostics,
        });

        if self.config.trace_startup_time {
            trace_startup("restore");
        }

        let status = response.status();
        span.record_engine_status(&status.to_string());
        translate_status(&response, &mut checkpoint);

        let mut restore = RestoreHolder::new();
        if let Err(err) = Context::after_restore(&*self.root, None) {
            restore.handle(err);
        }

        if status.is_ok() && checkpoint.is_empty() {
            self.replay(&response, &mut restore);
        }

        match (checkpoint.take_if_any(), restore.take_if_any()) {
            (Some(mut checkpoint), Some(restore)) => {
                for cause in restore.into_causes() {
                    checkpoint.add_cause(cause);
                }
                Err(SessionError::Checkpoint(checkpoint))
            }
            (Some(checkpoint), None) => Err(SessionError::Checkpoint(checkpoint)),
            (None, Some(restore)) => Err(SessionError::Restore(restore)),
            (None, None) => Ok(()),
        }
    }

    fn replay(&self, response: &EngineResponse, restore: &mut RestoreHolder) {
        let Some(replay) = RestoreReplay::from_raw(
            response.new_arguments.as_deref(),
            response.new_properties.as_deref(),
        ) else {
            return;
        };

        match &self.replay {
            Some(handler) => {
                debug!(
                    arguments = replay.arguments.len(),
                    properties = replay.properties.len(),
                    "Replaying restored arguments and properties"
                );
                restore.run_with_handler(|| handler.replay(&replay));
            }
            None => warn!("Restore carried new arguments or properties but no replay handler is installed"),
        }
    }
}

/// Fold a non-OK engine status into the checkpoint aggregate
fn translate_status(response: &EngineResponse, checkpoint: &mut CheckpointHolder) {
    match response.status() {
        EngineStatus::Ok => {}
        EngineStatus::Error => {
            if response.failures.is_empty() {
                checkpoint.handle(Failure::other("Checkpoint engine reported an error without details"));
            }
            checkpoint.absorb_causes(response.failures.iter().map(|f| f.to_failure()));
        }
        EngineStatus::Unsupported => checkpoint.handle(Failure::NotConfigured),
        EngineStatus::Unknown(code) => checkpoint.handle(Failure::UnknownStatus(code)),
    }
}
