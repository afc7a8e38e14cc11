/*!
 * Checkpoint/Restore Coordinator - Demo Entry Point
 *
 * Runs one session against a scripted engine:
 * - Loads configuration from the environment
 * - Registers a few application and platform resources
 * - Claims a handle during the checkpoint window
 * - Prints session statistics as JSON
 */

use anyhow::{Context as _, Result};
use std::sync::{Arc, Weak};
use tracing::{error, info};

use crac_coordinator::{
    init_tracing, Claim, Coordinator, CoordinatorConfig, CriticalUnorderedContext,
    EngineResponse, Failure, FnResource, Handle, PlatformContext, PlatformResourceKind,
    PriorityContext, RestoreReplay, ScriptedEngine, SessionError,
};

fn main() -> Result<()> {
    init_tracing();

    info!("Checkpoint/restore coordinator demo starting...");
    info!("================================================");

    let config = CoordinatorConfig::from_env().context("Invalid coordinator configuration")?;
    info!(
        restore_order = ?config.restore_order,
        trace_startup_time = config.trace_startup_time,
        "Configuration loaded"
    );

    let engine = Arc::new(ScriptedEngine::with_responses([EngineResponse::ok()
        .with_arguments("demo --restored")
        .with_properties(["demo.mode=warm"])]));

    let coordinator = Coordinator::from_config(engine.clone(), config)
        .context("Failed to load resource policies")?
        .with_replay_handler(|replay: &RestoreReplay| -> Result<(), Failure> {
            info!(
                program = replay.program().unwrap_or("<none>"),
                arguments = ?replay.program_arguments(),
                properties = replay.properties.len(),
                "Replaying restored arguments"
            );
            Ok(())
        });
    info!(policies = coordinator.policies().len(), "Coordinator ready");

    // Application resources, notified in registration order
    let database = Arc::new(
        FnResource::new("database")
            .on_checkpoint(|ctx| {
                info!(context = %ctx.id(), "database: flushing and closing connections");
                Ok(())
            })
            .on_restore(|_| {
                info!("database: reconnecting");
                Ok(())
            }),
    );
    coordinator.register(&database);

    // Layered services ordered by priority
    let services = Arc::new(PriorityContext::<u32>::new());
    let http = Arc::new(FnResource::new("http-server"));
    let cache = Arc::new(FnResource::new("cache"));
    services.register(&cache, 20);
    services.register(&http, 10);
    coordinator.register(&services);

    // Late-registering components go through a critical context
    let workers = Arc::new(CriticalUnorderedContext::new());
    let worker = Arc::new(FnResource::new("worker-pool"));
    workers.register(&worker);
    coordinator.register(&workers);

    // Platform resource claiming its handle
    let weak_platform: Weak<PlatformContext> = Arc::downgrade(coordinator.platform());
    let log_file = Arc::new(FnResource::new("log-file").on_checkpoint(move |_| {
        if let Some(platform) = weak_platform.upgrade() {
            platform
                .claim(Handle::new(3), Claim::new("log-file"))
                .map_err(|e| Failure::resource("log-file", e.to_string()))?;
        }
        Ok(())
    }));
    coordinator
        .platform()
        .register(&log_file, PlatformResourceKind::FileDescriptors);

    match coordinator.checkpoint_restore() {
        Ok(()) => info!("Session completed, running in the restored instance"),
        Err(SessionError::Restore(err)) => error!("{}", err.report()),
        Err(err) => error!("{:?}", miette::Report::new(err)),
    }

    if let Some(request) = engine.last_request() {
        info!(claimed = ?request.claimed_handles, dry_run = request.dry_run, "Engine request");
    }

    let stats = serde_json::to_string_pretty(&coordinator.stats())?;
    println!("{}", stats);
    Ok(())
}
