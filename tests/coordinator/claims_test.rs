/*!
 * Handle Claim Tests
 * Claim windows as seen through whole sessions
 */

use crac_coordinator::{
    Claim, ClaimError, Coordinator, Failure, FnResource, Handle, PlatformContext,
    PlatformResourceKind, ScriptedEngine, SessionError,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

fn setup() -> (Arc<ScriptedEngine>, Coordinator) {
    let engine = Arc::new(ScriptedEngine::new());
    let coordinator = Coordinator::new(engine.clone());
    (engine, coordinator)
}

fn claimer(
    platform: &Arc<PlatformContext>,
    owner: &'static str,
    handles: &'static [i64],
) -> Arc<FnResource> {
    let weak: Weak<PlatformContext> = Arc::downgrade(platform);
    Arc::new(FnResource::new(owner).on_checkpoint(move |_| {
        let Some(platform) = weak.upgrade() else {
            return Ok(());
        };
        for raw in handles {
            platform
                .claim(Handle::new(*raw), Claim::new(owner))
                .map_err(|e| Failure::resource(owner, e.to_string()))?;
        }
        Ok(())
    }))
}

#[test]
fn test_claimed_handles_reach_the_engine() {
    let (engine, coordinator) = setup();
    let files = claimer(coordinator.platform(), "files", &[9, 4]);
    coordinator
        .platform()
        .register(&files, PlatformResourceKind::FileDescriptors);

    coordinator.checkpoint_restore().unwrap();
    let request = engine.last_request().unwrap();
    assert_eq!(request.claimed_handles, vec![Handle::new(4), Handle::new(9)]);
    assert!(!request.dry_run);
    assert!(!coordinator.platform().window_open());
}

#[test]
fn test_strict_double_claim_is_a_programming_error() {
    let (engine, coordinator) = setup();
    let first = claimer(coordinator.platform(), "first", &[5]);
    let second = claimer(coordinator.platform(), "second", &[5]);
    coordinator
        .platform()
        .register(&first, PlatformResourceKind::Normal);
    coordinator
        .platform()
        .register(&second, PlatformResourceKind::Cleaners);

    let expected = ClaimError::AlreadyClaimed {
        handle: Handle::new(5),
        owner: "first".to_string(),
    };
    match coordinator.checkpoint_restore() {
        Err(SessionError::Checkpoint(err)) => assert_eq!(
            err.causes(),
            &[Failure::resource("second", expected.to_string())]
        ),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(engine.last_request().map(|r| r.dry_run), Some(true));
}

#[test]
fn test_weak_claims_first_wins() {
    let (_engine, coordinator) = setup();
    let results = Arc::new(Mutex::new(Vec::new()));

    let weak = Arc::downgrade(coordinator.platform());
    let record = results.clone();
    let shared = Arc::new(FnResource::new("shared").on_checkpoint(move |_| {
        if let Some(platform) = weak.upgrade() {
            let mut record = record.lock();
            record.push(platform.claim_weak(Handle::new(2), Claim::new("a")));
            record.push(platform.claim_weak(Handle::new(2), Claim::new("b")));
            record.push(platform.claim_owner(Handle::new(2)) == Some("a".to_string()));
        }
        Ok(())
    }));
    coordinator
        .platform()
        .register(&shared, PlatformResourceKind::Selectors);

    coordinator.checkpoint_restore().unwrap();
    assert_eq!(*results.lock(), vec![true, false, true]);
}

#[test]
fn test_second_session_starts_with_empty_claims() {
    let (engine, coordinator) = setup();
    let first_session = Arc::new(AtomicBool::new(true));

    let weak = Arc::downgrade(coordinator.platform());
    let flag = first_session.clone();
    let resource = Arc::new(FnResource::new("toggling").on_checkpoint(move |_| {
        let Some(platform) = weak.upgrade() else {
            return Ok(());
        };
        if flag.swap(false, Ordering::SeqCst) {
            platform
                .claim(Handle::new(5), Claim::new("toggling"))
                .map_err(|e| Failure::other(e.to_string()))?;
        }
        platform
            .claim(Handle::new(6), Claim::new("toggling"))
            .map_err(|e| Failure::other(e.to_string()))
    }));
    coordinator
        .platform()
        .register(&resource, PlatformResourceKind::Normal);

    coordinator.checkpoint_restore().unwrap();
    coordinator.checkpoint_restore().unwrap();

    let claimed: Vec<Vec<Handle>> = engine
        .requests()
        .into_iter()
        .map(|r| r.claimed_handles)
        .collect();
    assert_eq!(
        claimed,
        vec![vec![Handle::new(5), Handle::new(6)], vec![Handle::new(6)]]
    );
    assert_eq!(coordinator.platform().claim_count(), 0);
}

#[test]
fn test_claim_diagnostics_fail_the_checkpoint() {
    let (engine, coordinator) = setup();
    let weak = Arc::downgrade(coordinator.platform());
    let leaky = Arc::new(FnResource::new("leaky").on_checkpoint(move |_| {
        if let Some(platform) = weak.upgrade() {
            platform
                .claim(
                    Handle::new(11),
                    Claim::new("leaky").with_diagnostic(|| {
                        Some(Failure::resource("leaky", "fd 11 is still open"))
                    }),
                )
                .map_err(|e| Failure::other(e.to_string()))?;
        }
        Ok(())
    }));
    coordinator
        .platform()
        .register(&leaky, PlatformResourceKind::FileDescriptors);

    match coordinator.checkpoint_restore() {
        Err(SessionError::Checkpoint(err)) => assert_eq!(
            err.causes(),
            &[Failure::resource("leaky", "fd 11 is still open")]
        ),
        other => panic!("unexpected {:?}", other),
    }
    let request = engine.last_request().unwrap();
    assert!(request.dry_run);
    assert_eq!(request.claimed_handles, vec![Handle::new(11)]);
}

#[test]
fn test_platform_resources_run_before_application_resources() {
    let (_engine, coordinator) = setup();
    let log = Arc::new(Mutex::new(Vec::new()));

    let app_log = log.clone();
    let app = Arc::new(FnResource::new("app").on_checkpoint(move |_| {
        app_log.lock().push("app");
        Ok(())
    }));
    let platform_log = log.clone();
    let platform = Arc::new(FnResource::new("selectors").on_checkpoint(move |_| {
        platform_log.lock().push("selectors");
        Ok(())
    }));
    coordinator.register(&app);
    coordinator
        .platform()
        .register(&platform, PlatformResourceKind::Selectors);

    coordinator.checkpoint_restore().unwrap();
    assert_eq!(*log.lock(), vec!["selectors", "app"]);
}
