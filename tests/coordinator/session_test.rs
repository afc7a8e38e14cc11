/*!
 * Session Tests
 * Whole checkpoint/restore sessions through the coordinator
 */

use crac_coordinator::{
    interrupt, Context, Coordinator, CriticalUnorderedContext, EngineResponse, Failure,
    FailureCode, FnResource, HostFailure, ScriptedEngine, SessionError,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::thread;

fn setup() -> (Arc<ScriptedEngine>, Coordinator) {
    let engine = Arc::new(ScriptedEngine::new());
    let coordinator = Coordinator::new(engine.clone());
    (engine, coordinator)
}

#[test]
fn test_both_phases_failing_raise_only_checkpoint() {
    let (engine, coordinator) = setup();
    let resource = Arc::new(
        FnResource::new("db")
            .on_checkpoint(|_| Err(Failure::resource("db", "flush failed")))
            .on_restore(|_| Err(Failure::resource("db", "reconnect failed"))),
    );
    coordinator.register(&resource);

    match coordinator.checkpoint_restore() {
        Err(SessionError::Checkpoint(err)) => assert_eq!(
            err.causes(),
            &[
                Failure::resource("db", "flush failed"),
                Failure::resource("db", "reconnect failed"),
            ]
        ),
        other => panic!("expected a checkpoint failure, got {:?}", other),
    }
    assert_eq!(engine.call_count(), 1);

    let stats = coordinator.stats();
    assert_eq!(stats.checkpoint_failures, 1);
    assert_eq!(stats.restore_failures, 0);
}

#[test]
fn test_after_restore_runs_when_only_engine_failed() {
    let engine = Arc::new(ScriptedEngine::with_responses([EngineResponse::error(vec![
        HostFailure::new(FailureCode::OpenFile, "/var/log/app.log"),
    ])]));
    let coordinator = Coordinator::new(engine.clone());

    let checkpoints = Arc::new(AtomicUsize::new(0));
    let restores = Arc::new(AtomicUsize::new(0));
    let (c, r) = (checkpoints.clone(), restores.clone());
    let resource = Arc::new(
        FnResource::new("log")
            .on_checkpoint(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .on_restore(move |_| {
                r.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
    );
    coordinator.register(&resource);

    match coordinator.checkpoint_restore() {
        Err(SessionError::Checkpoint(err)) => assert_eq!(
            err.causes(),
            &[Failure::host(FailureCode::OpenFile, "/var/log/app.log")]
        ),
        other => panic!("expected a checkpoint failure, got {:?}", other),
    }
    assert_eq!(engine.last_request().map(|r| r.dry_run), Some(false));
    assert_eq!(checkpoints.load(Ordering::SeqCst), 1);
    assert_eq!(restores.load(Ordering::SeqCst), 1);
}

#[test]
fn test_restore_only_failure_raises_restore() {
    let (_engine, coordinator) = setup();
    let resource = Arc::new(
        FnResource::new("db").on_restore(|_| Err(Failure::resource("db", "reconnect failed"))),
    );
    coordinator.register(&resource);

    assert!(matches!(
        coordinator.checkpoint_restore(),
        Err(SessionError::Restore(_))
    ));
}

#[test]
fn test_recursive_request_is_rejected() {
    let engine = Arc::new(ScriptedEngine::new());
    let coordinator = Arc::new(Coordinator::new(engine.clone()));
    let nested_result = Arc::new(Mutex::new(None));

    let weak: Weak<Coordinator> = Arc::downgrade(&coordinator);
    let seen = nested_result.clone();
    let resource = Arc::new(FnResource::new("recursive").on_checkpoint(move |_| {
        let Some(coordinator) = weak.upgrade() else {
            return Ok(());
        };
        let result = coordinator.checkpoint_restore();
        *seen.lock() = Some(result.clone());
        result.map_err(Failure::from)
    }));
    coordinator.register(&resource);

    let err = coordinator.checkpoint_restore().unwrap_err();
    assert_eq!(*nested_result.lock(), Some(Err(SessionError::Recursive)));
    match err {
        SessionError::Checkpoint(err) => assert_eq!(err.causes(), &[Failure::Recursive]),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(engine.call_count(), 1);
    assert_eq!(coordinator.stats().recursive_rejections, 1);
    assert!(!coordinator.in_session());
}

#[test]
fn test_unsupported_engine_notifies_nobody() {
    let engine = Arc::new(ScriptedEngine::new().with_supported(false));
    let coordinator = Coordinator::new(engine.clone());
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = calls.clone();
    let resource = Arc::new(FnResource::new("r").on_checkpoint(move |_| {
        counted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }));
    coordinator.register(&resource);

    assert_eq!(coordinator.checkpoint_restore(), Err(SessionError::Unsupported));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(engine.call_count(), 0);
    assert_eq!(coordinator.stats().unsupported_rejections, 1);
}

#[test]
fn test_sessions_from_threads_are_serialized() {
    let engine = Arc::new(ScriptedEngine::new());
    let coordinator = Arc::new(Coordinator::new(engine.clone()));
    let active = Arc::new(AtomicUsize::new(0));
    let overlaps = Arc::new(AtomicUsize::new(0));

    let (a, o) = (active.clone(), overlaps.clone());
    let resource = Arc::new(
        FnResource::new("probe")
            .on_checkpoint(move |_| {
                if a.fetch_add(1, Ordering::SeqCst) > 0 {
                    o.fetch_add(1, Ordering::SeqCst);
                }
                thread::yield_now();
                Ok(())
            })
            .on_restore({
                let a = active.clone();
                move |_| {
                    a.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
    );
    coordinator.register(&resource);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let coordinator = coordinator.clone();
            thread::spawn(move || coordinator.checkpoint_restore())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok(()));
    }

    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    assert_eq!(engine.call_count(), 4);
    assert_eq!(coordinator.stats().sessions_succeeded, 4);
}

#[test]
fn test_critical_race_surfaces_in_session_error() {
    let (engine, coordinator) = setup();
    let critical = Arc::new(CriticalUnorderedContext::new());
    coordinator.register(&critical);

    let late_calls = Arc::new(AtomicUsize::new(0));
    let calls = late_calls.clone();
    let late = Arc::new(FnResource::new("late").on_checkpoint(move |_| {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(Failure::resource("late", "not ready"))
    }));

    let weak_critical = Arc::downgrade(&critical);
    let raced = late.clone();
    let trigger = Arc::new(FnResource::new("trigger").on_checkpoint(move |_| {
        let ctx = weak_critical.clone();
        let late = raced.clone();
        thread::spawn(move || {
            if let Some(ctx) = ctx.upgrade() {
                ctx.register(&late);
            }
        })
        .join()
        .map_err(|_| Failure::other("registering thread panicked"))
    }));
    critical.register(&trigger);

    match coordinator.checkpoint_restore() {
        Err(SessionError::Checkpoint(err)) => {
            assert_eq!(err.causes(), &[Failure::resource("late", "not ready")])
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    assert_eq!(engine.last_request().map(|r| r.dry_run), Some(true));
    assert_eq!(critical.live_count(), 2);
}

#[test]
fn test_interrupt_is_reasserted_on_calling_thread() {
    let (_engine, coordinator) = setup();
    let resource = Arc::new(FnResource::new("sleeper").on_checkpoint(|_| Err(Failure::Interrupted)));
    coordinator.register(&resource);

    interrupt::take_interrupted();
    let err = coordinator.checkpoint_restore().unwrap_err();
    assert!(matches!(err, SessionError::Checkpoint(_)));
    assert!(interrupt::take_interrupted());
}

#[test]
fn test_resources_see_the_root_context() {
    let (_engine, coordinator) = setup();
    let root_id = coordinator.global_context().id();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = seen.clone();
    let resource = Arc::new(FnResource::new("r").on_checkpoint(move |ctx| {
        record.lock().push(ctx.id());
        Ok(())
    }));
    coordinator.register(&resource);

    coordinator.checkpoint_restore().unwrap();
    assert_eq!(*seen.lock(), vec![root_id]);
}

#[test]
fn test_replay_skipped_after_failed_checkpoint() {
    let engine = Arc::new(ScriptedEngine::with_responses([
        EngineResponse::ok().with_arguments("app")
    ]));
    let replays = Arc::new(AtomicUsize::new(0));
    let counted = replays.clone();
    let coordinator = Coordinator::new(engine).with_replay_handler(
        move |_: &crac_coordinator::RestoreReplay| -> Result<(), Failure> {
            counted.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
    );
    let resource = Arc::new(FnResource::new("r").on_checkpoint(|_| Err(Failure::other("no"))));
    coordinator.register(&resource);

    assert!(coordinator.checkpoint_restore().is_err());
    assert_eq!(replays.load(Ordering::SeqCst), 0);
}
