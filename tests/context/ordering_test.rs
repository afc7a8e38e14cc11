/*!
 * Ordering Tests
 * Notification order, failure draining and weak registration
 */

use crac_coordinator::{
    Context, Failure, FnResource, OrderedContext, PriorityContext, Resource, RestoreOrder,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;

type Log = Arc<Mutex<Vec<String>>>;

fn recording(name: &str, log: &Log) -> Arc<FnResource> {
    let before_log = log.clone();
    let after_log = log.clone();
    let before_name = format!("before {}", name);
    let after_name = format!("after {}", name);
    Arc::new(
        FnResource::new(name)
            .on_checkpoint(move |_| {
                before_log.lock().push(before_name.clone());
                Ok(())
            })
            .on_restore(move |_| {
                after_log.lock().push(after_name.clone());
                Ok(())
            }),
    )
}

fn names(snapshot: &[Arc<dyn Resource>]) -> Vec<String> {
    snapshot.iter().map(|r| r.name().to_string()).collect()
}

proptest! {
    #[test]
    fn every_resource_notified_once_in_order(failing in prop::collection::vec(any::<bool>(), 0..24)) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let ctx = OrderedContext::new();

        let resources: Vec<Arc<FnResource>> = failing
            .iter()
            .enumerate()
            .map(|(i, &fail)| {
                let before_log = log.clone();
                let after_log = log.clone();
                Arc::new(
                    FnResource::new(format!("r{}", i))
                        .on_checkpoint(move |_| {
                            before_log.lock().push((true, i));
                            if fail {
                                Err(Failure::resource(format!("r{}", i), "refused"))
                            } else {
                                Ok(())
                            }
                        })
                        .on_restore(move |_| {
                            after_log.lock().push((false, i));
                            Ok(())
                        }),
                )
            })
            .collect();
        for resource in &resources {
            ctx.register(resource);
        }

        let expected: Vec<String> = failing
            .iter()
            .enumerate()
            .filter(|(_, fail)| **fail)
            .map(|(i, _)| format!("r{}", i))
            .collect();
        let raised: Vec<String> = match Context::before_checkpoint(&ctx, None) {
            Ok(()) => Vec::new(),
            Err(err) => err
                .causes()
                .iter()
                .map(|cause| match cause {
                    Failure::Resource { resource, .. } => resource.clone(),
                    other => other.to_string(),
                })
                .collect(),
        };
        prop_assert_eq!(raised, expected);
        prop_assert!(Context::after_restore(&ctx, None).is_ok());

        let log = log.lock().clone();
        let before: Vec<usize> = log.iter().filter(|(b, _)| *b).map(|(_, i)| *i).collect();
        let after: Vec<usize> = log.iter().filter(|(b, _)| !*b).map(|(_, i)| *i).collect();
        prop_assert_eq!(before, (0..failing.len()).collect::<Vec<_>>());
        prop_assert_eq!(after, (0..failing.len()).rev().collect::<Vec<_>>());
    }
}

#[test]
fn test_priority_ties_keep_registration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let ctx = PriorityContext::<u32>::new();
    let a = recording("A", &log);
    let b = recording("B", &log);
    let c = recording("C", &log);

    ctx.register(&a, 1);
    ctx.register(&c, 1);
    ctx.register(&b, 2);

    assert_eq!(names(&ctx.checkpoint_snapshot()), vec!["A", "C", "B"]);

    Context::before_checkpoint(&ctx, None).unwrap();
    Context::after_restore(&ctx, None).unwrap();
    assert_eq!(
        *log.lock(),
        vec!["before A", "before C", "before B", "after B", "after C", "after A"]
    );
}

#[test]
fn test_forward_restore_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let ctx = OrderedContext::new().with_restore_order(RestoreOrder::Forward);
    let first = recording("first", &log);
    let second = recording("second", &log);
    ctx.register(&first);
    ctx.register(&second);

    Context::before_checkpoint(&ctx, None).unwrap();
    Context::after_restore(&ctx, None).unwrap();
    assert_eq!(
        *log.lock(),
        vec!["before first", "before second", "after first", "after second"]
    );
}

#[test]
fn test_dropped_resources_are_skipped() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let ctx = OrderedContext::new();
    let kept = recording("kept", &log);
    let gone = recording("gone", &log);
    ctx.register(&kept);
    ctx.register(&gone);
    assert_eq!(ctx.live_count(), 2);

    drop(gone);
    assert_eq!(ctx.live_count(), 1);

    Context::before_checkpoint(&ctx, None).unwrap();
    Context::after_restore(&ctx, None).unwrap();
    assert_eq!(*log.lock(), vec!["before kept", "after kept"]);
}

#[test]
fn test_nested_failures_flatten_into_parent() {
    let parent = OrderedContext::new();
    let child = Arc::new(PriorityContext::<u32>::new());
    let failing = Arc::new(
        FnResource::new("inner").on_checkpoint(|_| Err(Failure::resource("inner", "busy"))),
    );
    let sibling = Arc::new(
        FnResource::new("outer").on_checkpoint(|_| Err(Failure::resource("outer", "busy"))),
    );
    child.register(&failing, 5);
    parent.register(&child);
    parent.register(&sibling);

    let err = Context::before_checkpoint(&parent, None).unwrap_err();
    assert_eq!(
        err.causes(),
        &[
            Failure::resource("inner", "busy"),
            Failure::resource("outer", "busy"),
        ]
    );
}

#[test]
fn test_after_restore_failures_use_restore_aggregate() {
    let ctx = OrderedContext::new();
    let resource = Arc::new(
        FnResource::new("r").on_restore(|_| Err(Failure::resource("r", "cannot reconnect"))),
    );
    ctx.register(&resource);

    Context::before_checkpoint(&ctx, None).unwrap();
    let err = Context::after_restore(&ctx, None).unwrap_err();
    assert_eq!(err.causes(), &[Failure::resource("r", "cannot reconnect")]);
    assert!(err.to_string().starts_with("Restore failed"));
}
