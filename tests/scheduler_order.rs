// tests/scheduler_order.rs

use std::sync::Arc;

use buildrig::errors::BuildrigError;
use buildrig::sched::Scheduler;
use buildrig::tasks::{Task, TaskRegistry};
use buildrig_test_utils::fake::{invocation_log, log_entries, InvocationLog, RecordingAction};
use buildrig_test_utils::init_tracing;

fn recording_task(name: &str, deps: &[&str], log: &InvocationLog) -> Task {
    Task {
        name: name.to_string(),
        deps: deps.iter().map(|s| s.to_string()).collect(),
        parallel: false,
        action: Some(Arc::new(RecordingAction::new(name, log.clone()))),
    }
}

fn failing_task(name: &str, deps: &[&str], log: &InvocationLog) -> Task {
    Task {
        name: name.to_string(),
        deps: deps.iter().map(|s| s.to_string()).collect(),
        parallel: false,
        action: Some(Arc::new(RecordingAction::failing(name, log.clone()))),
    }
}

/// Diamond: default -> {style, bundle} -> clean. The shared prerequisite
/// runs exactly once, before either dependent.
#[tokio::test]
async fn diamond_runs_shared_prerequisite_once() {
    init_tracing();

    let log = invocation_log();
    let mut registry = TaskRegistry::new();
    registry.register(recording_task("clean", &[], &log));
    registry.register(recording_task("style", &["clean"], &log));
    registry.register(recording_task("bundle", &["clean"], &log));
    registry.register(Task::alias("default", vec!["style".into(), "bundle".into()]));

    let scheduler = Scheduler::new(Arc::new(registry));
    scheduler.run("default").await.expect("run should succeed");

    let entries = log_entries(&log);
    assert_eq!(entries.len(), 3, "each task runs exactly once: {entries:?}");
    assert_eq!(entries[0], "clean");
    assert!(entries.contains(&"style".to_string()));
    assert!(entries.contains(&"bundle".to_string()));
}

/// Every prerequisite finishes before its dependent starts.
#[tokio::test]
async fn prerequisites_run_before_dependents() {
    init_tracing();

    let log = invocation_log();
    let mut registry = TaskRegistry::new();
    registry.register(recording_task("lint", &[], &log));
    registry.register(recording_task("compile", &["lint"], &log));
    registry.register(recording_task("test", &["compile"], &log));

    let scheduler = Scheduler::new(Arc::new(registry));
    scheduler.run("test").await.expect("run should succeed");

    assert_eq!(log_entries(&log), vec!["lint", "compile", "test"]);
}

/// A failing sequential task halts the remaining un-started tasks.
#[tokio::test]
async fn sequential_failure_halts_remaining_tasks() {
    init_tracing();

    let log = invocation_log();
    let mut registry = TaskRegistry::new();
    registry.register(recording_task("first", &[], &log));
    registry.register(failing_task("second", &["first"], &log));
    registry.register(recording_task("third", &["second"], &log));

    let scheduler = Scheduler::new(Arc::new(registry));
    let err = scheduler.run("third").await.expect_err("second should fail");

    match err {
        BuildrigError::TaskFailed { task, .. } => assert_eq!(task, "second"),
        other => panic!("expected TaskFailed, got {other:?}"),
    }

    assert_eq!(
        log_entries(&log),
        vec!["first", "second"],
        "third must never start"
    );
}

/// Unknown task names fail before any action runs.
#[tokio::test]
async fn unknown_task_is_a_configuration_error() {
    init_tracing();

    let log = invocation_log();
    let mut registry = TaskRegistry::new();
    registry.register(recording_task("style", &[], &log));

    let scheduler = Scheduler::new(Arc::new(registry));
    let err = scheduler.run("styel").await.expect_err("typo should fail");

    assert!(matches!(err, BuildrigError::TaskNotFound(name) if name == "styel"));
    assert!(log_entries(&log).is_empty(), "no action may run");
}
