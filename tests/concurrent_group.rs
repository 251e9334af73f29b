// tests/concurrent_group.rs

use std::sync::Arc;

use buildrig::errors::BuildrigError;
use buildrig::sched::{build_plan, PlanStep, Scheduler};
use buildrig::tasks::{Task, TaskRegistry};
use buildrig_test_utils::fake::{invocation_log, log_entries, InvocationLog, RecordingAction};
use buildrig_test_utils::init_tracing;

fn parallel_task(name: &str, log: &InvocationLog, fail: bool) -> Task {
    let action = if fail {
        RecordingAction::failing(name, log.clone())
    } else {
        RecordingAction::new(name, log.clone())
    };
    Task {
        name: name.to_string(),
        deps: Vec::new(),
        parallel: true,
        action: Some(Arc::new(action)),
    }
}

/// Parallel siblings under one alias are planned as a single concurrent step.
#[test]
fn parallel_siblings_form_one_concurrent_step() {
    let log = invocation_log();
    let mut registry = TaskRegistry::new();
    registry.register(parallel_task("transformer", &log, false));
    registry.register(parallel_task("serve", &log, false));
    registry.register(parallel_task("watchers", &log, false));
    registry.register(Task::alias(
        "develop",
        vec!["transformer".into(), "serve".into(), "watchers".into()],
    ));

    let plan = build_plan(&registry, "develop").expect("plan should build");

    match &plan[0] {
        PlanStep::Concurrent(names) => assert_eq!(names.len(), 3),
        other => panic!("expected a concurrent step, got {other:?}"),
    }
}

/// A parallel task never shares a step with one of its own prerequisites.
#[test]
fn parallel_task_does_not_join_its_prerequisite_step() {
    let log = invocation_log();
    let mut registry = TaskRegistry::new();
    registry.register(parallel_task("first", &log, false));
    let mut second = parallel_task("second", &log, false);
    second.deps = vec!["first".to_string()];
    registry.register(second);

    let plan = build_plan(&registry, "second").expect("plan should build");

    assert_eq!(
        plan,
        vec![
            PlanStep::Sequential("first".to_string()),
            PlanStep::Sequential("second".to_string()),
        ]
    );
}

/// One member failing does not cancel its siblings: all members are invoked
/// exactly once and the group outcome names the failing task.
#[tokio::test]
async fn failing_member_does_not_cancel_siblings() {
    init_tracing();

    let log = invocation_log();
    let mut registry = TaskRegistry::new();
    registry.register(parallel_task("lint", &log, false));
    registry.register(parallel_task("broken", &log, true));
    registry.register(parallel_task("unit", &log, false));
    registry.register(Task::alias(
        "checks",
        vec!["lint".into(), "broken".into(), "unit".into()],
    ));

    let scheduler = Scheduler::new(Arc::new(registry));
    let err = scheduler.run("checks").await.expect_err("group should fail");

    match err {
        BuildrigError::TaskFailed { task, .. } => assert_eq!(task, "broken"),
        other => panic!("expected TaskFailed, got {other:?}"),
    }

    let mut entries = log_entries(&log);
    entries.sort();
    assert_eq!(entries, vec!["broken", "lint", "unit"], "every member ran once");
}

/// A failing concurrent step halts steps after it, but not its own members.
#[tokio::test]
async fn failure_in_group_halts_later_steps() {
    init_tracing();

    let log = invocation_log();
    let mut registry = TaskRegistry::new();
    registry.register(parallel_task("ok", &log, false));
    registry.register(parallel_task("bad", &log, true));
    let mut after = parallel_task("report", &log, false);
    after.parallel = false;
    after.deps = vec!["ok".to_string(), "bad".to_string()];
    registry.register(after);

    let scheduler = Scheduler::new(Arc::new(registry));
    scheduler.run("report").await.expect_err("run should fail");

    let entries = log_entries(&log);
    assert!(!entries.contains(&"report".to_string()), "report must never start");
    assert_eq!(entries.len(), 2);
}
