// tests/command_tasks.rs

use std::fs;
use std::sync::Arc;

use buildrig::errors::BuildrigError;
use buildrig::fs::RealFileSystem;
use buildrig::sched::Scheduler;
use buildrig::tasks::TaskRegistry;
use buildrig_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};
use buildrig_test_utils::init_tracing;
use tempfile::TempDir;

#[tokio::test]
async fn command_task_runs_shell_command() {
    init_tracing();

    let tmp = TempDir::new().expect("tempdir");
    let out = tmp.path().join("out.txt");

    let cfg = ConfigFileBuilder::new()
        .with_task(
            "touch",
            TaskConfigBuilder::cmd(&format!("echo done > {}", out.display())).build(),
        )
        .build();

    let registry = TaskRegistry::from_config(&cfg, Arc::new(RealFileSystem));
    let scheduler = Scheduler::new(Arc::new(registry));

    scheduler.run("touch").await.expect("command should succeed");

    let content = fs::read_to_string(&out).expect("command output file");
    assert_eq!(content, "done\n");
}

#[tokio::test]
async fn failing_command_surfaces_task_and_status() {
    init_tracing();

    let cfg = ConfigFileBuilder::new()
        .with_task("boom", TaskConfigBuilder::cmd("exit 3").build())
        .build();

    let registry = TaskRegistry::from_config(&cfg, Arc::new(RealFileSystem));
    let scheduler = Scheduler::new(Arc::new(registry));

    let err = scheduler.run("boom").await.expect_err("command should fail");

    match &err {
        BuildrigError::TaskFailed { task, .. } => assert_eq!(task, "boom"),
        other => panic!("expected TaskFailed, got {other:?}"),
    }
    assert!(err.to_string().contains("status 3"), "{err}");
}

/// An alias task from config sequences its dependencies in order.
#[tokio::test]
async fn alias_task_sequences_dependencies() {
    init_tracing();

    let tmp = TempDir::new().expect("tempdir");
    let out = tmp.path().join("order.txt");

    let cfg = ConfigFileBuilder::new()
        .with_task(
            "first",
            TaskConfigBuilder::cmd(&format!("echo 1 >> {}", out.display())).build(),
        )
        .with_task(
            "second",
            TaskConfigBuilder::cmd(&format!("echo 2 >> {}", out.display()))
                .dep("first")
                .build(),
        )
        .with_task("all", TaskConfigBuilder::alias().dep("second").build())
        .build();

    let registry = TaskRegistry::from_config(&cfg, Arc::new(RealFileSystem));
    let scheduler = Scheduler::new(Arc::new(registry));

    scheduler.run("all").await.expect("alias run should succeed");

    let content = fs::read_to_string(&out).expect("order file");
    assert_eq!(content, "1\n2\n");
}

/// The registry mirrors the config: bodies where declared, aliases where not.
#[test]
fn registry_reflects_config_bodies() {
    let cfg = ConfigFileBuilder::new()
        .with_transform("test/forms", "xml", "test/mock/forms.json")
        .with_task("style", TaskConfigBuilder::cmd("true").build())
        .with_task("transforms", TaskConfigBuilder::transform().build())
        .with_task("default", TaskConfigBuilder::alias().dep("style").build())
        .build();

    let registry = TaskRegistry::from_config(&cfg, Arc::new(RealFileSystem));

    assert_eq!(registry.len(), 3);
    assert!(registry.get("style").expect("style").action.is_some());
    assert!(registry.get("transforms").expect("transforms").action.is_some());
    assert!(registry.get("default").expect("default").action.is_none());
}
