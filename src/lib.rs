// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod report;
pub mod sched;
pub mod tasks;
pub mod transform;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::errors::{BuildrigError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::sched::Scheduler;
use crate::tasks::TaskRegistry;
use crate::watch::{build_watch_rules, spawn_watcher, WatchCoalescer, WatchEvent};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - registry / scheduler
/// - (optional) file watcher + coalescing loop
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let registry = Arc::new(TaskRegistry::from_config(&cfg, fs));
    let scheduler = Scheduler::new(registry);

    let task = args
        .task
        .clone()
        .unwrap_or_else(|| cfg.settings().default_task.clone());

    if !args.watch {
        return scheduler.run(&task).await;
    }

    // Compile the rules up front so rule problems surface before any task runs.
    let rules = build_watch_rules(&cfg)?;
    if rules.is_empty() {
        return Err(BuildrigError::ConfigError(
            "--watch requires at least one [watch.<name>] rule".to_string(),
        ));
    }

    info!(task = %task, rules = rules.len(), "watch mode; running initial build");

    // Watch mode: run the requested task first, then serve change events.
    // A failing initial build is reported but doesn't stop the watcher, same
    // as watch-triggered rebuild failures.
    if let Err(err) = scheduler.run(&task).await {
        error!(task = %task, error = %err, "initial build failed; watching anyway");
    }

    let (event_tx, event_rx) = mpsc::channel::<WatchEvent>(64);

    let root_dir = config_root_dir(&config_path);
    let _watcher_handle = spawn_watcher(root_dir, event_tx.clone())?;

    // Ctrl-C -> graceful shutdown; in-flight runs drain before exit.
    {
        let tx = event_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(WatchEvent::ShutdownRequested).await;
        });
    }

    let coalescer = WatchCoalescer::new(rules, scheduler, event_tx, event_rx);
    coalescer.run().await
}

/// Figure out a sensible project root for watching.
///
/// - If the config path has a non-empty parent (e.g. "configs/Buildrig.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Buildrig.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Simple dry-run output: print tasks, deps, bodies and watch rules.
fn print_dry_run(cfg: &ConfigFile) {
    println!("buildrig dry-run");
    println!("  settings.default_task = {}", cfg.settings().default_task);
    println!();

    println!("tasks ({}):", cfg.tasks().len());
    for (name, task) in cfg.tasks().iter() {
        println!("  - {name}");
        if let Some(ref cmd) = task.cmd {
            println!("      cmd: {cmd}");
        }
        if task.transform {
            println!("      transform: true");
        }
        if !task.deps.is_empty() {
            println!("      deps: {:?}", task.deps);
        }
        if task.parallel {
            println!("      parallel: true");
        }
    }

    if let Some(section) = cfg.transform_section() {
        println!();
        println!("transform:");
        println!("      src_dir: {}", section.src_dir);
        println!("      extension: {}", section.extension);
        println!("      out: {}", section.out);
        println!("      converter_cmd: {}", section.converter_cmd);
    }

    if !cfg.watch_rules().is_empty() {
        println!();
        println!("watch rules ({}):", cfg.watch_rules().len());
        for (name, rule) in cfg.watch_rules().iter() {
            println!("  - {name}");
            println!("      patterns: {:?}", rule.patterns);
            println!("      task: {}", rule.task);
            println!("      mode: {:?}", rule.mode);
        }
    }

    debug!("dry-run complete (no execution)");
}
