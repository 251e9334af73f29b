// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `buildrig`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "buildrig",
    version,
    about = "Build/test orchestrator: dependency-ordered tasks, watch-triggered rebuilds.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run. Defaults to the configured default task.
    #[arg(value_name = "TASK")]
    pub task: Option<String>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Buildrig.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Buildrig.toml")]
    pub config: String,

    /// After running the task, keep watching and re-run tasks on matching
    /// file changes until interrupted.
    #[arg(long)]
    pub watch: bool,

    /// Parse + validate, print tasks and watch rules, but don't execute
    /// anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUILDRIG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
