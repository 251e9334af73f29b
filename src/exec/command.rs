// src/exec/command.rs

//! Shell command task bodies.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{bail, Context};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::errors::Result;
use crate::tasks::{TaskAction, TaskName};

/// Task body that runs a shell command to completion.
///
/// stdout and stderr are streamed into the log at debug level; a non-zero
/// exit status fails the task with the exit code.
pub struct CommandAction {
    task: TaskName,
    cmd: String,
}

impl CommandAction {
    pub fn new(task: impl Into<TaskName>, cmd: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            cmd: cmd.into(),
        }
    }
}

impl TaskAction for CommandAction {
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            run_command(&self.task, &self.cmd).await?;
            Ok(())
        })
    }
}

/// Build a shell command appropriate for the platform.
pub(crate) fn shell_command(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

async fn run_command(task: &str, cmd: &str) -> anyhow::Result<()> {
    debug!(task = %task, cmd = %cmd, "starting task process");

    let mut command = shell_command(cmd);
    command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning process for task '{}'", task))?;

    // Consume both streams so buffers don't fill.
    if let Some(stdout) = child.stdout.take() {
        let task = task.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(task = %task, "stdout: {}", line);
            }
        });
    }

    if let Some(stderr) = child.stderr.take() {
        let task = task.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(task = %task, "stderr: {}", line);
            }
        });
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of task '{}'", task))?;

    if !status.success() {
        let code = status.code().unwrap_or(-1);
        bail!("process exited with status {}", code);
    }

    Ok(())
}
