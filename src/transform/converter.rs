// src/transform/converter.rs

//! External document converter collaborator.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::exec::command::shell_command;

/// Converter output for one document: the rendered representation and the
/// structured data model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedDocument {
    pub rendered: String,
    pub model: String,
}

/// Opaque converter interface.
///
/// The pipeline awaits one call at a time; implementations may reject by
/// returning an error. No timeout is imposed here, so a hung converter hangs
/// the calling pipeline.
pub trait Converter: Send + Sync {
    fn convert(&self, content: &str) -> Pin<Box<dyn Future<Output = Result<ConvertedDocument>> + Send + '_>>;
}

/// Production converter: pipes the document to a shell command's stdin and
/// parses its stdout as a JSON [`ConvertedDocument`].
#[derive(Debug, Clone)]
pub struct CommandConverter {
    cmd: String,
}

impl CommandConverter {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self { cmd: cmd.into() }
    }
}

impl Converter for CommandConverter {
    fn convert(&self, content: &str) -> Pin<Box<dyn Future<Output = Result<ConvertedDocument>> + Send + '_>> {
        let content = content.to_string();

        Box::pin(async move {
            let mut command = shell_command(&self.cmd);
            command
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            let mut child = command
                .spawn()
                .with_context(|| format!("spawning converter '{}'", self.cmd))?;

            {
                let mut stdin = child
                    .stdin
                    .take()
                    .context("converter child has no stdin handle")?;
                stdin
                    .write_all(content.as_bytes())
                    .await
                    .context("writing document to converter stdin")?;
                // Dropping the handle closes the pipe so the converter sees EOF.
            }

            let output = child
                .wait_with_output()
                .await
                .context("waiting for converter process")?;

            if !output.status.success() {
                let code = output.status.code().unwrap_or(-1);
                let stderr = String::from_utf8_lossy(&output.stderr);
                bail!(
                    "converter exited with status {}: {}",
                    code,
                    stderr.trim_end()
                );
            }

            let converted: ConvertedDocument = serde_json::from_slice(&output.stdout)
                .context("parsing converter stdout as JSON")?;

            Ok(converted)
        })
    }
}
