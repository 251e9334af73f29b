#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use tokio::sync::Semaphore;

use buildrig::errors::{BuildrigError, Result};
use buildrig::tasks::TaskAction;
use buildrig::transform::{ConvertedDocument, Converter};

/// Shared invocation log used by the fake actions below.
pub type InvocationLog = Arc<Mutex<Vec<String>>>;

pub fn invocation_log() -> InvocationLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn log_entries(log: &InvocationLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// A task body that records its invocation and immediately succeeds (or
/// fails, when built with [`RecordingAction::failing`]).
pub struct RecordingAction {
    name: String,
    log: InvocationLog,
    fail: bool,
}

impl RecordingAction {
    pub fn new(name: &str, log: InvocationLog) -> Self {
        Self {
            name: name.to_string(),
            log,
            fail: false,
        }
    }

    pub fn failing(name: &str, log: InvocationLog) -> Self {
        Self {
            name: name.to_string(),
            log,
            fail: true,
        }
    }
}

impl TaskAction for RecordingAction {
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.log.lock().unwrap().push(self.name.clone());
            if self.fail {
                Err(BuildrigError::Other(anyhow!("recorded action failed")))
            } else {
                Ok(())
            }
        })
    }
}

/// A task body that records its start and then blocks until the test hands
/// it a permit, so tests control exactly when a run settles.
pub struct GatedAction {
    name: String,
    log: InvocationLog,
    gate: Arc<Semaphore>,
}

impl GatedAction {
    pub fn new(name: &str, log: InvocationLog, gate: Arc<Semaphore>) -> Self {
        Self {
            name: name.to_string(),
            log,
            gate,
        }
    }
}

impl TaskAction for GatedAction {
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.log.lock().unwrap().push(self.name.clone());
            let permit = self
                .gate
                .acquire()
                .await
                .expect("gate semaphore closed during test");
            permit.forget();
            Ok(())
        })
    }
}

/// Scripted converter: records every call's content in order, returns
/// configured outputs, and rejects configured contents.
pub struct FakeConverter {
    calls: InvocationLog,
    outputs: HashMap<String, ConvertedDocument>,
    fail_on: HashSet<String>,
}

impl FakeConverter {
    pub fn new(calls: InvocationLog) -> Self {
        Self {
            calls,
            outputs: HashMap::new(),
            fail_on: HashSet::new(),
        }
    }

    /// Configure the output for a given document content.
    pub fn with_output(mut self, content: &str, rendered: &str, model: &str) -> Self {
        self.outputs.insert(
            content.to_string(),
            ConvertedDocument {
                rendered: rendered.to_string(),
                model: model.to_string(),
            },
        );
        self
    }

    /// Reject any call whose content equals `content`.
    pub fn fail_on(mut self, content: &str) -> Self {
        self.fail_on.insert(content.to_string());
        self
    }
}

impl Converter for FakeConverter {
    fn convert(
        &self,
        content: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ConvertedDocument>> + Send + '_>> {
        let content = content.to_string();
        Box::pin(async move {
            self.calls.lock().unwrap().push(content.clone());

            if self.fail_on.contains(&content) {
                return Err(anyhow!("converter rejected document"));
            }

            Ok(self.outputs.get(&content).cloned().unwrap_or_else(|| {
                ConvertedDocument {
                    rendered: format!("rendered:{content}"),
                    model: format!("model:{content}"),
                }
            }))
        })
    }
}
