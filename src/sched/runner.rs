// src/sched/runner.rs

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::errors::{BuildrigError, Result};
use crate::report::TaskTimer;
use crate::sched::plan::{build_plan, PlanStep};
use crate::tasks::{TaskAction, TaskName, TaskRegistry};

/// Runs a requested task and all of its transitive prerequisites.
///
/// The scheduler owns no per-run state: each `run` call plans from scratch
/// against the immutable registry, so clones can serve watch-triggered runs
/// concurrently.
#[derive(Debug, Clone)]
pub struct Scheduler {
    registry: Arc<TaskRegistry>,
}

impl Scheduler {
    pub fn new(registry: Arc<TaskRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Run `task` to completion.
    ///
    /// Planning errors (unknown task, cycle) surface before any action is
    /// invoked. A step failure halts all remaining un-started steps;
    /// completed side effects are not rolled back.
    pub async fn run(&self, task: &str) -> Result<()> {
        let plan = build_plan(&self.registry, task)?;

        for step in plan {
            match step {
                PlanStep::Sequential(name) => self.run_one(&name).await?,
                PlanStep::Concurrent(names) => self.run_group(names).await?,
            }
        }

        Ok(())
    }

    async fn run_one(&self, name: &str) -> Result<()> {
        let task = self
            .registry
            .get(name)
            .ok_or_else(|| BuildrigError::TaskNotFound(name.to_string()))?;

        let Some(action) = &task.action else {
            debug!(task = %name, "alias task; prerequisites already ran");
            return Ok(());
        };

        run_action(name, action.as_ref()).await
    }

    /// Start all group members together; settle them all before deciding the
    /// outcome, so one member's failure never cancels a started sibling.
    async fn run_group(&self, names: Vec<TaskName>) -> Result<()> {
        let mut running: JoinSet<(TaskName, Result<()>)> = JoinSet::new();

        for name in names {
            let action = match self.registry.get(&name) {
                Some(task) => task.action.clone(),
                None => return Err(BuildrigError::TaskNotFound(name)),
            };

            running.spawn(async move {
                let outcome = match &action {
                    Some(action) => run_action(&name, action.as_ref()).await,
                    None => {
                        debug!(task = %name, "alias task; prerequisites already ran");
                        Ok(())
                    }
                };
                (name, outcome)
            });
        }

        let mut first_failure: Option<BuildrigError> = None;
        while let Some(joined) = running.join_next().await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((name, Err(err))) => {
                    warn!(task = %name, error = %err, "concurrent group member failed");
                    if first_failure.is_none() {
                        first_failure = Some(err);
                    }
                }
                Err(join_err) => {
                    error!(error = %join_err, "concurrent group member panicked");
                    if first_failure.is_none() {
                        first_failure = Some(BuildrigError::Other(join_err.into()));
                    }
                }
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Await a task body with start/elapsed/outcome reporting, wrapping generic
/// failures with the task's identity. Transform aborts already carry their
/// document context and pass through untouched.
async fn run_action(name: &str, action: &dyn TaskAction) -> Result<()> {
    let timer = TaskTimer::start(name);

    match action.run().await {
        Ok(()) => {
            timer.success();
            Ok(())
        }
        Err(err) => {
            timer.failure(&err);
            match err {
                abort @ BuildrigError::TransformAbort { .. } => Err(abort),
                failed @ BuildrigError::TaskFailed { .. } => Err(failed),
                other => Err(BuildrigError::TaskFailed {
                    task: name.to_string(),
                    source: other.into(),
                }),
            }
        }
    }
}
