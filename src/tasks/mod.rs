// src/tasks/mod.rs

//! Named tasks and the explicit registry they live in.
//!
//! Tasks are registered into a [`TaskRegistry`] value that is passed to the
//! scheduler, instead of living in hidden process-wide state. This keeps the
//! task graph inspectable and lets tests assemble registries directly.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::model::ConfigFile;
use crate::errors::Result;
use crate::exec::CommandAction;
use crate::fs::FileSystem;
use crate::transform::{CommandConverter, TransformJob, TransformPipeline};

/// Canonical task name type used throughout the crate.
pub type TaskName = String;

/// Opaque asynchronous task body.
///
/// Implementations are free to spawn OS processes, perform file IO, or run
/// the built-in transformation pipeline. The scheduler only awaits the
/// returned future and inspects the outcome.
pub trait TaskAction: Send + Sync {
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// A named unit of orchestrated work.
#[derive(Clone)]
pub struct Task {
    pub name: TaskName,

    /// Prerequisites, all completed before this task starts.
    pub deps: Vec<TaskName>,

    /// If true, the task may run concurrently with adjacent parallel
    /// siblings in the plan.
    pub parallel: bool,

    /// Body of the task. `None` marks an alias task that only sequences its
    /// prerequisites.
    pub action: Option<Arc<dyn TaskAction>>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("deps", &self.deps)
            .field("parallel", &self.parallel)
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

impl Task {
    /// An alias task: no body, only prerequisites.
    pub fn alias(name: impl Into<TaskName>, deps: Vec<TaskName>) -> Self {
        Self {
            name: name.into(),
            deps,
            parallel: false,
            action: None,
        }
    }
}

/// Immutable mapping from task name to task definition.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskName, Task>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a task under its own name. A later registration under the same
    /// name replaces the earlier one.
    pub fn register(&mut self, task: Task) {
        self.tasks.insert(task.name.clone(), task);
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Build the registry from a validated config.
    ///
    /// - `cmd = "..."` tasks get a shell command body.
    /// - `transform = true` tasks get the transformation pipeline configured
    ///   by `[transform]` (validation guarantees the section exists).
    /// - Tasks with neither are aliases.
    pub fn from_config(cfg: &ConfigFile, fs: Arc<dyn FileSystem>) -> Self {
        let mut registry = Self::new();

        for (name, tc) in cfg.tasks().iter() {
            let action: Option<Arc<dyn TaskAction>> = if let Some(cmd) = &tc.cmd {
                Some(Arc::new(CommandAction::new(name.clone(), cmd.clone())))
            } else if tc.transform {
                cfg.transform_section().map(|section| {
                    let converter = Arc::new(CommandConverter::new(&section.converter_cmd));
                    let pipeline = TransformPipeline::new(
                        Arc::clone(&fs),
                        converter,
                        TransformJob::from_section(section),
                    );
                    Arc::new(pipeline) as Arc<dyn TaskAction>
                })
            } else {
                None
            };

            registry.register(Task {
                name: name.clone(),
                deps: tc.deps.clone(),
                parallel: tc.parallel,
                action,
            });
        }

        registry
    }
}
