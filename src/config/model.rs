// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::DispatchMode;

/// Top-level configuration as read from a TOML file, before semantic
/// validation.
///
/// ```toml
/// [settings]
/// default_task = "default"
///
/// [transform]
/// src_dir = "test/forms"
/// out = "test/mock/forms.json"
/// converter_cmd = "node transformer/app.js"
///
/// [task.style]
/// cmd = "sass src/sass build/css"
///
/// [task.default]
/// deps = ["style", "bundle"]
///
/// [watch.sass]
/// patterns = ["src/sass/**/*.scss"]
/// task = "style"
/// mode = "serialize"
/// ```
///
/// All sections except `[task.*]` are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global behaviour from `[settings]`.
    #[serde(default)]
    pub settings: SettingsSection,

    /// Transformation pipeline config from `[transform]`.
    ///
    /// Required as soon as any task declares `transform = true`.
    #[serde(default)]
    pub transform: Option<TransformSection>,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// All watch rules from `[watch.<name>]`, keyed by rule name.
    #[serde(default)]
    pub watch: BTreeMap<String, WatchRuleConfig>,
}

/// `[settings]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsSection {
    /// Task to run when the CLI is invoked without a task name.
    #[serde(default = "default_task_name")]
    pub default_task: String,
}

fn default_task_name() -> String {
    "default".to_string()
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            default_task: default_task_name(),
        }
    }
}

/// `[transform]` section: where the transformation pipeline finds its input
/// documents and where the aggregate artifact goes.
#[derive(Debug, Clone, Deserialize)]
pub struct TransformSection {
    /// Directory scanned (one level deep) for input documents.
    pub src_dir: String,

    /// File extension of input documents, without the dot.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Path of the aggregate output artifact.
    pub out: String,

    /// Shell command invoked once per document. The document content is
    /// piped to stdin; stdout must be a JSON object with `rendered` and
    /// `model` string fields.
    pub converter_cmd: String,
}

fn default_extension() -> String {
    "xml".to_string()
}

/// `[task.<name>]` section.
///
/// A task body is either a shell command (`cmd`), the built-in
/// transformation pipeline (`transform = true`), or nothing at all, in
/// which case the task is an alias that only sequences its `deps`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskConfig {
    /// Shell command to execute.
    #[serde(default)]
    pub cmd: Option<String>,

    /// If true, the task body is the transformation pipeline configured by
    /// `[transform]`.
    #[serde(default)]
    pub transform: bool,

    /// Prerequisite tasks, all completed before this task starts.
    #[serde(default)]
    pub deps: Vec<String>,

    /// If true, this task may run concurrently with adjacent parallel
    /// siblings in the plan instead of blocking them.
    #[serde(default)]
    pub parallel: bool,
}

/// `[watch.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchRuleConfig {
    /// Glob patterns, relative to the project root.
    pub patterns: Vec<String>,

    /// Task to trigger when a changed path matches.
    pub task: String,

    /// Dispatch discipline for triggers arriving while a run is in flight.
    #[serde(default)]
    pub mode: DispatchMode,
}

/// Validated configuration.
///
/// Constructed only through `TryFrom<RawConfigFile>` (see `validate`), so
/// holders can rely on: every dependency reference resolves, the task graph
/// is acyclic, watch rules name known tasks and carry compilable globs, and
/// `[transform]` is present whenever a task needs it.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    settings: SettingsSection,
    transform: Option<TransformSection>,
    task: BTreeMap<String, TaskConfig>,
    watch: BTreeMap<String, WatchRuleConfig>,
}

impl ConfigFile {
    /// Construct without re-validating. Only `validate` should call this.
    pub(crate) fn new_unchecked(
        settings: SettingsSection,
        transform: Option<TransformSection>,
        task: BTreeMap<String, TaskConfig>,
        watch: BTreeMap<String, WatchRuleConfig>,
    ) -> Self {
        Self {
            settings,
            transform,
            task,
            watch,
        }
    }

    pub fn settings(&self) -> &SettingsSection {
        &self.settings
    }

    pub fn transform_section(&self) -> Option<&TransformSection> {
        self.transform.as_ref()
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }

    pub fn watch_rules(&self) -> &BTreeMap<String, WatchRuleConfig> {
        &self.watch
    }
}
