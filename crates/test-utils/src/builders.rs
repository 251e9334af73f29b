#![allow(dead_code)]

use std::collections::BTreeMap;

use buildrig::config::{
    ConfigFile, RawConfigFile, SettingsSection, TaskConfig, TransformSection, WatchRuleConfig,
};
use buildrig::types::DispatchMode;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                settings: SettingsSection::default(),
                transform: None,
                task: BTreeMap::new(),
                watch: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_default_task(mut self, name: &str) -> Self {
        self.config.settings.default_task = name.to_string();
        self
    }

    pub fn with_transform(mut self, src_dir: &str, extension: &str, out: &str) -> Self {
        self.config.transform = Some(TransformSection {
            src_dir: src_dir.to_string(),
            extension: extension.to_string(),
            out: out.to_string(),
            converter_cmd: "true".to_string(),
        });
        self
    }

    pub fn with_watch_rule(
        mut self,
        name: &str,
        patterns: &[&str],
        task: &str,
        mode: DispatchMode,
    ) -> Self {
        self.config.watch.insert(
            name.to_string(),
            WatchRuleConfig {
                patterns: patterns.iter().map(|p| p.to_string()).collect(),
                task: task.to_string(),
                mode,
            },
        );
        self
    }

    /// Build the raw config without running validation.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    /// Task whose body is a shell command.
    pub fn cmd(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: Some(cmd.to_string()),
                ..TaskConfig::default()
            },
        }
    }

    /// Alias task: no body, only dependencies.
    pub fn alias() -> Self {
        Self {
            task: TaskConfig::default(),
        }
    }

    /// Task whose body is the transformation pipeline.
    pub fn transform() -> Self {
        Self {
            task: TaskConfig {
                transform: true,
                ..TaskConfig::default()
            },
        }
    }

    pub fn dep(mut self, dep: &str) -> Self {
        self.task.deps.push(dep.to_string());
        self
    }

    pub fn parallel(mut self, val: bool) -> Self {
        self.task.parallel = val;
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
