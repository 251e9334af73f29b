// src/watch/rules.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::model::ConfigFile;
use crate::tasks::TaskName;
use crate::types::DispatchMode;

/// Compiled watch rule: glob patterns plus the task they re-trigger and the
/// dispatch discipline for overlapping triggers.
///
/// Patterns are evaluated against paths relative to the project root, e.g.
/// `"src/sass/forms.scss"`.
#[derive(Clone)]
pub struct WatchRule {
    name: String,
    task: TaskName,
    mode: DispatchMode,
    glob_set: GlobSet,
}

impl fmt::Debug for WatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRule")
            .field("name", &self.name)
            .field("task", &self.task)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl WatchRule {
    /// Name of the rule (the `[watch.<name>]` key).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Task triggered when a changed path matches.
    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Returns true if this rule is interested in the given path (relative
    /// to the project root).
    pub fn matches(&self, rel_path: &str) -> bool {
        self.glob_set.is_match(rel_path)
    }
}

/// Compile every `[watch.<name>]` rule from a validated config.
pub fn build_watch_rules(cfg: &ConfigFile) -> Result<Vec<WatchRule>> {
    let mut rules = Vec::with_capacity(cfg.watch_rules().len());

    for (name, rc) in cfg.watch_rules().iter() {
        let glob_set = build_globset(&rc.patterns)
            .with_context(|| format!("building globset for watch rule {}", name))?;

        rules.push(WatchRule {
            name: name.clone(),
            task: rc.task.clone(),
            mode: rc.mode,
            glob_set,
        });
    }

    Ok(rules)
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
