// src/config/validate.rs

use globset::Glob;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{BuildrigError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = BuildrigError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(
            raw.settings,
            raw.transform,
            raw.task,
            raw.watch,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_task_bodies(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_dag(cfg)?;
    validate_watch_rules(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(BuildrigError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_task_bodies(cfg: &RawConfigFile) -> Result<()> {
    let mut any_transform = false;

    for (name, task) in cfg.task.iter() {
        if task.cmd.is_some() && task.transform {
            return Err(BuildrigError::ConfigError(format!(
                "task '{}' declares both `cmd` and `transform = true`; pick one body",
                name
            )));
        }
        any_transform |= task.transform;
    }

    if any_transform && cfg.transform.is_none() {
        return Err(BuildrigError::ConfigError(
            "a task declares `transform = true` but there is no [transform] section".to_string(),
        ));
    }

    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.deps.iter() {
            if !cfg.task.contains_key(dep) {
                return Err(BuildrigError::ConfigError(format!(
                    "task '{}' has unknown dependency '{}' in `deps`",
                    name, dep
                )));
            }
            if dep == name {
                return Err(BuildrigError::ConfigError(format!(
                    "task '{}' cannot depend on itself in `deps`",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dep -> task. For:
    //   [task.bundle]
    //   deps = ["lint"]
    // we add edge lint -> bundle.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.deps.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    // A topological sort will fail if there is a cycle.
    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(BuildrigError::TaskCycle(format!(
                "cycle detected in task graph involving task '{}'",
                node
            )))
        }
    }
}

fn validate_watch_rules(cfg: &RawConfigFile) -> Result<()> {
    for (rule_name, rule) in cfg.watch.iter() {
        if rule.patterns.is_empty() {
            return Err(BuildrigError::ConfigError(format!(
                "watch rule '{}' has no patterns",
                rule_name
            )));
        }

        for pattern in rule.patterns.iter() {
            if let Err(err) = Glob::new(pattern) {
                return Err(BuildrigError::ConfigError(format!(
                    "watch rule '{}' has invalid glob pattern '{}': {}",
                    rule_name, pattern, err
                )));
            }
        }

        if !cfg.task.contains_key(&rule.task) {
            return Err(BuildrigError::ConfigError(format!(
                "watch rule '{}' triggers unknown task '{}'",
                rule_name, rule.task
            )));
        }
    }
    Ok(())
}
