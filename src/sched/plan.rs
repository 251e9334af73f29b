// src/sched/plan.rs

//! Plan construction: depth-first linearization of the prerequisite graph.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::errors::{BuildrigError, Result};
use crate::tasks::{TaskName, TaskRegistry};

/// One step of an execution plan.
///
/// Steps run strictly in order; within a `Concurrent` step all members are
/// started together and the step completes when the slowest member settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanStep {
    Sequential(TaskName),
    Concurrent(Vec<TaskName>),
}

impl PlanStep {
    pub fn task_names(&self) -> &[TaskName] {
        match self {
            PlanStep::Sequential(name) => std::slice::from_ref(name),
            PlanStep::Concurrent(names) => names,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Build the execution plan for `root`.
///
/// The traversal visits each distinct task at most once, places every
/// prerequisite strictly before its dependents, and fails on unknown names
/// and on cycles (naming the cycle members) before any task runs.
pub fn build_plan(registry: &TaskRegistry, root: &str) -> Result<Vec<PlanStep>> {
    let mut marks: HashMap<TaskName, Mark> = HashMap::new();
    let mut path: Vec<TaskName> = Vec::new();
    let mut order: Vec<TaskName> = Vec::new();
    let mut closures: HashMap<TaskName, HashSet<TaskName>> = HashMap::new();

    visit(registry, root, &mut marks, &mut path, &mut order, &mut closures)?;

    let plan = batch_steps(registry, order, &closures)?;
    debug!(root = %root, ?plan, "built execution plan");
    Ok(plan)
}

fn visit(
    registry: &TaskRegistry,
    name: &str,
    marks: &mut HashMap<TaskName, Mark>,
    path: &mut Vec<TaskName>,
    order: &mut Vec<TaskName>,
    closures: &mut HashMap<TaskName, HashSet<TaskName>>,
) -> Result<()> {
    match marks.get(name) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::InProgress) => {
            // The in-progress chain from the first occurrence of `name` back
            // to here is the cycle.
            let start = path.iter().position(|n| n == name).unwrap_or(0);
            let mut members: Vec<&str> = path[start..].iter().map(|s| s.as_str()).collect();
            members.push(name);
            return Err(BuildrigError::TaskCycle(members.join(" -> ")));
        }
        None => {}
    }

    let task = registry
        .get(name)
        .ok_or_else(|| BuildrigError::TaskNotFound(name.to_string()))?;

    marks.insert(name.to_string(), Mark::InProgress);
    path.push(name.to_string());

    let mut closure: HashSet<TaskName> = HashSet::new();
    for dep in task.deps.iter() {
        visit(registry, dep, marks, path, order, closures)?;
        closure.insert(dep.clone());
        if let Some(dep_closure) = closures.get(dep) {
            closure.extend(dep_closure.iter().cloned());
        }
    }

    path.pop();
    marks.insert(name.to_string(), Mark::Done);
    closures.insert(name.to_string(), closure);
    order.push(name.to_string());

    Ok(())
}

/// Partition the linearized order into plan steps.
///
/// Consecutive `parallel` tasks form one concurrent step, as long as no
/// member's transitive prerequisites are also in that step; postorder
/// guarantees prerequisites appear earlier in `order`, so this keeps the
/// deps-before-dependents invariant intact.
fn batch_steps(
    registry: &TaskRegistry,
    order: Vec<TaskName>,
    closures: &HashMap<TaskName, HashSet<TaskName>>,
) -> Result<Vec<PlanStep>> {
    let mut steps: Vec<PlanStep> = Vec::new();
    let mut group: Vec<TaskName> = Vec::new();

    for name in order {
        let task = registry
            .get(&name)
            .ok_or_else(|| BuildrigError::TaskNotFound(name.clone()))?;

        if task.parallel {
            let depends_on_group = closures
                .get(&name)
                .map(|closure| group.iter().any(|member| closure.contains(member)))
                .unwrap_or(false);

            if depends_on_group {
                flush_group(&mut steps, &mut group);
            }
            group.push(name);
        } else {
            flush_group(&mut steps, &mut group);
            steps.push(PlanStep::Sequential(name));
        }
    }

    flush_group(&mut steps, &mut group);
    Ok(steps)
}

fn flush_group(steps: &mut Vec<PlanStep>, group: &mut Vec<TaskName>) {
    match group.len() {
        0 => {}
        1 => steps.push(PlanStep::Sequential(group.remove(0))),
        _ => steps.push(PlanStep::Concurrent(std::mem::take(group))),
    }
}
