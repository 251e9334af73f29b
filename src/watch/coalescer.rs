// src/watch/coalescer.rs

//! The watch event loop: matches changed paths against rules and re-invokes
//! the scheduler, coalescing bursts per the rule's dispatch mode.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::sched::Scheduler;
use crate::types::DispatchMode;
use crate::watch::rules::WatchRule;

/// Events flowing into the watch loop.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// A watched path changed (relative to the project root).
    PathChanged(PathBuf),
    /// A previously started run settled.
    RunFinished { rule: usize, outcome: RunOutcome },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    Failed,
}

/// Per-rule dispatch state. Only `serialize` rules consult it.
#[derive(Debug, Default, Clone, Copy)]
struct RuleState {
    running: bool,
    pending: bool,
}

/// Cooperative event loop over watch events.
///
/// The loop owns all mutable dispatch state; spawned runs report back through
/// the same channel, so the pending flag is re-checked on the loop's next
/// resumption rather than from another thread of control.
pub struct WatchCoalescer {
    rules: Vec<WatchRule>,
    states: Vec<RuleState>,
    scheduler: Scheduler,
    event_tx: mpsc::Sender<WatchEvent>,
    event_rx: mpsc::Receiver<WatchEvent>,
    runs: JoinSet<()>,
}

impl WatchCoalescer {
    pub fn new(
        rules: Vec<WatchRule>,
        scheduler: Scheduler,
        event_tx: mpsc::Sender<WatchEvent>,
        event_rx: mpsc::Receiver<WatchEvent>,
    ) -> Self {
        let states = vec![RuleState::default(); rules.len()];
        Self {
            rules,
            states,
            scheduler,
            event_tx,
            event_rx,
            runs: JoinSet::new(),
        }
    }

    /// Serve events until shutdown, then drain in-flight runs.
    ///
    /// Rebuild failures are reported by the spawned runs and never terminate
    /// the loop; the watcher keeps serving subsequent change events.
    pub async fn run(mut self) -> Result<()> {
        info!(rules = self.rules.len(), "watch loop started");

        while let Some(event) = self.event_rx.recv().await {
            debug!(?event, "watch event");

            match event {
                WatchEvent::PathChanged(path) => self.handle_path_changed(&path),
                WatchEvent::RunFinished { rule, outcome } => {
                    self.handle_run_finished(rule, outcome)
                }
                WatchEvent::ShutdownRequested => break,
            }
        }

        info!("watch loop stopping; draining in-flight runs");
        loop {
            tokio::select! {
                joined = self.runs.join_next() => {
                    if joined.is_none() {
                        break;
                    }
                }
                // Keep the channel flowing so late run notifications never
                // block a draining run; the events themselves are discarded.
                _ = self.event_rx.recv() => {}
            }
        }

        Ok(())
    }

    fn handle_path_changed(&mut self, path: &Path) {
        let rel = path.to_string_lossy().replace('\\', "/");

        let matching: Vec<usize> = self
            .rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.matches(&rel))
            .map(|(idx, _)| idx)
            .collect();

        if matching.is_empty() {
            return;
        }

        for idx in matching {
            self.dispatch(idx, &rel);
        }
    }

    fn dispatch(&mut self, idx: usize, rel: &str) {
        match self.rules[idx].mode() {
            DispatchMode::Overlap => {
                debug!(
                    rule = %self.rules[idx].name(),
                    path = %rel,
                    "overlap rule; starting independent run"
                );
                self.start_run(idx);
            }
            DispatchMode::Serialize => {
                if self.states[idx].running {
                    // Coalesce: the in-flight run absorbs this trigger.
                    self.states[idx].pending = true;
                    debug!(
                        rule = %self.rules[idx].name(),
                        path = %rel,
                        "run in flight; trigger recorded as pending"
                    );
                } else {
                    self.states[idx].running = true;
                    self.start_run(idx);
                }
            }
        }
    }

    fn handle_run_finished(&mut self, idx: usize, outcome: RunOutcome) {
        if idx >= self.rules.len() {
            warn!(rule = idx, "run finished for unknown rule index; ignoring");
            return;
        }

        if outcome == RunOutcome::Failed {
            warn!(
                rule = %self.rules[idx].name(),
                task = %self.rules[idx].task(),
                "watch-triggered run failed; continuing to watch"
            );
        }

        if self.rules[idx].mode() == DispatchMode::Serialize {
            self.states[idx].running = false;
            // Re-check the pending flag now that the run settled: triggers
            // that arrived during the run collapse into one follow-up.
            if self.states[idx].pending {
                self.states[idx].pending = false;
                self.states[idx].running = true;
                self.start_run(idx);
            }
        }
    }

    fn start_run(&mut self, idx: usize) {
        let rule_name = self.rules[idx].name().to_string();
        let task = self.rules[idx].task().to_string();
        let scheduler = self.scheduler.clone();
        let tx = self.event_tx.clone();

        info!(rule = %rule_name, task = %task, "watch trigger; running task");

        self.runs.spawn(async move {
            let outcome = match scheduler.run(&task).await {
                Ok(()) => RunOutcome::Success,
                Err(err) => {
                    warn!(task = %task, error = %err, "watch-triggered run failed");
                    RunOutcome::Failed
                }
            };

            // The loop may already be shut down; nothing left to notify then.
            let _ = tx.send(WatchEvent::RunFinished { rule: idx, outcome }).await;
        });
    }
}
