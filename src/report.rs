// src/report.rs

//! Per-task start/elapsed/outcome reporting.
//!
//! Lines go through `tracing`, so they share the stderr stream and level
//! filtering with the rest of the crate's logs.

use std::time::Instant;

use tracing::{error, info};

use crate::errors::BuildrigError;

/// Measures one task execution from start to settlement.
#[derive(Debug)]
pub struct TaskTimer {
    name: String,
    started: Instant,
}

impl TaskTimer {
    pub fn start(name: &str) -> Self {
        info!(task = %name, "task started");
        Self {
            name: name.to_string(),
            started: Instant::now(),
        }
    }

    pub fn success(self) {
        info!(
            task = %self.name,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "task finished"
        );
    }

    pub fn failure(self, err: &BuildrigError) {
        error!(
            task = %self.name,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            error = %err,
            "task failed"
        );
    }
}
