use std::str::FromStr;

use serde::Deserialize;

/// Dispatch discipline for a watch rule when its task is triggered again
/// while a run is already in flight.
///
/// - `Serialize`: the in-flight run absorbs later triggers; exactly one
///   follow-up run starts after it finishes (default behaviour).
/// - `Overlap`: every trigger starts an independent run, concurrent with any
///   still-running execution of the same task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    Serialize,
    Overlap,
}

impl Default for DispatchMode {
    fn default() -> Self {
        DispatchMode::Serialize
    }
}

impl FromStr for DispatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "serialize" => Ok(DispatchMode::Serialize),
            "overlap" => Ok(DispatchMode::Overlap),
            other => Err(format!(
                "invalid watch mode: {other} (expected \"serialize\" or \"overlap\")"
            )),
        }
    }
}
