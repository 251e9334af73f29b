// src/watch/mod.rs

//! File-watch triggering: compiled rules, the coalescing event loop, and the
//! notify bridge.

pub mod coalescer;
pub mod rules;
pub mod watcher;

pub use coalescer::{RunOutcome, WatchCoalescer, WatchEvent};
pub use rules::{build_watch_rules, WatchRule};
pub use watcher::{spawn_watcher, WatcherHandle};
