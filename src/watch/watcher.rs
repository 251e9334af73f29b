// src/watch/watcher.rs

use std::path::PathBuf;

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::watch::coalescer::WatchEvent;

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive
/// for as long as needed. Dropping this handle stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher that observes `root` recursively and forwards
/// every changed path, relativized against `root`, into the watch loop.
///
/// Rule matching happens in the loop, not here; this is only the bridge from
/// notify's blocking callback into the async world.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    watch_tx: mpsc::Sender<WatchEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    // Canonicalize once so we have a stable base path to relativize against.
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        {
            let event_tx = event_tx.clone();
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if let Err(err) = event_tx.send(event) {
                        // We can't log via tracing here easily, so fallback to stderr.
                        eprintln!("buildrig: failed to forward notify event: {err}");
                    }
                }
                Err(err) => {
                    eprintln!("buildrig: file watch error: {err}");
                }
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!("file watcher started on {:?}", root);

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "received notify event");

            for path in event.paths {
                let rel = match path.strip_prefix(&root) {
                    Ok(rel) => rel.to_path_buf(),
                    Err(_) => {
                        warn!(?path, ?root, "could not relativize changed path; ignoring");
                        continue;
                    }
                };

                if watch_tx.send(WatchEvent::PathChanged(rel)).await.is_err() {
                    // Watch loop is gone; no point keeping the bridge alive.
                    debug!("watch loop channel closed; stopping notify bridge");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}
