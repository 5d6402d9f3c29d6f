//! Watch Polling Task
//!
//! Drives [`FileWatcher::poll`] off the caller's path. Each poll runs on the
//! blocking pool because it touches the filesystem.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::watcher::FileWatcher;

/// Spawns a background task polling `watcher` every `interval`.
pub fn spawn_watch_task(watcher: Arc<FileWatcher>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting dependency watch task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let poller = watcher.clone();
            match tokio::task::spawn_blocking(move || poller.poll()).await {
                Ok(0) => debug!("Dependency poll: no changes"),
                Ok(fired) => info!("Dependency poll: {} registrations fired", fired),
                // A panicking poll must not stop future polls
                Err(err) => warn!("Dependency poll failed: {}", err),
            }
        }
    })
}
