//! Expiration Sweep Task
//!
//! Background task that periodically removes expired cache entries.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::Cache;
use crate::clock::Clock;

/// Spawns a background task that periodically sweeps expired entries.
///
/// The task runs in an infinite loop, sleeping for `interval` between
/// sweeps. Each sweep only holds a shard lock for the key being removed, so
/// callers are never blocked for longer than a single removal.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let cache = Cache::new(CacheConfig::default(), Arc::new(FileWatcher::new()));
/// let sweep_handle = spawn_sweep_task(cache.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task<V, C>(cache: Cache<V, C>, interval: Duration) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
    C: Clock,
{
    tokio::spawn(async move {
        info!("Starting expiration sweep task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.sweep_expired();

            if removed > 0 {
                info!("Expiration sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiration sweep: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Priority;
    use crate::clock::MockClock;
    use crate::config::CacheConfig;
    use crate::watcher::ManualWatcher;
    use std::sync::Arc;

    fn cache_with_clock() -> (Cache<String, MockClock>, MockClock) {
        let clock = MockClock::new();
        let cache = Cache::with_clock(
            CacheConfig {
                ttl: Duration::from_secs(10),
            },
            Arc::new(ManualWatcher::new()),
            clock.clone(),
        );
        (cache, clock)
    }

    #[tokio::test]
    async fn test_sweep_task_removes_expired_entries() {
        let (cache, clock) = cache_with_clock();
        cache
            .put("expire_soon", "value".to_string(), Priority::Default, Vec::new())
            .unwrap();
        clock.advance(Duration::from_secs(11));

        let handle = spawn_sweep_task(cache.clone(), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Sweep removed it without any read touching the entry
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().expired, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_preserves_valid_entries() {
        let (cache, _clock) = cache_with_clock();
        cache
            .put("long_lived", "value".to_string(), Priority::Default, Vec::new())
            .unwrap();

        let handle = spawn_sweep_task(cache.clone(), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(cache.get("long_lived"), Some("value".to_string()));

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_can_be_aborted() {
        let (cache, _clock) = cache_with_clock();

        let handle = spawn_sweep_task(cache, Duration::from_secs(1));

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
