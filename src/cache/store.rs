//! Cache Store Module
//!
//! Main cache engine: a sharded entry table with fixed TTL expiration,
//! priority-based exemption, dependency invalidation and asynchronous
//! removal notifications.
//!
//! Expired entries are evicted lazily by `contains`/`get` when they happen
//! to be read, and by [`Cache::sweep_expired`] for everything else. Both
//! paths use [`CacheEntry::is_evictable`].

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::cache::notify::{Notifier, RemovalEvent};
use crate::cache::stats::StatsRecorder;
use crate::cache::{CacheEntry, CacheStats, Priority, RemovalReason};
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::source::Source;
use crate::tasks::start_dispatch;
use crate::watcher::{ChangeCallback, DependencyWatcher, ResourceId, WatchId};

struct Inner<V, C> {
    entries: DashMap<String, CacheEntry<V>>,
    config: CacheConfig,
    clock: C,
    watcher: Arc<dyn DependencyWatcher>,
    notifier: Notifier<V>,
    stats: StatsRecorder,
}

// == Cache ==
/// Concurrent key/value cache.
///
/// Cloning is cheap and yields a handle to the same cache. Operations on the
/// same key are serialized by the key's shard lock; other keys proceed in
/// parallel.
pub struct Cache<V, C = SystemClock> {
    inner: Arc<Inner<V, C>>,
}

impl<V, C> Clone for Cache<V, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<V> Cache<V, SystemClock>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache using the system clock.
    ///
    /// Removal notifications are delivered by a task on the current Tokio
    /// runtime, or by a dedicated thread when there is no runtime.
    pub fn new(config: CacheConfig, watcher: Arc<dyn DependencyWatcher>) -> Self {
        Self::with_clock(config, watcher, SystemClock)
    }
}

impl<V, C> Cache<V, C>
where
    V: Clone + Send + Sync + 'static,
    C: Clock,
{
    /// Creates a cache with a custom clock (useful for testing).
    pub fn with_clock(
        config: CacheConfig,
        watcher: Arc<dyn DependencyWatcher>,
        clock: C,
    ) -> Self {
        let (notifier, receiver) = Notifier::new();
        start_dispatch(receiver, notifier.listener_slot());

        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                config,
                clock,
                watcher,
                notifier,
                stats: StatsRecorder::default(),
            }),
        }
    }

    // == Contains ==
    /// Returns true iff a live entry exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.read_live(key, |_| ()).is_some()
    }

    // == Get ==
    /// Returns the value if present and unexpired. Does not extend the TTL.
    pub fn get(&self, key: &str) -> Option<V> {
        let value = self.read_live(key, |entry| entry.value.clone());
        if value.is_some() {
            self.inner.stats.record_hit();
        } else {
            self.inner.stats.record_miss();
        }
        value
    }

    // == Put ==
    /// Inserts or replaces the entry for `key`, expiring one TTL from now.
    ///
    /// A replaced entry is reported with [`RemovalReason::Replaced`] (or
    /// [`RemovalReason::Expired`] if it had already lapsed) before the new
    /// entry becomes visible to other callers.
    pub fn put(
        &self,
        key: impl Into<String>,
        value: V,
        priority: Priority,
        dependencies: Vec<ResourceId>,
    ) -> Result<()> {
        let key = key.into();
        validate_key(&key)?;

        let now = self.inner.clock.now();
        let retired_watch = {
            let slot = self.inner.entries.entry(key.clone());
            // Registered under the shard lock so a change signal cannot
            // race ahead of the entry it belongs to
            let watch_id = (!dependencies.is_empty()).then(|| {
                self.inner
                    .watcher
                    .watch(&dependencies, self.change_handler(&key))
            });
            let entry = CacheEntry::new(value, priority, dependencies, now, self.inner.config.ttl)
                .with_watch(watch_id);

            match slot {
                Entry::Occupied(mut occupied) => {
                    let reason = if occupied.get().is_evictable(now) {
                        RemovalReason::Expired
                    } else {
                        RemovalReason::Replaced
                    };
                    let previous = occupied.insert(entry);
                    self.inner.notifier.notify(&key, reason, previous.value);
                    self.inner.stats.record_removal(reason);
                    previous.watch_id
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(entry);
                    None
                }
            }
        };

        if let Some(id) = retired_watch {
            self.inner.watcher.unwatch(id);
        }
        Ok(())
    }

    // == Load ==
    /// Fetches `identifier` from `source` and stores the value with the
    /// fetched dependencies. On fetch failure nothing is stored and any
    /// existing entry for `key` is left untouched.
    pub fn load<S>(
        &self,
        key: impl Into<String>,
        source: &S,
        identifier: &str,
        priority: Priority,
    ) -> Result<()>
    where
        S: Source<Value = V> + ?Sized,
    {
        let key = key.into();
        validate_key(&key)?;

        let fetched = source
            .fetch(identifier)
            .map_err(|source| CacheError::DependencyResolution {
                key: key.clone(),
                source,
            })?;
        self.put(key, fetched.value, priority, fetched.dependencies)
    }

    // == Remove ==
    /// Removes the entry for `key`. Returns false (and notifies nobody) if
    /// there was nothing to remove.
    pub fn remove(&self, key: &str) -> bool {
        let now = self.inner.clock.now();
        self.evict(key, |entry| {
            Some(if entry.is_evictable(now) {
                RemovalReason::Expired
            } else {
                RemovalReason::Explicit
            })
        })
        .is_some()
    }

    // == Removal Listener ==
    /// Registers the process-wide removal listener, replacing any previous
    /// one. It runs on the dispatch task, never inline with the operation
    /// that caused the removal.
    pub fn set_removal_listener<F>(&self, listener: F)
    where
        F: Fn(RemovalEvent<V>) + Send + Sync + 'static,
    {
        self.inner.notifier.set_listener(Arc::new(listener));
    }

    // == Sweep Expired ==
    /// Removes every expired Default-priority entry.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.inner.clock.now();
        let candidates: Vec<String> = self
            .inner
            .entries
            .iter()
            .filter(|item| item.value().is_evictable(now))
            .map(|item| item.key().clone())
            .collect();

        candidates
            .iter()
            .filter(|key| {
                self.evict(key, |entry| {
                    entry
                        .is_evictable(now)
                        .then_some(RemovalReason::Expired)
                })
                .is_some()
            })
            .count()
    }

    // == Time To Live ==
    /// Remaining lifetime of a live entry.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let now = self.inner.clock.now();
        self.read_live(key, |entry| entry.ttl_remaining(now))
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.inner.stats.snapshot(self.len())
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Runs `read` on the live entry, lazily evicting it if it has expired.
    fn read_live<R>(&self, key: &str, read: impl FnOnce(&CacheEntry<V>) -> R) -> Option<R> {
        let now = self.inner.clock.now();
        match self.inner.entries.get(key) {
            None => return None,
            Some(entry) if !entry.is_evictable(now) => return Some(read(entry.value())),
            Some(_) => {}
        }

        self.evict(key, |entry| {
            entry
                .is_evictable(now)
                .then_some(RemovalReason::Expired)
        });
        None
    }

    /// Removes the entry for `key` if `decide` returns a reason.
    ///
    /// The notification is enqueued before the shard lock is released.
    fn evict(
        &self,
        key: &str,
        decide: impl FnOnce(&CacheEntry<V>) -> Option<RemovalReason>,
    ) -> Option<RemovalReason> {
        let removed = {
            let Entry::Occupied(occupied) = self.inner.entries.entry(key.to_owned()) else {
                return None;
            };
            let reason = decide(occupied.get())?;
            self.inner
                .notifier
                .notify(key, reason, occupied.get().value.clone());
            (reason, occupied.remove())
        };

        let (reason, entry) = removed;
        self.inner.stats.record_removal(reason);
        if let Some(id) = entry.watch_id {
            self.inner.watcher.unwatch(id);
        }
        debug!(key, %reason, "Cache entry removed");
        Some(reason)
    }

    /// Builds the watcher callback for an entry stored under `key`.
    ///
    /// Only the entry carrying the firing registration is evicted, so a late
    /// signal for a replaced entry leaves its successor alone.
    fn change_handler(&self, key: &str) -> ChangeCallback {
        let inner = Arc::downgrade(&self.inner);
        let key = key.to_owned();
        Arc::new(move |watch_id: WatchId, resource: &str| {
            let Some(inner) = inner.upgrade() else {
                return;
            };
            let cache = Cache { inner };
            let evicted = cache.evict(&key, |entry| {
                (entry.watch_id == Some(watch_id)).then_some(RemovalReason::DependencyChanged)
            });
            if evicted.is_some() {
                debug!(key = %key, resource, "Dependency changed; entry invalidated");
            }
        })
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey("key must not be empty".to_string()));
    }
    Ok(())
}
