//! Cache Entry Module
//!
//! Defines individual cache entries together with their priority and the
//! reasons an entry can leave the cache.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::watcher::{ResourceId, WatchId};

// == Priority ==
/// Eviction policy flag for an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    /// Eligible for time-based and dependency eviction
    #[default]
    Default,
    /// Exempt from time-based eviction; still removed on dependency change
    /// or explicit request
    NonRemovable,
}

// == Removal Reason ==
/// Why an entry left the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemovalReason {
    Expired,
    DependencyChanged,
    Explicit,
    Replaced,
}

impl RemovalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemovalReason::Expired => "expired",
            RemovalReason::DependencyChanged => "dependency-changed",
            RemovalReason::Explicit => "explicit",
            RemovalReason::Replaced => "replaced",
        }
    }
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Cache Entry ==
/// A single cache entry with value and lifecycle metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Eviction policy
    pub priority: Priority,
    /// Resources whose change invalidates this entry
    pub dependencies: Vec<ResourceId>,
    /// Insertion time
    pub created_at: DateTime<Utc>,
    /// Absolute expiration time, fixed at insertion
    pub expires_at: DateTime<Utc>,
    /// Watcher registration backing `dependencies`
    pub(crate) watch_id: Option<WatchId>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry expiring `ttl` after `now`.
    pub fn new(
        value: V,
        priority: Priority,
        dependencies: Vec<ResourceId>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            value,
            priority,
            dependencies,
            created_at: now,
            expires_at,
            watch_id: None,
        }
    }

    pub(crate) fn with_watch(mut self, watch_id: Option<WatchId>) -> Self {
        self.watch_id = watch_id;
        self
    }

    // == Is Expired ==
    /// Checks whether the TTL has elapsed at `now`.
    ///
    /// Boundary condition: an entry is expired once `now >= expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Expired and not exempt from time-based eviction.
    pub fn is_evictable(&self, now: DateTime<Utc>) -> bool {
        self.priority == Priority::Default && self.is_expired(now)
    }

    // == Time To Live ==
    /// Remaining lifetime at `now`; zero once expired.
    pub fn ttl_remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }
}
