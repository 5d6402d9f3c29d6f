//! Cache Statistics Module
//!
//! Tracks hits, misses and removals broken down by reason.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::cache::RemovalReason;

// == Cache Stats ==
/// Point-in-time snapshot of cache counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of successful `get` calls
    pub hits: u64,
    /// Number of `get` calls that found nothing live
    pub misses: u64,
    /// Entries removed because their TTL elapsed
    pub expired: u64,
    /// Entries removed because a dependency changed
    pub dependency_changed: u64,
    /// Entries removed on request
    pub explicit: u64,
    /// Entries overwritten by a newer `put`
    pub replaced: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Total removals across all reasons.
    pub fn removals(&self) -> u64 {
        self.expired + self.dependency_changed + self.explicit + self.replaced
    }
}

// == Stats Recorder ==
/// Lock-free counters shared by concurrent cache operations.
#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
    dependency_changed: AtomicU64,
    explicit: AtomicU64,
    replaced: AtomicU64,
}

impl StatsRecorder {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_removal(&self, reason: RemovalReason) {
        let counter = match reason {
            RemovalReason::Expired => &self.expired,
            RemovalReason::DependencyChanged => &self.dependency_changed,
            RemovalReason::Explicit => &self.explicit,
            RemovalReason::Replaced => &self.replaced,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, total_entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            dependency_changed: self.dependency_changed.load(Ordering::Relaxed),
            explicit: self.explicit.load(Ordering::Relaxed),
            replaced: self.replaced.load(Ordering::Relaxed),
            total_entries,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = StatsRecorder::default().snapshot(0);
        assert_eq!(stats, CacheStats::default());
        assert_eq!(stats.removals(), 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let recorder = StatsRecorder::default();
        recorder.record_hit();
        recorder.record_miss();
        assert_eq!(recorder.snapshot(0).hit_rate(), 0.5);
    }

    #[test]
    fn test_removals_counted_per_reason() {
        let recorder = StatsRecorder::default();
        recorder.record_removal(RemovalReason::Expired);
        recorder.record_removal(RemovalReason::Expired);
        recorder.record_removal(RemovalReason::DependencyChanged);
        recorder.record_removal(RemovalReason::Explicit);
        recorder.record_removal(RemovalReason::Replaced);

        let stats = recorder.snapshot(3);
        assert_eq!(stats.expired, 2);
        assert_eq!(stats.dependency_changed, 1);
        assert_eq!(stats.explicit, 1);
        assert_eq!(stats.replaced, 1);
        assert_eq!(stats.removals(), 5);
        assert_eq!(stats.total_entries, 3);
    }
}
