//! Clock Module
//!
//! Supplies "now" to the cache (expiration checks) and to the benchmark timer
//! (interval measurement). Swap in [`MockClock`] for deterministic tests.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

// == Clock Trait ==
/// Source of wall-clock and monotonic time.
pub trait Clock: Send + Sync + 'static {
    /// Current wall-clock time, used for entry timestamps.
    fn now(&self) -> DateTime<Utc>;

    /// Current monotonic instant, used for interval measurement.
    fn instant(&self) -> Instant;
}

// == System Clock ==
/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }
}

// == Mock Clock ==
/// Manually advanced clock. Clones share the same offset.
#[derive(Debug, Clone)]
pub struct MockClock {
    wall_origin: DateTime<Utc>,
    instant_origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Creates a clock frozen at the current system time.
    pub fn new() -> Self {
        Self {
            wall_origin: Utc::now(),
            instant_origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Moves both wall and monotonic time forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }

    fn offset(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        let offset =
            chrono::Duration::from_std(self.offset()).unwrap_or_else(|_| chrono::Duration::zero());
        self.wall_origin + offset
    }

    fn instant(&self) -> Instant {
        self.instant_origin + self.offset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock_is_frozen() {
        let clock = MockClock::new();
        let a = clock.instant();
        let b = clock.instant();
        assert_eq!(a, b);
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_mock_clock_advance_moves_both_times() {
        let clock = MockClock::new();
        let wall = clock.now();
        let mono = clock.instant();

        clock.advance(Duration::from_secs(5));

        assert_eq!(clock.now() - wall, chrono::Duration::seconds(5));
        assert_eq!(clock.instant() - mono, Duration::from_secs(5));
    }

    #[test]
    fn test_mock_clock_clones_share_offset() {
        let clock = MockClock::new();
        let other = clock.clone();
        other.advance(Duration::from_millis(250));
        assert_eq!(clock.instant(), other.instant());
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock;
        let a = clock.instant();
        let b = clock.instant();
        assert!(b >= a);
    }
}
