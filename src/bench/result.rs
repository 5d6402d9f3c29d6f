//! Benchmark results.

use std::fmt;

use serde::Serialize;

use super::harness::{CACHED_LABEL, UNCACHED_LABEL};

/// Outcome of one trial. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkResult {
    /// Which path was measured, e.g. "cached" or "uncached"
    pub label: String,
    pub iterations: u64,
    /// Mean inner-window duration in ticks
    pub average_ticks: f64,
    /// Mean inner-window duration in nanoseconds
    pub average_nanoseconds: f64,
    /// Outer-window duration of the whole trial in ticks
    pub total_ticks: u64,
}

impl fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label.as_str() {
            CACHED_LABEL => write!(f, "Average time with cache: ")?,
            UNCACHED_LABEL => write!(f, "Average time without cache: ")?,
            label => write!(f, "Average time ({}): ", label)?,
        }
        write!(
            f,
            "{:.2} ticks = {:.2} nanoseconds",
            self.average_ticks, self.average_nanoseconds
        )
    }
}

/// Cached and uncached results measured with the same iteration count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub cached: BenchmarkResult,
    pub uncached: BenchmarkResult,
}

impl Comparison {
    /// How many times faster the cached path was. `None` when the cached
    /// average rounds to zero.
    pub fn speedup(&self) -> Option<f64> {
        (self.cached.average_nanoseconds > 0.0)
            .then(|| self.uncached.average_nanoseconds / self.cached.average_nanoseconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(label: &str, average_nanoseconds: f64) -> BenchmarkResult {
        BenchmarkResult {
            label: label.to_string(),
            iterations: 10,
            average_ticks: average_nanoseconds,
            average_nanoseconds,
            total_ticks: 0,
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(
            result(CACHED_LABEL, 12.5).to_string(),
            "Average time with cache: 12.50 ticks = 12.50 nanoseconds"
        );
        assert_eq!(
            result(UNCACHED_LABEL, 3000.0).to_string(),
            "Average time without cache: 3000.00 ticks = 3000.00 nanoseconds"
        );
        assert_eq!(
            result("warm", 1.0).to_string(),
            "Average time (warm): 1.00 ticks = 1.00 nanoseconds"
        );
    }

    #[test]
    fn test_speedup() {
        let comparison = Comparison {
            cached: result("cached", 50.0),
            uncached: result("uncached", 5_000.0),
        };
        assert_eq!(comparison.speedup(), Some(100.0));

        let instant = Comparison {
            cached: result("cached", 0.0),
            uncached: result("uncached", 5_000.0),
        };
        assert_eq!(instant.speedup(), None);
    }

    #[test]
    fn test_serializes_fields() {
        let json = serde_json::to_value(result("uncached", 3.0)).unwrap();
        assert_eq!(json["label"], "uncached");
        assert_eq!(json["iterations"], 10);
        assert_eq!(json["average_nanoseconds"], 3.0);
    }
}
