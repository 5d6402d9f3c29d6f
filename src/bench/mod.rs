//! Benchmark Module
//!
//! Measures the latency of reads served from the cache against reads
//! recomputed from the source of truth.

mod harness;
mod result;
mod timer;

pub use harness::{BenchmarkHarness, CACHED_LABEL, UNCACHED_LABEL};
pub use result::{BenchmarkResult, Comparison};
pub use timer::{TimingSample, Timer, Window, DEFAULT_FREQUENCY, NANOS_PER_SECOND};
