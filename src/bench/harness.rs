//! Benchmark Harness
//!
//! Runs the same timed loop over a cache lookup and over a recompute from the
//! source of truth, so the two averages are directly comparable.

use std::fmt::Display;
use std::hint::black_box;

use tracing::info;

use crate::bench::{BenchmarkResult, Comparison, Timer, Window};
use crate::cache::Cache;
use crate::clock::{Clock, SystemClock};
use crate::error::BenchmarkError;

pub const CACHED_LABEL: &str = "cached";
pub const UNCACHED_LABEL: &str = "uncached";

// == Benchmark Harness ==
/// Owns the timer used by its trials; trials run one at a time.
#[derive(Debug)]
pub struct BenchmarkHarness<C: Clock = SystemClock> {
    timer: Timer<C>,
}

impl BenchmarkHarness<SystemClock> {
    pub fn new() -> Self {
        Self::with_timer(Timer::new())
    }
}

impl Default for BenchmarkHarness<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> BenchmarkHarness<C> {
    pub fn with_timer(timer: Timer<C>) -> Self {
        Self { timer }
    }

    pub fn timer(&self) -> &Timer<C> {
        &self.timer
    }

    // == Cached Trial ==
    /// Times `iterations` lookups of `key`. A miss aborts the trial.
    pub fn run_cached_trial<V, CC>(
        &mut self,
        cache: &Cache<V, CC>,
        key: &str,
        iterations: u64,
    ) -> Result<BenchmarkResult, BenchmarkError>
    where
        V: Clone + Send + Sync + 'static,
        CC: Clock,
    {
        self.run_trial(CACHED_LABEL, iterations, || {
            cache
                .get(key)
                .map(|value| {
                    black_box(value);
                })
                .ok_or_else(|| format!("cache miss for key '{}'", key))
        })
    }

    // == Uncached Trial ==
    /// Times `iterations` full recomputes via `fetch`. A failed fetch aborts
    /// the trial.
    pub fn run_uncached_trial<T, E, F>(
        &mut self,
        mut fetch: F,
        iterations: u64,
    ) -> Result<BenchmarkResult, BenchmarkError>
    where
        F: FnMut() -> Result<T, E>,
        E: Display,
    {
        self.run_trial(UNCACHED_LABEL, iterations, || {
            fetch()
                .map(|value| {
                    black_box(value);
                })
                .map_err(|err| err.to_string())
        })
    }

    // == Compare ==
    /// Runs the cached trial then the uncached trial with the same count.
    pub fn compare<V, CC, T, E, F>(
        &mut self,
        cache: &Cache<V, CC>,
        key: &str,
        fetch: F,
        iterations: u64,
    ) -> Result<Comparison, BenchmarkError>
    where
        V: Clone + Send + Sync + 'static,
        CC: Clock,
        F: FnMut() -> Result<T, E>,
        E: Display,
    {
        let cached = self.run_cached_trial(cache, key, iterations)?;
        let uncached = self.run_uncached_trial(fetch, iterations)?;
        Ok(Comparison { cached, uncached })
    }

    /// Shared loop so both paths pay identical measurement overhead.
    fn run_trial<W>(
        &mut self,
        label: &str,
        iterations: u64,
        mut work: W,
    ) -> Result<BenchmarkResult, BenchmarkError>
    where
        W: FnMut() -> Result<(), String>,
    {
        if iterations == 0 {
            return Err(BenchmarkError::InvalidConfiguration(format!(
                "trial '{}' needs at least one iteration",
                label
            )));
        }

        info!(label, iterations, "Starting benchmark trial");
        self.timer.reset_accumulator();
        self.timer.start(Window::Outer);

        for iteration in 0..iterations {
            self.timer.start(Window::Inner);
            let outcome = work();
            self.timer.stop(Window::Inner);

            if let Err(reason) = outcome {
                self.timer.stop(Window::Outer);
                return Err(BenchmarkError::TrialAborted {
                    label: label.to_string(),
                    iteration,
                    reason,
                });
            }
            self.timer.record_elapsed(iteration, Window::Inner);
        }

        self.timer.stop(Window::Outer);
        // The outer window is one aggregate sample, never a warm-up
        self.timer.record_elapsed(1, Window::Outer);

        let result = self.timer.average(iterations, label)?;
        info!(
            label,
            average_ticks = result.average_ticks,
            average_nanoseconds = result.average_nanoseconds,
            "Benchmark trial finished"
        );
        Ok(result)
    }
}
