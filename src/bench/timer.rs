//! Timer Module
//!
//! Two independent stopwatch windows: `Outer` spans a whole trial and
//! `Inner` spans one iteration. Inner samples are summed into an
//! accumulator from which the per-iteration average is derived.

use std::time::{Duration, Instant};

use crate::bench::BenchmarkResult;
use crate::clock::{Clock, SystemClock};
use crate::error::BenchmarkError;

pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Ticks per second. `Instant` resolves nanoseconds, so one tick is one
/// nanosecond by default.
pub const DEFAULT_FREQUENCY: u64 = NANOS_PER_SECOND;

// == Window ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// The whole trial
    Outer,
    /// A single iteration
    Inner,
}

// == Timing Sample ==
/// One recorded measurement. Consumed immediately by the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingSample {
    pub iteration_index: u64,
    pub elapsed_ticks: u64,
    pub is_aggregate_window: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct Stopwatch {
    started: Option<Instant>,
    elapsed: Duration,
}

impl Stopwatch {
    /// Starting always begins a fresh measurement.
    fn start(&mut self, now: Instant) {
        self.started = Some(now);
        self.elapsed = Duration::ZERO;
    }

    fn stop(&mut self, now: Instant) {
        if let Some(started) = self.started.take() {
            self.elapsed = now.saturating_duration_since(started);
        }
    }

    fn elapsed(&self, now: Instant) -> Duration {
        match self.started {
            Some(started) => now.saturating_duration_since(started),
            None => self.elapsed,
        }
    }
}

// == Timer ==
/// Stopwatch pair with an accumulator for per-iteration durations.
///
/// One timer serves one trial at a time.
#[derive(Debug)]
pub struct Timer<C: Clock = SystemClock> {
    clock: C,
    frequency: u64,
    outer: Stopwatch,
    inner: Stopwatch,
    accumulated_ticks: u64,
    outer_ticks: u64,
}

impl Timer<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for Timer<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Timer<C> {
    pub fn with_clock(clock: C) -> Self {
        Self::with_frequency(clock, DEFAULT_FREQUENCY)
    }

    /// Creates a timer counting `frequency` ticks per second (at least 1).
    pub fn with_frequency(clock: C, frequency: u64) -> Self {
        Self {
            clock,
            frequency: frequency.max(1),
            outer: Stopwatch::default(),
            inner: Stopwatch::default(),
            accumulated_ticks: 0,
            outer_ticks: 0,
        }
    }

    pub fn frequency(&self) -> u64 {
        self.frequency
    }

    pub fn nanoseconds_per_tick(&self) -> f64 {
        NANOS_PER_SECOND as f64 / self.frequency as f64
    }

    // == Start / Stop ==
    /// Starts `window`, discarding whatever it measured before.
    pub fn start(&mut self, window: Window) {
        let now = self.clock.instant();
        self.stopwatch(window).start(now);
    }

    pub fn stop(&mut self, window: Window) {
        let now = self.clock.instant();
        self.stopwatch(window).stop(now);
    }

    /// Ticks measured by `window` so far (live if still running).
    pub fn elapsed_ticks(&self, window: Window) -> u64 {
        let now = self.clock.instant();
        let stopwatch = match window {
            Window::Outer => &self.outer,
            Window::Inner => &self.inner,
        };
        self.to_ticks(stopwatch.elapsed(now))
    }

    // == Record Elapsed ==
    /// Records the window's elapsed time for iteration `iteration`.
    ///
    /// Iteration 0 is a warm-up and is never recorded. Inner samples add to
    /// the accumulator; an outer sample replaces the trial total.
    pub fn record_elapsed(&mut self, iteration: u64, window: Window) -> Option<TimingSample> {
        if iteration == 0 {
            return None;
        }

        let elapsed_ticks = self.elapsed_ticks(window);
        match window {
            Window::Inner => self.accumulated_ticks += elapsed_ticks,
            Window::Outer => self.outer_ticks = elapsed_ticks,
        }
        Some(TimingSample {
            iteration_index: iteration,
            elapsed_ticks,
            is_aggregate_window: window == Window::Outer,
        })
    }

    /// Zeroes the accumulated totals. Call once per measurement campaign.
    pub fn reset_accumulator(&mut self) {
        self.accumulated_ticks = 0;
        self.outer_ticks = 0;
    }

    pub fn accumulated_ticks(&self) -> u64 {
        self.accumulated_ticks
    }

    pub fn outer_ticks(&self) -> u64 {
        self.outer_ticks
    }

    // == Average ==
    /// Averages the accumulated inner ticks over `iterations`.
    pub fn average(&self, iterations: u64, label: &str) -> Result<BenchmarkResult, BenchmarkError> {
        if iterations == 0 {
            return Err(BenchmarkError::InvalidConfiguration(
                "iteration count must be at least 1".to_string(),
            ));
        }

        let total = self.accumulated_ticks as f64;
        Ok(BenchmarkResult {
            label: label.to_string(),
            iterations,
            average_ticks: total / iterations as f64,
            average_nanoseconds: total * self.nanoseconds_per_tick() / iterations as f64,
            total_ticks: self.outer_ticks,
        })
    }

    fn stopwatch(&mut self, window: Window) -> &mut Stopwatch {
        match window {
            Window::Outer => &mut self.outer,
            Window::Inner => &mut self.inner,
        }
    }

    fn to_ticks(&self, elapsed: Duration) -> u64 {
        let ticks = elapsed.as_nanos() * u128::from(self.frequency) / u128::from(NANOS_PER_SECOND);
        u64::try_from(ticks).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;

    fn timed(timer: &mut Timer<MockClock>, clock: &MockClock, window: Window, by: Duration) {
        timer.start(window);
        clock.advance(by);
        timer.stop(window);
    }

    #[test]
    fn test_elapsed_ticks_in_nanoseconds() {
        let clock = MockClock::new();
        let mut timer = Timer::with_clock(clock.clone());

        timed(&mut timer, &clock, Window::Inner, Duration::from_micros(3));
        assert_eq!(timer.elapsed_ticks(Window::Inner), 3_000);
        assert_eq!(timer.elapsed_ticks(Window::Outer), 0);
    }

    #[test]
    fn test_first_iteration_is_discarded() {
        let clock = MockClock::new();
        let mut timer = Timer::with_clock(clock.clone());

        timed(&mut timer, &clock, Window::Inner, Duration::from_micros(500));
        assert_eq!(timer.record_elapsed(0, Window::Inner), None);
        assert_eq!(timer.accumulated_ticks(), 0);

        timed(&mut timer, &clock, Window::Inner, Duration::from_nanos(40));
        let sample = timer.record_elapsed(1, Window::Inner).unwrap();
        assert_eq!(
            sample,
            TimingSample {
                iteration_index: 1,
                elapsed_ticks: 40,
                is_aggregate_window: false
            }
        );
        assert_eq!(timer.accumulated_ticks(), 40);
    }

    #[test]
    fn test_restart_resets_window() {
        let clock = MockClock::new();
        let mut timer = Timer::with_clock(clock.clone());

        timed(&mut timer, &clock, Window::Inner, Duration::from_nanos(100));
        timer.start(Window::Inner);
        clock.advance(Duration::from_nanos(7));
        assert_eq!(timer.elapsed_ticks(Window::Inner), 7);
        timer.stop(Window::Inner);

        clock.advance(Duration::from_nanos(1_000));
        assert_eq!(timer.elapsed_ticks(Window::Inner), 7, "stopped window must not grow");
    }

    #[test]
    fn test_outer_sample_replaces_total() {
        let clock = MockClock::new();
        let mut timer = Timer::with_clock(clock.clone());

        timed(&mut timer, &clock, Window::Outer, Duration::from_nanos(900));
        let sample = timer.record_elapsed(1, Window::Outer).unwrap();
        assert!(sample.is_aggregate_window);
        assert_eq!(timer.outer_ticks(), 900);
        assert_eq!(timer.accumulated_ticks(), 0);
    }

    #[test]
    fn test_reset_accumulator() {
        let clock = MockClock::new();
        let mut timer = Timer::with_clock(clock.clone());
        timed(&mut timer, &clock, Window::Inner, Duration::from_nanos(10));
        timer.record_elapsed(3, Window::Inner);
        assert_eq!(timer.accumulated_ticks(), 10);

        timer.reset_accumulator();
        assert_eq!(timer.accumulated_ticks(), 0);
        assert_eq!(timer.outer_ticks(), 0);
    }

    #[test]
    fn test_average() {
        let clock = MockClock::new();
        let mut timer = Timer::with_clock(clock.clone());
        for i in 1..=4 {
            timed(&mut timer, &clock, Window::Inner, Duration::from_nanos(25));
            timer.record_elapsed(i, Window::Inner);
        }

        let result = timer.average(5, "cached").unwrap();
        assert_eq!(result.label, "cached");
        assert_eq!(result.iterations, 5);
        assert_eq!(result.average_ticks, 20.0);
        assert_eq!(result.average_nanoseconds, 20.0);
    }

    #[test]
    fn test_average_with_coarse_ticks() {
        let clock = MockClock::new();
        // 100 ns ticks
        let mut timer = Timer::with_frequency(clock.clone(), 10_000_000);
        assert_eq!(timer.nanoseconds_per_tick(), 100.0);

        timed(&mut timer, &clock, Window::Inner, Duration::from_micros(1));
        timer.record_elapsed(1, Window::Inner);

        let result = timer.average(2, "uncached").unwrap();
        assert_eq!(result.average_ticks, 5.0);
        assert_eq!(result.average_nanoseconds, 500.0);
    }

    #[test]
    fn test_average_rejects_zero_iterations() {
        let timer = Timer::new();
        assert!(matches!(
            timer.average(0, "cached"),
            Err(BenchmarkError::InvalidConfiguration(_))
        ));
    }
}
