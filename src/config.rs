//! Configuration Module
//!
//! Handles loading cache and benchmark configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default entry lifetime in seconds
pub const DEFAULT_TTL_SECONDS: u64 = 120;

/// Default number of iterations per benchmark trial
pub const DEFAULT_ITERATION_COUNT: u64 = 10_000;

/// Application configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Fixed lifetime applied to every entry at insertion
    pub ttl_seconds: u64,
    /// Benchmark loop length
    pub iteration_count: u64,
    /// Interval between expiration sweeps in milliseconds
    pub sweep_interval_ms: u64,
    /// Interval between dependency polls in milliseconds
    pub watch_interval_ms: u64,
    /// Path of the users file acting as source of truth
    pub users_file: PathBuf,
    /// User to look up; `None` picks the first user in the file
    pub lookup_user: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `TTL_SECONDS` - Entry lifetime in seconds (default: 120)
    /// - `ITERATION_COUNT` - Iterations per trial (default: 10000)
    /// - `SWEEP_INTERVAL_MS` - Expiration sweep frequency (default: 1000)
    /// - `WATCH_INTERVAL_MS` - Dependency poll frequency (default: 500)
    /// - `USERS_FILE` - Users file path (default: data/users.json)
    /// - `LOOKUP_USER` - User name to look up (default: first user)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl_seconds: parse_var("TTL_SECONDS").unwrap_or(defaults.ttl_seconds),
            iteration_count: parse_var("ITERATION_COUNT").unwrap_or(defaults.iteration_count),
            sweep_interval_ms: parse_var("SWEEP_INTERVAL_MS")
                .unwrap_or(defaults.sweep_interval_ms),
            watch_interval_ms: parse_var("WATCH_INTERVAL_MS")
                .unwrap_or(defaults.watch_interval_ms),
            users_file: env::var("USERS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.users_file),
            lookup_user: env::var("LOOKUP_USER").ok().filter(|v| !v.is_empty()),
        }
    }

    /// The slice of configuration the cache itself needs.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl: Duration::from_secs(self.ttl_seconds),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_TTL_SECONDS,
            iteration_count: DEFAULT_ITERATION_COUNT,
            sweep_interval_ms: 1000,
            watch_interval_ms: 500,
            users_file: PathBuf::from("data/users.json"),
            lookup_user: None,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

// == Cache Config ==
/// Per-cache settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Lifetime applied at `put`; never extended by reads
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_TTL_SECONDS),
        }
    }
}
