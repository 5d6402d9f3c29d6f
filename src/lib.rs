//! Memcache Bench - an in-process cache and a cached-vs-uncached read benchmark
//!
//! Provides a key/value cache with fixed TTL expiration, priority-based
//! exemption, dependency invalidation and asynchronous removal notifications,
//! plus a timing harness comparing cache hits against recomputing from the
//! source of truth.

pub mod bench;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod source;
pub mod tasks;
pub mod watcher;

pub use bench::{BenchmarkHarness, BenchmarkResult};
pub use cache::{Cache, Priority, RemovalReason};
pub use config::{CacheConfig, Config};
pub use tasks::{spawn_sweep_task, spawn_watch_task};
