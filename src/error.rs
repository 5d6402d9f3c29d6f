//! Error types for the cache and benchmark harness
//!
//! Provides unified error handling using thiserror.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Errors surfaced to callers of cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key is empty
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// The source of truth failed while resolving a value and its dependencies
    #[error("Failed to resolve '{key}' from source: {source}")]
    DependencyResolution {
        key: String,
        #[source]
        source: SourceError,
    },
}

// == Source Error Enum ==
/// Errors produced by a [`Source`](crate::source::Source) fetch.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Backing resource could not be read
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Backing resource could not be decoded
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The identifier is unknown to the source
    #[error("Not found: {0}")]
    NotFound(String),
}

// == Watcher Error Enum ==
/// Failures of the change-detection mechanism.
///
/// These never reach cache callers; watchers log them and report "no change".
#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("Cannot read metadata for {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// == Benchmark Error Enum ==
/// Errors raised by the benchmark harness.
#[derive(Error, Debug)]
pub enum BenchmarkError {
    /// Rejected before any timer window starts
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A unit of work failed mid-trial
    #[error("Trial '{label}' aborted at iteration {iteration}: {reason}")]
    TrialAborted {
        label: String,
        iteration: u64,
        reason: String,
    },
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
