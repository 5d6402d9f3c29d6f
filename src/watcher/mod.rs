//! Dependency Watcher Module
//!
//! Detects changes to external resources that cache entries depend on.
//!
//! # Implementations
//! - [`FileWatcher`]: polls file modification metadata
//! - [`ManualWatcher`]: changes are pushed by the owner via `trigger`

mod file;
mod manual;

use std::sync::Arc;

pub use file::FileWatcher;
pub use manual::ManualWatcher;

/// Identifier of an external resource (a file path for [`FileWatcher`]).
pub type ResourceId = String;

/// Handle for one registration, returned by `watch` and passed to `unwatch`.
pub type WatchId = u64;

/// Invoked with the registration id and the resource that changed.
pub type ChangeCallback = Arc<dyn Fn(WatchId, &str) + Send + Sync>;

// == Dependency Watcher Trait ==
/// A resource change detector.
///
/// Registrations fire at least once per actual change and are dropped after
/// firing. Detection failures are handled inside the watcher and reported as
/// "no change". Callbacks must be invoked without holding the watcher's
/// internal locks.
pub trait DependencyWatcher: Send + Sync {
    /// Registers interest in `resources`. Must not perform blocking I/O.
    ///
    /// Must never invoke `on_change` itself, even for a resource already
    /// known to be stale: the cache calls `watch` while holding the key's
    /// shard lock and the callback takes that same lock. Report such changes
    /// from the next detection cycle instead.
    fn watch(&self, resources: &[ResourceId], on_change: ChangeCallback) -> WatchId;

    /// Drops a registration. Unknown ids are ignored.
    fn unwatch(&self, id: WatchId);

    /// Number of live registrations.
    fn registrations(&self) -> usize;
}
