//! File Watcher
//!
//! Polls file metadata (modification time and length) to detect changes.
//! Polling is driven by [`spawn_watch_task`](crate::tasks::spawn_watch_task);
//! `watch` only records the registration and never touches the filesystem.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use tracing::{debug, warn};

use super::{ChangeCallback, DependencyWatcher, ResourceId, WatchId};
use crate::error::WatcherError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    modified: SystemTime,
    len: u64,
}

/// What the last successful poll saw for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Baseline {
    /// Not polled yet
    Pending,
    /// `None` means the file did not exist
    Known(Option<Fingerprint>),
}

struct Registration {
    files: Vec<(PathBuf, Baseline)>,
    registered_at: SystemTime,
    on_change: ChangeCallback,
}

enum Verdict {
    Changed(String),
    Unchanged(Vec<Baseline>),
}

// == File Watcher ==
/// Dependency watcher over files on the local filesystem.
#[derive(Default)]
pub struct FileWatcher {
    next_id: AtomicU64,
    registrations: Mutex<HashMap<WatchId, Registration>>,
}

impl FileWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    // == Poll ==
    /// Checks every registered file once and fires callbacks for changes.
    ///
    /// Filesystem access happens without holding the registration lock.
    /// Returns the number of registrations fired.
    pub fn poll(&self) -> usize {
        let snapshot: Vec<(WatchId, SystemTime, Vec<(PathBuf, Baseline)>)> = self
            .lock()
            .iter()
            .map(|(id, reg)| (*id, reg.registered_at, reg.files.clone()))
            .collect();

        let verdicts: Vec<(WatchId, Verdict)> = snapshot
            .into_iter()
            .map(|(id, registered_at, files)| (id, assess(registered_at, &files)))
            .collect();

        let mut fired = Vec::new();
        {
            let mut registrations = self.lock();
            for (id, verdict) in verdicts {
                match verdict {
                    Verdict::Changed(resource) => {
                        if let Some(reg) = registrations.remove(&id) {
                            fired.push((id, resource, reg.on_change));
                        }
                    }
                    Verdict::Unchanged(baselines) => {
                        if let Some(reg) = registrations.get_mut(&id) {
                            for ((_, slot), baseline) in reg.files.iter_mut().zip(baselines) {
                                *slot = baseline;
                            }
                        }
                    }
                }
            }
        }

        for (id, resource, on_change) in &fired {
            debug!(watch_id = id, resource = %resource, "Watched file changed");
            on_change(*id, resource.as_str());
        }
        fired.len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<WatchId, Registration>> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl DependencyWatcher for FileWatcher {
    fn watch(&self, resources: &[ResourceId], on_change: ChangeCallback) -> WatchId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let registration = Registration {
            files: resources
                .iter()
                .map(|r| (PathBuf::from(r), Baseline::Pending))
                .collect(),
            registered_at: SystemTime::now(),
            on_change,
        };
        self.lock().insert(id, registration);
        id
    }

    fn unwatch(&self, id: WatchId) {
        self.lock().remove(&id);
    }

    fn registrations(&self) -> usize {
        self.lock().len()
    }
}

/// Compares the current state of each file against its baseline.
fn assess(registered_at: SystemTime, files: &[(PathBuf, Baseline)]) -> Verdict {
    let mut baselines = Vec::with_capacity(files.len());
    for (path, baseline) in files {
        let observed = match observe(path) {
            Ok(observed) => observed,
            Err(err) => {
                warn!("{}; treating as unchanged", err);
                baselines.push(*baseline);
                continue;
            }
        };

        let changed = match baseline {
            // Modified between registration and the first poll
            Baseline::Pending => observed.is_some_and(|fp| fp.modified > registered_at),
            Baseline::Known(previous) => *previous != observed,
        };
        if changed {
            return Verdict::Changed(path.display().to_string());
        }
        baselines.push(Baseline::Known(observed));
    }
    Verdict::Unchanged(baselines)
}

/// Reads a file's fingerprint. A missing file is `Ok(None)`, not an error.
fn observe(path: &Path) -> Result<Option<Fingerprint>, WatcherError> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(WatcherError::Metadata {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let modified = metadata.modified().map_err(|source| WatcherError::Metadata {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(Fingerprint {
        modified,
        len: metadata.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn counter() -> (ChangeCallback, Arc<AtomicU64>) {
        let count = Arc::new(AtomicU64::new(0));
        let sink = count.clone();
        let callback: ChangeCallback = Arc::new(move |_: WatchId, _: &str| {
            sink.fetch_add(1, Ordering::SeqCst);
        });
        (callback, count)
    }

    fn path_string(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_unchanged_file_does_not_fire() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("users.json");
        fs::write(&file, "[]").unwrap();

        let watcher = FileWatcher::new();
        let (callback, count) = counter();
        watcher.watch(&[path_string(&file)], callback);

        assert_eq!(watcher.poll(), 0);
        assert_eq!(watcher.poll(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(watcher.registrations(), 1);
    }

    #[test]
    fn test_modified_file_fires_once() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("users.json");
        fs::write(&file, "[]").unwrap();

        let watcher = FileWatcher::new();
        let (callback, count) = counter();
        watcher.watch(&[path_string(&file)], callback);
        assert_eq!(watcher.poll(), 0);

        // Different length guarantees a new fingerprint regardless of mtime granularity
        fs::write(&file, r#"[{"user_code":"42","user_name":"alice"}]"#).unwrap();

        assert_eq!(watcher.poll(), 1);
        assert_eq!(watcher.poll(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(watcher.registrations(), 0);
    }

    #[test]
    fn test_missing_file_is_not_a_change_until_created() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("later.json");

        let watcher = FileWatcher::new();
        let (callback, count) = counter();
        watcher.watch(&[path_string(&file)], callback);

        assert_eq!(watcher.poll(), 0);
        assert_eq!(watcher.poll(), 0);

        fs::write(&file, "created").unwrap();
        assert_eq!(watcher.poll(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_deleted_file_fires() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("gone.json");
        fs::write(&file, "x").unwrap();

        let watcher = FileWatcher::new();
        let (callback, count) = counter();
        watcher.watch(&[path_string(&file)], callback);
        assert_eq!(watcher.poll(), 0);

        fs::remove_file(&file).unwrap();
        assert_eq!(watcher.poll(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unreadable_metadata_is_treated_as_unchanged() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, "x").unwrap();
        // A path through a regular file fails with something other than NotFound
        let broken = file.join("child");

        let watcher = FileWatcher::new();
        let (callback, count) = counter();
        watcher.watch(&[path_string(&broken)], callback);

        assert_eq!(watcher.poll(), 0);
        assert_eq!(watcher.poll(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(watcher.registrations(), 1);
    }

    #[test]
    fn test_watch_never_fires_callbacks() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("users.json");

        let watcher = FileWatcher::new();
        let (callback, count) = counter();
        watcher.watch(&[path_string(&file)], callback.clone());
        assert_eq!(watcher.poll(), 0);
        fs::write(&file, "[]").unwrap();

        // The first registration is stale now, yet watch only records
        watcher.watch(&[path_string(&file)], callback);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        assert!(watcher.poll() >= 1);
        assert!(count.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_unwatch_removes_registration() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("users.json");
        fs::write(&file, "[]").unwrap();

        let watcher = FileWatcher::new();
        let (callback, count) = counter();
        let id = watcher.watch(&[path_string(&file)], callback);
        assert_eq!(watcher.poll(), 0);

        watcher.unwatch(id);
        fs::write(&file, "[ ]").unwrap();

        assert_eq!(watcher.poll(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(watcher.registrations(), 0);
    }
}
