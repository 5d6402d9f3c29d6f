//! Push-style watcher: the owner announces changes explicitly.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use super::{ChangeCallback, DependencyWatcher, ResourceId, WatchId};

struct Registration {
    resources: Vec<ResourceId>,
    on_change: ChangeCallback,
}

/// Watcher whose changes are signalled by calling [`ManualWatcher::trigger`].
#[derive(Default)]
pub struct ManualWatcher {
    next_id: AtomicU64,
    registrations: Mutex<HashMap<WatchId, Registration>>,
}

impl ManualWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Announces that `resource` changed. Returns the number of registrations fired.
    pub fn trigger(&self, resource: &str) -> usize {
        let fired: Vec<(WatchId, ChangeCallback)> = {
            let mut registrations = self
                .registrations
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let ids: Vec<WatchId> = registrations
                .iter()
                .filter(|(_, reg)| reg.resources.iter().any(|r| r == resource))
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| registrations.remove(&id).map(|reg| (id, reg.on_change)))
                .collect()
        };

        debug!(resource, fired = fired.len(), "Resource change announced");
        for (id, on_change) in &fired {
            on_change(*id, resource);
        }
        fired.len()
    }
}

impl DependencyWatcher for ManualWatcher {
    fn watch(&self, resources: &[ResourceId], on_change: ChangeCallback) -> WatchId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id,
                Registration {
                    resources: resources.to_vec(),
                    on_change,
                },
            );
        id
    }

    fn unwatch(&self, id: WatchId) {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }

    fn registrations(&self) -> usize {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
