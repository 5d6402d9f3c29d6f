//! Removal notifications
//!
//! Removals are enqueued on an unbounded channel while the key's shard lock
//! is still held, and a background task hands them to the registered
//! listener. Per-key delivery order therefore matches removal order.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::warn;

use crate::cache::RemovalReason;

/// A single entry leaving the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovalEvent<V> {
    pub key: String,
    pub reason: RemovalReason,
    /// Value the entry held when it was removed
    pub value: V,
}

/// Process-wide removal callback.
pub type RemovalListener<V> = Arc<dyn Fn(RemovalEvent<V>) + Send + Sync>;

/// Shared slot holding the current listener, read by the dispatch task.
pub(crate) type ListenerSlot<V> = Arc<RwLock<Option<RemovalListener<V>>>>;

pub(crate) struct Notifier<V> {
    sender: UnboundedSender<RemovalEvent<V>>,
    listener: ListenerSlot<V>,
}

impl<V> Notifier<V> {
    pub fn new() -> (Self, UnboundedReceiver<RemovalEvent<V>>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let notifier = Self {
            sender,
            listener: Arc::new(RwLock::new(None)),
        };
        (notifier, receiver)
    }

    pub fn listener_slot(&self) -> ListenerSlot<V> {
        self.listener.clone()
    }

    pub fn set_listener(&self, listener: RemovalListener<V>) {
        *self
            .listener
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(listener);
    }

    /// Enqueues an event. Never blocks.
    pub fn notify(&self, key: &str, reason: RemovalReason, value: V) {
        let event = RemovalEvent {
            key: key.to_owned(),
            reason,
            value,
        };
        if self.sender.send(event).is_err() {
            warn!(key, %reason, "Removal dispatch stopped; event dropped");
        }
    }
}

/// Reads the current listener without holding the lock across the call.
pub(crate) fn current_listener<V>(slot: &ListenerSlot<V>) -> Option<RemovalListener<V>> {
    slot.read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_enqueues_event() {
        let (notifier, mut receiver) = Notifier::new();
        notifier.notify("k", RemovalReason::Explicit, 7u32);

        let event = receiver.try_recv().unwrap();
        assert_eq!(
            event,
            RemovalEvent {
                key: "k".to_string(),
                reason: RemovalReason::Explicit,
                value: 7
            }
        );
    }

    #[test]
    fn test_notify_after_receiver_dropped_is_silent() {
        let (notifier, receiver) = Notifier::new();
        drop(receiver);
        notifier.notify("k", RemovalReason::Expired, 1u32);
    }

    #[test]
    fn test_listener_slot_is_shared() {
        let (notifier, _receiver) = Notifier::<u32>::new();
        let slot = notifier.listener_slot();
        assert!(current_listener(&slot).is_none());

        notifier.set_listener(Arc::new(|_| {}));
        assert!(current_listener(&slot).is_some());
    }
}
