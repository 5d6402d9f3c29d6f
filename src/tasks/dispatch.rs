//! Removal Dispatch Task
//!
//! Delivers removal events to the registered listener, one at a time and in
//! the order they were enqueued. Ends when every cache handle is dropped.
//!
//! Inside a Tokio runtime each listener call runs on the blocking pool, so a
//! slow listener never stalls an async worker. Outside a runtime a dedicated
//! thread drains the queue instead.

use std::panic::{self, AssertUnwindSafe};
use std::thread;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::cache::notify::{current_listener, ListenerSlot};
use crate::cache::RemovalEvent;

/// Starts delivery on the current runtime, or on a dedicated thread when
/// called outside one.
pub(crate) fn start_dispatch<V>(receiver: UnboundedReceiver<RemovalEvent<V>>, listener: ListenerSlot<V>)
where
    V: Send + Sync + 'static,
{
    if Handle::try_current().is_ok() {
        spawn_dispatch_task(receiver, listener);
        return;
    }

    let spawned = thread::Builder::new()
        .name("removal-dispatch".to_string())
        .spawn(move || run_dispatch_thread(receiver, &listener));
    if let Err(err) = spawned {
        warn!("Failed to start removal dispatch thread: {}", err);
    }
}

pub(crate) fn spawn_dispatch_task<V>(
    mut receiver: UnboundedReceiver<RemovalEvent<V>>,
    listener: ListenerSlot<V>,
) -> JoinHandle<()>
where
    V: Send + Sync + 'static,
{
    tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            let slot = listener.clone();
            // Awaited one at a time to keep delivery order
            if let Err(err) = tokio::task::spawn_blocking(move || deliver(&slot, event)).await {
                warn!("Removal listener task failed: {}", err);
            }
        }
        debug!("Removal dispatch task finished");
    })
}

fn run_dispatch_thread<V>(mut receiver: UnboundedReceiver<RemovalEvent<V>>, listener: &ListenerSlot<V>) {
    while let Some(event) = receiver.blocking_recv() {
        deliver(listener, event);
    }
    debug!("Removal dispatch thread finished");
}

/// Hands one event to the current listener. A panicking listener is logged
/// and later events are still delivered.
fn deliver<V>(listener: &ListenerSlot<V>, event: RemovalEvent<V>) {
    let Some(listener) = current_listener(listener) else {
        trace!(key = %event.key, "No removal listener registered");
        return;
    };

    let key = event.key.clone();
    let reason = event.reason;
    debug!(key = %key, reason = %reason, "Dispatching removal notification");
    if panic::catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
        warn!(key = %key, reason = %reason, "Removal listener panicked");
    }
}
