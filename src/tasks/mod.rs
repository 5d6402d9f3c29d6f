//! Background Tasks Module
//!
//! Contains background tasks that run independently of cache callers.
//!
//! # Tasks
//! - Expiration sweep: removes expired entries at configured intervals
//! - Watch polling: checks file dependencies for changes
//! - Removal dispatch: delivers removal notifications to the listener

mod dispatch;
mod sweep;
mod watch;

pub(crate) use dispatch::start_dispatch;
pub use sweep::spawn_sweep_task;
pub use watch::spawn_watch_task;
