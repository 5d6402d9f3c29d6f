//! Cache Module
//!
//! Provides an in-process cache with TTL expiration, priority exemption,
//! dependency invalidation and asynchronous removal notifications.

mod entry;
pub(crate) mod notify;
mod stats;
mod store;


// Re-export public types
pub use entry::{CacheEntry, Priority, RemovalReason};
pub use notify::{RemovalEvent, RemovalListener};
pub use stats::CacheStats;
pub use store::Cache;
