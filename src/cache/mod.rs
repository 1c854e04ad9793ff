//! Cache Module
//!
//! Provides the in-memory order cache with TTL expiration and periodic sweeping.

mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use store::OrderCache;
