//! Order Cache Module
//!
//! Concurrent TTL map from order id to order, with lazy expiry on read and
//! batched removal of expired entries by the sweeper.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, CacheStatsSnapshot};
use crate::error::{CacheError, Result};
use crate::models::Order;

// == Order Cache ==
/// In-memory order cache.
///
/// One reader/writer lock guards the whole map: `get`, `keys` and `len`
/// share it, while `set`, `delete` and `sweep_expired` take it exclusively.
/// The lock never leaves this type, so callers only ever hold an
/// `Arc<OrderCache>`.
#[derive(Debug)]
pub struct OrderCache {
    /// Order id to entry
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// TTL applied when `set` is called with a zero TTL
    default_ttl: Duration,
    /// Lookup and sweep counters
    stats: CacheStats,
}

impl OrderCache {
    // == Constructor ==
    /// Creates an empty cache.
    ///
    /// # Arguments
    /// * `default_ttl` - TTL used for zero-TTL inserts; zero means entries never expire
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
            stats: CacheStats::new(),
        }
    }

    /// Returns the configured default TTL.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // == Set ==
    /// Inserts or overwrites the entry for `id`. Last writer wins.
    ///
    /// A zero `ttl` selects the default TTL; it does not mean "forever"
    /// unless the default is itself zero.
    pub async fn set(&self, id: impl Into<String>, value: Order, ttl: Duration) {
        let ttl = if ttl.is_zero() { self.default_ttl } else { ttl };
        let entry = CacheEntry::new(value, ttl);

        let mut entries = self.entries.write().await;
        entries.insert(id.into(), entry);
    }

    // == Get ==
    /// Returns the order for `id` if present and not expired.
    ///
    /// Expired entries stay in the map until the next sweep but are
    /// reported as absent.
    pub async fn get(&self, id: &str) -> Option<Order> {
        let entries = self.entries.read().await;

        match entries.get(id) {
            Some(entry) if !entry.is_expired() => {
                self.stats.record_hit();
                Some(entry.value.clone())
            }
            _ => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Delete ==
    /// Removes the entry for `id`.
    ///
    /// # Errors
    /// `CacheError::NotFound` if no entry exists; the cache is left unchanged.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        match entries.remove(id) {
            Some(_) => Ok(()),
            None => Err(CacheError::NotFound(id.to_string())),
        }
    }

    // == Keys ==
    /// Returns a sorted snapshot of every id physically present, including
    /// expired entries not yet swept.
    pub async fn keys(&self) -> Vec<String> {
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    // == Length ==
    /// Returns the number of entries physically present.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    // == Is Empty ==
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    // == Sweep Expired ==
    /// Removes all expired entries and returns how many were removed.
    ///
    /// Expired ids are collected under the shared lock, then removed in a
    /// single exclusive section. Each id is re-checked before removal since
    /// a `set` may have refreshed it between the two phases.
    pub async fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let expired: Vec<String> = {
            let entries = self.entries.read().await;
            entries
                .iter()
                .filter(|(_, entry)| entry.is_expired_at(now))
                .map(|(id, _)| id.clone())
                .collect()
        };

        if expired.is_empty() {
            return 0;
        }

        let removed = {
            let mut entries = self.entries.write().await;
            let now = Utc::now();
            let mut removed = 0;
            for id in &expired {
                if entries.get(id).is_some_and(|entry| entry.is_expired_at(now)) {
                    entries.remove(id);
                    removed += 1;
                }
            }
            removed
        };

        debug!(candidates = expired.len(), removed, "sweep pass complete");
        self.stats.record_swept(removed);
        removed
    }

    // == Stats ==
    /// Returns current cache counters.
    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }
}
