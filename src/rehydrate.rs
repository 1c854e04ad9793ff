//! Rehydration Module
//!
//! Rebuilds the cache from the durable store before the pipeline starts.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::cache::OrderCache;
use crate::error::RehydrateError;
use crate::models::Order;
use crate::store::OrderReader;

/// Outcome of one rehydration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RehydrateReport {
    /// Rows inserted into the cache
    pub loaded: usize,
    /// Rows whose `id` column disagrees with the payload's `order_uid`
    pub skipped_mismatch: usize,
}

/// One-shot loader from the durable store into the cache.
pub struct RehydrationLoader {
    reader: Arc<dyn OrderReader>,
}

impl RehydrationLoader {
    pub fn new(reader: Arc<dyn OrderReader>) -> Self {
        Self { reader }
    }

    /// Scans every stored row and inserts it with the default TTL.
    ///
    /// Any undecodable row aborts the whole pass; rows already inserted are
    /// left in the cache, but the caller is expected to treat the error as
    /// fatal. A row whose stored id differs from its embedded id is skipped
    /// and counted.
    pub async fn run(&self, cache: &OrderCache) -> Result<RehydrateReport, RehydrateError> {
        let rows = self.reader.scan_all().await?;
        info!(rows = rows.len(), "Rehydrating cache from durable store");

        let mut report = RehydrateReport::default();
        for row in rows {
            let order = Order::decode(&row.data).map_err(|source| RehydrateError::Decode {
                id: row.id.clone(),
                source,
            })?;

            if order.id() != row.id {
                warn!(
                    row_id = %row.id,
                    order_id = %order.id(),
                    "Skipping stored row whose id does not match its payload"
                );
                report.skipped_mismatch += 1;
                continue;
            }

            cache.set(row.id, order, Duration::ZERO).await;
            report.loaded += 1;
        }

        info!(
            loaded = report.loaded,
            skipped_mismatch = report.skipped_mismatch,
            "Cache rehydration complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, StoreError};
    use crate::store::MemoryOrderStore;

    #[tokio::test]
    async fn test_rehydrate_round_trip() {
        let payload = r#"{"order_uid":"abc","delivery":{"city":"Kazan"}}"#;
        let store = Arc::new(MemoryOrderStore::with_rows([("abc", payload)]));
        let cache = OrderCache::new(Duration::ZERO);

        let report = RehydrationLoader::new(store).run(&cache).await.unwrap();

        assert_eq!(report, RehydrateReport { loaded: 1, skipped_mismatch: 0 });
        assert_eq!(
            cache.get("abc").await,
            Some(Order::decode(payload.as_bytes()).unwrap())
        );
    }

    #[tokio::test]
    async fn test_rehydrate_skips_id_mismatch() {
        let store = Arc::new(MemoryOrderStore::with_rows([
            ("abc", r#"{"order_uid":"abc"}"#),
            ("stale", r#"{"order_uid":"other"}"#),
        ]));
        let cache = OrderCache::new(Duration::ZERO);

        let report = RehydrationLoader::new(store).run(&cache).await.unwrap();

        assert_eq!(report, RehydrateReport { loaded: 1, skipped_mismatch: 1 });
        assert_eq!(cache.keys().await, vec!["abc"]);
        assert!(cache.get("stale").await.is_none());
        assert!(cache.get("other").await.is_none());
    }

    #[tokio::test]
    async fn test_rehydrate_decode_failure_is_fatal() {
        let store = Arc::new(MemoryOrderStore::with_rows([
            ("abc", r#"{"order_uid":"abc"}"#),
            ("broken", "{not json"),
        ]));
        let cache = OrderCache::new(Duration::ZERO);

        let result = RehydrationLoader::new(store).run(&cache).await;

        match result {
            Err(RehydrateError::Decode { id, source }) => {
                assert_eq!(id, "broken");
                assert!(matches!(source, DecodeError::Json(_)));
            }
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rehydrate_empty_store() {
        let store = Arc::new(MemoryOrderStore::new());
        let cache = OrderCache::new(Duration::ZERO);

        let report = RehydrationLoader::new(store).run(&cache).await.unwrap();

        assert_eq!(report, RehydrateReport::default());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_rehydrate_uses_default_ttl() {
        let store = Arc::new(MemoryOrderStore::with_rows([("abc", r#"{"order_uid":"abc"}"#)]));
        let cache = OrderCache::new(Duration::from_millis(50));

        RehydrationLoader::new(store).run(&cache).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(cache.get("abc").await.is_none());
    }

    struct FailingReader;

    #[async_trait::async_trait]
    impl OrderReader for FailingReader {
        async fn scan_all(&self) -> Result<Vec<crate::store::StoredOrder>, StoreError> {
            Err(StoreError::Unavailable("scan refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_rehydrate_store_failure() {
        let cache = OrderCache::new(Duration::ZERO);
        let result = RehydrationLoader::new(Arc::new(FailingReader)).run(&cache).await;
        assert!(matches!(result, Err(RehydrateError::Store(_))));
    }
}
