//! API Handlers
//!
//! HTTP request handlers for each read API endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::debug;

use crate::cache::OrderCache;
use crate::error::{CacheError, Result};
use crate::models::{HealthResponse, Order, StatsResponse};
use crate::pipeline::PipelineStats;
use crate::rehydrate::RehydrateReport;

/// Application state shared across all handlers.
///
/// Handlers only read from the cache; the pipeline forwarder and the
/// rehydration loader are its only writers.
#[derive(Clone)]
pub struct AppState {
    /// Shared order cache
    pub cache: Arc<OrderCache>,
    /// Counters of the running pipeline
    pub pipeline: Arc<PipelineStats>,
    /// Result of the startup rehydration pass
    pub rehydration: RehydrateReport,
}

impl AppState {
    /// Creates a new AppState around the given cache.
    pub fn new(cache: Arc<OrderCache>) -> Self {
        Self {
            cache,
            pipeline: Arc::new(PipelineStats::new()),
            rehydration: RehydrateReport::default(),
        }
    }

    /// Reports counters from a running pipeline instead of an idle one.
    pub fn with_pipeline_stats(mut self, stats: Arc<PipelineStats>) -> Self {
        self.pipeline = stats;
        self
    }

    pub fn with_rehydration(mut self, report: RehydrateReport) -> Self {
        self.rehydration = report;
        self
    }
}

/// Handler for GET /getallids
///
/// Returns every cached order id, including expired ids not yet swept.
pub async fn list_ids_handler(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.cache.keys().await)
}

/// Handler for GET /getorder/:id
///
/// Returns the cached order body. Unknown and expired ids both yield a 500.
pub async fn get_order_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Order>> {
    debug!(order_id = %id, "getorder");
    let order = state
        .cache
        .get(&id)
        .await
        .ok_or(CacheError::NotFound(id))?;

    Ok(Json(order))
}

/// Handler for GET /stats
///
/// Returns cache, pipeline and rehydration counters.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let total_entries = state.cache.len().await;

    Json(StatsResponse::new(
        state.cache.stats(),
        total_entries,
        state.pipeline.snapshot(),
        state.rehydration,
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};
    use std::time::Duration;

    fn state() -> AppState {
        AppState::new(Arc::new(OrderCache::new(Duration::ZERO)))
    }

    fn order(id: &str) -> Order {
        let mut body = Map::new();
        body.insert("locale".to_string(), json!("en"));
        Order {
            order_uid: id.to_string(),
            body,
        }
    }

    #[tokio::test]
    async fn test_get_order_handler() {
        let state = state();
        state.cache.set("abc", order("abc"), Duration::ZERO).await;

        let response = get_order_handler(State(state), Path("abc".to_string()))
            .await
            .unwrap();
        assert_eq!(response.0, order("abc"));
    }

    #[tokio::test]
    async fn test_get_nonexistent_order() {
        let result = get_order_handler(State(state()), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(id)) if id == "nonexistent"));
    }

    #[tokio::test]
    async fn test_list_ids_handler() {
        let state = state();
        state.cache.set("b", order("b"), Duration::ZERO).await;
        state.cache.set("a", order("a"), Duration::ZERO).await;

        let response = list_ids_handler(State(state)).await;
        assert_eq!(response.0, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = state().with_rehydration(RehydrateReport {
            loaded: 2,
            skipped_mismatch: 1,
        });
        state.pipeline.record_received();

        let response = stats_handler(State(state)).await;
        assert_eq!(response.cache.hits, 0);
        assert_eq!(response.pipeline.received, 1);
        assert_eq!(response.rehydration.skipped_mismatch, 1);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
