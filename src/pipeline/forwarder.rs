//! Forwarder stage: applies persisted orders to the cache.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::PipelineStats;
use crate::cache::OrderCache;
use crate::models::Order;

/// Inserts each order with the cache's default TTL.
pub async fn run_forwarder(
    cache: Arc<OrderCache>,
    mut rx: mpsc::Receiver<Order>,
    stats: Arc<PipelineStats>,
    shutdown: CancellationToken,
) {
    info!("Cache forwarder started");

    loop {
        let order = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("Cache forwarder received shutdown signal");
                break;
            }
            order = rx.recv() => order,
        };

        let Some(order) = order else {
            info!("Order queue closed, cache forwarder stopping");
            break;
        };

        let id = order.order_uid.clone();
        cache.set(id.clone(), order, Duration::ZERO).await;
        stats.record_forwarded();
        debug!(order_id = %id, "Order added to cache");
    }
}
