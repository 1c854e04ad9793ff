//! Persistence gateway stage
//!
//! Decodes each message, writes `(id, payload)` to the durable store, and
//! hands persisted orders to the forwarder. A message that fails to decode
//! or persist is logged, counted and dropped. It is never retried and
//! never reaches the cache.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::PipelineStats;
use crate::error::PipelineError;
use crate::models::Order;
use crate::source::InboundMessage;
use crate::store::OrderWriter;

pub struct PersistenceGateway {
    writer: Arc<dyn OrderWriter>,
    stats: Arc<PipelineStats>,
}

impl PersistenceGateway {
    pub fn new(writer: Arc<dyn OrderWriter>, stats: Arc<PipelineStats>) -> Self {
        Self { writer, stats }
    }

    /// Decodes and persists one message.
    ///
    /// The stored payload is the raw message bytes, not a re-encoding.
    pub async fn process(&self, message: &InboundMessage) -> Result<Order, PipelineError> {
        let order = Order::decode(&message.payload)?;

        self.writer
            .insert(order.id(), &message.payload)
            .await
            .map_err(|source| PipelineError::Persistence {
                id: order.id().to_string(),
                source,
            })?;

        Ok(order)
    }

    /// Consumes the raw queue one message at a time until it closes or
    /// `shutdown` fires.
    pub async fn run(
        self,
        mut rx: mpsc::Receiver<InboundMessage>,
        tx: mpsc::Sender<Order>,
        shutdown: CancellationToken,
    ) {
        info!("Persistence gateway started");

        loop {
            let message = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Persistence gateway received shutdown signal");
                    break;
                }
                message = rx.recv() => message,
            };

            let Some(message) = message else {
                info!("Message queue closed, persistence gateway stopping");
                break;
            };

            let order = match self.process(&message).await {
                Ok(order) => order,
                Err(PipelineError::Decode(e)) => {
                    self.stats.record_decode_failure();
                    warn!(error = %e, "Dropping undecodable message");
                    continue;
                }
                Err(e @ PipelineError::Persistence { .. }) => {
                    self.stats.record_persist_failure();
                    error!(error = %e, "Dropping order that failed to persist");
                    continue;
                }
            };

            self.stats.record_persisted();
            debug!(order_id = %order.id(), "Order persisted");

            let sent = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Persistence gateway received shutdown signal");
                    break;
                }
                sent = tx.send(order) => sent,
            };
            if sent.is_err() {
                warn!("Cache forwarder gone, persistence gateway stopping");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::MemoryOrderStore;

    fn gateway(store: &Arc<MemoryOrderStore>) -> (PersistenceGateway, Arc<PipelineStats>) {
        let stats = Arc::new(PipelineStats::new());
        (PersistenceGateway::new(store.clone(), stats.clone()), stats)
    }

    #[tokio::test]
    async fn test_process_persists_raw_payload() {
        let store = Arc::new(MemoryOrderStore::new());
        let (gateway, _) = gateway(&store);
        let payload = br#"{"order_uid":"abc123","track_number":"WB1"}"#;

        let order = gateway.process(&InboundMessage::new(&payload[..])).await.unwrap();

        assert_eq!(order.id(), "abc123");
        assert_eq!(store.row("abc123").await, Some(payload.to_vec()));
    }

    #[tokio::test]
    async fn test_process_decode_failure_skips_store() {
        let store = Arc::new(MemoryOrderStore::new());
        let (gateway, _) = gateway(&store);

        let result = gateway.process(&InboundMessage::new("{oops")).await;

        assert!(matches!(result, Err(PipelineError::Decode(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_process_store_failure() {
        let store = Arc::new(MemoryOrderStore::new());
        store.set_fail_writes(true);
        let (gateway, _) = gateway(&store);

        let result = gateway
            .process(&InboundMessage::new(r#"{"order_uid":"abc"}"#))
            .await;

        assert!(matches!(
            result,
            Err(PipelineError::Persistence {
                source: StoreError::Unavailable(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_run_forwards_only_persisted_orders() {
        let store = Arc::new(MemoryOrderStore::with_rows([("dup", r#"{"order_uid":"dup"}"#)]));
        let (gateway, stats) = gateway(&store);
        let (raw_tx, raw_rx) = mpsc::channel(8);
        let (order_tx, mut order_rx) = mpsc::channel(8);

        for payload in [
            r#"{"order_uid":"a"}"#,
            "garbage",
            r#"{"order_uid":"dup"}"#,
            r#"{"order_uid":"b"}"#,
        ] {
            raw_tx.send(InboundMessage::new(payload)).await.unwrap();
        }
        drop(raw_tx);

        gateway.run(raw_rx, order_tx, CancellationToken::new()).await;

        let mut forwarded = Vec::new();
        while let Some(order) = order_rx.recv().await {
            forwarded.push(order.order_uid);
        }
        assert_eq!(forwarded, vec!["a", "b"]);

        let stats = stats.snapshot();
        assert_eq!(stats.persisted, 2);
        assert_eq!(stats.decode_failures, 1);
        assert_eq!(stats.persist_failures, 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let store = Arc::new(MemoryOrderStore::new());
        let (gateway, stats) = gateway(&store);
        let (raw_tx, raw_rx) = mpsc::channel(8);
        let (order_tx, _order_rx) = mpsc::channel(8);
        let shutdown = CancellationToken::new();

        raw_tx
            .send(InboundMessage::new(r#"{"order_uid":"queued"}"#))
            .await
            .unwrap();
        shutdown.cancel();

        // Sender still open: only the token can end the loop
        gateway.run(raw_rx, order_tx, shutdown).await;

        assert!(store.is_empty().await, "Queued message should be dropped");
        assert_eq!(stats.snapshot().persisted, 0);
        drop(raw_tx);
    }
}
