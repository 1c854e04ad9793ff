//! Receiver stage: moves messages from the source into the raw queue.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::PipelineStats;
use crate::source::{InboundMessage, MessageSource};

/// Runs until the source closes, the gateway goes away, or `shutdown` fires.
pub async fn run_receiver<S: MessageSource>(
    mut source: S,
    tx: mpsc::Sender<InboundMessage>,
    stats: Arc<PipelineStats>,
    shutdown: CancellationToken,
) {
    info!("Pipeline receiver started");

    loop {
        let message = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("Pipeline receiver received shutdown signal");
                break;
            }
            message = source.recv() => message,
        };

        let Some(message) = message else {
            info!("Message source closed, receiver stopping");
            break;
        };
        stats.record_received();
        debug!(bytes = message.payload.len(), "Message received");

        let sent = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("Pipeline receiver received shutdown signal");
                break;
            }
            sent = tx.send(message) => sent,
        };
        if sent.is_err() {
            info!("Gateway queue closed, receiver stopping");
            break;
        }
    }
}
