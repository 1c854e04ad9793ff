//! Ingestion Pipeline Module
//!
//! Three worker tasks joined by bounded FIFO queues:
//!
//! ```text
//! MessageSource -> receiver -> [raw queue] -> gateway -> [order queue] -> forwarder -> OrderCache
//!                                             (decode, persist)            (set)
//! ```
//!
//! Each queue has exactly one consumer, so cache updates for a given order
//! id land in the same order the rows were persisted. All workers observe
//! one cancellation token and stop at their next await point once it fires;
//! anything still queued is dropped.

mod forwarder;
mod gateway;
mod receiver;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::cache::OrderCache;
use crate::source::MessageSource;
use crate::store::OrderWriter;

pub use forwarder::run_forwarder;
pub use gateway::PersistenceGateway;
pub use receiver::run_receiver;

// == Pipeline Stats ==
/// Per-stage counters, shared by the workers and the read API.
#[derive(Debug, Default)]
pub struct PipelineStats {
    received: AtomicU64,
    decode_failures: AtomicU64,
    persisted: AtomicU64,
    persist_failures: AtomicU64,
    forwarded: AtomicU64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persisted(&self) {
        self.persisted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persist_failure(&self) {
        self.persist_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PipelineStatsSnapshot {
        PipelineStatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            persisted: self.persisted.load(Ordering::Relaxed),
            persist_failures: self.persist_failures.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of [`PipelineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStatsSnapshot {
    /// Messages pulled off the source
    pub received: u64,
    /// Messages dropped because the payload was not a valid order
    pub decode_failures: u64,
    /// Orders written to the durable store
    pub persisted: u64,
    /// Orders dropped because the store rejected the write
    pub persist_failures: u64,
    /// Orders applied to the cache
    pub forwarded: u64,
}

// == Pipeline Handle ==
/// Running pipeline workers.
#[derive(Debug)]
pub struct PipelineHandle {
    stats: Arc<PipelineStats>,
    tasks: Vec<JoinHandle<()>>,
}

impl PipelineHandle {
    /// Shared counters for this pipeline.
    pub fn stats(&self) -> Arc<PipelineStats> {
        self.stats.clone()
    }

    /// Waits for every worker to exit.
    ///
    /// Workers exit when the shutdown token is cancelled or when the source
    /// closes and the queues behind it have been drained.
    pub async fn join(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                error!("Pipeline worker failed: {}", e);
            }
        }
        info!("Pipeline stopped");
    }
}

// == Spawn ==
/// Starts the receiver, gateway and forwarder workers.
///
/// # Arguments
/// * `source` - Inbound message stream
/// * `writer` - Durable store the gateway persists into
/// * `cache` - Cache the forwarder populates
/// * `capacity` - Size of each bounded handoff queue
/// * `shutdown` - Token observed by every worker
pub fn spawn_pipeline<S>(
    source: S,
    writer: Arc<dyn OrderWriter>,
    cache: Arc<OrderCache>,
    capacity: usize,
    shutdown: CancellationToken,
) -> PipelineHandle
where
    S: MessageSource + 'static,
{
    let stats = Arc::new(PipelineStats::new());
    let capacity = capacity.max(1);
    let (raw_tx, raw_rx) = mpsc::channel(capacity);
    let (order_tx, order_rx) = mpsc::channel(capacity);

    let gateway = PersistenceGateway::new(writer, stats.clone());

    let tasks = vec![
        tokio::spawn(run_receiver(source, raw_tx, stats.clone(), shutdown.clone())),
        tokio::spawn(gateway.run(raw_rx, order_tx, shutdown.clone())),
        tokio::spawn(run_forwarder(cache, order_rx, stats.clone(), shutdown)),
    ];

    info!(capacity, "Pipeline started");
    PipelineHandle { stats, tasks }
}
