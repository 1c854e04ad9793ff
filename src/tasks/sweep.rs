//! Expiry Sweep Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::OrderCache;

/// Spawns a background task that periodically sweeps expired cache entries.
///
/// The task sleeps for `interval` between passes and exits when `shutdown`
/// is cancelled. Returns `None` without spawning anything when `interval`
/// is zero.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(OrderCache::new(Duration::from_secs(300)));
/// let shutdown = CancellationToken::new();
/// let sweeper = spawn_sweep_task(cache.clone(), Duration::from_secs(1), shutdown.clone());
/// // Later, during shutdown:
/// shutdown.cancel();
/// ```
pub fn spawn_sweep_task(
    cache: Arc<OrderCache>,
    interval: Duration,
    shutdown: CancellationToken,
) -> Option<JoinHandle<()>> {
    if interval.is_zero() {
        info!("Expiry sweep disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        info!("Starting expiry sweep task with interval of {:?}", interval);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Expiry sweep task stopping");
                    break;
                }
                _ = tokio::time::sleep(interval) => {}
            }

            let removed = cache.sweep_expired().await;

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    }))
}
