//! Order Cache - order ingestion with durable persistence and an in-memory read cache

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use order_cache::api::{create_router, AppState};
use order_cache::source::TcpSource;
use order_cache::store::{MemoryOrderStore, OrderReader, OrderWriter, PgOrderStore};
use order_cache::{spawn_pipeline, spawn_sweep_task, Config, OrderCache, RehydrationLoader};

/// Main entry point for the order cache service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect to the durable store (bounded retries)
/// 4. Rehydrate the cache from the store
/// 5. Start the expiry sweeper
/// 6. Bind the message source and start the pipeline
/// 7. Serve the read API until SIGINT/SIGTERM
/// 8. Wait for the workers to stop
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "order_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting order cache service");

    let config = Config::from_env();
    info!(
        "Configuration loaded: default_ttl={}s, sweep_interval={}s, port={}, ingest={}, table={}",
        config.default_ttl,
        config.sweep_interval,
        config.server_port,
        config.ingest_addr,
        config.orders_table
    );

    let (reader, writer, pg_pool) = match &config.database_url {
        Some(url) => {
            let store = PgOrderStore::connect_with_retry(
                url,
                &config.orders_table,
                config.db_connect_attempts,
                config.db_connect_backoff(),
            )
            .await
            .context("Connect to DB failed")?;
            let pool = store.pool().clone();
            let store = Arc::new(store);
            (
                store.clone() as Arc<dyn OrderReader>,
                store as Arc<dyn OrderWriter>,
                Some(pool),
            )
        }
        None => {
            warn!("DATABASE_URL not set, orders will be kept in an in-memory store");
            let store = Arc::new(MemoryOrderStore::new());
            (
                store.clone() as Arc<dyn OrderReader>,
                store as Arc<dyn OrderWriter>,
                None,
            )
        }
    };

    let cache = Arc::new(OrderCache::new(config.default_ttl()));
    let rehydration = RehydrationLoader::new(reader)
        .run(&cache)
        .await
        .context("Init cache failed")?;
    info!(
        cache_size = cache.len().await,
        default_ttl = ?cache.default_ttl(),
        "Cache init OK"
    );

    let shutdown = CancellationToken::new();
    let sweeper = spawn_sweep_task(cache.clone(), config.sweep_interval(), shutdown.clone());

    let source = TcpSource::bind_with_max_frame(
        config.ingest_addr.as_str(),
        config.queue_capacity,
        config.ingest_max_frame,
        shutdown.clone(),
    )
    .await
    .with_context(|| format!("Failed to bind ingest source on {}", config.ingest_addr))?;

    let pipeline = spawn_pipeline(
        source,
        writer,
        cache.clone(),
        config.queue_capacity,
        shutdown.clone(),
    );

    let state = AppState::new(cache)
        .with_pipeline_stats(pipeline.stats())
        .with_rehydration(rehydration);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {}", addr))?;
    info!("Server listening on http://{}", addr);

    tokio::spawn(shutdown_signal(shutdown.clone()));

    let server_shutdown = shutdown.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
        .await;

    // Stop the workers even if the server ended on its own
    shutdown.cancel();
    pipeline.join().await;
    if let Some(handle) = sweeper {
        if let Err(e) = handle.await {
            error!("Expiry sweep task failed: {}", e);
        }
    }
    if let Some(pool) = pg_pool {
        pool.close().await;
    }

    served.context("HTTP server failed")?;
    info!("Shutdown complete");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM, then cancels `shutdown`.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    shutdown.cancel();
}
