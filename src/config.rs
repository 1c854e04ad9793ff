//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default TTL in seconds for cached orders; 0 = never expire
    pub default_ttl: u64,
    /// Expiry sweep interval in seconds; 0 disables the sweeper
    pub sweep_interval: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Listen address of the TCP message source
    pub ingest_addr: String,
    /// Largest accepted payload frame on the TCP source, in bytes
    pub ingest_max_frame: usize,
    /// PostgreSQL connection URL; None runs against an in-memory store
    pub database_url: Option<String>,
    /// Orders table, optionally schema-qualified
    pub orders_table: String,
    /// Connection attempts before giving up at startup
    pub db_connect_attempts: u32,
    /// Fixed delay between connection attempts in milliseconds
    pub db_connect_backoff_ms: u64,
    /// Capacity of each bounded pipeline queue
    pub queue_capacity: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 0, never expire)
    /// - `SWEEP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `SERVER_PORT` - HTTP server port (default: 9000)
    /// - `INGEST_ADDR` - TCP message source address (default: 0.0.0.0:4223)
    /// - `INGEST_MAX_FRAME_BYTES` - Largest payload frame (default: 1048576)
    /// - `DATABASE_URL` - PostgreSQL URL (default: unset, in-memory store)
    /// - `ORDERS_TABLE` - Orders table (default: study.orders)
    /// - `DB_CONNECT_ATTEMPTS` - Connection attempts (default: 5)
    /// - `DB_CONNECT_BACKOFF_MS` - Delay between attempts (default: 1000)
    /// - `PIPELINE_QUEUE_CAPACITY` - Pipeline queue size (default: 256)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl: parse_env("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            sweep_interval: parse_env("SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
            server_port: parse_env("SERVER_PORT").unwrap_or(defaults.server_port),
            ingest_addr: env::var("INGEST_ADDR").unwrap_or(defaults.ingest_addr),
            ingest_max_frame: parse_env("INGEST_MAX_FRAME_BYTES")
                .unwrap_or(defaults.ingest_max_frame),
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            orders_table: env::var("ORDERS_TABLE").unwrap_or(defaults.orders_table),
            db_connect_attempts: parse_env("DB_CONNECT_ATTEMPTS")
                .unwrap_or(defaults.db_connect_attempts),
            db_connect_backoff_ms: parse_env("DB_CONNECT_BACKOFF_MS")
                .unwrap_or(defaults.db_connect_backoff_ms),
            queue_capacity: parse_env("PIPELINE_QUEUE_CAPACITY")
                .unwrap_or(defaults.queue_capacity),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }

    pub fn db_connect_backoff(&self) -> Duration {
        Duration::from_millis(self.db_connect_backoff_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: 0,
            sweep_interval: 60,
            server_port: 9000,
            ingest_addr: "0.0.0.0:4223".to_string(),
            ingest_max_frame: 1024 * 1024,
            database_url: None,
            orders_table: "study.orders".to_string(),
            db_connect_attempts: 5,
            db_connect_backoff_ms: 1000,
            queue_capacity: 256,
        }
    }
}

fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
