//! PostgreSQL order store

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, warn};

use super::{OrderReader, OrderWriter, StoredOrder};
use crate::error::StoreError;

/// Postgres unique_violation SQLSTATE
const UNIQUE_VIOLATION: &str = "23505";

/// Orders table backed by a Postgres connection pool.
///
/// Table layout: `id TEXT PRIMARY KEY, data JSONB`.
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: PgPool,
    table: String,
}

impl PgOrderStore {
    /// Wraps an existing pool.
    ///
    /// The table name is interpolated into SQL, so only plain identifiers
    /// with an optional schema prefix are accepted.
    pub fn new(pool: PgPool, table: impl Into<String>) -> Result<Self, StoreError> {
        let table = table.into();
        if !is_valid_table_name(&table) {
            return Err(StoreError::InvalidTable(table));
        }
        Ok(Self { pool, table })
    }

    /// Connects to `url`, retrying up to `attempts` times with a fixed
    /// `backoff` between tries.
    pub async fn connect_with_retry(
        url: &str,
        table: &str,
        attempts: u32,
        backoff: Duration,
    ) -> Result<Self, StoreError> {
        if !is_valid_table_name(table) {
            return Err(StoreError::InvalidTable(table.to_string()));
        }

        let attempts = attempts.max(1);
        let mut attempt = 1;
        loop {
            let result = PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(5))
                .connect(url)
                .await;

            match result {
                Ok(pool) => {
                    info!(attempt, table, "Connected to PostgreSQL");
                    return Self::new(pool, table);
                }
                Err(e) if attempt < attempts => {
                    warn!(attempt, attempts, error = %e, "Database connection failed, retrying");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(StoreError::Connect {
                        attempts,
                        source: e,
                    })
                }
            }
        }
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl OrderReader for PgOrderStore {
    async fn scan_all(&self) -> Result<Vec<StoredOrder>, StoreError> {
        let sql = format!("SELECT id, data::text FROM {}", self.table);
        let rows: Vec<(String, String)> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|(id, data)| StoredOrder {
                id,
                data: data.into_bytes(),
            })
            .collect())
    }
}

#[async_trait]
impl OrderWriter for PgOrderStore {
    async fn insert(&self, id: &str, payload: &[u8]) -> Result<(), StoreError> {
        let data = std::str::from_utf8(payload).map_err(|e| StoreError::InvalidPayload {
            id: id.to_string(),
            reason: e.to_string(),
        })?;

        let sql = format!("INSERT INTO {}(id, data) VALUES ($1, $2::jsonb)", self.table);
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(data)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db))
                if db.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                Err(StoreError::Conflict(id.to_string()))
            }
            Err(e) => Err(StoreError::Query(e)),
        }
    }
}

/// Accepts `name` or `schema.name`, each part `[A-Za-z_][A-Za-z0-9_]*`.
fn is_valid_table_name(table: &str) -> bool {
    let parts: Vec<&str> = table.split('.').collect();
    parts.len() <= 2
        && parts.iter().all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}
