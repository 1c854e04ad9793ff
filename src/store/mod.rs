//! Durable Store Module
//!
//! The relational store is the system of record for orders. The pipeline
//! and the rehydration loader only see it through these two traits.

mod memory;
mod postgres;

use async_trait::async_trait;

use crate::error::StoreError;

pub use memory::MemoryOrderStore;
pub use postgres::PgOrderStore;

/// One `(id, data)` row of the orders table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredOrder {
    /// Value of the `id` column
    pub id: String,
    /// Raw serialized payload from the `data` column
    pub data: Vec<u8>,
}

/// Full-table read access, used once at startup.
#[async_trait]
pub trait OrderReader: Send + Sync {
    async fn scan_all(&self) -> Result<Vec<StoredOrder>, StoreError>;
}

/// Single-row insert access, used by the persistence gateway.
#[async_trait]
pub trait OrderWriter: Send + Sync {
    /// Inserts `(id, payload)`. Fails with `StoreError::Conflict` when the
    /// id is already stored.
    async fn insert(&self, id: &str, payload: &[u8]) -> Result<(), StoreError>;
}
