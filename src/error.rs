//! Error types for the order service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Errors reported by the order cache.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CacheError {
    /// Key is absent or logically expired
    #[error("Key not found: {0}")]
    NotFound(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        // Read API clients get a server error for unknown or expired ids,
        // never a 404.
        let (status, message) = match &self {
            CacheError::NotFound(id) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Order not found: {}", id),
            ),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Decode Error ==
/// A payload that cannot be turned into an order.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Payload is not a JSON object with the expected fields
    #[error("Malformed order payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload carries an empty `order_uid`
    #[error("Order payload has an empty order_uid")]
    EmptyId,
}

// == Store Error ==
/// Errors raised by durable store backends.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Connection retries exhausted at startup
    #[error("Failed to connect to database after {attempts} attempts: {source}")]
    Connect {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    /// Query or statement failure
    #[error("Database query failed: {0}")]
    Query(#[from] sqlx::Error),

    /// Row with this id already exists
    #[error("Order already stored: {0}")]
    Conflict(String),

    /// Table name is not a plain (optionally schema-qualified) identifier
    #[error("Invalid table name: {0}")]
    InvalidTable(String),

    /// Payload could not be written in the store's column format
    #[error("Invalid payload for order {id}: {reason}")]
    InvalidPayload { id: String, reason: String },

    /// Backend refused the write
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

// == Pipeline Error ==
/// Per-message failures inside the persistence gateway. Never fatal.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Persist failed for order {id}: {source}")]
    Persistence {
        id: String,
        #[source]
        source: StoreError,
    },
}

// == Rehydrate Error ==
/// Startup failures while rebuilding the cache. Always fatal.
#[derive(Error, Debug)]
pub enum RehydrateError {
    #[error("Failed to scan durable store: {0}")]
    Store(#[from] StoreError),

    #[error("Stored row {id} is not a valid order: {source}")]
    Decode {
        id: String,
        #[source]
        source: DecodeError,
    },
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
