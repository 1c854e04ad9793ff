//! Order model
//!
//! An order is an opaque JSON object identified by its embedded `order_uid`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DecodeError;

/// A decoded order payload.
///
/// Only `order_uid` is interpreted; every other field is carried as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique, stable order id embedded in the payload
    pub order_uid: String,
    /// Remaining payload fields
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl Order {
    /// Decodes a raw message or stored row payload.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let order: Order = serde_json::from_slice(payload)?;
        if order.order_uid.is_empty() {
            return Err(DecodeError::EmptyId);
        }
        Ok(order)
    }

    /// Returns the embedded order id.
    pub fn id(&self) -> &str {
        &self.order_uid
    }
}
