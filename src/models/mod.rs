//! Domain and response models
//!
//! The order payload type plus the DTOs serialized by the read API.

pub mod order;
pub mod responses;

pub use order::Order;
pub use responses::{CacheStatsResponse, HealthResponse, StatsResponse};
