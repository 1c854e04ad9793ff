//! API Module
//!
//! HTTP handlers and routing for the read API.
//!
//! # Endpoints
//! - `GET /getallids` - List cached order ids
//! - `GET /getorder/:id` - Fetch one cached order
//! - `GET /stats` - Service counters
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
