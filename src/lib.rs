//! Order Cache - order ingestion with durable persistence and an in-memory read cache
//!
//! Orders arrive on a message source, are written to the durable store, and
//! are served from a TTL cache that is rebuilt from the store at startup.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod rehydrate;
pub mod source;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::OrderCache;
pub use config::Config;
pub use pipeline::spawn_pipeline;
pub use rehydrate::RehydrationLoader;
pub use tasks::spawn_sweep_task;
