//! API Routes
//!
//! Configures the Axum router with all read API endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    get_order_handler, health_handler, list_ids_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /getallids` - List cached order ids
/// - `GET /getorder/:id` - Fetch one order; 500 when unknown or expired
/// - `GET /stats` - Cache, pipeline and rehydration counters
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/getallids", get(list_ids_handler))
        .route("/getorder/:id", get(get_order_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::OrderCache;
    use crate::models::Order;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn create_test_app() -> (Router, Arc<OrderCache>) {
        let cache = Arc::new(OrderCache::new(Duration::ZERO));
        let state = AppState::new(cache.clone());
        (create_router(state), cache)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (app, _) = create_test_app();
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let (app, _) = create_test_app();
        let response = app.oneshot(get("/stats")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_getallids_endpoint() {
        let (app, _) = create_test_app();
        let response = app.oneshot(get("/getallids")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_getorder_found() {
        let (app, cache) = create_test_app();
        let order = Order::decode(br#"{"order_uid":"abc"}"#).unwrap();
        cache.set("abc", order, Duration::ZERO).await;

        let response = app.oneshot(get("/getorder/abc")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_getorder_not_found_is_server_error() {
        let (app, _) = create_test_app();
        let response = app.oneshot(get("/getorder/unknown")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
