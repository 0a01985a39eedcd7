//! API Routes
//!
//! Configures the Axum router with all admin endpoints.

use axum::{
    routing::{get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_stats_handler, clear_all_handler, clear_handler, delete_handler, get_handler,
    health_handler, list_handler, set_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/caches", get(list_handler).delete(clear_all_handler))
        .route("/caches/:name", axum::routing::delete(clear_handler))
        .route("/caches/:name/stats", get(cache_stats_handler))
        .route("/caches/:name/entries", put(set_handler))
        .route(
            "/caches/:name/entries/:key",
            get(get_handler).delete(delete_handler),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
