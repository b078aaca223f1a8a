//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, evict_handler, get_handler, health_handler, list_caches_handler,
    put_handler, put_if_absent_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /caches/:cache/:key` - Store a value
/// - `POST /caches/:cache/:key/if-absent` - Store a value unless present
/// - `GET /caches/:cache/:key` - Retrieve a value
/// - `DELETE /caches/:cache/:key` - Evict a key
/// - `DELETE /caches/:cache` - Clear a cache
/// - `GET /caches` - List cache names
/// - `GET /caches/:cache/stats` - Get cache statistics
/// - `GET /health` - Health check endpoint
///
/// The static `stats` segment takes precedence over a key named `stats`.
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/caches", get(list_caches_handler))
        .route("/caches/:cache", delete(clear_handler))
        .route("/caches/:cache/stats", get(stats_handler))
        .route(
            "/caches/:cache/:key",
            put(put_handler).get(get_handler).delete(evict_handler),
        )
        .route("/caches/:cache/:key/if-absent", post(put_if_absent_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
