//! API Module
//!
//! HTTP handlers and routing exposing named caches over REST.
//!
//! # Endpoints
//! - `PUT /caches/:cache/:key` - Store a value
//! - `POST /caches/:cache/:key/if-absent` - Store a value unless present
//! - `GET /caches/:cache/:key` - Retrieve a value
//! - `DELETE /caches/:cache/:key` - Evict a key
//! - `DELETE /caches/:cache` - Clear a cache
//! - `GET /caches` - List cache names
//! - `GET /caches/:cache/stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
