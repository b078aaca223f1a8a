//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{Cache, CacheConfiguration, CacheKey};
use crate::compress::wrap_target_managers;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::manager::{CacheManager, StoreCacheManager};
use crate::models::{
    validate_key, CacheNamesResponse, ClearResponse, DeleteResponse, GetResponse, HealthResponse,
    PutIfAbsentResponse, PutRequest, PutResponse, StatsResponse,
};
use crate::store::{CacheWriter, InMemoryCacheWriter};

/// Registration name of the manager built over the in-memory writer.
pub const STORE_CACHE_MANAGER: &str = "storeCacheManager";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Manager serving the HTTP caches, compressing when selected
    pub manager: Arc<dyn CacheManager>,
    /// Backing writer, for statistics and cleanup
    pub writer: InMemoryCacheWriter,
}

impl AppState {
    pub fn new(manager: Arc<dyn CacheManager>, writer: InMemoryCacheWriter) -> Self {
        Self { manager, writer }
    }

    /// Creates the writer and manager described by the configuration.
    ///
    /// Only the configured cache names are served. The manager is wrapped with
    /// compression when [`STORE_CACHE_MANAGER`] is on the allow-list.
    pub fn from_config(config: &Config) -> Self {
        let writer = InMemoryCacheWriter::new();

        let mut defaults = CacheConfiguration::with_entry_ttl(config.default_ttl);
        if !config.allow_null_values {
            defaults = defaults.disable_caching_null_values();
        }

        let builder = config
            .cache_names
            .iter()
            .fold(
                StoreCacheManager::builder(Arc::new(writer.clone()), defaults),
                |builder, name| builder.with_initial_cache(name.clone()),
            )
            .disable_creating_caches_on_the_fly();
        let store_manager: Arc<dyn CacheManager> = Arc::new(builder.build());

        let managers = vec![(STORE_CACHE_MANAGER.to_string(), Arc::clone(&store_manager))];
        let manager = wrap_target_managers(managers, &config.compression)
            .into_iter()
            .next()
            .map(|wrapped| Arc::new(wrapped) as Arc<dyn CacheManager>)
            .unwrap_or(store_manager);

        Self::new(manager, writer)
    }

    fn cache(&self, name: &str) -> Result<Arc<dyn Cache>> {
        self.manager
            .get_cache(name)
            .ok_or_else(|| CacheError::NotFound(format!("Cache '{}' not found", name)))
    }
}

fn checked_key(key: &str) -> Result<CacheKey> {
    match validate_key(key) {
        Some(message) => Err(CacheError::InvalidRequest(message)),
        None => Ok(CacheKey::from(key)),
    }
}

/// Handler for PUT /caches/:cache/:key
pub async fn put_handler(
    State(state): State<AppState>,
    Path((cache, key)): Path<(String, String)>,
    Json(req): Json<PutRequest>,
) -> Result<Json<PutResponse>> {
    let cache_key = checked_key(&key)?;
    state.cache(&cache)?.put(&cache_key, req.value)?;

    Ok(Json(PutResponse::new(cache, key)))
}

/// Handler for POST /caches/:cache/:key/if-absent
pub async fn put_if_absent_handler(
    State(state): State<AppState>,
    Path((cache, key)): Path<(String, String)>,
    Json(req): Json<PutRequest>,
) -> Result<Json<PutIfAbsentResponse>> {
    let cache_key = checked_key(&key)?;
    let existing = state.cache(&cache)?.put_if_absent(&cache_key, req.value)?;

    Ok(Json(PutIfAbsentResponse::new(cache, key, existing)))
}

/// Handler for GET /caches/:cache/:key
///
/// A miss is 404; a cached null is a hit with `cached_null` set.
pub async fn get_handler(
    State(state): State<AppState>,
    Path((cache, key)): Path<(String, String)>,
) -> Result<Json<GetResponse>> {
    let cache_key = checked_key(&key)?;
    let hit = state
        .cache(&cache)?
        .get(&cache_key)?
        .ok_or_else(|| CacheError::NotFound(format!("Key '{}' not found in '{}'", key, cache)))?;

    Ok(Json(GetResponse::new(cache, key, hit)))
}

/// Handler for DELETE /caches/:cache/:key
pub async fn evict_handler(
    State(state): State<AppState>,
    Path((cache, key)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    let cache_key = checked_key(&key)?;
    state.cache(&cache)?.evict(&cache_key)?;

    Ok(Json(DeleteResponse::new(cache, key)))
}

/// Handler for DELETE /caches/:cache
pub async fn clear_handler(
    State(state): State<AppState>,
    Path(cache): Path<String>,
) -> Result<Json<ClearResponse>> {
    state.cache(&cache)?.clear()?;
    Ok(Json(ClearResponse::new(cache)))
}

/// Handler for GET /caches
pub async fn list_caches_handler(State(state): State<AppState>) -> Json<CacheNamesResponse> {
    Json(CacheNamesResponse {
        caches: state.manager.cache_names(),
    })
}

/// Handler for GET /caches/:cache/stats
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(cache): Path<String>,
) -> Result<Json<StatsResponse>> {
    state.cache(&cache)?;

    Ok(Json(StatsResponse::new(
        state.writer.statistics(&cache),
        state.writer.entry_count(&cache),
    )))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
