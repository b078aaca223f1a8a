//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::ValueWrapper;
use crate::store::CacheStatistics;

/// Response body for `GET /caches/:cache/:key`
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub cache: String,
    pub key: String,
    /// The stored value, `null` for a cached null
    pub value: Option<Value>,
    /// True when the entry is an explicitly cached null
    pub cached_null: bool,
}

impl GetResponse {
    pub fn new(cache: impl Into<String>, key: impl Into<String>, hit: ValueWrapper) -> Self {
        let cached_null = hit.is_null();
        Self {
            cache: cache.into(),
            key: key.into(),
            value: hit.into_inner(),
            cached_null,
        }
    }
}

/// Response body for `PUT /caches/:cache/:key`
#[derive(Debug, Clone, Serialize)]
pub struct PutResponse {
    /// Success message
    pub message: String,
    pub cache: String,
    pub key: String,
}

impl PutResponse {
    pub fn new(cache: impl Into<String>, key: impl Into<String>) -> Self {
        let (cache, key) = (cache.into(), key.into());
        Self {
            message: format!("Key '{}' stored in '{}'", key, cache),
            cache,
            key,
        }
    }
}

/// Response body for `POST /caches/:cache/:key/if-absent`
#[derive(Debug, Clone, Serialize)]
pub struct PutIfAbsentResponse {
    pub cache: String,
    pub key: String,
    /// True when this request's value was written
    pub stored: bool,
    /// The value already present when nothing was written
    pub existing: Option<Value>,
}

impl PutIfAbsentResponse {
    pub fn new(
        cache: impl Into<String>,
        key: impl Into<String>,
        existing: Option<ValueWrapper>,
    ) -> Self {
        Self {
            cache: cache.into(),
            key: key.into(),
            stored: existing.is_none(),
            existing: existing.and_then(ValueWrapper::into_inner),
        }
    }
}

/// Response body for `DELETE /caches/:cache/:key`
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    pub cache: String,
    pub key: String,
}

impl DeleteResponse {
    pub fn new(cache: impl Into<String>, key: impl Into<String>) -> Self {
        let (cache, key) = (cache.into(), key.into());
        Self {
            message: format!("Key '{}' evicted from '{}'", key, cache),
            cache,
            key,
        }
    }
}

/// Response body for `DELETE /caches/:cache`
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Success message
    pub message: String,
    pub cache: String,
}

impl ClearResponse {
    pub fn new(cache: impl Into<String>) -> Self {
        let cache = cache.into();
        Self {
            message: format!("Cache '{}' cleared", cache),
            cache,
        }
    }
}

/// Response body for `GET /caches`
#[derive(Debug, Clone, Serialize)]
pub struct CacheNamesResponse {
    pub caches: Vec<String>,
}

/// Response body for `GET /caches/:cache/stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub statistics: CacheStatistics,
    /// Entries currently held for this cache, expired ones included
    pub total_entries: usize,
    /// Hit rate (hits / gets)
    pub hit_rate: f64,
}

impl StatsResponse {
    pub fn new(statistics: CacheStatistics, total_entries: usize) -> Self {
        let hit_rate = statistics.hit_rate();
        Self {
            statistics,
            total_entries,
            hit_rate,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_response_cached_null() {
        let resp = GetResponse::new("c", "k", ValueWrapper::new(None));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["value"], Value::Null);
        assert_eq!(json["cached_null"], json!(true));
    }

    #[test]
    fn test_get_response_value() {
        let resp = GetResponse::new("c", "k", ValueWrapper::new(Some(json!([1, 2]))));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["value"], json!([1, 2]));
        assert_eq!(json["cached_null"], json!(false));
    }

    #[test]
    fn test_put_if_absent_response() {
        let stored = PutIfAbsentResponse::new("c", "k", None);
        assert!(stored.stored);
        assert!(stored.existing.is_none());

        let kept = PutIfAbsentResponse::new("c", "k", Some(ValueWrapper::new(Some(json!(1)))));
        assert!(!kept.stored);
        assert_eq!(kept.existing, Some(json!(1)));
    }

    #[test]
    fn test_stats_response_flattens_counters() {
        let mut statistics = CacheStatistics::empty("users");
        statistics.gets = 10;
        statistics.hits = 8;
        statistics.misses = 2;

        let json = serde_json::to_value(StatsResponse::new(statistics, 3)).unwrap();
        assert_eq!(json["cache_name"], json!("users"));
        assert_eq!(json["total_entries"], json!(3));
        assert!((json["hit_rate"].as_f64().unwrap() - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
