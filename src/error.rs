//! Error types for the compressing cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Boxed error carried as the cause of wrapped failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// == Cache Error Enum ==
/// Unified error type for cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Compression, decompression, serialize or deserialize failure
    #[error("Serialization failed: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Logical key has no storage text form
    #[error("Key conversion failed: {0}")]
    KeyConversion(String),

    /// The backing store lacks the requested capability
    #[error("Unsupported operation: {0}")]
    UnsupportedCapability(String),

    /// A value loader failed on a cache miss
    #[error("Value for key '{key}' could not be loaded")]
    ValueRetrieval {
        key: String,
        #[source]
        source: BoxError,
    },

    /// A null value was offered to a cache that does not allow them
    #[error("Cache '{0}' does not allow null values")]
    NullValueNotAllowed(String),

    /// Cache or key not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl CacheError {
    /// Builds a serialization error with an underlying cause.
    pub fn serialization(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        CacheError::Serialization {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Builds a serialization error without an underlying cause.
    pub fn serialization_msg(message: impl Into<String>) -> Self {
        CacheError::Serialization {
            message: message.into(),
            source: None,
        }
    }

    /// Whether a caller may reasonably retry the failed operation.
    ///
    /// Only loader failures qualify; serialization and key conversion
    /// failures are deterministic.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CacheError::ValueRetrieval { .. })
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_)
            | CacheError::KeyConversion(_)
            | CacheError::NullValueNotAllowed(_) => StatusCode::BAD_REQUEST,
            CacheError::UnsupportedCapability(_) => StatusCode::NOT_IMPLEMENTED,
            CacheError::ValueRetrieval { .. } => StatusCode::BAD_GATEWAY,
            CacheError::Serialization { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_retryable_classification() {
        let retrieval = CacheError::ValueRetrieval {
            key: "k".to_string(),
            source: "boom".into(),
        };
        assert!(retrieval.is_retryable());
        assert!(!CacheError::KeyConversion("k".to_string()).is_retryable());
        assert!(!CacheError::serialization_msg("bad").is_retryable());
    }

    #[test]
    fn test_value_retrieval_keeps_cause() {
        let err = CacheError::ValueRetrieval {
            key: "user:1".to_string(),
            source: "database offline".into(),
        };
        assert!(err.to_string().contains("user:1"));
        assert_eq!(err.source().unwrap().to_string(), "database offline");
    }

    #[test]
    fn test_error_status_codes() {
        let test_cases = vec![
            (CacheError::NotFound("key".to_string()), StatusCode::NOT_FOUND),
            (CacheError::InvalidRequest("bad".to_string()), StatusCode::BAD_REQUEST),
            (CacheError::KeyConversion("k".to_string()), StatusCode::BAD_REQUEST),
            (CacheError::NullValueNotAllowed("c".to_string()), StatusCode::BAD_REQUEST),
            (
                CacheError::UnsupportedCapability("async".to_string()),
                StatusCode::NOT_IMPLEMENTED,
            ),
            (
                CacheError::ValueRetrieval {
                    key: "k".to_string(),
                    source: "down".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                CacheError::serialization_msg("corrupt"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected_status) in test_cases {
            let response = error.into_response();
            assert_eq!(response.status(), expected_status);
        }
    }
}
