//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

/// Maximum accepted key length, in characters.
pub const MAX_KEY_LENGTH: usize = 256;

/// Request body for `PUT /caches/:cache/:key` and its `if-absent` variant.
///
/// A JSON `null` (or a missing `value`) caches an explicit null.
#[derive(Debug, Clone, Deserialize)]
pub struct PutRequest {
    /// The value to store
    #[serde(default)]
    pub value: Option<Value>,
}

/// Validates a key taken from the request path.
///
/// Returns an error message if validation fails, None if valid.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.chars().count() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} characters",
            MAX_KEY_LENGTH
        ));
    }
    None
}
