//! Serializers
//!
//! Key and value serialization pairs used by the byte-level caches.

use std::fmt;

use serde_json::Value;

use crate::codec::NULL_VALUE;
use crate::error::{CacheError, Result};

// == Value Serializer ==
/// Converts cache values to and from the bytes handed to the writer.
pub trait ValueSerializer: Send + Sync + fmt::Debug {
    fn serialize(&self, value: &Value) -> Result<Vec<u8>>;

    fn deserialize(&self, bytes: &[u8]) -> Result<Value>;

    /// Bytes representing an explicitly cached null.
    ///
    /// Must never collide with the output of [`serialize`](ValueSerializer::serialize).
    fn null_marker(&self) -> &[u8] {
        NULL_VALUE
    }
}

/// Serializes any JSON value as compact JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonValueSerializer;

impl ValueSerializer for JsonValueSerializer {
    fn serialize(&self, value: &Value) -> Result<Vec<u8>> {
        serde_json::to_vec(value)
            .map_err(|e| CacheError::serialization("Unable to serialize value", e))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Value> {
        serde_json::from_slice(bytes)
            .map_err(|e| CacheError::serialization("Unable to deserialize value", e))
    }
}

/// Stores string values as their raw UTF-8 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringValueSerializer;

impl ValueSerializer for StringValueSerializer {
    fn serialize(&self, value: &Value) -> Result<Vec<u8>> {
        match value {
            Value::String(s) => Ok(s.as_bytes().to_vec()),
            other => Err(CacheError::serialization_msg(format!(
                "StringValueSerializer only accepts strings, got {}",
                json_kind(other)
            ))),
        }
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Value> {
        std::str::from_utf8(bytes)
            .map(|s| Value::String(s.to_string()))
            .map_err(|e| CacheError::serialization("Stored value is not valid UTF-8", e))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// == Key Serializer ==
/// Converts the prefixed key text into storage key bytes.
pub trait KeySerializer: Send + Sync + fmt::Debug {
    fn serialize(&self, key: &str) -> Vec<u8>;
}

/// UTF-8 key bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringKeySerializer;

impl KeySerializer for StringKeySerializer {
    fn serialize(&self, key: &str) -> Vec<u8> {
        key.as_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_roundtrip() {
        let value = json!({"name": "ada", "tags": [1, 2, 3]});
        let bytes = JsonValueSerializer.serialize(&value).unwrap();
        assert_eq!(JsonValueSerializer.deserialize(&bytes).unwrap(), value);
    }

    #[test]
    fn test_json_string_length_includes_quotes() {
        let bytes = JsonValueSerializer.serialize(&json!("abc")).unwrap();
        assert_eq!(bytes, br#""abc""#);
    }

    #[test]
    fn test_json_rejects_garbage() {
        let result = JsonValueSerializer.deserialize(b"{not json");
        assert!(matches!(result, Err(CacheError::Serialization { .. })));
    }

    #[test]
    fn test_string_serializer_raw_bytes() {
        let bytes = StringValueSerializer.serialize(&json!("plain")).unwrap();
        assert_eq!(bytes, b"plain");
        assert_eq!(StringValueSerializer.deserialize(&bytes).unwrap(), json!("plain"));
    }

    #[test]
    fn test_string_serializer_rejects_non_strings() {
        let result = StringValueSerializer.serialize(&json!({"a": 1}));
        assert!(matches!(result, Err(CacheError::Serialization { .. })));
    }

    #[test]
    fn test_null_marker_is_not_producible() {
        assert!(std::str::from_utf8(JsonValueSerializer.null_marker()).is_err());
        assert!(StringValueSerializer.deserialize(NULL_VALUE).is_err());
    }

    #[test]
    fn test_key_serializer_utf8() {
        assert_eq!(StringKeySerializer.serialize("users::1"), b"users::1");
    }
}
