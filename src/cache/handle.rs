//! Store Handle
//!
//! Native view of a byte-level cache: its name, writer and configuration.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use super::config::CacheConfiguration;
use super::key::CacheKey;
use crate::error::{CacheError, Result};
use crate::store::CacheWriter;

// == Store Handle ==
/// Everything needed to talk to the writer on behalf of one named cache.
///
/// Owns storage-key derivation: every read, write and eviction path goes
/// through [`storage_key`](StoreHandle::storage_key).
#[derive(Debug, Clone)]
pub struct StoreHandle {
    name: String,
    writer: Arc<dyn CacheWriter>,
    config: CacheConfiguration,
}

impl StoreHandle {
    pub fn new(
        name: impl Into<String>,
        writer: Arc<dyn CacheWriter>,
        config: CacheConfiguration,
    ) -> Self {
        Self {
            name: name.into(),
            writer,
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn writer(&self) -> &dyn CacheWriter {
        self.writer.as_ref()
    }

    pub fn config(&self) -> &CacheConfiguration {
        &self.config
    }

    // == Keys ==
    /// Converts, prefixes and serializes `key`.
    pub fn storage_key(&self, key: &CacheKey) -> Result<Vec<u8>> {
        let converted = self.config.key_converter().convert(key)?;
        let text = self.config.key_prefix().prefix_for(&self.name) + &converted;
        Ok(self.config.key_serializer().serialize(&text))
    }

    /// Glob matching every key this cache can write.
    pub fn clear_pattern(&self) -> Vec<u8> {
        let pattern = self.config.key_prefix().prefix_for(&self.name) + "*";
        self.config.key_serializer().serialize(&pattern)
    }

    // == TTL ==
    pub fn time_to_live(&self, key: &CacheKey, value: Option<&Value>) -> Duration {
        self.config.time_to_live(key, value)
    }

    /// TTL to refresh on reads, when time-to-idle is enabled.
    pub fn idle_ttl(&self, key: &CacheKey) -> Option<Duration> {
        self.config
            .is_time_to_idle_enabled()
            .then(|| self.time_to_live(key, None))
    }

    // == Reads ==
    /// Reads the stored bytes for an already derived storage key.
    pub fn read(&self, key: &CacheKey, storage_key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.idle_ttl(key) {
            Some(ttl) => self.writer.get_with_ttl(&self.name, storage_key, ttl),
            None => self.writer.get(&self.name, storage_key),
        }
    }

    // == Values ==
    /// Rejects a null value when the cache does not allow them.
    pub fn check_value(&self, value: Option<Value>) -> Result<Option<Value>> {
        if value.is_none() && !self.config.allow_null_values() {
            return Err(CacheError::NullValueNotAllowed(self.name.clone()));
        }
        Ok(value)
    }

    pub fn is_null_marker(&self, bytes: &[u8]) -> bool {
        bytes == self.config.value_serializer().null_marker()
    }

    /// Serialized form of `value`, the null marker for `None`.
    pub fn serialize_value(&self, value: Option<&Value>) -> Result<Vec<u8>> {
        let serializer = self.config.value_serializer();
        match value {
            Some(value) => serializer.serialize(value),
            None => Ok(serializer.null_marker().to_vec()),
        }
    }
}
