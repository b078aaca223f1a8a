//! Cache Configuration
//!
//! Per-cache settings shared by every cache built over a writer.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use super::key::{CacheKey, KeyConverter, StandardKeyConverter};
use super::serializer::{JsonValueSerializer, KeySerializer, StringKeySerializer, ValueSerializer};

// == TTL Function ==
/// Computes the time-to-live of an entry from its key and value.
///
/// `value` is `None` for nulls and for reads that refresh an idle expiry.
/// [`Duration::ZERO`] means the entry never expires.
pub trait TtlFunction: Send + Sync {
    fn time_to_live(&self, key: &CacheKey, value: Option<&Value>) -> Duration;
}

impl<F> TtlFunction for F
where
    F: Fn(&CacheKey, Option<&Value>) -> Duration + Send + Sync,
{
    fn time_to_live(&self, key: &CacheKey, value: Option<&Value>) -> Duration {
        self(key, value)
    }
}

/// Same TTL for every entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTtl(pub Duration);

impl TtlFunction for FixedTtl {
    fn time_to_live(&self, _key: &CacheKey, _value: Option<&Value>) -> Duration {
        self.0
    }
}

// == Key Prefix ==
/// How the storage key text is prefixed before serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPrefix {
    /// Keys are stored exactly as converted
    Disabled,
    /// `"{cache}::"`
    CacheName,
    /// `"{prefix}{cache}::"`
    Prefixed(String),
}

impl KeyPrefix {
    /// Prefix text for keys of cache `name`.
    pub fn prefix_for(&self, name: &str) -> String {
        match self {
            KeyPrefix::Disabled => String::new(),
            KeyPrefix::CacheName => format!("{}::", name),
            KeyPrefix::Prefixed(prefix) => format!("{}{}::", prefix, name),
        }
    }
}

// == Cache Configuration ==
/// Immutable settings for one byte-level cache.
///
/// There is no default TTL; callers must choose one.
#[derive(Clone)]
pub struct CacheConfiguration {
    ttl: Arc<dyn TtlFunction>,
    allow_null_values: bool,
    time_to_idle: bool,
    key_prefix: KeyPrefix,
    key_converter: Arc<dyn KeyConverter>,
    key_serializer: Arc<dyn KeySerializer>,
    value_serializer: Arc<dyn ValueSerializer>,
}

impl CacheConfiguration {
    /// Creates a configuration with the given TTL function.
    ///
    /// Null values are allowed, keys are prefixed with the cache name, values
    /// are JSON and keys UTF-8.
    pub fn new(ttl: impl TtlFunction + 'static) -> Self {
        Self {
            ttl: Arc::new(ttl),
            allow_null_values: true,
            time_to_idle: false,
            key_prefix: KeyPrefix::CacheName,
            key_converter: Arc::new(StandardKeyConverter::new()),
            key_serializer: Arc::new(StringKeySerializer),
            value_serializer: Arc::new(JsonValueSerializer),
        }
    }

    /// Shorthand for a fixed TTL.
    pub fn with_entry_ttl(ttl: Duration) -> Self {
        Self::new(FixedTtl(ttl))
    }

    pub fn entry_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Arc::new(FixedTtl(ttl));
        self
    }

    pub fn ttl_function(mut self, ttl: impl TtlFunction + 'static) -> Self {
        self.ttl = Arc::new(ttl);
        self
    }

    pub fn disable_caching_null_values(mut self) -> Self {
        self.allow_null_values = false;
        self
    }

    /// Reads refresh the entry's expiry with the TTL computed for its key.
    pub fn enable_time_to_idle(mut self) -> Self {
        self.time_to_idle = true;
        self
    }

    pub fn disable_key_prefix(mut self) -> Self {
        self.key_prefix = KeyPrefix::Disabled;
        self
    }

    pub fn prefix_cache_name_with(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = KeyPrefix::Prefixed(prefix.into());
        self
    }

    pub fn with_key_converter(mut self, converter: impl KeyConverter + 'static) -> Self {
        self.key_converter = Arc::new(converter);
        self
    }

    pub fn serialize_keys_with(mut self, serializer: impl KeySerializer + 'static) -> Self {
        self.key_serializer = Arc::new(serializer);
        self
    }

    pub fn serialize_values_with(mut self, serializer: impl ValueSerializer + 'static) -> Self {
        self.value_serializer = Arc::new(serializer);
        self
    }

    // == Accessors ==
    pub fn allow_null_values(&self) -> bool {
        self.allow_null_values
    }

    pub fn is_time_to_idle_enabled(&self) -> bool {
        self.time_to_idle
    }

    pub fn key_prefix(&self) -> &KeyPrefix {
        &self.key_prefix
    }

    pub fn key_converter(&self) -> &dyn KeyConverter {
        self.key_converter.as_ref()
    }

    pub fn key_serializer(&self) -> &dyn KeySerializer {
        self.key_serializer.as_ref()
    }

    pub fn value_serializer(&self) -> &dyn ValueSerializer {
        self.value_serializer.as_ref()
    }

    pub fn time_to_live(&self, key: &CacheKey, value: Option<&Value>) -> Duration {
        self.ttl.time_to_live(key, value)
    }
}

impl fmt::Debug for CacheConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfiguration")
            .field("allow_null_values", &self.allow_null_values)
            .field("time_to_idle", &self.time_to_idle)
            .field("key_prefix", &self.key_prefix)
            .field("key_converter", &self.key_converter)
            .field("key_serializer", &self.key_serializer)
            .field("value_serializer", &self.value_serializer)
            .finish_non_exhaustive()
    }
}
