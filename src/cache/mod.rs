//! Cache Module
//!
//! The cache abstraction plus the plain byte-level and in-process caches that
//! cache managers hand out.

mod config;
mod handle;
mod key;
mod map_cache;
mod serializer;
mod store_cache;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{BoxError, CacheError, Result};

// Re-export public types
pub use config::{CacheConfiguration, FixedTtl, KeyPrefix, TtlFunction};
pub use handle::StoreHandle;
pub use key::{CacheKey, KeyConverter, StandardKeyConverter};
pub use map_cache::MapCache;
pub use serializer::{
    JsonValueSerializer, KeySerializer, StringKeySerializer, StringValueSerializer,
    ValueSerializer,
};
pub use store_cache::StoreCache;

/// Synchronous loader invoked on a cache miss.
pub type ValueLoader<'a> =
    Box<dyn FnOnce() -> std::result::Result<Option<Value>, BoxError> + Send + 'a>;

/// Future-producing loader invoked on a cache miss.
pub type AsyncValueLoader = Box<
    dyn FnOnce() -> BoxFuture<'static, std::result::Result<Option<Value>, BoxError>> + Send,
>;

// == Value Wrapper ==
/// A cache hit. Holds `None` when the cached value is an explicit null.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueWrapper(Option<Value>);

impl ValueWrapper {
    pub fn new(value: Option<Value>) -> Self {
        Self(value)
    }

    pub fn get(&self) -> Option<&Value> {
        self.0.as_ref()
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    pub fn into_inner(self) -> Option<Value> {
        self.0
    }

    /// Deserializes the wrapped value into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        self.0
            .as_ref()
            .map(|value| {
                T::deserialize(value)
                    .map_err(|e| CacheError::serialization("Unable to convert cached value", e))
            })
            .transpose()
    }
}

// == Cache ==
/// A named cache of JSON values.
///
/// `get` returns `Ok(None)` on a miss and `Ok(Some(wrapper))` on a hit, where
/// the wrapper may hold an explicit null. The `retrieve*` methods return their
/// future inside a `Result` so that capability errors surface before any
/// asynchronous work starts.
pub trait Cache: Send + Sync {
    fn name(&self) -> &str;

    /// The byte-level store behind this cache, if it has one.
    ///
    /// Caches exposing a handle can be wrapped with compression.
    fn native_store(&self) -> Option<StoreHandle> {
        None
    }

    fn get(&self, key: &CacheKey) -> Result<Option<ValueWrapper>>;

    /// Stores `value`; `None` caches an explicit null.
    fn put(&self, key: &CacheKey, value: Option<Value>) -> Result<()>;

    /// Stores `value` unless an entry exists, returning the existing entry.
    fn put_if_absent(&self, key: &CacheKey, value: Option<Value>) -> Result<Option<ValueWrapper>>;

    fn evict(&self, key: &CacheKey) -> Result<()>;

    fn clear(&self) -> Result<()>;

    /// Returns the cached value, loading and storing it on a miss.
    ///
    /// Loader failures come back as [`CacheError::ValueRetrieval`]. There is
    /// no single-flight: concurrent misses may each run their loader.
    fn get_with_loader(&self, key: &CacheKey, loader: ValueLoader<'_>) -> Result<Option<Value>> {
        if let Some(hit) = self.get(key)? {
            return Ok(hit.into_inner());
        }

        let value = loader().map_err(|source| CacheError::ValueRetrieval {
            key: key.to_string(),
            source,
        })?;
        self.put(key, value.clone())?;
        Ok(value)
    }

    fn retrieve(&self, key: &CacheKey) -> Result<BoxFuture<'static, Result<Option<ValueWrapper>>>>;

    fn retrieve_with_loader(
        &self,
        key: &CacheKey,
        loader: AsyncValueLoader,
    ) -> Result<BoxFuture<'static, Result<Option<Value>>>>;
}
