//! Compressing Cache
//!
//! Decorator over a byte-level cache that gzips serialized values at or above
//! a size threshold and transparently inflates them on read.

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tracing::debug;

use crate::cache::{AsyncValueLoader, Cache, CacheKey, StoreHandle, ValueLoader, ValueWrapper};
use crate::codec::{self, Threshold};
use crate::error::{CacheError, Result};
use crate::store::{CacheStatistics, ASYNC_RETRIEVE_UNSUPPORTED};

// == Compressing Cache ==
/// A named cache whose writes pass through the threshold policy.
///
/// Reads accept both envelopes: gzip streams are inflated, anything else is
/// deserialized as-is. Holds no state beyond the handle and threshold.
#[derive(Debug, Clone)]
pub struct CompressingCache {
    handle: StoreHandle,
    threshold: Threshold,
}

impl CompressingCache {
    pub fn new(handle: StoreHandle, threshold: Threshold) -> Self {
        Self { handle, threshold }
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    pub fn handle(&self) -> &StoreHandle {
        &self.handle
    }

    pub fn statistics(&self) -> CacheStatistics {
        self.handle.writer().statistics(self.handle.name())
    }

    pub fn clear_statistics(&self) {
        self.handle.writer().clear_statistics(self.handle.name())
    }

    // == Envelope ==
    /// Bytes to store for `value`. Nulls become the marker and are never compressed.
    fn encode(&self, value: Option<&Value>) -> Result<Vec<u8>> {
        let Some(value) = value else {
            return self.handle.serialize_value(None);
        };

        let serialized = self.handle.serialize_value(Some(value))?;
        if !self.threshold.should_compress(serialized.len()) {
            debug!(
                cache = self.handle.name(),
                size = serialized.len(),
                threshold = self.threshold.bytes(),
                "Storing value uncompressed"
            );
            return Ok(serialized);
        }

        let compressed = codec::compress(&serialized)?;
        debug!(
            cache = self.handle.name(),
            size = serialized.len(),
            compressed = compressed.len(),
            "Compressed value"
        );
        Ok(compressed)
    }

    fn decode(&self, bytes: &[u8]) -> Result<ValueWrapper> {
        decode_envelope(&self.handle, bytes)
    }

    /// Serializes, compresses if needed and writes `value` synchronously.
    fn write(&self, key: &CacheKey, value: Option<&Value>) -> Result<()> {
        let bytes = self.encode(value)?;
        let storage_key = self.handle.storage_key(key)?;
        let ttl = self.handle.time_to_live(key, value);

        self.handle
            .writer()
            .put(self.handle.name(), &storage_key, &bytes, ttl)
    }

    fn ensure_async_retrieve(&self) -> Result<()> {
        if self.handle.writer().supports_async_retrieve() {
            Ok(())
        } else {
            Err(CacheError::UnsupportedCapability(
                ASYNC_RETRIEVE_UNSUPPORTED.to_string(),
            ))
        }
    }
}

/// The null marker is checked before any decompression.
fn decode_envelope(handle: &StoreHandle, bytes: &[u8]) -> Result<ValueWrapper> {
    if handle.is_null_marker(bytes) {
        return Ok(ValueWrapper::new(None));
    }

    let raw = if codec::is_compressed(bytes) {
        codec::decompress(bytes)?
    } else {
        bytes.into()
    };
    let value = handle.config().value_serializer().deserialize(&raw)?;
    Ok(ValueWrapper::new(Some(value)))
}

fn retrieval_error(key: &CacheKey, source: crate::error::BoxError) -> CacheError {
    CacheError::ValueRetrieval {
        key: key.to_string(),
        source,
    }
}

impl Cache for CompressingCache {
    fn name(&self) -> &str {
        self.handle.name()
    }

    fn native_store(&self) -> Option<StoreHandle> {
        Some(self.handle.clone())
    }

    fn get(&self, key: &CacheKey) -> Result<Option<ValueWrapper>> {
        let storage_key = self.handle.storage_key(key)?;
        self.handle
            .read(key, &storage_key)?
            .map(|bytes| self.decode(&bytes))
            .transpose()
    }

    fn put(&self, key: &CacheKey, value: Option<Value>) -> Result<()> {
        let value = self.handle.check_value(value)?;
        self.write(key, value.as_ref())
    }

    fn put_if_absent(&self, key: &CacheKey, value: Option<Value>) -> Result<Option<ValueWrapper>> {
        if value.is_none() && !self.handle.config().allow_null_values() {
            return self.get(key);
        }

        let ttl = self.handle.time_to_live(key, value.as_ref());
        let storage_key = self.handle.storage_key(key)?;
        let bytes = self.encode(value.as_ref())?;

        self.handle
            .writer()
            .put_if_absent(self.handle.name(), &storage_key, &bytes, ttl)?
            .map(|existing| self.decode(&existing))
            .transpose()
    }

    fn evict(&self, key: &CacheKey) -> Result<()> {
        let storage_key = self.handle.storage_key(key)?;
        self.handle.writer().remove(self.handle.name(), &storage_key)
    }

    fn clear(&self) -> Result<()> {
        self.handle
            .writer()
            .clean(self.handle.name(), &self.handle.clear_pattern())
    }

    fn get_with_loader(&self, key: &CacheKey, loader: ValueLoader<'_>) -> Result<Option<Value>> {
        if let Some(hit) = self.get(key)? {
            return Ok(hit.into_inner());
        }

        let loaded = loader().map_err(|source| retrieval_error(key, source))?;
        let value = self.handle.check_value(loaded)?;
        self.write(key, value.as_ref())?;
        Ok(value)
    }

    fn retrieve(&self, key: &CacheKey) -> Result<BoxFuture<'static, Result<Option<ValueWrapper>>>> {
        self.ensure_async_retrieve()?;

        let storage_key = self.handle.storage_key(key)?;
        let pending = self
            .handle
            .writer()
            .retrieve(self.handle.name(), storage_key, self.handle.idle_ttl(key));
        let handle = self.handle.clone();

        Ok(async move {
            pending
                .await?
                .map(|bytes| decode_envelope(&handle, &bytes))
                .transpose()
        }
        .boxed())
    }

    fn retrieve_with_loader(
        &self,
        key: &CacheKey,
        loader: AsyncValueLoader,
    ) -> Result<BoxFuture<'static, Result<Option<Value>>>> {
        let lookup = self.retrieve(key)?;
        let cache = self.clone();
        let key = key.clone();

        Ok(async move {
            if let Some(hit) = lookup.await? {
                return Ok(hit.into_inner());
            }

            let loaded = loader().await.map_err(|source| retrieval_error(&key, source))?;
            let value = cache.handle.check_value(loaded)?;
            let bytes = cache.encode(value.as_ref())?;
            let storage_key = cache.handle.storage_key(&key)?;
            let ttl = cache.handle.time_to_live(&key, value.as_ref());

            cache
                .handle
                .writer()
                .store(cache.handle.name(), storage_key, bytes, ttl)
                .await?;
            Ok(value)
        }
        .boxed())
    }
}
