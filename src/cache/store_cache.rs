//! Store Cache
//!
//! Plain byte-level cache: serialized values go to the writer untouched.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

use super::{AsyncValueLoader, Cache, CacheConfiguration, CacheKey, StoreHandle, ValueWrapper};
use crate::error::{CacheError, Result};
use crate::store::{CacheStatistics, CacheWriter, ASYNC_RETRIEVE_UNSUPPORTED};

// == Store Cache ==
/// A named cache writing raw serialized values through a [`CacheWriter`].
///
/// Entries it writes never carry a compression header.
#[derive(Debug, Clone)]
pub struct StoreCache {
    handle: StoreHandle,
}

impl StoreCache {
    pub fn new(
        name: impl Into<String>,
        writer: Arc<dyn CacheWriter>,
        config: CacheConfiguration,
    ) -> Self {
        Self {
            handle: StoreHandle::new(name, writer, config),
        }
    }

    pub fn configuration(&self) -> &CacheConfiguration {
        self.handle.config()
    }

    pub fn statistics(&self) -> CacheStatistics {
        self.handle.writer().statistics(self.handle.name())
    }

    pub fn clear_statistics(&self) {
        self.handle.writer().clear_statistics(self.handle.name())
    }

    fn decode(&self, bytes: &[u8]) -> Result<ValueWrapper> {
        decode_raw(&self.handle, bytes)
    }
}

fn decode_raw(handle: &StoreHandle, bytes: &[u8]) -> Result<ValueWrapper> {
    if handle.is_null_marker(bytes) {
        return Ok(ValueWrapper::new(None));
    }
    let value = handle.config().value_serializer().deserialize(bytes)?;
    Ok(ValueWrapper::new(Some(value)))
}

impl Cache for StoreCache {
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
        let bytes = self.handle.serialize_value(value.as_ref())?;
        let storage_key = self.handle.storage_key(key)?;
        let ttl = self.handle.time_to_live(key, value.as_ref());

        self.handle
            .writer()
            .put(self.handle.name(), &storage_key, &bytes, ttl)
    }

    fn put_if_absent(&self, key: &CacheKey, value: Option<Value>) -> Result<Option<ValueWrapper>> {
        if value.is_none() && !self.handle.config().allow_null_values() {
            return self.get(key);
        }

        let ttl = self.handle.time_to_live(key, value.as_ref());
        let storage_key = self.handle.storage_key(key)?;
        let bytes = self.handle.serialize_value(value.as_ref())?;

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

    fn retrieve(&self, key: &CacheKey) -> Result<BoxFuture<'static, Result<Option<ValueWrapper>>>> {
        if !self.handle.writer().supports_async_retrieve() {
            return Err(CacheError::UnsupportedCapability(
                ASYNC_RETRIEVE_UNSUPPORTED.to_string(),
            ));
        }

        let storage_key = self.handle.storage_key(key)?;
        let pending = self
            .handle
            .writer()
            .retrieve(self.handle.name(), storage_key, self.handle.idle_ttl(key));
        let handle = self.handle.clone();

        Ok(async move {
            pending
                .await?
                .map(|bytes| decode_raw(&handle, &bytes))
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
        let handle = self.handle.clone();
        let key = key.clone();

        Ok(async move {
            if let Some(hit) = lookup.await? {
                return Ok(hit.into_inner());
            }

            let loaded = loader().await.map_err(|source| CacheError::ValueRetrieval {
                key: key.to_string(),
                source,
            })?;
            let value = handle.check_value(loaded)?;
            let storage_key = handle.storage_key(&key)?;
            let bytes = handle.serialize_value(value.as_ref())?;
            let ttl = handle.time_to_live(&key, value.as_ref());

            handle
                .writer()
                .store(handle.name(), storage_key, bytes, ttl)
                .await?;
            Ok(value)
        }
        .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::store::InMemoryCacheWriter;
    use serde_json::json;
    use std::time::Duration;

    fn cache_with(writer: &InMemoryCacheWriter, config: CacheConfiguration) -> StoreCache {
        StoreCache::new("plain", Arc::new(writer.clone()), config)
    }

    fn config() -> CacheConfiguration {
        CacheConfiguration::with_entry_ttl(Duration::from_secs(60))
    }

    #[test]
    fn test_put_stores_raw_serialized_bytes() {
        let writer = InMemoryCacheWriter::new();
        let cache = cache_with(&writer, config());

        cache.put(&"k".into(), Some(json!({"a": 1}))).unwrap();

        let stored = writer.get("plain", b"plain::k").unwrap().unwrap();
        assert_eq!(stored, br#"{"a":1}"#);
        assert_eq!(
            cache.get(&"k".into()).unwrap(),
            Some(ValueWrapper::new(Some(json!({"a": 1}))))
        );
    }

    #[test]
    fn test_miss_and_null_are_distinct() {
        let writer = InMemoryCacheWriter::new();
        let cache = cache_with(&writer, config());

        assert_eq!(cache.get(&"absent".into()).unwrap(), None);

        cache.put(&"nothing".into(), None).unwrap();
        let hit = cache.get(&"nothing".into()).unwrap().unwrap();
        assert!(hit.is_null());
    }

    #[test]
    fn test_put_if_absent_keeps_first() {
        let writer = InMemoryCacheWriter::new();
        let cache = cache_with(&writer, config());

        assert_eq!(cache.put_if_absent(&"k".into(), Some(json!(1))).unwrap(), None);
        let existing = cache.put_if_absent(&"k".into(), Some(json!(2))).unwrap();

        assert_eq!(existing, Some(ValueWrapper::new(Some(json!(1)))));
    }

    #[test]
    fn test_evict_and_clear() {
        let writer = InMemoryCacheWriter::new();
        let cache = cache_with(&writer, config());

        cache.put(&"a".into(), Some(json!(1))).unwrap();
        cache.put(&"b".into(), Some(json!(2))).unwrap();
        cache.evict(&"a".into()).unwrap();
        assert_eq!(cache.get(&"a".into()).unwrap(), None);

        cache.clear().unwrap();
        assert!(writer.is_empty());
        assert_eq!(cache.statistics().deletes, 2);
    }

    #[test]
    fn test_get_with_loader_default_method() {
        let writer = InMemoryCacheWriter::new();
        let cache = cache_with(&writer, config());

        let value = cache
            .get_with_loader(&"k".into(), Box::new(|| Ok::<_, BoxError>(Some(json!("loaded")))))
            .unwrap();
        assert_eq!(value, Some(json!("loaded")));

        let cached = cache
            .get_with_loader(
                &"k".into(),
                Box::new(|| Err::<Option<Value>, BoxError>("must not run".into())),
            )
            .unwrap();
        assert_eq!(cached, Some(json!("loaded")));
    }

    #[test]
    fn test_retrieve_unsupported() {
        let writer = InMemoryCacheWriter::without_async_retrieve();
        let cache = cache_with(&writer, config());

        assert!(matches!(
            cache.retrieve(&"k".into()),
            Err(CacheError::UnsupportedCapability(_))
        ));
    }

    #[test]
    fn test_retrieve_with_loader_stores_value() {
        let writer = InMemoryCacheWriter::new();
        let cache = cache_with(&writer, config());

        let pending = cache
            .retrieve_with_loader(
                &"k".into(),
                Box::new(|| async { Ok::<_, BoxError>(Some(json!(7))) }.boxed()),
            )
            .unwrap();
        assert_eq!(tokio_test::block_on(pending).unwrap(), Some(json!(7)));
        assert_eq!(
            cache.get(&"k".into()).unwrap(),
            Some(ValueWrapper::new(Some(json!(7))))
        );
    }
}
