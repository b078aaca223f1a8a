//! Map Cache
//!
//! In-process cache of JSON values with no byte-level store behind it.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;

use super::{AsyncValueLoader, Cache, CacheKey, KeyConverter, StandardKeyConverter, ValueWrapper};
use crate::error::{CacheError, Result};

// == Map Cache ==
/// Concurrent map cache. Values are kept as-is, so there is nothing to compress.
#[derive(Debug, Clone)]
pub struct MapCache {
    name: String,
    entries: Arc<DashMap<String, Option<Value>>>,
    converter: Arc<StandardKeyConverter>,
    allow_null_values: bool,
}

impl MapCache {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Arc::new(DashMap::new()),
            converter: Arc::new(StandardKeyConverter::new()),
            allow_null_values: true,
        }
    }

    pub fn disable_caching_null_values(mut self) -> Self {
        self.allow_null_values = false;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check_value(&self, value: Option<Value>) -> Result<Option<Value>> {
        if value.is_none() && !self.allow_null_values {
            return Err(CacheError::NullValueNotAllowed(self.name.clone()));
        }
        Ok(value)
    }
}

impl Cache for MapCache {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &CacheKey) -> Result<Option<ValueWrapper>> {
        let key = self.converter.convert(key)?;
        Ok(self
            .entries
            .get(&key)
            .map(|entry| ValueWrapper::new(entry.value().clone())))
    }

    fn put(&self, key: &CacheKey, value: Option<Value>) -> Result<()> {
        let value = self.check_value(value)?;
        self.entries.insert(self.converter.convert(key)?, value);
        Ok(())
    }

    fn put_if_absent(&self, key: &CacheKey, value: Option<Value>) -> Result<Option<ValueWrapper>> {
        if value.is_none() && !self.allow_null_values {
            return self.get(key);
        }

        match self.entries.entry(self.converter.convert(key)?) {
            Entry::Occupied(occupied) => Ok(Some(ValueWrapper::new(occupied.get().clone()))),
            Entry::Vacant(vacant) => {
                vacant.insert(value);
                Ok(None)
            }
        }
    }

    fn evict(&self, key: &CacheKey) -> Result<()> {
        self.entries.remove(&self.converter.convert(key)?);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }

    fn retrieve(&self, key: &CacheKey) -> Result<BoxFuture<'static, Result<Option<ValueWrapper>>>> {
        let hit = self.get(key)?;
        Ok(future::ready(Ok(hit)).boxed())
    }

    fn retrieve_with_loader(
        &self,
        key: &CacheKey,
        loader: AsyncValueLoader,
    ) -> Result<BoxFuture<'static, Result<Option<Value>>>> {
        let cache = self.clone();
        let key = key.clone();

        Ok(async move {
            if let Some(hit) = cache.get(&key)? {
                return Ok(hit.into_inner());
            }
            let value = loader().await.map_err(|source| CacheError::ValueRetrieval {
                key: key.to_string(),
                source,
            })?;
            cache.put(&key, value.clone())?;
            Ok(value)
        }
        .boxed())
    }
}
