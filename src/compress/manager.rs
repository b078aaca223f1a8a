//! Compressing Cache Manager
//!
//! Wraps one cache manager so that every compressible cache it hands out
//! goes through a [`CompressingCache`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::CompressingCache;
use crate::cache::{Cache, CacheConfiguration};
use crate::codec::Threshold;
use crate::manager::{CacheManager, StoreCacheManager};

// == Compressing Cache Manager ==
/// Decorator over a named cache manager with a fixed threshold.
///
/// Caches exposing a native store are wrapped on every lookup; all others are
/// returned untouched.
pub struct CompressingCacheManager<M: CacheManager + ?Sized = dyn CacheManager> {
    delegate: Arc<M>,
    name: String,
    threshold: Threshold,
}

impl<M: CacheManager + ?Sized> CompressingCacheManager<M> {
    pub fn new(delegate: Arc<M>, name: impl Into<String>, threshold: Threshold) -> Self {
        Self {
            delegate,
            name: name.into(),
            threshold,
        }
    }

    /// Name the delegate was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    pub fn delegate(&self) -> &Arc<M> {
        &self.delegate
    }
}

impl CompressingCacheManager<StoreCacheManager> {
    pub fn cache_configurations(&self) -> BTreeMap<String, CacheConfiguration> {
        self.delegate.cache_configurations()
    }
}

impl<M: CacheManager + ?Sized> CacheManager for CompressingCacheManager<M> {
    fn get_cache(&self, name: &str) -> Option<Arc<dyn Cache>> {
        let cache = self.delegate.get_cache(name)?;

        match cache.native_store() {
            Some(handle) => {
                Some(Arc::new(CompressingCache::new(handle, self.threshold)) as Arc<dyn Cache>)
            }
            None => {
                debug!(cache = name, manager = %self.name, "Cache is not compressible");
                Some(cache)
            }
        }
    }

    fn cache_names(&self) -> Vec<String> {
        self.delegate.cache_names()
    }
}

impl<M: CacheManager + ?Sized> fmt::Debug for CompressingCacheManager<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressingCacheManager")
            .field("name", &self.name)
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}
