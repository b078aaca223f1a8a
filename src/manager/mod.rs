//! Manager Module
//!
//! Cache managers hand out named caches. `StoreCacheManager` builds
//! [`StoreCache`]s over one writer; `SimpleCacheManager` serves a fixed set.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::cache::{Cache, CacheConfiguration, StoreCache};
use crate::store::CacheWriter;

// == Cache Manager ==
/// Lookup of caches by name.
pub trait CacheManager: Send + Sync {
    /// The cache called `name`, or `None` when the manager does not know it.
    fn get_cache(&self, name: &str) -> Option<Arc<dyn Cache>>;

    /// Names of the caches currently known, sorted.
    fn cache_names(&self) -> Vec<String>;
}

// == Store Cache Manager ==
/// Manager of [`StoreCache`]s sharing a single writer.
///
/// Caches are memoized: repeated lookups of a name return the same instance.
#[derive(Debug)]
pub struct StoreCacheManager {
    writer: Arc<dyn CacheWriter>,
    defaults: CacheConfiguration,
    configurations: BTreeMap<String, CacheConfiguration>,
    caches: DashMap<String, Arc<StoreCache>>,
    allow_in_flight_creation: bool,
}

impl StoreCacheManager {
    pub fn builder(
        writer: Arc<dyn CacheWriter>,
        defaults: CacheConfiguration,
    ) -> StoreCacheManagerBuilder {
        StoreCacheManagerBuilder {
            writer,
            defaults,
            configurations: BTreeMap::new(),
            allow_in_flight_creation: true,
        }
    }

    pub fn writer(&self) -> &Arc<dyn CacheWriter> {
        &self.writer
    }

    /// Configuration of every cache created so far, by name.
    pub fn cache_configurations(&self) -> BTreeMap<String, CacheConfiguration> {
        self.caches
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().configuration().clone()))
            .collect()
    }

    /// The concrete cache called `name`.
    pub fn store_cache(&self, name: &str) -> Option<Arc<StoreCache>> {
        if let Some(cache) = self.caches.get(name) {
            return Some(Arc::clone(cache.value()));
        }
        if !self.allow_in_flight_creation {
            return None;
        }

        let cache = self
            .caches
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(cache = name, "Creating cache on the fly");
                Arc::new(self.create_cache(name))
            });
        Some(Arc::clone(cache.value()))
    }

    fn create_cache(&self, name: &str) -> StoreCache {
        let config = self
            .configurations
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.defaults.clone());
        StoreCache::new(name, Arc::clone(&self.writer), config)
    }
}

impl CacheManager for StoreCacheManager {
    fn get_cache(&self, name: &str) -> Option<Arc<dyn Cache>> {
        self.store_cache(name).map(|cache| cache as Arc<dyn Cache>)
    }

    fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }
}

/// Builder for [`StoreCacheManager`].
#[derive(Debug)]
pub struct StoreCacheManagerBuilder {
    writer: Arc<dyn CacheWriter>,
    defaults: CacheConfiguration,
    configurations: BTreeMap<String, CacheConfiguration>,
    allow_in_flight_creation: bool,
}

impl StoreCacheManagerBuilder {
    /// Registers a cache created at build time with its own configuration.
    pub fn with_cache_configuration(
        mut self,
        name: impl Into<String>,
        config: CacheConfiguration,
    ) -> Self {
        self.configurations.insert(name.into(), config);
        self
    }

    /// Registers a cache created at build time with the default configuration.
    pub fn with_initial_cache(self, name: impl Into<String>) -> Self {
        let defaults = self.defaults.clone();
        self.with_cache_configuration(name, defaults)
    }

    /// Unknown names return `None` instead of creating a cache.
    pub fn disable_creating_caches_on_the_fly(mut self) -> Self {
        self.allow_in_flight_creation = false;
        self
    }

    pub fn build(self) -> StoreCacheManager {
        let manager = StoreCacheManager {
            writer: self.writer,
            defaults: self.defaults,
            configurations: self.configurations,
            caches: DashMap::new(),
            allow_in_flight_creation: self.allow_in_flight_creation,
        };

        for name in manager.configurations.keys() {
            let cache = Arc::new(manager.create_cache(name));
            manager.caches.insert(name.clone(), cache);
        }
        manager
    }
}

// == Simple Cache Manager ==
/// Serves a fixed collection of caches.
pub struct SimpleCacheManager {
    caches: BTreeMap<String, Arc<dyn Cache>>,
}

impl SimpleCacheManager {
    pub fn new(caches: Vec<Arc<dyn Cache>>) -> Self {
        Self {
            caches: caches
                .into_iter()
                .map(|cache| (cache.name().to_string(), cache))
                .collect(),
        }
    }
}

impl CacheManager for SimpleCacheManager {
    fn get_cache(&self, name: &str) -> Option<Arc<dyn Cache>> {
        self.caches.get(name).cloned()
    }

    fn cache_names(&self) -> Vec<String> {
        self.caches.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MapCache;
    use crate::store::InMemoryCacheWriter;
    use serde_json::json;
    use std::time::Duration;

    fn defaults() -> CacheConfiguration {
        CacheConfiguration::with_entry_ttl(Duration::from_secs(60))
    }

    fn manager() -> StoreCacheManager {
        StoreCacheManager::builder(Arc::new(InMemoryCacheWriter::new()), defaults())
            .with_cache_configuration("sessions", defaults().entry_ttl(Duration::from_secs(5)))
            .with_initial_cache("users")
            .build()
    }

    #[test]
    fn test_initial_caches_exist_at_build() {
        let manager = manager();
        assert_eq!(manager.cache_names(), vec!["sessions", "users"]);
    }

    #[test]
    fn test_cache_is_memoized() {
        let manager = manager();
        let first = manager.store_cache("orders").unwrap();
        let second = manager.store_cache("orders").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.cache_names(), vec!["orders", "sessions", "users"]);
    }

    #[test]
    fn test_cache_configurations() {
        let manager = manager();
        let configs = manager.cache_configurations();
        assert_eq!(
            configs["sessions"].time_to_live(&"k".into(), None),
            Duration::from_secs(5)
        );
        assert_eq!(
            configs["users"].time_to_live(&"k".into(), None),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_disabled_on_the_fly_creation() {
        let manager = StoreCacheManager::builder(Arc::new(InMemoryCacheWriter::new()), defaults())
            .with_initial_cache("users")
            .disable_creating_caches_on_the_fly()
            .build();

        assert!(manager.get_cache("users").is_some());
        assert!(manager.get_cache("unknown").is_none());
    }

    #[test]
    fn test_caches_share_writer() {
        let writer = InMemoryCacheWriter::new();
        let manager = StoreCacheManager::builder(Arc::new(writer.clone()), defaults()).build();

        manager
            .get_cache("a")
            .unwrap()
            .put(&"k".into(), Some(json!(1)))
            .unwrap();
        manager
            .get_cache("b")
            .unwrap()
            .put(&"k".into(), Some(json!(2)))
            .unwrap();

        assert_eq!(writer.len(), 2);
        assert!(manager.get_cache("a").unwrap().native_store().is_some());
    }

    #[test]
    fn test_simple_manager() {
        let local: Arc<dyn Cache> = Arc::new(MapCache::new("local"));
        let manager = SimpleCacheManager::new(vec![local]);

        assert_eq!(manager.cache_names(), vec!["local"]);
        assert!(manager.get_cache("local").is_some());
        assert!(manager.get_cache("other").is_none());
    }
}
