//! In-Memory Cache Writer
//!
//! Sharded byte store standing in for a remote key-value server.

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt};
use tracing::debug;

use super::{glob_matches, CacheStatistics, CacheWriter, StatsCounter, StoredEntry};
use crate::error::Result;

type EntryKey = (String, Vec<u8>);

#[derive(Debug)]
struct Inner {
    entries: DashMap<EntryKey, StoredEntry>,
    stats: DashMap<String, Arc<StatsCounter>>,
    async_retrieve: bool,
}

// == In-Memory Cache Writer ==
/// Byte-level store keyed by `(cache name, key bytes)`.
///
/// Cloning is cheap and every clone shares the same entries. Expired entries
/// read as absent and are dropped on access or by
/// [`cleanup_expired`](InMemoryCacheWriter::cleanup_expired).
#[derive(Debug, Clone)]
pub struct InMemoryCacheWriter {
    inner: Arc<Inner>,
}

impl Default for InMemoryCacheWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCacheWriter {
    // == Constructor ==
    /// Creates an empty writer with future-based retrieval enabled.
    pub fn new() -> Self {
        Self::with_async_retrieve(true)
    }

    /// Creates an empty writer that reports no async retrieve capability.
    pub fn without_async_retrieve() -> Self {
        Self::with_async_retrieve(false)
    }

    fn with_async_retrieve(async_retrieve: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                stats: DashMap::new(),
                async_retrieve,
            }),
        }
    }

    fn counter(&self, name: &str) -> Arc<StatsCounter> {
        if let Some(counter) = self.inner.stats.get(name) {
            return Arc::clone(counter.value());
        }
        let counter = self.inner.stats.entry(name.to_string()).or_default();
        Arc::clone(counter.value())
    }

    // == Read ==
    fn read(&self, name: &str, key: &[u8], idle_ttl: Option<Duration>) -> Option<Vec<u8>> {
        let entry_key = (name.to_string(), key.to_vec());

        let (value, expired) = match self.inner.entries.get_mut(&entry_key) {
            Some(mut entry) if !entry.is_expired() => {
                if let Some(ttl) = idle_ttl {
                    entry.touch(ttl);
                }
                (Some(entry.value.clone()), false)
            }
            Some(_) => (None, true),
            None => (None, false),
        };

        if expired {
            self.inner
                .entries
                .remove_if(&entry_key, |_, entry| entry.is_expired());
        }

        self.counter(name).record_get(value.is_some());
        value
    }

    fn write(&self, name: &str, key: &[u8], value: &[u8], ttl: Duration) {
        self.inner.entries.insert(
            (name.to_string(), key.to_vec()),
            StoredEntry::new(value.to_vec(), ttl),
        );
        self.counter(name).record_put();
    }

    // == Cleanup Expired ==
    /// Removes all expired entries across every cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut removed = 0;
        self.inner.entries.retain(|_, entry| {
            let expired = entry.is_expired();
            if expired {
                removed += 1;
            }
            !expired
        });
        removed
    }

    // == Length ==
    /// Returns the number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Returns the number of entries stored for cache `name`.
    pub fn entry_count(&self, name: &str) -> usize {
        self.inner
            .entries
            .iter()
            .filter(|entry| entry.key().0 == name)
            .count()
    }
}

impl CacheWriter for InMemoryCacheWriter {
    fn get(&self, name: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.read(name, key, None))
    }

    fn get_with_ttl(&self, name: &str, key: &[u8], ttl: Duration) -> Result<Option<Vec<u8>>> {
        Ok(self.read(name, key, Some(ttl)))
    }

    fn put(&self, name: &str, key: &[u8], value: &[u8], ttl: Duration) -> Result<()> {
        self.write(name, key, value, ttl);
        Ok(())
    }

    fn put_if_absent(
        &self,
        name: &str,
        key: &[u8],
        value: &[u8],
        ttl: Duration,
    ) -> Result<Option<Vec<u8>>> {
        let existing = match self.inner.entries.entry((name.to_string(), key.to_vec())) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired() {
                    occupied.insert(StoredEntry::new(value.to_vec(), ttl));
                    None
                } else {
                    Some(occupied.get().value.clone())
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(StoredEntry::new(value.to_vec(), ttl));
                None
            }
        };

        if existing.is_none() {
            self.counter(name).record_put();
        }
        Ok(existing)
    }

    fn remove(&self, name: &str, key: &[u8]) -> Result<()> {
        if self
            .inner
            .entries
            .remove(&(name.to_string(), key.to_vec()))
            .is_some()
        {
            self.counter(name).record_deletes(1);
        }
        Ok(())
    }

    fn clean(&self, name: &str, pattern: &[u8]) -> Result<()> {
        let mut removed = 0u64;
        self.inner.entries.retain(|(cache, key), _| {
            let matched = cache == name && glob_matches(pattern, key);
            if matched {
                removed += 1;
            }
            !matched
        });

        debug!("Cleaned {} entries from cache '{}'", removed, name);
        self.counter(name).record_deletes(removed);
        Ok(())
    }

    fn supports_async_retrieve(&self) -> bool {
        self.inner.async_retrieve
    }

    fn retrieve(
        &self,
        name: &str,
        key: Vec<u8>,
        idle_ttl: Option<Duration>,
    ) -> BoxFuture<'static, Result<Option<Vec<u8>>>> {
        let writer = self.clone();
        let name = name.to_string();
        async move { Ok(writer.read(&name, &key, idle_ttl)) }.boxed()
    }

    fn store(
        &self,
        name: &str,
        key: Vec<u8>,
        value: Vec<u8>,
        ttl: Duration,
    ) -> BoxFuture<'static, Result<()>> {
        let writer = self.clone();
        let name = name.to_string();
        async move {
            writer.write(&name, &key, &value, ttl);
            Ok(())
        }
        .boxed()
    }

    fn statistics(&self, name: &str) -> CacheStatistics {
        match self.inner.stats.get(name) {
            Some(counter) => counter.snapshot(name),
            None => CacheStatistics::empty(name),
        }
    }

    fn clear_statistics(&self, name: &str) {
        if let Some(counter) = self.inner.stats.get(name) {
            counter.reset();
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    const TTL: Duration = Duration::from_secs(300);

    #[test]
    fn test_writer_new() {
        let writer = InMemoryCacheWriter::new();
        assert!(writer.is_empty());
        assert!(writer.supports_async_retrieve());
        assert!(!InMemoryCacheWriter::without_async_retrieve().supports_async_retrieve());
    }

    #[test]
    fn test_put_and_get() {
        let writer = InMemoryCacheWriter::new();

        writer.put("c", b"key1", b"value1", TTL).unwrap();

        assert_eq!(writer.get("c", b"key1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(writer.len(), 1);
    }

    #[test]
    fn test_caches_are_isolated_by_name() {
        let writer = InMemoryCacheWriter::new();

        writer.put("a", b"key", b"from-a", TTL).unwrap();
        writer.put("b", b"key", b"from-b", TTL).unwrap();

        assert_eq!(writer.get("a", b"key").unwrap(), Some(b"from-a".to_vec()));
        assert_eq!(writer.get("b", b"key").unwrap(), Some(b"from-b".to_vec()));
        assert_eq!(writer.entry_count("a"), 1);
    }

    #[test]
    fn test_get_nonexistent() {
        let writer = InMemoryCacheWriter::new();
        assert_eq!(writer.get("c", b"missing").unwrap(), None);
    }

    #[test]
    fn test_overwrite() {
        let writer = InMemoryCacheWriter::new();

        writer.put("c", b"key1", b"value1", TTL).unwrap();
        writer.put("c", b"key1", b"value2", TTL).unwrap();

        assert_eq!(writer.get("c", b"key1").unwrap(), Some(b"value2".to_vec()));
        assert_eq!(writer.len(), 1);
    }

    #[test]
    fn test_ttl_expiration() {
        let writer = InMemoryCacheWriter::new();

        writer
            .put("c", b"key1", b"value1", Duration::from_millis(100))
            .unwrap();
        assert!(writer.get("c", b"key1").unwrap().is_some());

        sleep(Duration::from_millis(150));

        assert_eq!(writer.get("c", b"key1").unwrap(), None);
        assert!(writer.is_empty(), "Expired entry should be dropped on read");
    }

    #[test]
    fn test_time_to_idle_read_refreshes_expiry() {
        let writer = InMemoryCacheWriter::new();
        let idle = Duration::from_millis(200);

        writer.put("c", b"key", b"v", idle).unwrap();
        sleep(Duration::from_millis(120));
        assert!(writer.get_with_ttl("c", b"key", idle).unwrap().is_some());
        sleep(Duration::from_millis(120));

        assert!(writer.get("c", b"key").unwrap().is_some());
    }

    #[test]
    fn test_put_if_absent() {
        let writer = InMemoryCacheWriter::new();

        assert_eq!(writer.put_if_absent("c", b"k", b"first", TTL).unwrap(), None);
        assert_eq!(
            writer.put_if_absent("c", b"k", b"second", TTL).unwrap(),
            Some(b"first".to_vec())
        );
        assert_eq!(writer.get("c", b"k").unwrap(), Some(b"first".to_vec()));
    }

    #[test]
    fn test_put_if_absent_replaces_expired() {
        let writer = InMemoryCacheWriter::new();

        writer
            .put("c", b"k", b"stale", Duration::from_millis(50))
            .unwrap();
        sleep(Duration::from_millis(80));

        assert_eq!(writer.put_if_absent("c", b"k", b"fresh", TTL).unwrap(), None);
        assert_eq!(writer.get("c", b"k").unwrap(), Some(b"fresh".to_vec()));
    }

    #[test]
    fn test_remove() {
        let writer = InMemoryCacheWriter::new();

        writer.put("c", b"key1", b"value1", TTL).unwrap();
        writer.remove("c", b"key1").unwrap();
        writer.remove("c", b"never-there").unwrap();

        assert!(writer.is_empty());
        assert_eq!(writer.statistics("c").deletes, 1);
    }

    #[test]
    fn test_clean_only_matching_cache_and_pattern() {
        let writer = InMemoryCacheWriter::new();

        writer.put("users", b"users::1", b"a", TTL).unwrap();
        writer.put("users", b"users::2", b"b", TTL).unwrap();
        writer.put("users", b"other::1", b"c", TTL).unwrap();
        writer.put("orders", b"users::1", b"d", TTL).unwrap();

        writer.clean("users", b"users::*").unwrap();

        assert_eq!(writer.entry_count("users"), 1);
        assert_eq!(writer.entry_count("orders"), 1);
        assert_eq!(writer.statistics("users").deletes, 2);
    }

    #[test]
    fn test_cleanup_expired() {
        let writer = InMemoryCacheWriter::new();

        writer
            .put("c", b"key1", b"v", Duration::from_millis(50))
            .unwrap();
        writer.put("c", b"key2", b"v", TTL).unwrap();

        sleep(Duration::from_millis(80));

        assert_eq!(writer.cleanup_expired(), 1);
        assert_eq!(writer.len(), 1);
        assert!(writer.get("c", b"key2").unwrap().is_some());
    }

    #[test]
    fn test_statistics() {
        let writer = InMemoryCacheWriter::new();

        writer.put("c", b"key1", b"value1", TTL).unwrap();
        writer.get("c", b"key1").unwrap();
        writer.get("c", b"nonexistent").unwrap();

        let stats = writer.statistics("c");
        assert_eq!(stats.puts, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);

        writer.clear_statistics("c");
        assert_eq!(writer.statistics("c"), CacheStatistics::empty("c"));
    }

    #[test]
    fn test_retrieve_and_store() {
        let writer = InMemoryCacheWriter::new();

        tokio_test::block_on(writer.store("c", b"k".to_vec(), b"v".to_vec(), TTL)).unwrap();
        let value = tokio_test::block_on(writer.retrieve("c", b"k".to_vec(), None)).unwrap();

        assert_eq!(value, Some(b"v".to_vec()));
    }
}
