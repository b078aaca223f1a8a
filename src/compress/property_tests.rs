//! Property-Based Tests for Compress Module
//!
//! Uses proptest to check the envelope and decorator properties.

use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Cache, CacheConfiguration, CacheKey, StoreCache, StoreHandle, ValueWrapper};
use crate::codec::{self, Threshold, GZIP_MAGIC};
use crate::compress::CompressingCache;
use crate::store::{CacheWriter, InMemoryCacheWriter};

// == Test Configuration ==
const CACHE: &str = "props";

fn config() -> CacheConfiguration {
    CacheConfiguration::with_entry_ttl(Duration::from_secs(300))
}

fn compressing(writer: &InMemoryCacheWriter, threshold: u64) -> CompressingCache {
    let handle = StoreHandle::new(CACHE, Arc::new(writer.clone()), config());
    CompressingCache::new(handle, Threshold::new(threshold))
}

// == Strategies ==
/// Byte strings that cannot be mistaken for a gzip envelope.
fn raw_bytes_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..256)
        .prop_filter("must not start with the gzip magic", |b| !codec::is_compressed(b))
}

fn json_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,64}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 32, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::from),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..8)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn key_strategy() -> impl Strategy<Value = CacheKey> {
    prop_oneof![
        "[a-zA-Z0-9:_-]{1,32}".prop_map(CacheKey::from),
        any::<i64>().prop_map(CacheKey::from),
        prop::collection::vec("[a-z]{1,6}", 0..5).prop_map(CacheKey::from),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Round-trip: inflating a compressed stream yields the input.
    #[test]
    fn prop_compress_round_trip(data in prop::collection::vec(any::<u8>(), 0..2048)) {
        let compressed = codec::compress(&data).unwrap();
        prop_assert_eq!(&compressed[..2], &GZIP_MAGIC[..]);
        let inflated = codec::decompress(&compressed).unwrap();
        prop_assert_eq!(inflated.as_ref(), data.as_slice());
    }

    // Passthrough: bytes without the magic come back unchanged.
    #[test]
    fn prop_raw_bytes_pass_through(data in raw_bytes_strategy()) {
        let out = codec::decompress(&data).unwrap();
        prop_assert_eq!(out.as_ref(), data.as_slice());
    }

    // Boundary: exactly T bytes is compressed, T - 1 is not.
    #[test]
    fn prop_threshold_boundary(threshold in 1u64..10_000) {
        let policy = Threshold::new(threshold);
        prop_assert!(policy.should_compress(threshold as usize));
        prop_assert!(!policy.should_compress(threshold as usize - 1));
    }

    // Any value reads back as written, whichever envelope it was stored in.
    #[test]
    fn prop_decorated_round_trip(
        value in json_value_strategy(),
        threshold in 0u64..512,
    ) {
        let writer = InMemoryCacheWriter::new();
        let cache = compressing(&writer, threshold);

        cache.put(&"k".into(), Some(value.clone())).unwrap();

        let stored = writer.get(CACHE, b"props::k").unwrap().unwrap();
        let serialized_len = serde_json::to_vec(&value).unwrap().len();
        prop_assert_eq!(codec::is_compressed(&stored), serialized_len as u64 >= threshold);
        prop_assert_eq!(cache.get(&"k".into()).unwrap(), Some(ValueWrapper::new(Some(value))));
    }

    // Mixed mode: raw entries stay readable after compression is switched on.
    #[test]
    fn prop_mixed_mode_compatibility(
        old in json_value_strategy(),
        new in json_value_strategy(),
    ) {
        let writer = InMemoryCacheWriter::new();
        let raw: Arc<dyn CacheWriter> = Arc::new(writer.clone());
        StoreCache::new(CACHE, raw, config()).put(&"old".into(), Some(old.clone())).unwrap();

        let cache = compressing(&writer, 0);
        cache.put(&"new".into(), Some(new.clone())).unwrap();

        prop_assert_eq!(cache.get(&"old".into()).unwrap(), Some(ValueWrapper::new(Some(old))));
        prop_assert_eq!(cache.get(&"new".into()).unwrap(), Some(ValueWrapper::new(Some(new))));
    }

    // Eviction derives the same storage key as the write.
    #[test]
    fn prop_evict_removes_written_entry(key in key_strategy(), threshold in 0u64..64) {
        let writer = InMemoryCacheWriter::new();
        let cache = compressing(&writer, threshold);

        cache.put(&key, Some(json!({"payload": "x".repeat(80)}))).unwrap();
        prop_assert_eq!(writer.len(), 1);

        cache.evict(&key).unwrap();
        prop_assert!(writer.is_empty());
        prop_assert_eq!(cache.get(&key).unwrap(), None);
    }
}

// == Concurrency ==
#[test]
fn test_concurrent_put_if_absent_has_one_winner() {
    let writer = InMemoryCacheWriter::new();
    let cache = compressing(&writer, 16);
    let threads = 8;

    let results: Vec<Option<ValueWrapper>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let cache = cache.clone();
                scope.spawn(move || {
                    let value = json!({"writer": i, "padding": "p".repeat(64)});
                    cache.put_if_absent(&"contended".into(), Some(value)).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners = results.iter().filter(|r| r.is_none()).count();
    assert_eq!(winners, 1);

    let stored = cache.get(&"contended".into()).unwrap().unwrap();
    for observed in results.into_iter().flatten() {
        assert_eq!(observed, stored);
    }
}
