//! Cache Statistics Module
//!
//! Tracks per-cache operation counters kept by the writer.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Stats Counter ==
/// Lock-free counters for one cache name.
#[derive(Debug, Default)]
pub struct StatsCounter {
    puts: AtomicU64,
    gets: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    deletes: AtomicU64,
}

impl StatsCounter {
    /// Increments the put counter.
    pub fn record_put(&self) {
        self.puts.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a read and whether it hit.
    pub fn record_get(&self, hit: bool) {
        self.gets.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Adds `count` removed entries.
    pub fn record_deletes(&self, count: u64) {
        self.deletes.fetch_add(count, Ordering::Relaxed);
    }

    /// Zeroes every counter.
    pub fn reset(&self) {
        for counter in [&self.puts, &self.gets, &self.hits, &self.misses, &self.deletes] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Takes a point-in-time copy labelled with `name`.
    pub fn snapshot(&self, name: &str) -> CacheStatistics {
        CacheStatistics {
            cache_name: name.to_string(),
            puts: self.puts.load(Ordering::Relaxed),
            gets: self.gets.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
        }
    }
}

// == Cache Statistics ==
/// Snapshot of the counters for one cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStatistics {
    /// Cache the counters belong to
    pub cache_name: String,
    /// Number of writes
    pub puts: u64,
    /// Number of reads
    pub gets: u64,
    /// Reads that found a value
    pub hits: u64,
    /// Reads that found nothing
    pub misses: u64,
    /// Entries removed by evict or clear
    pub deletes: u64,
}

impl CacheStatistics {
    /// All-zero statistics for `name`.
    pub fn empty(name: &str) -> Self {
        Self {
            cache_name: name.to_string(),
            ..Self::default()
        }
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
