//! Compress Cache - threshold-based gzip compression for key-value caches
//!
//! Wraps byte-level caches so that serialized values at or above a size
//! threshold are stored gzipped, while smaller or older raw entries stay
//! readable. Ships an in-memory writer and a small HTTP surface over it.

pub mod api;
pub mod cache;
pub mod codec;
pub mod compress;
pub mod config;
pub mod error;
pub mod manager;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::{Cache, CacheConfiguration, CacheKey, ValueWrapper};
pub use codec::Threshold;
pub use compress::{wrap_target_managers, CompressingCache, CompressingCacheManager};
pub use config::{CompressionSettings, Config, ConfigError};
pub use error::{CacheError, Result};
pub use manager::{CacheManager, SimpleCacheManager, StoreCacheManager};
pub use store::{CacheWriter, InMemoryCacheWriter};
pub use tasks::spawn_cleanup_task;
