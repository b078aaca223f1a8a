//! Compress Module
//!
//! Threshold-based gzip compression layered over byte-level caches and the
//! managers that hand them out.

mod cache;
mod manager;
pub mod registration;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use cache::CompressingCache;
pub use manager::CompressingCacheManager;
pub use registration::wrap_target_managers;
