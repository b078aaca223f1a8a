//! Registration
//!
//! Selects which named cache managers get compression.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use super::CompressingCacheManager;
use crate::config::CompressionSettings;
use crate::manager::CacheManager;

/// Wraps every manager whose name is on the allow-list.
///
/// Output keeps input order and wraps each listed manager once. Managers not
/// on the list are dropped from the output; the caller keeps using them as-is.
pub fn wrap_target_managers<I>(
    managers: I,
    settings: &CompressionSettings,
) -> Vec<CompressingCacheManager>
where
    I: IntoIterator<Item = (String, Arc<dyn CacheManager>)>,
{
    let targets: HashSet<&str> = settings
        .target_cache_managers
        .iter()
        .map(String::as_str)
        .collect();
    let mut seen = HashSet::new();
    let mut wrapped = Vec::new();

    for (name, manager) in managers {
        if !targets.contains(name.as_str()) || !seen.insert(name.clone()) {
            continue;
        }
        info!(
            manager = %name,
            threshold = settings.threshold.bytes(),
            "Enabling compression for cache manager"
        );
        wrapped.push(CompressingCacheManager::new(manager, name, settings.threshold));
    }

    for target in &settings.target_cache_managers {
        if !seen.contains(target) {
            warn!(manager = %target, "Compression target not found among cache managers");
        }
    }
    wrapped
}
