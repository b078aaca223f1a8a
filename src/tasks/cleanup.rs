//! TTL Cleanup Task
//!
//! Background task that periodically removes expired entries from the
//! in-memory writer.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::InMemoryCacheWriter;

/// Spawns a background task that sweeps expired entries every interval.
///
/// Reads already treat expired entries as absent; the sweep only reclaims
/// memory held by entries nobody reads again.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let writer = InMemoryCacheWriter::new();
/// let cleanup_handle = spawn_cleanup_task(writer.clone(), 1);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(
    writer: InMemoryCacheWriter,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            cleanup_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = writer.cleanup_expired();
            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
