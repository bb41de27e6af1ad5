//! TTL Cleanup Task
//!
//! Background task that periodically purges expired backend entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::backend::MemoryBackend;

/// Spawns a background task that periodically purges expired entries.
///
/// Expired entries are already invisible to reads; purging only reclaims
/// their memory. The coordinator never expires anything itself.
///
/// # Returns
/// A JoinHandle for the spawned task, to be aborted on shutdown.
///
/// # Example
/// ```ignore
/// let backend = Arc::new(MemoryBackend::new(1000));
/// let cleanup_handle = spawn_cleanup_task(backend.clone(), 1);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(
    backend: Arc<MemoryBackend>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = backend.cleanup_expired().await;
            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
