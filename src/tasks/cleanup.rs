//! TTL Cleanup Task
//!
//! Expired memory-engine entries already read as absent; this sweep only
//! reclaims the space they hold.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::backends::memory::CacheStore;

/// Spawns a task that sweeps expired entries every `cleanup_interval_secs`.
///
/// The returned handle is aborted during shutdown.
pub fn spawn_cleanup_task(
    store: Arc<RwLock<CacheStore>>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            interval_secs = interval.as_secs(),
            "Starting TTL cleanup task"
        );

        let mut ticker = tokio::time::interval(interval);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let (removed, remaining) = {
                let mut guard = store.write().await;
                let removed = guard.cleanup_expired();
                (removed, guard.len())
            };

            if removed > 0 {
                info!(removed, remaining, "TTL cleanup removed expired entries");
            } else {
                debug!(remaining, "TTL cleanup found no expired entries");
            }
        }
    })
}
