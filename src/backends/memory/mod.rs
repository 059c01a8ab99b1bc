//! Memory Backend
//!
//! In-process engine: a HashMap with LRU eviction and per-entry expiry.
//! Absence is signalled natively by a missing or expired entry.

mod entry;
mod lru;
mod store;

#[cfg(test)]
mod property_tests;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

pub use entry::{current_timestamp_ms, CacheEntry};
pub use lru::LruTracker;
pub use store::CacheStore;

use super::{Backend, RequestContext};
use crate::error::Result;

/// Storage engine backed by a shared [`CacheStore`].
#[derive(Clone)]
pub struct MemoryBackend {
    store: Arc<RwLock<CacheStore>>,
}

impl MemoryBackend {
    pub fn new(max_entries: usize, default_ttl: u64) -> Self {
        Self {
            store: Arc::new(RwLock::new(CacheStore::new(max_entries, default_ttl))),
        }
    }

    /// Shared handle to the store, used by the cleanup task.
    pub fn store(&self) -> Arc<RwLock<CacheStore>> {
        self.store.clone()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get(&self, ctx: &RequestContext, key: &str) -> Result<Bytes> {
        ctx.run(async {
            // Write lock: a read touches the LRU order
            let mut store = self.store.write().await;
            store.get(key)
        })
        .await
    }

    async fn put(
        &self,
        ctx: &RequestContext,
        key: &str,
        payload: Bytes,
        ttl_seconds: u64,
    ) -> Result<()> {
        ctx.run(async {
            let mut store = self.store.write().await;
            store.set(key.to_string(), payload, ttl_seconds)
        })
        .await
    }
}
