//! Moka Backend
//!
//! Lock-free concurrent engine on `moka::future::Cache`. Each entry carries
//! its own TTL through an [`Expiry`] policy; an expired or evicted entry
//! simply reads as absent.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use ::moka::future::Cache;
use ::moka::Expiry;

use super::{Backend, RequestContext};
use crate::error::{CacheError, Result};
use crate::ttl;

#[derive(Debug, Clone)]
struct Entry {
    payload: Bytes,
    /// 0 = never expire
    ttl_seconds: u64,
}

impl Entry {
    fn lifetime(&self) -> Option<Duration> {
        (self.ttl_seconds > 0).then(|| Duration::from_secs(self.ttl_seconds))
    }
}

/// Per-entry expiry: every write restarts the entry's own TTL.
struct EntryExpiry;

impl Expiry<String, Entry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.lifetime()
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.lifetime()
    }
}

pub struct MokaBackend {
    cache: Cache<String, Entry>,
    default_ttl: u64,
}

impl MokaBackend {
    /// Creates a bounded cache holding at most `max_entries` payloads.
    pub fn new(max_entries: u64, default_ttl: u64) -> Self {
        let cache = Cache::builder()
            .name("cache_gateway")
            .max_capacity(max_entries)
            .expire_after(EntryExpiry)
            .build();

        Self { cache, default_ttl }
    }
}

impl std::fmt::Debug for MokaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaBackend")
            .field("entry_count", &self.cache.entry_count())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

#[async_trait]
impl Backend for MokaBackend {
    async fn get(&self, ctx: &RequestContext, key: &str) -> Result<Bytes> {
        ctx.run(async {
            match self.cache.get(key).await {
                Some(entry) => Ok(entry.payload),
                None => Err(CacheError::NotFound(key.to_string())),
            }
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
        let entry = Entry {
            payload,
            ttl_seconds: ttl::resolve(ttl_seconds, self.default_ttl),
        };

        ctx.run(async {
            self.cache.insert(key.to_string(), entry).await;
            Ok(())
        })
        .await
    }
}
