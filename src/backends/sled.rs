//! Sled Backend
//!
//! Embedded on-disk engine. Records are stored as an 8-byte big-endian
//! expiry timestamp (Unix milliseconds, 0 = never) followed by the payload.
//! Sled calls block, so they run on the blocking pool.

use std::path::Path;

use ::sled::{Db, IVec};
use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use tokio::task::JoinError;
use tracing::{debug, warn};

use super::memory::current_timestamp_ms;
use super::{Backend, RequestContext};
use crate::error::{CacheError, Result};
use crate::ttl;

const HEADER_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct SledBackend {
    db: Db,
    default_ttl: u64,
}

impl SledBackend {
    /// Opens (or creates) the database at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>, default_ttl: u64) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CacheError::Backend(format!("Failed to create directory: {}", e)))?;
        }

        let db = ::sled::open(path).map_err(map_sled_error)?;
        Ok(Self { db, default_ttl })
    }
}

// == Record Layout ==
fn encode_record(payload: &[u8], ttl_seconds: u64) -> Vec<u8> {
    let expires_at = if ttl_seconds == 0 {
        0
    } else {
        current_timestamp_ms().saturating_add(ttl_seconds.saturating_mul(1000))
    };

    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
    buf.put_u64(expires_at);
    buf.put_slice(payload);
    buf.to_vec()
}

/// Splits a record into its expiry and payload.
fn decode_record(record: &IVec) -> Result<(u64, &[u8])> {
    if record.len() < HEADER_LEN {
        return Err(CacheError::Backend(format!(
            "Corrupt record: {} bytes is shorter than the {} byte header",
            record.len(),
            HEADER_LEN
        )));
    }

    let (header, payload) = record.split_at(HEADER_LEN);
    let mut expiry = [0u8; HEADER_LEN];
    expiry.copy_from_slice(header);
    Ok((u64::from_be_bytes(expiry), payload))
}

fn is_expired(expires_at: u64) -> bool {
    expires_at != 0 && current_timestamp_ms() >= expires_at
}

// == Error Mapping ==
/// Maps native sled failures onto the gateway error taxonomy.
pub fn map_sled_error(err: ::sled::Error) -> CacheError {
    match err {
        ::sled::Error::CollectionNotFound(name) => {
            CacheError::NotFound(String::from_utf8_lossy(&name).into_owned())
        }
        ::sled::Error::Io(e) => CacheError::Backend(format!("Sled I/O failure: {}", e)),
        other => CacheError::Backend(format!("Sled failure: {}", other)),
    }
}

fn map_join_error(err: JoinError) -> CacheError {
    CacheError::Backend(format!("Sled task failed: {}", err))
}

#[async_trait]
impl Backend for SledBackend {
    async fn get(&self, ctx: &RequestContext, key: &str) -> Result<Bytes> {
        let db = self.db.clone();
        let key = key.to_string();

        ctx.run(async move {
            tokio::task::spawn_blocking(move || {
                let record = db
                    .get(key.as_bytes())
                    .map_err(map_sled_error)?
                    .ok_or_else(|| CacheError::NotFound(key.clone()))?;

                let (expires_at, payload) = decode_record(&record)?;
                if is_expired(expires_at) {
                    debug!(key = %key, "Dropping expired sled record");
                    if let Err(e) = db.remove(key.as_bytes()) {
                        warn!(key = %key, error = %e, "Failed to remove expired sled record");
                    }
                    return Err(CacheError::NotFound(key));
                }

                Ok(Bytes::copy_from_slice(payload))
            })
            .await
            .map_err(map_join_error)?
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
        let db = self.db.clone();
        let key = key.to_string();
        let record = encode_record(&payload, ttl::resolve(ttl_seconds, self.default_ttl));

        ctx.run(async move {
            tokio::task::spawn_blocking(move || {
                db.insert(key.as_bytes(), record)
                    .map(|_| ())
                    .map_err(map_sled_error)
            })
            .await
            .map_err(map_join_error)?
        })
        .await
    }
}
