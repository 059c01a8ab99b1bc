//! Storage Backends
//!
//! The [`Backend`] trait is the contract every storage engine presents:
//! identical `get`/`put` semantics and the same [`CacheError`] taxonomy no
//! matter how the native client fails.
//!
//! # Engines
//! - `memory` - in-process HashMap with LRU eviction
//! - `moka` - `moka::future::Cache` with per-entry expiry
//! - `sled` - embedded on-disk tree
//!
//! The engine is chosen once at startup from [`BackendKind`].

pub mod instrumented;
pub mod memory;
pub mod moka;
pub mod sled;

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::info;

use crate::config::{Config, ConfigError};
use crate::error::{CacheError, Result};
use crate::metrics::Recorder;
use crate::tasks::spawn_cleanup_task;

pub use instrumented::InstrumentedBackend;
pub use memory::MemoryBackend;
pub use self::moka::MokaBackend;
pub use self::sled::SledBackend;

// == Backend Contract ==
/// Storage engine contract.
///
/// - `get` on an absent or expired key returns [`CacheError::NotFound`].
/// - `put` with `ttl_seconds == 0` applies the engine's configured default.
/// - Any other native failure is [`CacheError::Backend`].
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    async fn get(&self, ctx: &RequestContext, key: &str) -> Result<Bytes>;

    async fn put(
        &self,
        ctx: &RequestContext,
        key: &str,
        payload: Bytes,
        ttl_seconds: u64,
    ) -> Result<()>;
}

// == Request Context ==
/// Cancellation and deadline carried by every backend call.
#[derive(Debug, Clone)]
pub struct RequestContext {
    token: CancellationToken,
    timeout: Duration,
}

impl RequestContext {
    pub fn new(timeout: Duration) -> Self {
        Self::with_token(CancellationToken::new(), timeout)
    }

    pub fn with_token(token: CancellationToken, timeout: Duration) -> Self {
        Self { token, timeout }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Guard that cancels this context when dropped.
    ///
    /// Handlers hold it for the request lifetime, so a dropped request future
    /// aborts any outstanding backend work.
    pub fn drop_guard(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }

    /// Runs `op` unless the context is cancelled or the deadline passes first.
    pub async fn run<F, T>(&self, op: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                Err(CacheError::Backend("backend operation cancelled".to_string()))
            }
            result = tokio::time::timeout(self.timeout, op) => match result {
                Ok(inner) => inner,
                Err(_) => Err(CacheError::Backend(format!(
                    "backend operation timed out after {}ms",
                    self.timeout.as_millis()
                ))),
            },
        }
    }
}

// == Backend Kind ==
/// Storage engine selected by static configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    Moka,
    Sled,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Memory => "memory",
            BackendKind::Moka => "moka",
            BackendKind::Sled => "sled",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "moka" => Ok(BackendKind::Moka),
            "sled" => Ok(BackendKind::Sled),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}

// == Open ==
/// An opened storage engine plus its background work, if any.
pub struct Engine {
    pub backend: Arc<dyn Backend>,
    pub cleanup: Option<JoinHandle<()>>,
}

/// Opens the configured engine and wraps it with backend instrumentation.
///
/// Must be called from within a Tokio runtime.
pub fn open(config: &Config, recorder: Recorder) -> Result<Engine> {
    let (backend, cleanup): (Arc<dyn Backend>, _) = match config.backend {
        BackendKind::Memory => {
            let memory = MemoryBackend::new(config.max_entries, config.default_ttl);
            let cleanup = spawn_cleanup_task(memory.store(), config.cleanup_interval);
            (Arc::new(memory), Some(cleanup))
        }
        BackendKind::Moka => (
            Arc::new(MokaBackend::new(config.max_entries as u64, config.default_ttl)),
            None,
        ),
        BackendKind::Sled => (
            Arc::new(SledBackend::open(&config.sled_path, config.default_ttl)?),
            None,
        ),
    };

    info!(
        backend = %config.backend,
        default_ttl = config.default_ttl,
        "Storage backend opened"
    );

    Ok(Engine {
        backend: Arc::new(InstrumentedBackend::new(backend, recorder)),
        cleanup,
    })
}
