//! Instrumented Backend
//!
//! Decorator that records backend-facing metrics around any engine. Callers
//! see the wrapped engine's results unchanged.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use super::{Backend, RequestContext};
use crate::error::Result;
use crate::metrics::{Outcome, Recorder, RequestChannel};
use crate::models::PayloadFormat;

pub struct InstrumentedBackend {
    inner: Arc<dyn Backend>,
    recorder: Recorder,
}

impl InstrumentedBackend {
    pub fn new(inner: Arc<dyn Backend>, recorder: Recorder) -> Self {
        Self { inner, recorder }
    }
}

#[async_trait]
impl Backend for InstrumentedBackend {
    async fn get(&self, ctx: &RequestContext, key: &str) -> Result<Bytes> {
        self.recorder.record_total(RequestChannel::GetBackend);
        let started = Instant::now();

        let result = self.inner.get(ctx, key).await;

        let outcome = Outcome::from_result(&result);
        if let Err(err) = &result {
            debug!(key = %key, error = %err, "Backend get failed");
        }
        self.recorder
            .record_outcome(RequestChannel::GetBackend, outcome, started.elapsed());
        result
    }

    async fn put(
        &self,
        ctx: &RequestContext,
        key: &str,
        payload: Bytes,
        ttl_seconds: u64,
    ) -> Result<()> {
        let format = PayloadFormat::from_payload(&payload);
        let defines_ttl = ttl_seconds > 0;
        // Body bytes only, without the format tag
        let body_len = payload.len().saturating_sub(format.tag_len());
        self.recorder.record_backend_put_size(body_len);
        let started = Instant::now();

        let result = self.inner.put(ctx, key, payload, ttl_seconds).await;

        let outcome = Outcome::from_result(&result);
        match &result {
            Ok(()) => self.recorder.record_backend_put_duration(started.elapsed()),
            Err(err) => debug!(key = %key, error = %err, "Backend put failed"),
        }
        self.recorder
            .record_backend_put_outcome(format, outcome, defines_ttl);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryBackend;
    use crate::error::CacheError;
    use crate::metrics::MetricsRegistry;
    use std::time::Duration;

    /// Engine whose every call fails with a backend error.
    struct BrokenBackend;

    #[async_trait]
    impl Backend for BrokenBackend {
        async fn get(&self, _ctx: &RequestContext, _key: &str) -> Result<Bytes> {
            Err(CacheError::Backend("connection refused".to_string()))
        }

        async fn put(&self, _: &RequestContext, _: &str, _: Bytes, _: u64) -> Result<()> {
            Err(CacheError::Backend("connection refused".to_string()))
        }
    }

    fn setup(inner: Arc<dyn Backend>) -> (Arc<MetricsRegistry>, InstrumentedBackend) {
        let registry = Arc::new(MetricsRegistry::new("test", "").unwrap());
        let backend = InstrumentedBackend::new(inner, Recorder::new(registry.clone()));
        (registry, backend)
    }

    fn ctx() -> RequestContext {
        RequestContext::new(Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_successful_put_is_labeled() {
        let (registry, backend) = setup(Arc::new(MemoryBackend::new(10, 60)));

        backend
            .put(&ctx(), "k", Bytes::from_static(b"json{\"a\":1}"), 30)
            .await
            .unwrap();
        backend
            .put(&ctx(), "k2", Bytes::from_static(b"xml<a/>"), 0)
            .await
            .unwrap();

        let status = &registry.puts_backend.status;
        assert_eq!(status.with_label_values(&["json", "add", "true"]).get(), 1);
        assert_eq!(status.with_label_values(&["xml", "add", "false"]).get(), 1);
        assert_eq!(registry.puts_backend.duration.get_sample_count(), 2);
        assert_eq!(registry.puts_backend.size.get_sample_count(), 2);
        // `{"a":1}` and `<a/>`
        assert_eq!(registry.puts_backend.size.get_sample_sum(), 11.0);
    }

    #[tokio::test]
    async fn test_failed_put_counts_error_without_duration() {
        let (registry, backend) = setup(Arc::new(BrokenBackend));

        let result = backend
            .put(&ctx(), "k", Bytes::from_static(b"garbage"), 0)
            .await;
        assert!(matches!(result, Err(CacheError::Backend(_))));

        let status = &registry.puts_backend.status;
        assert_eq!(
            status.with_label_values(&["invalid_format", "error", "false"]).get(),
            1
        );
        assert_eq!(registry.puts_backend.duration.get_sample_count(), 0);
    }

    #[tokio::test]
    async fn test_get_outcomes() {
        let (registry, backend) = setup(Arc::new(MemoryBackend::new(10, 60)));

        backend
            .put(&ctx(), "present", Bytes::from_static(b"json1"), 0)
            .await
            .unwrap();
        backend.get(&ctx(), "present").await.unwrap();
        let missing = backend.get(&ctx(), "absent").await;
        assert!(matches!(missing, Err(CacheError::NotFound(_))));

        let status = &registry.gets_backend.status;
        assert_eq!(status.with_label_values(&["add"]).get(), 2);
        assert_eq!(status.with_label_values(&["bad_request"]).get(), 1);
        assert_eq!(status.with_label_values(&["error"]).get(), 0);
        assert_eq!(registry.gets_backend.duration.get_sample_count(), 1);
    }

    #[tokio::test]
    async fn test_get_backend_error() {
        let (registry, backend) = setup(Arc::new(BrokenBackend));

        let result = backend.get(&ctx(), "k").await;
        assert_eq!(
            result,
            Err(CacheError::Backend("connection refused".to_string()))
        );

        let status = &registry.gets_backend.status;
        assert_eq!(status.with_label_values(&["error"]).get(), 1);
        assert_eq!(registry.gets_backend.duration.get_sample_count(), 0);
    }
}
