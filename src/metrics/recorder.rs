//! Instrumentation Recorder
//!
//! Typed, per-event recording API over the [`MetricsRegistry`]. Every method is
//! an atomic increment or observation that never fails and never blocks.

use std::sync::Arc;
use std::time::Duration;

use prometheus::IntCounterVec;
use tracing::debug;

use super::outcome::Outcome;
use super::registry::{
    MetricsRegistry, RequestMetrics, ACCEPT_VAL, BAD_REQUEST_VAL, CLOSE_VAL, ERROR_VAL,
    INVALID_FORMAT_VAL, JSON_VAL, TOTAL_VAL, XML_VAL,
};
use crate::models::PayloadFormat;

/// Channels whose status counter is keyed by `status` alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestChannel {
    PutClient,
    GetClient,
    GetBackend,
}

/// Kinds of connection failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionError {
    Accept,
    Close,
}

// == Recorder ==
/// Cheap cloneable handle shared by every recording component.
///
/// A disabled recorder holds no registry; all of its methods are no-ops.
#[derive(Clone, Default)]
pub struct Recorder {
    registry: Option<Arc<MetricsRegistry>>,
}

impl Recorder {
    pub fn new(registry: Arc<MetricsRegistry>) -> Self {
        Self {
            registry: Some(registry),
        }
    }

    /// A recorder with no instruments behind it.
    pub fn disabled() -> Self {
        Self { registry: None }
    }

    pub fn registry(&self) -> Option<&Arc<MetricsRegistry>> {
        self.registry.as_ref()
    }

    fn channel(&self, channel: RequestChannel) -> Option<&RequestMetrics> {
        let registry = self.registry.as_deref()?;
        Some(match channel {
            RequestChannel::PutClient => &registry.puts,
            RequestChannel::GetClient => &registry.gets,
            RequestChannel::GetBackend => &registry.gets_backend,
        })
    }

    // == Request Channels ==
    /// Counts a request as received.
    pub fn record_total(&self, channel: RequestChannel) {
        if let Some(m) = self.channel(channel) {
            inc(&m.status, &[TOTAL_VAL]);
        }
    }

    pub fn record_duration(&self, channel: RequestChannel, elapsed: Duration) {
        if let Some(m) = self.channel(channel) {
            m.duration.observe(elapsed.as_secs_f64());
        }
    }

    pub fn record_error(&self, channel: RequestChannel) {
        if let Some(m) = self.channel(channel) {
            inc(&m.status, &[ERROR_VAL]);
        }
    }

    pub fn record_bad_request(&self, channel: RequestChannel) {
        if let Some(m) = self.channel(channel) {
            inc(&m.status, &[BAD_REQUEST_VAL]);
        }
    }

    /// Records the single terminal outcome of a request.
    ///
    /// Only successful requests contribute to the latency histogram.
    pub fn record_outcome(&self, channel: RequestChannel, outcome: Outcome, elapsed: Duration) {
        match outcome {
            Outcome::Success => self.record_duration(channel, elapsed),
            Outcome::ClientError => self.record_bad_request(channel),
            Outcome::ServerError => self.record_error(channel),
        }
    }

    // == Backend Put Channel ==
    /// Counts one backend put labeled by payload format, outcome and TTL presence.
    pub fn record_backend_put_outcome(
        &self,
        format: PayloadFormat,
        outcome: Outcome,
        defines_ttl: bool,
    ) {
        if let Some(registry) = self.registry.as_deref() {
            let format = match format {
                PayloadFormat::Json => JSON_VAL,
                PayloadFormat::Xml => XML_VAL,
                PayloadFormat::Invalid => INVALID_FORMAT_VAL,
            };
            let defines_ttl = if defines_ttl { "true" } else { "false" };
            inc(
                &registry.puts_backend.status,
                &[format, status_label(outcome), defines_ttl],
            );
        }
    }

    pub fn record_backend_put_duration(&self, elapsed: Duration) {
        if let Some(registry) = self.registry.as_deref() {
            registry.puts_backend.duration.observe(elapsed.as_secs_f64());
        }
    }

    /// Observes the payload size; empty payloads are not observed.
    pub fn record_backend_put_size(&self, size_in_bytes: usize) {
        if size_in_bytes == 0 {
            return;
        }
        if let Some(registry) = self.registry.as_deref() {
            registry.puts_backend.size.observe(size_in_bytes as f64);
        }
    }

    // == Connections ==
    pub fn record_connection_opened(&self) {
        if let Some(registry) = self.registry.as_deref() {
            registry.connections.open.inc();
        }
    }

    pub fn record_connection_closed(&self) {
        if let Some(registry) = self.registry.as_deref() {
            registry.connections.open.dec();
        }
    }

    /// Counts a connection error. Leaves the open connection gauge untouched.
    pub fn record_connection_error(&self, kind: ConnectionError) {
        if let Some(registry) = self.registry.as_deref() {
            let label = match kind {
                ConnectionError::Accept => ACCEPT_VAL,
                ConnectionError::Close => CLOSE_VAL,
            };
            inc(&registry.connections.errors, &[label]);
        }
    }

    // == Extra TTL ==
    pub fn record_extra_ttl_seconds(&self, seconds: u64) {
        if let Some(registry) = self.registry.as_deref() {
            registry.extra_ttl.observe(seconds as f64);
        }
    }
}

fn status_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Success => TOTAL_VAL,
        Outcome::ClientError => BAD_REQUEST_VAL,
        Outcome::ServerError => ERROR_VAL,
    }
}

fn inc(counter: &IntCounterVec, labels: &[&str]) {
    match counter.get_metric_with_label_values(labels) {
        Ok(c) => c.inc(),
        Err(err) => debug!(error = %err, "Dropped counter update"),
    }
}
