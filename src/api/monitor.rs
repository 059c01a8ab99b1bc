//! HTTP Monitoring Middleware
//!
//! Wraps a route so every request is counted on arrival and classified into
//! exactly one terminal outcome when the handler finishes.
//!
//! A handler may commit its status early through the [`StatusCapture`]
//! request extension. Only the first status written is kept; a later write,
//! including the final response status, is ignored.
//!
//! A request whose future is dropped before a response exists (client
//! disconnect, handler panic) ends as a server error unless a status was
//! already committed.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::metrics::{Outcome, Recorder, RequestChannel};

/// First-write-wins record of a response status.
#[derive(Debug, Clone, Default)]
pub struct StatusCapture(Arc<OnceLock<StatusCode>>);

impl StatusCapture {
    /// Stores `status` unless one was already written. Returns whether it was kept.
    pub fn write(&self, status: StatusCode) -> bool {
        self.0.set(status).is_ok()
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.0.get().copied()
    }
}

/// Middleware state: which channel the wrapped route reports on.
#[derive(Clone)]
pub struct Monitor {
    recorder: Recorder,
    channel: RequestChannel,
}

impl Monitor {
    pub fn new(recorder: Recorder, channel: RequestChannel) -> Self {
        Self { recorder, channel }
    }

    /// Records the terminal outcome for a finished request.
    fn finish(&self, capture: &StatusCapture, started: Instant) {
        let outcome = Outcome::from_status(capture.status());
        self.recorder
            .record_outcome(self.channel, outcome, started.elapsed());
    }
}

/// A counted request awaiting its terminal outcome, recorded on drop.
struct InFlight {
    monitor: Monitor,
    capture: StatusCapture,
    started: Instant,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        // Ignored when a status was written; otherwise no response was produced
        self.capture.write(StatusCode::INTERNAL_SERVER_ERROR);
        self.monitor.finish(&self.capture, self.started);
    }
}

pub async fn monitor(
    State(monitor): State<Monitor>,
    mut request: Request,
    next: Next,
) -> Response {
    monitor.recorder.record_total(monitor.channel);

    let capture = StatusCapture::default();
    request.extensions_mut().insert(capture.clone());
    let in_flight = InFlight {
        monitor,
        capture,
        started: Instant::now(),
    };

    let response = next.run(request).await;

    in_flight.capture.write(response.status());
    drop(in_flight);
    response
}
