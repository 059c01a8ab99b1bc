//! Metrics Module
//!
//! Outcome classification plus the instruments exposed to the scraper.
//!
//! # Instruments
//! - `put_total{status}`, `put_duration_seconds`
//! - `get_total{status}`, `get_duration_seconds`
//! - `backend_put_total{format,status,defines_ttl}`, `backend_put_duration_seconds`
//! - `backend_put_size_bytes`
//! - `backend_get_total{status}`, `backend_get_duration_seconds`
//! - `connections`, `connection_errors{kind}`
//! - `extra_ttl_seconds`

mod outcome;
mod recorder;
pub mod registry;

pub use outcome::Outcome;
pub use recorder::{ConnectionError, Recorder, RequestChannel};
pub use registry::MetricsRegistry;
