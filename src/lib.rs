//! Cache Gateway - a caching gateway over interchangeable storage engines
//!
//! Uniform PUT/GET semantics with TTL expiration in front of a memory, moka
//! or sled engine, with every client-facing and backend-facing operation
//! classified and recorded as Prometheus metrics.

pub mod api;
pub mod backends;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod server;
pub mod tasks;
pub mod ttl;

pub use api::{create_router, AppState};
pub use backends::{Backend, BackendKind, RequestContext};
pub use config::Config;
pub use error::{CacheError, Result};
pub use metrics::{MetricsRegistry, Recorder};
