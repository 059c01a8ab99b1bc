//! API Module
//!
//! HTTP handlers, routing and request monitoring for the gateway.
//!
//! # Endpoints
//! - `POST /cache` - Store one or more values
//! - `GET /cache?uuid=<key>` - Retrieve a value
//! - `GET /status` - Health check
//! - `GET /metrics` - Metrics exposition

pub mod handlers;
pub mod monitor;
pub mod routes;

pub use handlers::*;
pub use monitor::{Monitor, StatusCapture};
pub use routes::create_router;
