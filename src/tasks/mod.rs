//! Background Tasks Module
//!
//! Periodic work that runs alongside the server.
//!
//! # Tasks
//! - TTL Cleanup: sweeps expired entries out of the memory engine

mod cleanup;

pub use cleanup::spawn_cleanup_task;
