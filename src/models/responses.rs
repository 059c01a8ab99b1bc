//! Response DTOs for the cache gateway API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

/// Response body for `POST /cache`
#[derive(Debug, Clone, Serialize)]
pub struct PutResponse {
    pub responses: Vec<PutResponseObject>,
}

/// Key assigned to one stored value
#[derive(Debug, Clone, Serialize)]
pub struct PutResponseObject {
    pub uuid: String,
}

impl PutResponse {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            responses: keys
                .into_iter()
                .map(|uuid| PutResponseObject { uuid })
                .collect(),
        }
    }
}

/// Response body for the status endpoint (GET /status)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Active storage engine
    pub backend: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(backend: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            backend: backend.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
