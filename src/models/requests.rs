//! Request DTOs for the cache gateway API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

/// Request body for `POST /cache`
#[derive(Debug, Clone, Deserialize)]
pub struct PutRequest {
    /// Values to store, answered in the same order
    pub puts: Vec<PutObject>,
}

/// A single value inside a put request.
#[derive(Debug, Clone, Deserialize)]
pub struct PutObject {
    /// Declared payload format: "json" or "xml"
    #[serde(rename = "type")]
    pub kind: String,
    /// Requested TTL in seconds, 0 or absent means backend default
    #[serde(default)]
    pub ttlseconds: i64,
    /// The payload. XML payloads must be sent as a JSON string.
    pub value: Value,
    /// Client-chosen key, only honoured when the gateway allows it
    #[serde(default)]
    pub key: Option<String>,
}

impl PutRequest {
    /// Validates the request envelope
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self, max_num_values: usize) -> Option<String> {
        if self.puts.is_empty() {
            return Some("No values to put".to_string());
        }
        if self.puts.len() > max_num_values {
            return Some(format!(
                "More keys than allowed: {}",
                max_num_values
            ));
        }
        None
    }
}

/// Query string for `GET /cache`
#[derive(Debug, Clone, Deserialize)]
pub struct GetQuery {
    #[serde(default)]
    pub uuid: Option<String>,
}
