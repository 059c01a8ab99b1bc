//! Error types for the cache gateway
//!
//! `CacheError` is the closed set of failures that may cross the storage
//! boundary. Adapters translate every native failure into one of its variants.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Normalized failure categories shared by every storage engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key is absent (or expired) in the backing store
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Request was rejected before reaching a backend
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Any native storage engine failure
    #[error("Backend error: {0}")]
    Backend(String),
}

impl CacheError {
    /// Returns the HTTP status this error surfaces as.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::BadRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache gateway.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            CacheError::NotFound("k".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CacheError::BadRequest("ttl".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CacheError::Backend("timeout".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_into_response_body() {
        let response = CacheError::BadRequest("negative ttl".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "Bad request: negative ttl");
    }
}
