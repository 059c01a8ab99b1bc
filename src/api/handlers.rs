//! API Handlers
//!
//! HTTP request handlers for each gateway endpoint. Inputs are fully
//! validated before any backend call is made.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::backends::{Backend, RequestContext};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::metrics::Recorder;
use crate::models::{
    GetQuery, HealthResponse, PayloadFormat, PutObject, PutRequest, PutResponse, StoredItem,
    MAX_KEY_LENGTH,
};
use crate::ttl;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Active storage engine, already instrumented
    pub backend: Arc<dyn Backend>,
    pub recorder: Recorder,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(backend: Arc<dyn Backend>, recorder: Recorder, config: Config) -> Self {
        Self {
            backend,
            recorder,
            config: Arc::new(config),
        }
    }

    /// Fresh per-request context carrying the configured backend deadline.
    fn request_context(&self) -> RequestContext {
        RequestContext::new(self.config.backend_timeout)
    }
}

/// A put item that passed validation, plus any TTL seconds cut by the cap.
struct PreparedItem {
    item: StoredItem,
    extra_ttl: Option<u64>,
}

fn prepare(object: PutObject, config: &Config) -> Result<PreparedItem> {
    let format = PayloadFormat::from_type(&object.kind);

    let body = match (format, object.value) {
        (PayloadFormat::Json, value) => serde_json::to_vec(&value)
            .map(Bytes::from)
            .map_err(|e| CacheError::BadRequest(format!("Invalid JSON value: {}", e)))?,
        (PayloadFormat::Xml, Value::String(xml)) => Bytes::from(xml),
        (PayloadFormat::Xml, other) => {
            return Err(CacheError::BadRequest(format!(
                "XML messages must have a String value. Found {}",
                other
            )))
        }
        (PayloadFormat::Invalid, _) => {
            return Err(CacheError::BadRequest(format!(
                "Type must be one of [\"json\", \"xml\"]. Found '{}'",
                object.kind
            )))
        }
    };

    if body.len() > config.max_size_bytes {
        return Err(CacheError::BadRequest(format!(
            "Payload size {} exceeded max size {}",
            body.len(),
            config.max_size_bytes
        )));
    }

    let requested = ttl::validate_requested(object.ttlseconds)?;
    let capped = ttl::cap(requested, config.max_ttl);

    let key = match object.key {
        Some(_) if !config.allow_setting_keys => {
            return Err(CacheError::BadRequest(
                "Setting keys is not allowed on this gateway".to_string(),
            ))
        }
        Some(key) if key.is_empty() || key.len() > MAX_KEY_LENGTH => {
            return Err(CacheError::BadRequest(format!(
                "Key must be between 1 and {} bytes",
                MAX_KEY_LENGTH
            )))
        }
        Some(key) => key,
        None => Uuid::new_v4().to_string(),
    };

    Ok(PreparedItem {
        item: StoredItem::new(key, body, format, capped.ttl_seconds),
        extra_ttl: capped.extra_seconds,
    })
}

/// Handler for POST /cache
///
/// Stores every value of the request and answers with their keys, in order.
pub async fn put_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<PutRequest>, JsonRejection>,
) -> Result<Json<PutResponse>> {
    let Json(request) =
        body.map_err(|rejection| CacheError::BadRequest(rejection.body_text()))?;

    if let Some(error_msg) = request.validate(state.config.max_num_values) {
        return Err(CacheError::BadRequest(error_msg));
    }

    let prepared = request
        .puts
        .into_iter()
        .map(|object| prepare(object, &state.config))
        .collect::<Result<Vec<_>>>()?;

    let ctx = state.request_context();
    let _guard = ctx.drop_guard();

    let mut keys = Vec::with_capacity(prepared.len());
    for PreparedItem { item, extra_ttl } in prepared {
        if let Some(extra) = extra_ttl {
            debug!(key = %item.key, extra, "Requested TTL exceeds the maximum, capping");
            state.recorder.record_extra_ttl_seconds(extra);
        }

        state
            .backend
            .put(&ctx, &item.key, item.encode(), item.ttl_seconds)
            .await
            .inspect_err(|e| warn!(key = %item.key, error = %e, "Put failed"))?;
        keys.push(item.key);
    }

    Ok(Json(PutResponse::new(keys)))
}

/// Handler for GET /cache?uuid=<key>
///
/// Returns the stored payload with the content type of its format.
pub async fn get_handler(
    State(state): State<AppState>,
    Query(query): Query<GetQuery>,
) -> Result<Response> {
    let key = query
        .uuid
        .filter(|uuid| !uuid.is_empty())
        .ok_or_else(|| CacheError::BadRequest("Missing required parameter uuid".to_string()))?;

    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::BadRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }

    let ctx = state.request_context();
    let _guard = ctx.drop_guard();

    let stored = state.backend.get(&ctx, &key).await?;
    let item = StoredItem::decode(key, stored).ok_or_else(|| {
        CacheError::Backend("Stored value has an unknown format tag".to_string())
    })?;

    Ok((
        [(header::CONTENT_TYPE, item.format.content_type())],
        item.payload,
    )
        .into_response())
}

/// Handler for GET /status
pub async fn status_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.config.backend.as_str()))
}

/// Handler for GET /metrics
///
/// Text exposition of every registered instrument.
pub async fn metrics_handler(State(state): State<AppState>) -> Result<Response> {
    let Some(registry) = state.recorder.registry() else {
        return Ok((StatusCode::NOT_FOUND, "metrics are disabled").into_response());
    };

    let body = registry
        .render()
        .map_err(|e| CacheError::Backend(format!("Failed to encode metrics: {}", e)))?;

    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response())
}
