//! API Routes
//!
//! Configures the Axum router with all gateway endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{get_handler, metrics_handler, put_handler, status_handler, AppState};
use super::monitor::{monitor, Monitor};
use crate::metrics::RequestChannel;

/// Creates the main router with all endpoints configured.
///
/// `POST /cache` reports on the put channel and `GET /cache` on the get
/// channel. Status and metrics endpoints are not monitored.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let put_monitor = Monitor::new(state.recorder.clone(), RequestChannel::PutClient);
    let get_monitor = Monitor::new(state.recorder.clone(), RequestChannel::GetClient);

    Router::new()
        .route(
            "/cache",
            post(put_handler).layer(middleware::from_fn_with_state(put_monitor, monitor)),
        )
        .route(
            "/cache",
            get(get_handler).layer(middleware::from_fn_with_state(get_monitor, monitor)),
        )
        .route("/status", get(status_handler))
        .route("/metrics", get(metrics_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
