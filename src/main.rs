//! Cache Gateway server binary
//!
//! # Startup Sequence
//! 1. Initialize tracing subscriber for logging
//! 2. Load configuration from environment variables
//! 3. Build the metrics registry and recorder
//! 4. Open the configured storage engine
//! 5. Create the Axum router and serve it on the configured port
//! 6. Handle graceful shutdown on SIGINT/SIGTERM

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cache_gateway::api::{create_router, AppState};
use cache_gateway::config::Config;
use cache_gateway::metrics::{MetricsRegistry, Recorder};
use cache_gateway::{backends, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cache_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Cache Gateway");

    let config = Config::from_env().context("Invalid configuration")?;
    info!(
        "Configuration loaded: backend={}, default_ttl={}s, max_ttl={}s, port={}",
        config.backend, config.default_ttl, config.max_ttl, config.server_port
    );

    let recorder = build_recorder(&config);

    let engine = backends::open(&config, recorder.clone())
        .with_context(|| format!("Failed to open {} backend", config.backend))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let app = create_router(AppState::new(engine.backend, recorder.clone(), config));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    server::serve(listener, app, recorder, shutdown_signal()).await?;

    if let Some(cleanup) = engine.cleanup {
        cleanup.abort();
        warn!("Cleanup task aborted");
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Builds the recorder. A registry that fails to build disables metrics
/// rather than stopping the gateway.
fn build_recorder(config: &Config) -> Recorder {
    if !config.metrics_enabled {
        info!("Metrics disabled");
        return Recorder::disabled();
    }

    match MetricsRegistry::new(&config.metrics_namespace, &config.metrics_subsystem) {
        Ok(registry) => Recorder::new(Arc::new(registry)),
        Err(e) => {
            warn!(error = %e, "Failed to build metrics registry, metrics disabled");
            Recorder::disabled()
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
