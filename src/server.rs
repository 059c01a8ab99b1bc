//! HTTP Server
//!
//! Accept loop serving the router over HTTP/1 and HTTP/2. Every accepted
//! connection records one open event and then exactly one of: a clean close
//! or a close error. Errors never touch the open connection gauge.

use std::future::Future;
use std::time::Duration;

use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::service::TowerToHyperService;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::metrics::{ConnectionError, Recorder};

/// Pause after a failed accept, so a persistent failure (e.g. fd exhaustion)
/// does not spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Serves `router` on `listener` until `shutdown` resolves.
///
/// On shutdown the loop stops accepting, asks open connections to finish
/// their in-flight requests, and waits for them.
pub async fn serve<F>(
    listener: TcpListener,
    router: Router,
    recorder: Recorder,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send,
{
    let closing = CancellationToken::new();
    let mut connections = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(peer = %peer, "Connection accepted");
                    recorder.record_connection_opened();
                    connections.spawn(serve_connection(
                        stream,
                        router.clone(),
                        recorder.clone(),
                        closing.clone(),
                    ));
                }
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                    recorder.record_connection_error(ConnectionError::Accept);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            },
        }

        // Reap finished connection tasks
        while connections.try_join_next().is_some() {}
    }

    info!(open = connections.len(), "Stopped accepting, draining connections");
    closing.cancel();
    while connections.join_next().await.is_some() {}

    Ok(())
}

async fn serve_connection(
    stream: TcpStream,
    router: Router,
    recorder: Recorder,
    closing: CancellationToken,
) {
    let builder = auto::Builder::new(TokioExecutor::new());
    let service = TowerToHyperService::new(router);
    let conn = builder.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        _ = closing.cancelled() => {
            conn.as_mut().graceful_shutdown();
            conn.as_mut().await
        }
    };

    match result {
        Ok(()) => recorder.record_connection_closed(),
        Err(e) => {
            debug!(error = %e, "Connection closed with error");
            recorder.record_connection_error(ConnectionError::Close);
        }
    }
}
