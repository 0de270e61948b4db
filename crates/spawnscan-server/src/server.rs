//! Scan server lifecycle management.
//!
//! Provides [`start_server`] which binds to a TCP port and runs the Axum
//! server until a restart is requested or `Ctrl-C` is received. Either
//! way in-flight requests are drained before it returns.

use std::net::SocketAddr;
use std::sync::Arc;

use spawnscan_core::ScanClient;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::control::RestartControl;
use crate::router::build_router;
use crate::state::AppState;

/// Configuration for the scan server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `127.0.0.1`).
    pub host: String,
    /// The TCP port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 12345,
        }
    }
}

/// Why the server stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// A client asked for a restart.
    Restart,
    /// The process was interrupted.
    Interrupt,
}

/// Start the scan HTTP server.
///
/// Binds to the configured address, builds the router, and serves
/// requests until shutdown.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind or the server
/// encounters a fatal I/O error.
pub async fn start_server<C>(
    config: &ServerConfig,
    state: Arc<AppState<C>>,
) -> Result<ShutdownReason, ServerError>
where
    C: ScanClient + 'static,
{
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| ServerError::Bind(format!("invalid address: {e}")))?;

    let restart = Arc::clone(&state.restart);
    let router = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;

    info!(%addr, "Scan server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&restart)))
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

    if restart.is_requested() {
        Ok(ShutdownReason::Restart)
    } else {
        Ok(ShutdownReason::Interrupt)
    }
}

/// Resolve on a restart request or `Ctrl-C`.
async fn shutdown_signal(restart: Arc<RestartControl>) {
    tokio::select! {
        () = restart.wait() => info!("Restart requested, draining connections"),
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => info!("Interrupted, draining connections"),
            Err(e) => {
                warn!(error = %e, "Failed to listen for Ctrl-C, waiting for restart only");
                restart.wait().await;
            }
        },
    }
}

/// Errors that can occur when starting or running the scan server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}
