//! Service wiring for the `spawnscan-server` binary.
//!
//! [`load_config`] reads the YAML settings file, and [`run_service`]
//! builds the relay client, scanner, notification dispatcher and HTTP
//! server from it.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use spawnscan_core::config::ListenConfig;
use spawnscan_core::{ConfigError, RelayScanClient, ScanError, Scanner, ServiceConfig};
use spawnscan_notifier::{Notifier, drain_dispatcher, spawn_dispatcher};
use tracing::info;

use crate::server::{ServerConfig, ServerError, ShutdownReason, start_server};
use crate::state::AppState;

/// How long queued notifications may take to go out after the server stops.
const NOTIFICATION_DRAIN_GRACE: Duration = Duration::from_secs(5);

/// Errors that can occur while starting or running the service.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The scanner could not be built from configuration.
    #[error("scanner error: {source}")]
    Scanner {
        /// The underlying scan error.
        #[from]
        source: ScanError,
    },

    /// The server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: ServerError,
    },
}

/// Parse an `interface/port` listen argument, e.g. `127.0.0.1/12345`.
///
/// # Errors
///
/// Returns a description of the problem if the argument is malformed.
pub fn parse_listen(arg: &str) -> Result<ListenConfig, String> {
    let (host, port) = arg
        .split_once('/')
        .ok_or_else(|| format!("expected interface/port, got {arg:?}"))?;
    if host.is_empty() {
        return Err(format!("missing interface in {arg:?}"));
    }
    let port = port
        .parse()
        .map_err(|e| format!("invalid port {port:?}: {e}"))?;
    Ok(ListenConfig {
        host: host.to_owned(),
        port,
    })
}

/// Load configuration from `path`, falling back to defaults when the
/// file does not exist. Environment overrides apply either way.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file exists but cannot be read, parsed,
/// or validated.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    if path.exists() {
        ServiceConfig::from_file(path)
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        let mut config = ServiceConfig::default();
        config.apply_env_overrides();
        Ok(config)
    }
}

/// Run the service until it is interrupted or a restart is requested.
///
/// # Errors
///
/// Returns [`StartupError`] if the scanner cannot be built or the server
/// fails to bind or serve.
pub async fn run_service(config: ServiceConfig) -> Result<ShutdownReason, StartupError> {
    let client = RelayScanClient::new(&config.scan.relay_url);
    let scanner = Scanner::new(client, config.scan.credentials(), config.scan.depth)?
        .with_altitude(config.scan.altitude);
    info!(
        relay_url = %config.scan.relay_url,
        username = %config.scan.username,
        provider = config.scan.auth_service.as_str(),
        depth = config.scan.depth,
        "Scanner configured"
    );

    let mut state = AppState::new(scanner);
    let mut dispatcher = None;
    let notifier = Notifier::from_config(&config.notifier);
    if notifier.is_enabled() {
        let (sender, handle) = spawn_dispatcher(notifier);
        state = state.with_notifications(sender);
        dispatcher = Some(handle);
        info!("Push notifications enabled");
    } else {
        info!("No push provider configured, notifications disabled");
    }

    let server_config = ServerConfig {
        host: config.listen.host.clone(),
        port: config.listen.port,
    };
    let state = Arc::new(state);
    let reason = start_server(&server_config, Arc::clone(&state)).await?;

    // Dropping the last state closes the sightings channel.
    drop(state);
    if let Some(handle) = dispatcher {
        drain_dispatcher(handle, NOTIFICATION_DRAIN_GRACE).await;
    }
    Ok(reason)
}
