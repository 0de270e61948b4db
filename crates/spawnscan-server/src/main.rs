//! Spawnscan scan service binary.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Parse the command line
//! 3. Load configuration from `spawnscan.yaml` (or `--config`)
//! 4. Serve until `Ctrl-C` or a restart request
//!
//! A restart request exits with code 75 so a supervisor starts the
//! service again.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use spawnscan_core::config::ListenConfig;
use spawnscan_server::startup::parse_listen;
use spawnscan_server::{RESTART_EXIT_CODE, ShutdownReason, StartupError, load_config, run_service};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Sighting scan service.
#[derive(Debug, Parser)]
#[command(name = "spawnscan-server", version, about)]
struct Args {
    /// Listen address as `interface/port`, e.g. `127.0.0.1/12345`.
    #[arg(value_parser = parse_listen)]
    listen: Option<ListenConfig>,

    /// Path to the YAML settings file.
    #[arg(long, default_value = "spawnscan.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let args = Args::parse();
    info!("spawnscan-server starting");

    match run(args).await {
        Ok(ShutdownReason::Restart) => {
            info!(code = RESTART_EXIT_CODE, "Exiting for restart");
            ExitCode::from(RESTART_EXIT_CODE)
        }
        Ok(ShutdownReason::Interrupt) => {
            info!("spawnscan-server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "spawnscan-server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ShutdownReason, StartupError> {
    let mut config = load_config(&args.config)?;
    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    info!(
        listen = %config.listen.address(),
        config = %args.config.display(),
        "Configuration loaded"
    );
    run_service(config).await
}
