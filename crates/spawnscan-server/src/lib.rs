//! HTTP scan service for Spawnscan.
//!
//! This crate provides an Axum HTTP server with a single path:
//!
//! - **`GET /?id&lat&lng&rad[&x&y]`** scans the grid cell around a
//!   position and answers `{id, pokemons, gyms, pokestops}`
//! - **`POST /`** answers `{"dump":"ok"}` and asks the process to restart
//!
//! # Architecture
//!
//! One [`ScanSession`](spawnscan_core::ScanSession) lives behind a mutex in
//! [`AppState`]. Every handler takes that lock first, so only one request
//! drives the location client at a time. Sightings from each scan are
//! handed to the notification dispatcher over a channel after the lock is
//! released.

pub mod control;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;

// Re-export primary types for convenience.
pub use control::{RESTART_EXIT_CODE, RestartControl};
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, ShutdownReason, start_server};
pub use startup::{StartupError, load_config, run_service};
pub use state::AppState;
