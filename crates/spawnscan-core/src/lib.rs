//! Location client adapter, scan session, and sighting aggregator for
//! Spawnscan.
//!
//! A scan moves the location client over the grid cell around a center,
//! collects one heartbeat per position, and merges the batches into a
//! deduplicated [`ScanSnapshot`](spawnscan_types::ScanSnapshot).
//!
//! # Modules
//!
//! - [`aggregator`] -- [`Scanner`] fan-out, seen-set dedup, and landmark
//!   classification.
//! - [`client`] -- [`ScanClient`] trait and login [`Credentials`].
//! - [`config`] -- Configuration loading from `spawnscan.yaml` into
//!   strongly-typed structs.
//! - [`error`] -- Scan and configuration error types.
//! - [`relay`] -- [`RelayScanClient`], the HTTP relay implementation.
//! - [`session`] -- [`ScanSession`], the explicit login and location state.
//! - [`stub`] -- [`StubScanClient`] replaying scripted heartbeats.
//!
//! [`Scanner`]: aggregator::Scanner
//! [`ScanClient`]: client::ScanClient
//! [`Credentials`]: client::Credentials
//! [`RelayScanClient`]: relay::RelayScanClient
//! [`ScanSession`]: session::ScanSession
//! [`StubScanClient`]: stub::StubScanClient

pub mod aggregator;
pub mod client;
pub mod config;
pub mod error;
pub mod relay;
pub mod session;
pub mod stub;

pub use aggregator::{ScanArea, Scanner};
pub use client::{AuthService, Credentials, ScanClient};
pub use config::{NotifierConfig, ServiceConfig};
pub use error::{ConfigError, ScanError};
pub use relay::RelayScanClient;
pub use session::ScanSession;
pub use stub::StubScanClient;
