//! Shared type definitions for the Spawnscan sighting service.
//!
//! This crate is the single source of truth for the records that flow
//! between the location client, the sighting aggregator, the HTTP layer,
//! and the notifier. Output records are exported to `TypeScript` via
//! `ts-rs` for the browser map client.
//!
//! # Modules
//!
//! - [`geo`] -- Geographic coordinate value type
//! - [`ids`] -- Spawn point identifiers and the sighting deduplication key
//! - [`raw`] -- Records as returned by a single heartbeat call
//! - [`records`] -- Output records and the per-request scan snapshot
//! - [`species`] -- Entity type id to display name table

pub mod geo;
pub mod ids;
pub mod raw;
pub mod records;
pub mod species;

// Re-export all public types at crate root for convenience.
pub use geo::Coordinate;
pub use ids::{SightingKey, SpawnPointId};
pub use raw::{LandmarkDetails, RawCell, RawCellBatch, RawLandmark, RawSighting};
pub use records::{CapturableLandmark, LuredLandmark, ScanSnapshot, Sighting};
pub use species::{display_name, species_name};
