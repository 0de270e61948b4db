//! Hierarchical spatial grid for the Spawnscan sighting service.
//!
//! The grid subdivides the latitude/longitude plane into a quadtree. Level
//! 0 is a single cell covering the whole globe; every level splits each
//! cell into four children. The aggregator takes the cell enclosing a
//! scan center at a fixed level and fans out over its children.
//!
//! # Modules
//!
//! - [`cell`] -- [`CellId`] and the enclosing-cell lookup.
//! - [`error`] -- Error types for grid operations.

pub mod cell;
pub mod error;

// Re-export primary types at crate root.
pub use cell::{CellId, MAX_LEVEL, SCAN_DEPTH, enclosing_cell};
pub use error::GridError;
