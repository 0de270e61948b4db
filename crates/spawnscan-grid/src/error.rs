//! Error types for the `spawnscan-grid` crate.

use spawnscan_types::Coordinate;

/// Errors that can occur during grid operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    /// A subdivision level outside `0..=MAX_LEVEL`, or a parent level
    /// deeper than the cell itself.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The coordinate is not a finite WGS84 position.
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(Coordinate),
}
