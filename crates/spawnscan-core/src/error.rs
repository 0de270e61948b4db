//! Error types for the scan pipeline and configuration loading.

use spawnscan_grid::GridError;

/// Errors surfaced by the location client adapter and the aggregator.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Login failed, or the relay no longer accepts the session.
    ///
    /// The session is invalidated so the next scan logs in again.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// A single heartbeat call failed at the transport or protocol level.
    #[error("heartbeat failed: {0}")]
    Transient(String),

    /// A heartbeat answered with a body that is not a cell batch.
    #[error("malformed heartbeat response: {0}")]
    Malformed(String),

    /// The scan center or depth is not usable by the grid.
    #[error("grid error: {source}")]
    Grid {
        /// The underlying grid error.
        #[from]
        source: GridError,
    },
}

impl ScanError {
    /// Whether this failure ends cell collection while keeping the
    /// batches gathered so far.
    pub const fn keeps_partial_scan(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Malformed(_))
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The file parsed but a value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}
