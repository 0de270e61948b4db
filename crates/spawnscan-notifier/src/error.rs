//! Error types for push delivery.

/// Errors surfaced when a push provider fails to deliver a message.
///
/// Failed deliveries are reported once and never retried.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The request never reached the provider or the connection failed.
    #[error("push transport failed: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("push provider returned {status}: {body}")]
    Rejected {
        /// HTTP status code returned by the provider.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
}
