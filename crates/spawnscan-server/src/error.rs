//! Error types for the scan API.
//!
//! [`ApiError`] unifies request-level failures into a single enum that
//! converts into a plain-text HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Client
//! errors answer `417 Expectation Failed`; everything else answers `500`.
//! No request-level failure terminates the process.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use spawnscan_core::ScanError;
use tracing::{error, warn};

/// Errors that can occur while handling a scan request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// One or more required query fields are absent.
    #[error("All the fields were not supplied (missing: {})", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// A query field is present but unusable.
    #[error("invalid field: {0}")]
    Validation(String),

    /// The location client rejected the login or the session.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The scan could not be performed.
    #[error("scan failed: {source}")]
    Scan {
        /// The underlying scan error.
        source: ScanError,
    },
}

impl ApiError {
    /// HTTP status this error answers with.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingFields(_) | Self::Validation(_) => StatusCode::EXPECTATION_FAILED,
            Self::Authentication(_) | Self::Scan { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ScanError> for ApiError {
    fn from(source: ScanError) -> Self {
        match source {
            ScanError::Authentication(msg) => Self::Authentication(msg),
            source => Self::Scan { source },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            error!(error = %message, "Request failed");
        } else {
            warn!(error = %message, "Request rejected");
        }
        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use spawnscan_core::ScanError;

    use super::*;

    #[test]
    fn client_errors_are_expectation_failed() {
        assert_eq!(
            ApiError::MissingFields(vec!["rad"]).status(),
            StatusCode::EXPECTATION_FAILED
        );
        assert_eq!(
            ApiError::Validation(String::from("lat")).status(),
            StatusCode::EXPECTATION_FAILED
        );
    }

    #[test]
    fn scan_errors_are_server_errors() {
        let auth = ApiError::from(ScanError::Authentication(String::from("bad password")));
        assert!(matches!(auth, ApiError::Authentication(_)));
        assert_eq!(auth.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let transient = ApiError::from(ScanError::Transient(String::from("reset")));
        assert!(matches!(transient, ApiError::Scan { .. }));
        assert_eq!(transient.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn missing_fields_message_names_fields() {
        let message = ApiError::MissingFields(vec!["lat", "rad"]).to_string();
        assert_eq!(message, "All the fields were not supplied (missing: lat, rad)");
    }
}
