//! The location client adapter seam.
//!
//! [`ScanClient`] wraps the external location-aware client: log in, move
//! the session to a coordinate, and ask for everything visible there.
//! Every call mutates location state held by the session, so callers must
//! serialize `set_location` + `heartbeat` pairs per session.
//!
//! [`RelayScanClient`](crate::relay::RelayScanClient) talks to a relay over
//! HTTP; [`StubScanClient`](crate::stub::StubScanClient) replays scripted
//! batches for tests.

use std::future::Future;

use serde::{Deserialize, Serialize};
use spawnscan_types::{Coordinate, RawCellBatch};

use crate::error::ScanError;

/// Account provider the location client authenticates against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthService {
    /// Trainer club account.
    #[default]
    Ptc,
    /// Google account.
    Google,
}

impl AuthService {
    /// Wire name of the provider.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ptc => "ptc",
            Self::Google => "google",
        }
    }
}

/// Login material for the location client.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
    /// Account provider.
    pub auth_service: AuthService,
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("auth_service", &self.auth_service)
            .finish()
    }
}

/// A location-aware client that reports the records around a position.
///
/// Methods return `Send` futures so a scan can run inside an Axum handler.
pub trait ScanClient: Send + Sync {
    /// Opaque per-login handle holding the client's location state.
    type Session: Send + Sync;

    /// Log in and obtain a fresh session.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Authentication`] on invalid credentials or
    /// transport failure.
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Self::Session, ScanError>> + Send;

    /// Move the session to `at`. The next heartbeat samples this position.
    fn set_location(&self, session: &mut Self::Session, at: Coordinate, altitude: f64);

    /// Fetch every record visible from the session's current position.
    ///
    /// An area without records yields an empty batch, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Transient`] or [`ScanError::Malformed`] when
    /// this one call fails, and [`ScanError::Authentication`] when the
    /// session is no longer accepted.
    fn heartbeat(
        &self,
        session: &Self::Session,
    ) -> impl Future<Output = Result<RawCellBatch, ScanError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_password() {
        let credentials = Credentials {
            username: String::from("ash"),
            password: String::from("pikachu123"),
            auth_service: AuthService::Google,
        };
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("ash"));
        assert!(!rendered.contains("pikachu123"));
    }

    #[test]
    fn auth_service_wire_names() {
        assert_eq!(AuthService::Ptc.as_str(), "ptc");
        assert_eq!(AuthService::Google.as_str(), "google");
        assert_eq!(AuthService::default(), AuthService::Ptc);
    }
}
