//! HTTP relay implementation of [`ScanClient`].
//!
//! The relay fronts the real location-aware game client. It exposes two
//! JSON endpoints:
//!
//! - `POST {relay_url}/login` with `{username, password, provider}`,
//!   answering `{token}`;
//! - `POST {relay_url}/heartbeat` with `{token, lat, lng, altitude}`,
//!   answering a [`RawCellBatch`].
//!
//! `401`/`403` mean the session is gone; any other failure affects only
//! the call at hand.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use spawnscan_types::{Coordinate, RawCellBatch};
use tracing::debug;

use crate::client::{Credentials, ScanClient};
use crate::error::ScanError;

/// Login handle issued by the relay, plus the position it is parked at.
pub struct RelaySession {
    token: String,
    location: Option<Coordinate>,
    altitude: f64,
}

impl RelaySession {
    /// Where the session was last moved, if anywhere.
    pub const fn location(&self) -> Option<Coordinate> {
        self.location
    }
}

impl core::fmt::Debug for RelaySession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RelaySession")
            .field("token", &"<redacted>")
            .field("location", &self.location)
            .field("altitude", &self.altitude)
            .finish()
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    provider: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Serialize)]
struct HeartbeatRequest<'a> {
    token: &'a str,
    lat: f64,
    lng: f64,
    altitude: f64,
}

/// A [`ScanClient`] backed by the HTTP relay.
pub struct RelayScanClient {
    client: reqwest::Client,
    base_url: String,
}

impl RelayScanClient {
    /// Create a client for the relay at `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl ScanClient for RelayScanClient {
    type Session = RelaySession;

    async fn login(&self, credentials: &Credentials) -> Result<Self::Session, ScanError> {
        let url = format!("{}/login", self.base_url);
        let body = LoginRequest {
            username: &credentials.username,
            password: &credentials.password,
            provider: credentials.auth_service.as_str(),
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScanError::Authentication(format!("login request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(ScanError::Authentication(format!(
                "relay rejected login with {status}: {error_body}"
            )));
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| ScanError::Authentication(format!("login response parse failed: {e}")))?;

        Ok(RelaySession {
            token: login.token,
            location: None,
            altitude: 0.0,
        })
    }

    fn set_location(&self, session: &mut Self::Session, at: Coordinate, altitude: f64) {
        session.location = Some(at);
        session.altitude = altitude;
    }

    async fn heartbeat(&self, session: &Self::Session) -> Result<RawCellBatch, ScanError> {
        let at = session
            .location
            .ok_or_else(|| ScanError::Transient("heartbeat before any location was set".to_owned()))?;
        let url = format!("{}/heartbeat", self.base_url);
        let body = HeartbeatRequest {
            token: &session.token,
            lat: at.lat,
            lng: at.lng,
            altitude: session.altitude,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScanError::Transient(format!("heartbeat request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(status_error(status, &error_body));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ScanError::Transient(format!("heartbeat body read failed: {e}")))?;
        let batch = decode_batch(&text)?;
        debug!(%at, cells = batch.cells.len(), "Heartbeat answered");
        Ok(batch)
    }
}

/// Map a non-success heartbeat status to a scan error.
fn status_error(status: StatusCode, body: &str) -> ScanError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ScanError::Authentication(format!("relay returned {status}: {body}"))
        }
        _ => ScanError::Transient(format!("relay returned {status}: {body}")),
    }
}

/// Decode a heartbeat body.
fn decode_batch(body: &str) -> Result<RawCellBatch, ScanError> {
    serde_json::from_str(body).map_err(|e| ScanError::Malformed(e.to_string()))
}
