//! Scripted [`ScanClient`] for tests and offline runs.
//!
//! Heartbeats pop results from a script; once the script is exhausted
//! every heartbeat answers with the fallback batch (empty by default).
//! Every location the client is moved to is recorded.

use std::collections::VecDeque;
use std::future::{Future, ready};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use spawnscan_types::{Coordinate, RawCellBatch};

use crate::client::{Credentials, ScanClient};
use crate::error::ScanError;

/// Session handle issued by [`StubScanClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct StubSession {
    /// Sequence number of the login that issued this handle.
    pub login: u64,
    /// Current position, if moved.
    pub location: Option<Coordinate>,
}

/// A [`ScanClient`] that replays scripted heartbeat results.
#[derive(Debug, Default)]
pub struct StubScanClient {
    script: Mutex<VecDeque<Result<RawCellBatch, ScanError>>>,
    fallback: RawCellBatch,
    reject_login: bool,
    logins: AtomicU64,
    heartbeats: AtomicU64,
    visited: Mutex<Vec<Coordinate>>,
}

impl StubScanClient {
    /// A client whose heartbeats always return an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// A client that answers heartbeats from `script` in order.
    pub fn with_script(script: impl IntoIterator<Item = Result<RawCellBatch, ScanError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        }
    }

    /// A client that answers every heartbeat with `batch`.
    pub fn repeating(batch: RawCellBatch) -> Self {
        Self {
            fallback: batch,
            ..Self::default()
        }
    }

    /// A client whose login always fails.
    pub fn rejecting_login() -> Self {
        Self {
            reject_login: true,
            ..Self::default()
        }
    }

    /// Number of successful logins.
    pub fn login_count(&self) -> u64 {
        self.logins.load(Ordering::Relaxed)
    }

    /// Number of heartbeat calls, failed ones included.
    pub fn heartbeat_count(&self) -> u64 {
        self.heartbeats.load(Ordering::Relaxed)
    }

    /// Every location passed to `set_location`, in call order.
    pub fn visited(&self) -> Vec<Coordinate> {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ScanClient for StubScanClient {
    type Session = StubSession;

    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Self::Session, ScanError>> + Send {
        let result = if self.reject_login {
            Err(ScanError::Authentication(format!(
                "login rejected for {}",
                credentials.username
            )))
        } else {
            let login = self.logins.fetch_add(1, Ordering::Relaxed).saturating_add(1);
            Ok(StubSession {
                login,
                location: None,
            })
        };
        ready(result)
    }

    fn set_location(&self, session: &mut Self::Session, at: Coordinate, _altitude: f64) {
        session.location = Some(at);
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(at);
    }

    fn heartbeat(
        &self,
        _session: &Self::Session,
    ) -> impl Future<Output = Result<RawCellBatch, ScanError>> + Send {
        self.heartbeats.fetch_add(1, Ordering::Relaxed);
        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        ready(next.unwrap_or_else(|| Ok(self.fallback.clone())))
    }
}
