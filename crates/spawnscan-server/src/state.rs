//! Shared application state for the scan API.
//!
//! [`AppState`] owns the scanner, the single scan session, the restart
//! control, and the optional channel to the notification dispatcher.
//! The session mutex is the process-wide request lock: every handler
//! acquires it first, so request bodies run one at a time while the
//! transport keeps accepting connections.

use std::sync::Arc;

use spawnscan_core::{ScanClient, ScanSession, Scanner};
use spawnscan_notifier::SightingSender;
use spawnscan_types::Sighting;
use tokio::sync::Mutex;
use tracing::warn;

use crate::control::RestartControl;

/// Shared state behind every handler.
pub struct AppState<C: ScanClient> {
    /// Drives the location client over the grid.
    pub scanner: Scanner<C>,
    /// The one login session; holding its lock serializes requests.
    pub session: Mutex<ScanSession<C::Session>>,
    /// Set by `POST /`.
    pub restart: Arc<RestartControl>,
    /// Where each scan's sightings are published for notification.
    pub sightings: Option<SightingSender>,
}

impl<C: ScanClient> AppState<C> {
    /// Create state with a fresh session and no notifications.
    pub fn new(scanner: Scanner<C>) -> Self {
        Self {
            scanner,
            session: Mutex::new(ScanSession::new()),
            restart: Arc::new(RestartControl::new()),
            sightings: None,
        }
    }

    /// Publish sightings on `sender` after each successful scan.
    #[must_use]
    pub fn with_notifications(mut self, sender: SightingSender) -> Self {
        self.sightings = Some(sender);
        self
    }

    /// Share an existing restart control.
    #[must_use]
    pub fn with_restart(mut self, restart: Arc<RestartControl>) -> Self {
        self.restart = restart;
        self
    }

    /// Hand a scan's sightings to the notification dispatcher, if any.
    ///
    /// Never blocks. A stopped dispatcher is logged and otherwise ignored.
    pub fn publish(&self, sightings: &[Sighting]) {
        let Some(sender) = &self.sightings else {
            return;
        };
        if sightings.is_empty() {
            return;
        }
        if sender.send(sightings.to_vec()).is_err() {
            warn!("Notification dispatcher is not running, dropping sightings");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use spawnscan_core::{Credentials, StubScanClient};
    use spawnscan_types::SpawnPointId;
    use tokio::sync::mpsc;

    use super::*;

    fn state() -> AppState<StubScanClient> {
        let scanner = Scanner::new(StubScanClient::new(), Credentials::default(), 15).unwrap();
        AppState::new(scanner)
    }

    fn sighting() -> Sighting {
        Sighting {
            entity_id: 1,
            lat: 0.0,
            lng: 0.0,
            expire_time: String::new(),
            disappear_time: 0,
            hash: String::from("a:1"),
            spawn_point_id: SpawnPointId::new("a"),
        }
    }

    #[test]
    fn publish_without_dispatcher_is_a_no_op() {
        state().publish(&[sighting()]);
    }

    #[test]
    fn publish_sends_one_message_per_scan() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let state = state().with_notifications(sender);

        state.publish(&[sighting(), sighting()]);
        state.publish(&[]);

        assert_eq!(receiver.try_recv().unwrap().len(), 2);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn publish_to_stopped_dispatcher_does_not_fail() {
        let (sender, receiver) = mpsc::unbounded_channel();
        drop(receiver);
        state().with_notifications(sender).publish(&[sighting()]);
    }
}
