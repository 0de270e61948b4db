//! Background delivery of notifications.
//!
//! The request handler publishes each scan's sightings on an unbounded
//! channel and moves on. The dispatcher task owns the [`Notifier`] and a
//! memory of already-notified keys, so a sighting reported by several
//! consecutive scans is pushed once. A key is forgotten once its
//! disappearance time has passed.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use spawnscan_types::{Sighting, SightingKey};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::notifier::{Notifier, NotifyOutcome};
use crate::provider::PushProvider;

/// Sending half of the dispatcher channel: one message per scan.
pub type SightingSender = mpsc::UnboundedSender<Vec<Sighting>>;

/// Deduplicates sightings across scans before handing them to a
/// [`Notifier`].
pub struct Dispatcher<P> {
    notifier: Notifier<P>,
    notified: HashMap<SightingKey, i64>,
}

impl<P: PushProvider> Dispatcher<P> {
    /// Wrap a notifier.
    pub fn new(notifier: Notifier<P>) -> Self {
        Self {
            notifier,
            notified: HashMap::new(),
        }
    }

    /// The wrapped notifier.
    pub const fn notifier(&self) -> &Notifier<P> {
        &self.notifier
    }

    /// Number of keys currently remembered.
    pub fn remembered(&self) -> usize {
        self.notified.len()
    }

    /// Handle one scan's sightings at unix time `now`.
    ///
    /// Returns the number of messages delivered.
    pub async fn handle_batch(&mut self, sightings: &[Sighting], now: i64) -> usize {
        self.notified.retain(|_, disappears_at| *disappears_at > now);

        let mut sent = 0_usize;
        for sighting in sightings {
            if sighting.disappear_time <= now {
                continue;
            }
            if self
                .notified
                .insert(sighting.key(), sighting.disappear_time)
                .is_some()
            {
                continue;
            }
            match self.notifier.notify(sighting).await {
                Ok(NotifyOutcome::Sent) => sent = sent.saturating_add(1),
                Ok(_) => {}
                Err(e) => warn!(hash = %sighting.hash, error = %e, "Notification delivery failed"),
            }
        }
        sent
    }

    /// Receive batches until every sender is dropped.
    pub async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<Vec<Sighting>>) {
        while let Some(batch) = receiver.recv().await {
            let sent = self.handle_batch(&batch, Utc::now().timestamp()).await;
            debug!(
                received = batch.len(),
                sent,
                remembered = self.remembered(),
                "Notification batch handled"
            );
        }
        info!("Notification dispatcher stopped");
    }
}

/// Spawn a dispatcher task for `notifier`.
///
/// Returns the sender the request handler publishes on and the task
/// handle. The task ends when all senders are dropped.
pub fn spawn_dispatcher<P>(notifier: Notifier<P>) -> (SightingSender, JoinHandle<()>)
where
    P: PushProvider + 'static,
{
    let (sender, receiver) = mpsc::unbounded_channel();
    let handle = tokio::spawn(Dispatcher::new(notifier).run(receiver));
    (sender, handle)
}

/// Wait up to `grace` for a dispatcher task to finish its queue.
///
/// Every [`SightingSender`] must already be dropped, or the task never
/// ends. Returns whether the task finished cleanly in time; a task still
/// running is aborted.
pub async fn drain_dispatcher(mut handle: JoinHandle<()>, grace: Duration) -> bool {
    match tokio::time::timeout(grace, &mut handle).await {
        Ok(Ok(())) => {
            debug!("Notification dispatcher drained");
            true
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Notification dispatcher failed");
            false
        }
        Err(_elapsed) => {
            warn!(?grace, "Notification dispatcher did not drain in time, aborting");
            handle.abort();
            false
        }
    }
}
