//! Restart control shared between the scan API and the server loop.
//!
//! `POST /` calls [`RestartControl::request`]; the server loop waits on
//! [`RestartControl::wait`], drains in-flight connections, and the binary
//! exits with [`RESTART_EXIT_CODE`] so its supervisor starts it again.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Exit code asking the supervisor to restart the service (`EX_TEMPFAIL`).
pub const RESTART_EXIT_CODE: u8 = 75;

/// One-shot restart request flag.
#[derive(Debug, Default)]
pub struct RestartControl {
    requested: AtomicBool,
    notify: Notify,
}

impl RestartControl {
    /// A control with no restart requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a restart. Idempotent.
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    /// Whether a restart has been requested.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Resolve once a restart has been requested.
    pub async fn wait(&self) {
        while !self.is_requested() {
            self.notify.notified().await;
        }
    }
}
