//! Explicit scan session state.
//!
//! A [`ScanSession`] owns the client's login handle and remembers where the
//! handle was last moved. The HTTP layer keeps exactly one session behind a
//! mutex so that only one scan drives the client at a time.

use spawnscan_types::Coordinate;

/// Login handle plus location bookkeeping for one [`ScanClient`].
///
/// [`ScanClient`]: crate::client::ScanClient
#[derive(Debug)]
pub struct ScanSession<S> {
    handle: Option<S>,
    location: Option<Coordinate>,
    logins: u64,
}

impl<S> ScanSession<S> {
    /// A session that has not logged in yet.
    pub const fn new() -> Self {
        Self {
            handle: None,
            location: None,
            logins: 0,
        }
    }

    /// Whether a login handle is held.
    pub const fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Drop the login handle so the next scan logs in again.
    pub fn invalidate(&mut self) {
        self.handle = None;
        self.location = None;
    }

    /// Where the handle was last moved, if anywhere.
    pub const fn location(&self) -> Option<Coordinate> {
        self.location
    }

    /// Number of successful logins over the session's lifetime.
    pub const fn login_count(&self) -> u64 {
        self.logins
    }

    pub(crate) fn activate(&mut self, handle: S) {
        self.handle = Some(handle);
        self.location = None;
        self.logins = self.logins.saturating_add(1);
    }

    pub(crate) const fn handle(&self) -> Option<&S> {
        self.handle.as_ref()
    }

    pub(crate) fn handle_mut(&mut self) -> Option<&mut S> {
        self.handle.as_mut()
    }

    pub(crate) const fn record_location(&mut self, at: Coordinate) {
        self.location = Some(at);
    }
}

impl<S> Default for ScanSession<S> {
    fn default() -> Self {
        Self::new()
    }
}
