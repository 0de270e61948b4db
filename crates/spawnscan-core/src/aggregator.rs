//! The sighting aggregator.
//!
//! One scan samples the parent grid cell around the (optionally
//! translated) center: one heartbeat at the center itself, then one per
//! child cell in enumeration order. The batches are merged into a
//! [`ScanSnapshot`]:
//!
//! - sightings are deduplicated by `(spawn point, entity type)`, and the
//!   first batch to report a key wins, so the center heartbeat beats any
//!   child heartbeat;
//! - enabled landmarks are classified as capturable (positive score) or
//!   lured (fort-type stop) without deduplication;
//! - disappearance times are computed from the time the batches are
//!   merged.
//!
//! A heartbeat that fails transiently ends collection; whatever was
//! gathered is still merged.

use std::collections::HashSet;
use std::iter;

use chrono::{DateTime, Local, TimeDelta, Utc};
use spawnscan_grid::{CellId, MAX_LEVEL, enclosing_cell};
use spawnscan_types::{
    CapturableLandmark, Coordinate, LandmarkDetails, LuredLandmark, RawCellBatch, RawLandmark,
    RawSighting, ScanSnapshot, Sighting,
};
use tracing::{debug, info, warn};

use crate::client::{Credentials, ScanClient};
use crate::error::ScanError;
use crate::session::ScanSession;

/// Degrees moved per unit of request offset, on both axes.
pub const OFFSET_STEP_DEGREES: f64 = 0.0025;

/// Format used for every time-of-day string in the output.
const TIME_OF_DAY_FORMAT: &str = "%H:%M:%S";

/// What a caller asked to scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanArea {
    /// Base location.
    pub center: Coordinate,
    /// Radius in grid units; bounds the accepted offsets.
    pub radius_cells: i32,
    /// Virtual grid column offset, applied to latitude.
    pub offset_x: Option<i32>,
    /// Virtual grid row offset, applied to longitude.
    pub offset_y: Option<i32>,
}

impl ScanArea {
    /// An area without offsets.
    pub const fn new(center: Coordinate, radius_cells: i32) -> Self {
        Self {
            center,
            radius_cells,
            offset_x: None,
            offset_y: None,
        }
    }

    /// The same area with the given offsets.
    #[must_use]
    pub const fn with_offset(mut self, offset_x: Option<i32>, offset_y: Option<i32>) -> Self {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self
    }

    /// The same area with offsets cleared.
    #[must_use]
    pub const fn without_offset(&self) -> Self {
        Self::new(self.center, self.radius_cells)
    }

    /// The center actually scanned.
    ///
    /// Both offsets must be present and inside the radius window for the
    /// center to move; otherwise the base location is used unchanged.
    pub fn effective_center(&self) -> Coordinate {
        match (self.offset_x, self.offset_y) {
            (Some(x), Some(y))
                if offset_in_window(x, self.radius_cells)
                    && offset_in_window(y, self.radius_cells) =>
            {
                self.center.translated(
                    f64::from(x) * OFFSET_STEP_DEGREES,
                    f64::from(y) * OFFSET_STEP_DEGREES,
                )
            }
            _ => self.center,
        }
    }
}

/// Whether `offset` lies in `(floor(-radius / 2), floor(radius / 2)]`.
fn offset_in_window(offset: i32, radius: i32) -> bool {
    let low = radius.checked_neg().map_or(i32::MIN, |neg| neg.div_euclid(2));
    let high = radius.div_euclid(2);
    low < offset && offset <= high
}

/// Drives a [`ScanClient`] over the grid and merges what it reports.
pub struct Scanner<C> {
    client: C,
    credentials: Credentials,
    depth: u8,
    altitude: f64,
}

impl<C: ScanClient> Scanner<C> {
    /// Create a scanner fanning out from cells at `depth`.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Grid`] if cells at `depth` cannot have
    /// children.
    pub fn new(client: C, credentials: Credentials, depth: u8) -> Result<Self, ScanError> {
        if depth >= MAX_LEVEL {
            return Err(ScanError::Grid {
                source: spawnscan_grid::GridError::InvalidArgument(format!(
                    "scan depth {depth} must be below {MAX_LEVEL}"
                )),
            });
        }
        Ok(Self {
            client,
            credentials,
            depth,
            altitude: 0.0,
        })
    }

    /// Set the altitude reported with every location update.
    #[must_use]
    pub const fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = altitude;
        self
    }

    /// The wrapped client.
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Level of the parent cell each scan fans out from.
    pub const fn depth(&self) -> u8 {
        self.depth
    }

    /// Run one full scan of `area`.
    ///
    /// Logs in if `session` holds no handle. The session is left at the
    /// effective center afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Authentication`] if login fails or the client
    /// rejects the session mid-scan (the session is invalidated), and
    /// [`ScanError::Grid`] if the effective center is not a valid position.
    /// Transient heartbeat failures are not errors; they shorten the scan.
    pub async fn scan(
        &self,
        session: &mut ScanSession<C::Session>,
        area: &ScanArea,
    ) -> Result<ScanSnapshot, ScanError> {
        let center = area.effective_center();
        let parent = enclosing_cell(center, self.depth)?;
        let children = parent.children()?;

        self.ensure_session(session).await?;

        let targets: Vec<Coordinate> = iter::once(center)
            .chain(children.iter().map(CellId::center))
            .collect();
        let mut batches = Vec::with_capacity(targets.len());
        let mut fatal = None;

        for (index, target) in targets.iter().enumerate() {
            self.move_to(session, *target)?;
            match self.heartbeat(session).await {
                Ok(batch) => batches.push(batch),
                Err(e) if e.keeps_partial_scan() => {
                    warn!(
                        cell = index,
                        collected = batches.len(),
                        error = %e,
                        "Heartbeat failed, keeping partial scan"
                    );
                    break;
                }
                Err(e) => {
                    fatal = Some(e);
                    break;
                }
            }
        }

        // The client's location is shared across requests; always put it back.
        self.move_to(session, center)?;

        if let Some(e) = fatal {
            warn!(error = %e, "Scan aborted, invalidating session");
            session.invalidate();
            return Err(e);
        }

        let snapshot = merge_batches(&batches, Utc::now());
        info!(
            %center,
            parent = %parent,
            cells = batches.len(),
            sightings = snapshot.sightings.len(),
            capturable = snapshot.capturable.len(),
            lured = snapshot.lured.len(),
            "Scan complete"
        );
        Ok(snapshot)
    }

    async fn ensure_session(&self, session: &mut ScanSession<C::Session>) -> Result<(), ScanError> {
        if session.is_active() {
            return Ok(());
        }
        match self.client.login(&self.credentials).await {
            Ok(handle) => {
                session.activate(handle);
                info!(
                    username = %self.credentials.username,
                    provider = self.credentials.auth_service.as_str(),
                    "Logged in to location client"
                );
                Ok(())
            }
            Err(e) => {
                session.invalidate();
                Err(e)
            }
        }
    }

    fn move_to(&self, session: &mut ScanSession<C::Session>, at: Coordinate) -> Result<(), ScanError> {
        let handle = session.handle_mut().ok_or_else(no_session)?;
        self.client.set_location(handle, at, self.altitude);
        session.record_location(at);
        Ok(())
    }

    async fn heartbeat(&self, session: &ScanSession<C::Session>) -> Result<RawCellBatch, ScanError> {
        let handle = session.handle().ok_or_else(no_session)?;
        self.client.heartbeat(handle).await
    }
}

fn no_session() -> ScanError {
    ScanError::Authentication(String::from("no active session"))
}

/// Merge heartbeat batches, in collection order, into a snapshot.
///
/// `now` is the reference time for disappearance timestamps.
pub fn merge_batches(batches: &[RawCellBatch], now: DateTime<Utc>) -> ScanSnapshot {
    let mut seen = HashSet::new();
    let mut snapshot = ScanSnapshot::default();

    for batch in batches {
        for raw in batch.sightings() {
            if seen.insert(raw.key()) {
                snapshot.sightings.push(build_sighting(raw, now));
            }
        }
        for landmark in batch.landmarks() {
            match classify_landmark(landmark) {
                Some(LandmarkClass::Capturable(gym)) => snapshot.capturable.push(gym),
                Some(LandmarkClass::Lured(stop)) => snapshot.lured.push(stop),
                None => {}
            }
        }
    }

    snapshot
}

/// Turn a raw sighting into an output record.
pub fn build_sighting(raw: &RawSighting, now: DateTime<Utc>) -> Sighting {
    let disappears_at = TimeDelta::try_milliseconds(raw.time_till_hidden_ms)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(now);

    Sighting {
        entity_id: raw.entity_id,
        lat: raw.position.lat,
        lng: raw.position.lng,
        expire_time: time_of_day(disappears_at),
        disappear_time: disappears_at.timestamp(),
        hash: raw.key().to_string(),
        spawn_point_id: raw.spawn_point_id.clone(),
    }
}

/// The output record a landmark maps to.
#[derive(Debug, Clone, PartialEq)]
pub enum LandmarkClass {
    /// Team-held landmark with a positive score.
    Capturable(CapturableLandmark),
    /// Fort-type stop, lured or not.
    Lured(LuredLandmark),
}

/// Classify one landmark record.
///
/// Disabled landmarks and zero-score team landmarks map to `None`.
pub fn classify_landmark(landmark: &RawLandmark) -> Option<LandmarkClass> {
    if !landmark.enabled {
        return None;
    }
    let Coordinate { lat, lng } = landmark.position;

    match landmark.details {
        LandmarkDetails::Gym { team, score } if score > 0 => {
            Some(LandmarkClass::Capturable(CapturableLandmark {
                team,
                lat,
                lng,
                score,
            }))
        }
        LandmarkDetails::Gym { team, .. } => {
            debug!(team, lat, lng, "Skipping zero-score landmark");
            None
        }
        LandmarkDetails::Stop { lure_expires_ms } => {
            let expire_time = lure_expires_ms
                .filter(|ms| *ms > 0)
                .and_then(DateTime::from_timestamp_millis)
                .map(time_of_day)
                .unwrap_or_default();
            Some(LandmarkClass::Lured(LuredLandmark {
                lat,
                lng,
                lured: !expire_time.is_empty(),
                expire_time,
            }))
        }
    }
}

fn time_of_day(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format(TIME_OF_DAY_FORMAT).to_string()
}
