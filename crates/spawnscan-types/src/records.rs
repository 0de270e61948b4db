//! Output records and the per-request scan snapshot.
//!
//! Field names follow the JSON contract of the scan endpoint:
//! sightings serialize as `{id, lat, lng, expire_time, disappear_time, hash}`,
//! capturable landmarks as `{team, lat, lng, score}` and lured landmarks
//! as `{lat, lng, lured, expire_time}`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::geo::Coordinate;
use crate::ids::{SightingKey, SpawnPointId};

/// A deduplicated entity sighting with its computed disappearance time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Sighting {
    /// Entity type identifier.
    #[serde(rename = "id")]
    pub entity_id: u32,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Local time of day the entity disappears, `HH:MM:SS`.
    pub expire_time: String,
    /// Unix timestamp (seconds) the entity disappears.
    pub disappear_time: i64,
    /// Stable identity token, `<spawn point>:<entity id>`.
    pub hash: String,
    /// Spawn point the entity appeared at.
    #[serde(skip)]
    #[ts(skip)]
    pub spawn_point_id: SpawnPointId,
}

impl Sighting {
    /// The deduplication key of this sighting.
    pub fn key(&self) -> SightingKey {
        SightingKey::new(self.spawn_point_id.clone(), self.entity_id)
    }

    /// Position of the sighting.
    pub const fn position(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// A landmark held by a team with a positive score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CapturableLandmark {
    /// Owning team id.
    pub team: u32,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Landmark score.
    pub score: u64,
}

/// A fort-type stop and its lure state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LuredLandmark {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Whether a lure is active.
    pub lured: bool,
    /// Local time of day the lure expires, `HH:MM:SS`; empty when not lured.
    pub expire_time: String,
}

/// The aggregate result of one scan.
///
/// Created per request and never persisted. Within one snapshot no two
/// sightings share a [`SightingKey`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanSnapshot {
    /// Deduplicated sightings, first-reported first.
    pub sightings: Vec<Sighting>,
    /// Every capturable landmark occurrence, in collection order.
    pub capturable: Vec<CapturableLandmark>,
    /// Every fort-type stop occurrence, in collection order.
    pub lured: Vec<LuredLandmark>,
}

impl ScanSnapshot {
    /// Whether the snapshot holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.sightings.is_empty() && self.capturable.is_empty() && self.lured.is_empty()
    }
}
