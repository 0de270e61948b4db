//! Records as returned by a single heartbeat call.
//!
//! A heartbeat reports every map cell visible from the client's current
//! location. Each cell carries the wild entity sightings and landmarks
//! inside it. These types mirror the relay's JSON wire format.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;
use crate::ids::{SightingKey, SpawnPointId};

/// One entity record from a heartbeat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSighting {
    /// Spawn point the entity appeared at.
    pub spawn_point_id: SpawnPointId,
    /// Entity type identifier.
    pub entity_id: u32,
    /// Where the entity is.
    #[serde(flatten)]
    pub position: Coordinate,
    /// Milliseconds until the entity disappears, measured from the
    /// heartbeat call.
    pub time_till_hidden_ms: i64,
}

impl RawSighting {
    /// The deduplication key of this record.
    pub fn key(&self) -> SightingKey {
        SightingKey::new(self.spawn_point_id.clone(), self.entity_id)
    }
}

/// The variant-specific part of a landmark record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LandmarkDetails {
    /// A capturable landmark held by a team.
    Gym {
        /// Owning team id (0 = neutral).
        team: u32,
        /// Prestige score; zero for an unclaimed landmark.
        score: u64,
    },
    /// A fort-type stop that can carry a lure.
    Stop {
        /// Unix timestamp in milliseconds when the active lure expires.
        /// Absent when no lure is applied.
        #[serde(default)]
        lure_expires_ms: Option<i64>,
    },
}

/// One landmark record from a heartbeat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLandmark {
    /// Disabled landmarks are ignored by the aggregator.
    pub enabled: bool,
    /// Where the landmark is.
    #[serde(flatten)]
    pub position: Coordinate,
    /// Team/score or lure information.
    pub details: LandmarkDetails,
}

/// The records of one map cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCell {
    /// Wild entity sightings inside the cell.
    #[serde(default)]
    pub sightings: Vec<RawSighting>,
    /// Landmarks inside the cell.
    #[serde(default)]
    pub landmarks: Vec<RawLandmark>,
}

/// Everything a single heartbeat returned.
///
/// An empty batch is a valid answer for an area with no records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCellBatch {
    /// Visible map cells.
    pub cells: Vec<RawCell>,
}

impl RawCellBatch {
    /// Build a batch holding a single cell.
    pub fn single(sightings: Vec<RawSighting>, landmarks: Vec<RawLandmark>) -> Self {
        Self {
            cells: vec![RawCell {
                sightings,
                landmarks,
            }],
        }
    }

    /// All sightings across cells, in cell order.
    pub fn sightings(&self) -> impl Iterator<Item = &RawSighting> {
        self.cells.iter().flat_map(|cell| cell.sightings.iter())
    }

    /// All landmarks across cells, in cell order.
    pub fn landmarks(&self) -> impl Iterator<Item = &RawLandmark> {
        self.cells.iter().flat_map(|cell| cell.landmarks.iter())
    }

    /// Whether no cell carries any record.
    pub fn is_empty(&self) -> bool {
        self.cells
            .iter()
            .all(|cell| cell.sightings.is_empty() && cell.landmarks.is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn decodes_relay_json() {
        let json = r#"{
            "cells": [
                {
                    "sightings": [
                        {"spawn_point_id": "89c25", "entity_id": 63,
                         "lat": 45.21, "lng": 2.45, "time_till_hidden_ms": 60000}
                    ],
                    "landmarks": [
                        {"enabled": true, "lat": 45.2, "lng": 2.4,
                         "details": {"kind": "gym", "team": 2, "score": 1800}},
                        {"enabled": true, "lat": 45.3, "lng": 2.5,
                         "details": {"kind": "stop"}}
                    ]
                },
                {}
            ]
        }"#;

        let batch: RawCellBatch = serde_json::from_str(json).unwrap();
        assert_eq!(batch.cells.len(), 2);
        assert_eq!(batch.sightings().count(), 1);
        assert_eq!(batch.landmarks().count(), 2);

        let sighting = batch.sightings().next().unwrap();
        assert_eq!(sighting.entity_id, 63);
        assert_eq!(sighting.key().to_string(), "89c25:63");

        let stop = batch.landmarks().nth(1).unwrap();
        assert_eq!(
            stop.details,
            LandmarkDetails::Stop {
                lure_expires_ms: None
            }
        );
    }

    #[test]
    fn empty_batch() {
        assert!(RawCellBatch::default().is_empty());
        assert!(RawCellBatch::single(Vec::new(), Vec::new()).is_empty());
    }

    #[test]
    fn missing_cells_is_malformed() {
        let result: Result<RawCellBatch, _> = serde_json::from_str("{}");
        assert!(result.is_err());
    }
}
