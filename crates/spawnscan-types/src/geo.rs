//! Geographic coordinate value type.

use serde::{Deserialize, Serialize};

/// A WGS84 latitude/longitude pair in degrees.
///
/// Immutable value. Translation produces a new coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, `[-90, 90]`.
    pub lat: f64,
    /// Longitude in degrees, `[-180, 180]`.
    pub lng: f64,
}

impl Coordinate {
    /// Create a coordinate from latitude and longitude in degrees.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both components are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Return this coordinate shifted by the given number of degrees.
    ///
    /// The result is [normalized](Self::normalized), so a shift across the
    /// antimeridian or past a pole stays a valid position.
    #[must_use]
    pub fn translated(&self, d_lat: f64, d_lng: f64) -> Self {
        Self {
            lat: self.lat + d_lat,
            lng: self.lng + d_lng,
        }
        .normalized()
    }

    /// Clamp latitude to `[-90, 90]` and wrap longitude into `[-180, 180)`.
    ///
    /// Non-finite components stay non-finite.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let lng = if (-180.0..=180.0).contains(&self.lng) {
            self.lng
        } else {
            (self.lng + 180.0).rem_euclid(360.0) - 180.0
        };
        Self {
            lat: self.lat.clamp(-90.0, 90.0),
            lng,
        }
    }
}

impl core::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}, {}", self.lat, self.lng)
    }
}
