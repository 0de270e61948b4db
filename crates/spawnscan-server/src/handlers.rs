//! Endpoint handlers for the scan API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/?id&lat&lng&rad[&x&y]` | Scan around a position |
//! | `POST` | `/` | Acknowledge and request a restart |
//!
//! Both handlers take the session lock before doing anything else.

use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use spawnscan_core::{ScanArea, ScanClient};
use spawnscan_types::{CapturableLandmark, Coordinate, LuredLandmark, Sighting};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter and response structs
// ---------------------------------------------------------------------------

/// Raw query parameters of `GET /`.
///
/// Fields are kept as text so that an absent field and an unparsable one
/// can be told apart.
#[derive(Debug, Default)]
pub struct ScanQuery {
    /// Request identity, echoed back.
    pub id: Option<String>,
    /// Latitude in degrees.
    pub lat: Option<String>,
    /// Longitude in degrees.
    pub lng: Option<String>,
    /// Radius in grid units.
    pub rad: Option<String>,
    /// Optional column offset.
    pub x: Option<String>,
    /// Optional row offset.
    pub y: Option<String>,
}

/// A validated scan request.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    /// Request identity, echoed back.
    pub id: i64,
    /// What to scan.
    pub area: ScanArea,
}

impl ScanQuery {
    /// Collect the known fields from decoded query pairs.
    ///
    /// A repeated key keeps its first value; unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "id" => &mut query.id,
                "lat" => &mut query.lat,
                "lng" => &mut query.lng,
                "rad" => &mut query.rad,
                "x" => &mut query.x,
                "y" => &mut query.y,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }

    /// Check presence and types of every field.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingFields`] naming every absent required
    /// field, or [`ApiError::Validation`] for the first present field that
    /// does not parse.
    pub fn validate(&self) -> Result<ScanRequest, ApiError> {
        let missing: Vec<&'static str> = [
            ("id", &self.id),
            ("lat", &self.lat),
            ("lng", &self.lng),
            ("rad", &self.rad),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name)
        .collect();
        if !missing.is_empty() {
            return Err(ApiError::MissingFields(missing));
        }

        let id = required(self.id.as_deref(), "id")?;
        let lat: f64 = required(self.lat.as_deref(), "lat")?;
        let lng: f64 = required(self.lng.as_deref(), "lng")?;
        let rad = required(self.rad.as_deref(), "rad")?;
        let x = optional(self.x.as_deref(), "x")?;
        let y = optional(self.y.as_deref(), "y")?;

        let center = Coordinate::new(lat, lng);
        if !center.is_valid() {
            return Err(ApiError::Validation(format!(
                "lat/lng ({center}) is not a valid position"
            )));
        }

        Ok(ScanRequest {
            id,
            area: ScanArea::new(center, rad).with_offset(x, y),
        })
    }
}

fn required<T>(value: Option<&str>, name: &'static str) -> Result<T, ApiError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = value.ok_or_else(|| ApiError::MissingFields(vec![name]))?;
    parse_field(raw, name)
}

fn optional<T>(value: Option<&str>, name: &'static str) -> Result<Option<T>, ApiError>
where
    T: FromStr,
    T::Err: Display,
{
    value.map(|raw| parse_field(raw, name)).transpose()
}

fn parse_field<T>(raw: &str, name: &'static str) -> Result<T, ApiError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| ApiError::Validation(format!("{name}={raw:?}: {e}")))
}

/// Response body of `GET /`.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResponse {
    /// Request identity.
    pub id: i64,
    /// Deduplicated sightings.
    pub pokemons: Vec<Sighting>,
    /// Capturable landmarks.
    pub gyms: Vec<CapturableLandmark>,
    /// Fort-type stops.
    pub pokestops: Vec<LuredLandmark>,
}

/// Response body of `POST /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpAck {
    /// Always `"ok"`.
    pub dump: String,
}

// ---------------------------------------------------------------------------
// GET / -- scan
// ---------------------------------------------------------------------------

/// Scan around the requested position.
///
/// If the scan finds no sightings the session is reset and the scan is
/// repeated once without offsets; the second result is returned as is.
///
/// # Errors
///
/// Returns [`ApiError`] for missing or invalid fields and for scans that
/// could not run.
pub async fn scan<C: ScanClient>(
    State(state): State<Arc<AppState<C>>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<ScanResponse>, ApiError> {
    let mut session = state.session.lock().await;

    let request = ScanQuery::from_pairs(pairs).validate()?;
    info!(
        id = request.id,
        center = %request.area.center,
        rad = request.area.radius_cells,
        x = ?request.area.offset_x,
        y = ?request.area.offset_y,
        "Scan requested"
    );

    let mut snapshot = state.scanner.scan(&mut session, &request.area).await?;
    if snapshot.sightings.is_empty() {
        info!(id = request.id, "No sightings found, retrying with a fresh session");
        session.invalidate();
        snapshot = state
            .scanner
            .scan(&mut session, &request.area.without_offset())
            .await?;
    }
    // Serializing the response touches no session state, so the lock ends here.
    drop(session);

    state.publish(&snapshot.sightings);

    Ok(Json(ScanResponse {
        id: request.id,
        pokemons: snapshot.sightings,
        gyms: snapshot.capturable,
        pokestops: snapshot.lured,
    }))
}

// ---------------------------------------------------------------------------
// POST / -- restart
// ---------------------------------------------------------------------------

/// Acknowledge and request a restart.
///
/// The server drains in-flight connections, so this response is flushed
/// before the process exits.
pub async fn restart<C: ScanClient>(State(state): State<Arc<AppState<C>>>) -> Json<DumpAck> {
    let _session = state.session.lock().await;
    info!("Restart requested");
    state.restart.request();
    Json(DumpAck {
        dump: String::from("ok"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> ScanQuery {
        ScanQuery::from_pairs(
            pairs
                .iter()
                .map(|(key, value)| ((*key).to_owned(), (*value).to_owned())),
        )
    }

    #[test]
    fn repeated_keys_keep_the_first_value() {
        let request = query(&[
            ("id", "1"),
            ("id", "2"),
            ("lat", "45.0"),
            ("lng", "2.0"),
            ("rad", "4"),
            ("rad", "oops"),
            ("zoom", "12"),
        ])
        .validate()
        .unwrap();
        assert_eq!(request.id, 1);
        assert_eq!(request.area.radius_cells, 4);
    }

    #[test]
    fn valid_query() {
        let request = query(&[
            ("id", "5"),
            ("lat", "45.2156"),
            ("lng", "2.4586"),
            ("rad", "4"),
            ("x", "1"),
            ("y", "-1"),
        ])
        .validate()
        .unwrap();
        assert_eq!(request.id, 5);
        assert_eq!(request.area.radius_cells, 4);
        assert_eq!(request.area.offset_x, Some(1));
        assert_eq!(request.area.offset_y, Some(-1));
    }

    #[test]
    fn missing_fields_are_all_named() {
        let err = query(&[("id", "5"), ("lng", "2.0")]).validate().unwrap_err();
        assert!(
            matches!(&err, ApiError::MissingFields(missing) if *missing == ["lat", "rad"]),
            "{err}"
        );
    }

    #[test]
    fn unparsable_values_are_validation_errors() {
        let base = [("id", "5"), ("lat", "1.0"), ("lng", "2.0"), ("rad", "4")];
        for (field, bad) in [("id", "five"), ("lat", "north"), ("rad", "4.5"), ("x", "")] {
            let mut pairs = base.to_vec();
            pairs.retain(|(k, _)| *k != field);
            pairs.push((field, bad));
            let err = query(&pairs).validate().unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "{field}={bad:?}");
        }
    }

    #[test]
    fn non_finite_or_out_of_range_positions_are_rejected() {
        for lat in ["NaN", "inf", "91"] {
            let err = query(&[("id", "1"), ("lat", lat), ("lng", "0"), ("rad", "4")])
                .validate()
                .unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "lat={lat}");
        }
    }
}
