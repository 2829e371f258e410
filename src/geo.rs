/*!
 * Geocoordinate extraction from the georeference field
 *
 * Each record carries an optional JSON object with numeric `lat` and `lng`
 * fields. Parsing is an explicit per-row result so the exclusion of a
 * malformed row is a visible, testable branch; a row failure never aborts
 * the batch.
 */

use serde::Deserialize;
use thiserror::Error;

use crate::data_types::{DatedVisit, GeoPoint};

/// Why a single row produced no map point
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinateError {
    /// The georeference field was absent or blank
    #[error("georeference field is absent")]
    Missing,
    /// Bad JSON, missing `lat`/`lng`, or non-numeric values
    #[error("malformed georeference: {0}")]
    Malformed(String),
}

#[derive(Debug, Deserialize)]
struct RawCoordinates {
    lat: f64,
    lng: f64,
}

/// Parse one georeference value into a latitude/longitude pair.
///
/// Values pass through unchanged; range checking is not this crate's concern.
pub fn parse_georeference(raw: Option<&str>) -> Result<(f64, f64), CoordinateError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).ok_or(CoordinateError::Missing)?;
    let coords: RawCoordinates =
        serde_json::from_str(raw).map_err(|e| CoordinateError::Malformed(e.to_string()))?;
    Ok((coords.lat, coords.lng))
}

/// Extract the map point set from the date-filtered visits.
///
/// Returns the valid points plus the count of rows excluded for missing or
/// malformed coordinates. An empty point set is reported through the
/// diagnostics, never as an error.
pub fn extract_points(visits: &[DatedVisit<'_>]) -> (Vec<GeoPoint>, usize) {
    let mut invalid_rows = 0;
    let points = visits
        .iter()
        .filter_map(|visit| {
            match parse_georeference(visit.record.georeference.as_deref()) {
                Ok((latitude, longitude)) => Some(GeoPoint {
                    latitude,
                    longitude,
                    neighborhood: visit.record.neighborhood.clone(),
                }),
                Err(_) => {
                    invalid_rows += 1;
                    None
                }
            }
        })
        .collect();
    (points, invalid_rows)
}
