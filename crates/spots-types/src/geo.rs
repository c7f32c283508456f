use std::f64::consts::PI;

use thiserror::Error;

/// Mean Earth radius used for the degree conversions.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

// Floor for cos(lat) so the poles give a wide but finite longitude span.
const MIN_COS_LAT: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeoError {
    #[error("invalid {0} parameter")]
    InvalidParameter(&'static str),
}

/// Axis-aligned latitude/longitude box approximating a circle of a given
/// radius around a point.
///
/// This is deliberately a box and not a great-circle test: points near the
/// corners are inside the box while being farther away than the radius, and
/// proximity checks built on it treat them as conflicts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    /// Box of `radius_km` around (`lat`, `lon`), clamped to the legal
    /// coordinate ranges (no wrapping across the antimeridian).
    pub fn around(lat: f64, lon: f64, radius_km: f64) -> Result<Self, GeoError> {
        if !lat.is_finite() {
            return Err(GeoError::InvalidParameter("latitude"));
        }
        if !lon.is_finite() {
            return Err(GeoError::InvalidParameter("longitude"));
        }
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(GeoError::InvalidParameter("radius"));
        }

        let lat_delta = radius_km / EARTH_RADIUS_KM * (180.0 / PI);
        let cos_lat = lat.to_radians().cos().abs().max(MIN_COS_LAT);
        let lon_delta = lat_delta / cos_lat;

        Ok(Self {
            min_lat: (lat - lat_delta).max(-90.0),
            max_lat: (lat + lat_delta).min(90.0),
            min_lon: (lon - lon_delta).max(-180.0),
            max_lon: (lon + lon_delta).min(180.0),
        })
    }

    /// Same as [`GeoBounds::around`] for raw query-string values.
    pub fn parse(lat: &str, lon: &str, radius_km: &str) -> Result<Self, GeoError> {
        let lat = parse_number(lat, "latitude")?;
        let lon = parse_number(lon, "longitude")?;
        let radius_km = parse_number(radius_km, "radius")?;
        Self::around(lat, lon, radius_km)
    }
}

fn parse_number(raw: &str, name: &'static str) -> Result<f64, GeoError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| GeoError::InvalidParameter(name))
}
