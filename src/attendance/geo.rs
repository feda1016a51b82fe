use derive_more::Display;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct GeoPoint {
    #[schema(example = 13.0827)]
    pub latitude: f64,
    #[schema(example = 80.2707)]
    pub longitude: f64,
}

/// Unchecked wire form; deserialization goes through `GeoPoint::new`.
#[derive(Deserialize)]
struct RawGeoPoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Display, PartialEq)]
pub enum CoordinateError {
    #[display(fmt = "coordinates must be finite numbers")]
    NotFinite,
    #[display(fmt = "latitude {} is outside [-90, 90]", _0)]
    LatitudeOutOfRange(f64),
    #[display(fmt = "longitude {} is outside [-180, 180]", _0)]
    LongitudeOutOfRange(f64),
}

impl std::error::Error for CoordinateError {}

impl GeoPoint {
    /// Builds a point, rejecting NaN, infinities and out-of-range degrees.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(CoordinateError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }
}

impl<'de> Deserialize<'de> for GeoPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawGeoPoint::deserialize(deserializer)?;
        Self::new(raw.latitude, raw.longitude).map_err(serde::de::Error::custom)
    }
}

/// Great-circle distance between two points in meters (unrounded).
pub fn distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // clamp guards against h drifting past 1.0 for antipodal points
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Distance rounded to the whole meter, the value that gets stored and shown.
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    round_half_up(distance(a, b), 0)
}

/// Rounds a non-negative value half-up to `decimals` places.
pub fn round_half_up(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor + 0.5).floor() / factor
}
