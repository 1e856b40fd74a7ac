use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{LocalGeoError, Result};

pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Effective urban driving speed used for drive-time estimates.
pub const DRIVE_SPEED_MPH: f64 = 25.0;
/// Walking speed used for walk-time estimates.
pub const WALK_SPEED_MPH: f64 = 3.0;

const MIN_DRIVE_MINUTES: u32 = 2;
const MIN_WALK_MINUTES: u32 = 1;

// --- Geo Types ---

/// A validated latitude/longitude pair in degrees.
///
/// The only way to obtain one is through [`GeoPoint::new`] (or deserializing,
/// which goes through the same check), so every `GeoPoint` in the system is
/// in range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "RawGeoPoint")]
pub struct GeoPoint {
    #[serde(rename = "latitude")]
    lat: f64,
    #[serde(rename = "longitude")]
    lng: f64,
}

#[derive(Deserialize, JsonSchema)]
struct RawGeoPoint {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = LocalGeoError;

    fn try_from(raw: RawGeoPoint) -> Result<Self> {
        GeoPoint::new(raw.latitude, raw.longitude)
    }
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        validate_coords(lat, lng)?;
        Ok(Self { lat, lng })
    }

    /// Build a point from optional coordinates, treating a missing or
    /// out-of-range value as "no location".
    pub fn from_optional(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        match (lat, lng) {
            (Some(lat), Some(lng)) => Self::new(lat, lng).ok(),
            _ => None,
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Great-circle distance to `other` in miles.
    pub fn distance_miles(&self, other: &GeoPoint) -> f64 {
        distance_miles(self, other)
    }
}

/// Reject coordinates outside `[-90, 90]` / `[-180, 180]`, including NaN.
pub fn validate_coords(lat: f64, lng: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(LocalGeoError::Validation(format!(
            "latitude must be between -90 and 90, got {lat}"
        )));
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(LocalGeoError::Validation(format!(
            "longitude must be between -180 and 180, got {lng}"
        )));
    }
    Ok(())
}

/// Haversine great-circle distance between two points in miles.
pub fn distance_miles(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat1_r = a.lat.to_radians();
    let lat2_r = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1_r.cos() * lat2_r.cos() * (d_lng / 2.0).sin().powi(2);
    // Clamp guards against h drifting a hair above 1.0 for antipodal points.
    let c = 2.0 * h.sqrt().min(1.0).asin();
    EARTH_RADIUS_MILES * c
}

/// Estimated drive time in whole minutes, never less than 2.
pub fn estimate_drive_minutes(miles: f64) -> u32 {
    travel_minutes(miles, DRIVE_SPEED_MPH).max(MIN_DRIVE_MINUTES)
}

/// Estimated walk time in whole minutes, never less than 1.
pub fn estimate_walk_minutes(miles: f64) -> u32 {
    travel_minutes(miles, WALK_SPEED_MPH).max(MIN_WALK_MINUTES)
}

fn travel_minutes(miles: f64, mph: f64) -> u32 {
    // Saturating cast: negative or NaN inputs become 0 and hit the floor.
    (miles / mph * 60.0).round() as u32
}

/// Round to one decimal place (~500 ft at mile scale).
pub fn round_to_tenth(miles: f64) -> f64 {
    (miles * 10.0).round() / 10.0
}
