use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{LocalGeoError, Result};
use crate::geo::GeoPoint;

/// Geohash length written onto every located record (~0.6km x 1.2km cell).
pub const GEOTAG_PRECISION: usize = 6;

/// Longest geohash the encoder supports.
const MAX_PRECISION: usize = 12;

/// Coarse locality key derived from a [`GeoPoint`].
///
/// Only ever built from a point, so a tag can always be re-derived from the
/// coordinates that carry it. Used for write-time annotation and cheap
/// same-cell checks, never for radius filtering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct GeoTag(String);

impl GeoTag {
    /// Tag a point at the standard precision.
    pub fn of(point: &GeoPoint) -> Result<Self> {
        Self::with_precision(point, GEOTAG_PRECISION)
    }

    /// Tag a point at an explicit precision (1..=12 characters).
    ///
    /// Cannot fail for a validated point and an in-range precision.
    pub fn with_precision(point: &GeoPoint, precision: usize) -> Result<Self> {
        if precision == 0 || precision > MAX_PRECISION {
            return Err(LocalGeoError::Validation(format!(
                "geotag precision must be 1-{MAX_PRECISION}, got {precision}"
            )));
        }
        geohash::encode(
            geohash::Coord {
                x: point.lng(),
                y: point.lat(),
            },
            precision,
        )
        .map(Self)
        .map_err(|e| LocalGeoError::Validation(format!("cannot geotag point: {e}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn precision(&self) -> usize {
        self.0.len()
    }

    /// Whether this tag lies inside the (coarser or equal) cell `cell`.
    pub fn within(&self, cell: &str) -> bool {
        self.0.starts_with(cell)
    }
}

impl fmt::Display for GeoTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    #[test]
    fn standard_tag_has_six_characters() {
        let tag = GeoTag::of(&pt(40.7128, -74.0060)).unwrap();
        assert_eq!(tag.precision(), 6);
    }

    #[test]
    fn known_geohash_value() {
        // Reference value for lower Manhattan.
        let tag = GeoTag::of(&pt(40.7128, -74.0060)).unwrap();
        assert_eq!(tag.as_str(), "dr5reg");
    }

    #[test]
    fn tagging_is_deterministic() {
        let p = pt(44.9778, -93.2650);
        assert_eq!(GeoTag::of(&p).unwrap(), GeoTag::of(&p).unwrap());
    }

    #[test]
    fn nearby_points_share_a_cell() {
        // ~30m apart, well inside one 6-char cell.
        let a = GeoTag::of(&pt(44.97780, -93.26500)).unwrap();
        let b = GeoTag::of(&pt(44.97800, -93.26520)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn distant_points_differ() {
        let a = GeoTag::of(&pt(44.9778, -93.2650)).unwrap();
        let b = GeoTag::of(&pt(40.7128, -74.0060)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn finer_tag_is_within_coarser_cell() {
        let p = pt(44.9778, -93.2650);
        let fine = GeoTag::with_precision(&p, 9).unwrap();
        let coarse = GeoTag::of(&p).unwrap();
        assert!(fine.within(coarse.as_str()));
    }

    #[test]
    fn rejects_bad_precision() {
        let p = pt(0.0, 0.0);
        assert!(GeoTag::with_precision(&p, 0).is_err());
        assert!(GeoTag::with_precision(&p, 13).is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let tag = GeoTag::of(&pt(40.7128, -74.0060)).unwrap();
        assert_eq!(serde_json::to_string(&tag).unwrap(), "\"dr5reg\"");
    }
}
