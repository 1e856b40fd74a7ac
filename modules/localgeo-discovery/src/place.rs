use localgeo_common::GeoPoint;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlaceCategory {
    Restaurants,
    Attractions,
}

impl PlaceCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Restaurants => "restaurants",
            Self::Attractions => "attractions",
        }
    }
}

/// A restaurant or attraction returned by a place source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRecord {
    pub id: String,
    pub name: String,
    pub category: PlaceCategory,
    /// Upstream provider, e.g. `google_places`.
    pub source: String,
    pub address: Option<String>,
    pub vicinity: Option<String>,
    pub location: Option<GeoPoint>,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
    pub price_level: Option<u8>,
}

impl PlaceRecord {
    /// Case-insensitive match of `needle` (already lowercased) against the
    /// name or address.
    pub fn matches_text(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self
                .address
                .as_deref()
                .is_some_and(|a| a.to_lowercase().contains(needle))
    }
}
