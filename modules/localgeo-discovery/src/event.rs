use std::fmt;

use chrono::{DateTime, Utc};
use localgeo_common::{start_time_or_epoch, GeoPoint};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An external event normalized into a typed record.
///
/// `name`, `venue` and `start_time_utc` feed the [`DedupeKey`] and are never
/// absent: a payload missing them yields an empty string instead. Everything
/// else is optional and stays `None` when the payload lacks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RawEventRecord {
    pub id: Option<String>,
    pub name: String,
    pub venue: String,
    /// Start time exactly as the source reported it.
    pub start_time_utc: String,
    pub location: Option<GeoPoint>,
    pub image_url: Option<String>,
    pub url: Option<String>,
    pub city: Option<String>,
    pub source_id: String,
}

impl RawEventRecord {
    /// Normalize one raw payload from an event source.
    ///
    /// Expected shape (all fields optional):
    /// `{ id, name: {text} | name, url, start: {utc, local}, logo: {url},
    ///    venue: { name, address: { city, latitude, longitude } } }`
    pub fn from_payload(payload: &Value, source_id: &str) -> Self {
        let name = text_at(payload, "/name/text")
            .or_else(|| text_at(payload, "/name"))
            .unwrap_or_default();
        let start_time_utc = text_at(payload, "/start/utc")
            .or_else(|| text_at(payload, "/start/local"))
            .unwrap_or_default();
        let venue = text_at(payload, "/venue/name").unwrap_or_default();
        let location = GeoPoint::from_optional(
            number_at(payload, "/venue/address/latitude"),
            number_at(payload, "/venue/address/longitude"),
        );

        Self {
            id: text_at(payload, "/id"),
            name,
            venue,
            start_time_utc,
            location,
            image_url: text_at(payload, "/logo/url"),
            url: text_at(payload, "/url"),
            city: text_at(payload, "/venue/address/city"),
            source_id: source_id.to_string(),
        }
    }

    /// Parsed start instant; malformed or zone-less values map to the epoch.
    pub fn start_instant(&self) -> DateTime<Utc> {
        start_time_or_epoch(&self.start_time_utc)
    }

    pub fn dedupe_key(&self) -> DedupeKey {
        DedupeKey::of(self)
    }
}

/// String or number at a JSON pointer, as text.
fn text_at(payload: &Value, pointer: &str) -> Option<String> {
    match payload.pointer(pointer)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Number (or numeric string) at a JSON pointer.
fn number_at(payload: &Value, pointer: &str) -> Option<f64> {
    match payload.pointer(pointer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Identity of an event across records: `name|start|venue`, with name and
/// venue lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupeKey(String);

impl DedupeKey {
    pub fn of(event: &RawEventRecord) -> Self {
        Self(format!(
            "{}|{}|{}",
            event.name.to_lowercase(),
            event.start_time_utc,
            event.venue.to_lowercase()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DedupeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Distance and travel estimates from a viewer to an event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TravelEstimate {
    /// Rounded to one decimal place.
    pub distance_miles: f64,
    pub drive_time_minutes: u32,
    pub walk_time_minutes: u32,
}

/// A normalized event with optional viewer-relative travel estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedEvent {
    #[serde(flatten)]
    pub event: RawEventRecord,
    #[serde(flatten)]
    pub travel: Option<TravelEstimate>,
}

impl EnrichedEvent {
    /// Wrap an event without travel estimates.
    pub fn bare(event: RawEventRecord) -> Self {
        Self {
            event,
            travel: None,
        }
    }

    pub fn distance_miles(&self) -> Option<f64> {
        self.travel.map(|t| t.distance_miles)
    }
}
