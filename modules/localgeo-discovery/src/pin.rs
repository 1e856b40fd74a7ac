use chrono::{DateTime, Utc};
use localgeo_common::{GeoPoint, GeoTag, LocalGeoError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::proximity::Located;
use crate::traits::ResolvedPlace;

/// Category carried by user-created pins.
pub const PIN_CATEGORY: &str = "pin";

pub const MAX_CONTENT_CHARS: usize = 200;
pub const MAX_TYPE_CHARS: usize = 50;

/// A user pin anchored to a resolved public place.
///
/// Fields are private so the geo-tag can only change together with the
/// location. Deserialization re-derives the tag from the stored point and
/// ignores whatever tag was persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StoredPin")]
pub struct Pin {
    id: Uuid,
    owner_id: String,
    content: String,
    location: GeoPoint,
    geo_tag: GeoTag,
    place_name: Option<String>,
    category: String,
    shared: bool,
    #[serde(rename = "type")]
    pin_type: Option<String>,
    created_at: DateTime<Utc>,
}

/// Request body for a new pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPin {
    pub place_id: String,
    pub content: String,
    #[serde(default)]
    pub shared: bool,
    #[serde(default, rename = "type")]
    pub pin_type: Option<String>,
}

/// Request body for editing an existing pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinUpdate {
    pub place_id: String,
    pub content: String,
    #[serde(default)]
    pub shared: bool,
}

impl Pin {
    /// Build a fresh pin for `owner_id` at a resolved place.
    pub fn create(
        owner_id: &str,
        new: &NewPin,
        place: &ResolvedPlace,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        validate_content(&new.content)?;
        validate_pin_type(new.pin_type.as_deref())?;
        Ok(Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            content: new.content.clone(),
            location: place.point,
            geo_tag: GeoTag::of(&place.point)?,
            place_name: place.display_name.clone(),
            category: PIN_CATEGORY.to_string(),
            shared: new.shared,
            pin_type: new.pin_type.clone(),
            created_at,
        })
    }

    /// Apply an owner edit: new content and visibility, moved to `place`.
    pub fn apply_update(&mut self, update: &PinUpdate, place: &ResolvedPlace) -> Result<()> {
        validate_content(&update.content)?;
        self.relocate(place.point)?;
        self.content = update.content.clone();
        self.shared = update.shared;
        self.place_name = place.display_name.clone();
        Ok(())
    }

    /// Move the pin, re-deriving its geo-tag.
    pub fn relocate(&mut self, point: GeoPoint) -> Result<()> {
        self.geo_tag = GeoTag::of(&point)?;
        self.location = point;
        Ok(())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn geo_tag(&self) -> &GeoTag {
        &self.geo_tag
    }

    pub fn place_name(&self) -> Option<&str> {
        self.place_name.as_deref()
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn is_user_pin(&self) -> bool {
        self.category == PIN_CATEGORY
    }

    pub fn is_shared(&self) -> bool {
        self.shared
    }

    pub fn pin_type(&self) -> Option<&str> {
        self.pin_type.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Located for Pin {
    fn location(&self) -> &GeoPoint {
        &self.location
    }
}

pub fn validate_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(LocalGeoError::Validation("content must not be blank".into()));
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(LocalGeoError::Validation(format!(
            "content must be at most {MAX_CONTENT_CHARS} characters"
        )));
    }
    Ok(())
}

pub fn validate_pin_type(pin_type: Option<&str>) -> Result<()> {
    match pin_type {
        Some(t) if t.chars().count() > MAX_TYPE_CHARS => Err(LocalGeoError::Validation(format!(
            "type must be at most {MAX_TYPE_CHARS} characters"
        ))),
        _ => Ok(()),
    }
}

/// Persisted shape of a pin. The tag is accepted but never trusted.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredPin {
    id: Uuid,
    owner_id: String,
    content: String,
    location: GeoPoint,
    #[serde(default)]
    #[allow(dead_code)]
    geo_tag: Option<String>,
    #[serde(default)]
    place_name: Option<String>,
    #[serde(default = "default_category")]
    category: String,
    #[serde(default)]
    shared: bool,
    #[serde(default, rename = "type")]
    pin_type: Option<String>,
    created_at: DateTime<Utc>,
}

fn default_category() -> String {
    PIN_CATEGORY.to_string()
}

impl TryFrom<StoredPin> for Pin {
    type Error = LocalGeoError;

    fn try_from(raw: StoredPin) -> Result<Self> {
        Ok(Self {
            id: raw.id,
            owner_id: raw.owner_id,
            content: raw.content,
            geo_tag: GeoTag::of(&raw.location)?,
            location: raw.location,
            place_name: raw.place_name,
            category: raw.category,
            shared: raw.shared,
            pin_type: raw.pin_type,
            created_at: raw.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn place(lat: f64, lng: f64) -> ResolvedPlace {
        ResolvedPlace {
            point: GeoPoint::new(lat, lng).unwrap(),
            display_name: Some("Loring Park".into()),
            feature_type: "poi".into(),
        }
    }

    fn new_pin(content: &str) -> NewPin {
        NewPin {
            place_id: "place.1".into(),
            content: content.into(),
            shared: true,
            pin_type: Some("food".into()),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 2, 12, 0, 0).unwrap()
    }

    #[test]
    fn create_tags_location_and_sets_category() {
        let pin = Pin::create("alice", &new_pin("great tacos"), &place(40.7128, -74.0060), now()).unwrap();
        assert_eq!(pin.geo_tag().as_str(), "dr5reg");
        assert_eq!(pin.category(), PIN_CATEGORY);
        assert_eq!(pin.place_name(), Some("Loring Park"));
        assert!(pin.is_owned_by("alice"));
        assert!(!pin.is_owned_by("bob"));
    }

    #[test]
    fn blank_or_long_content_is_rejected() {
        let p = place(44.97, -93.27);
        assert!(Pin::create("a", &new_pin("   "), &p, now()).is_err());
        let long = "x".repeat(MAX_CONTENT_CHARS + 1);
        assert!(Pin::create("a", &new_pin(&long), &p, now()).is_err());
        let max = "é".repeat(MAX_CONTENT_CHARS);
        assert!(Pin::create("a", &new_pin(&max), &p, now()).is_ok());
    }

    #[test]
    fn long_type_is_rejected() {
        let mut new = new_pin("ok");
        new.pin_type = Some("t".repeat(MAX_TYPE_CHARS + 1));
        let err = Pin::create("a", &new, &place(0.0, 0.0), now()).unwrap_err();
        assert!(matches!(err, LocalGeoError::Validation(_)));
    }

    #[test]
    fn relocating_rederives_tag() {
        let mut pin = Pin::create("a", &new_pin("hi"), &place(40.7128, -74.0060), now()).unwrap();
        pin.apply_update(
            &PinUpdate {
                place_id: "place.2".into(),
                content: "moved".into(),
                shared: false,
            },
            &place(44.9778, -93.2650),
        )
        .unwrap();
        assert_eq!(pin.geo_tag().as_str(), "9zvxve");
        assert_eq!(pin.content(), "moved");
        assert!(!pin.is_shared());
    }

    #[test]
    fn failed_update_leaves_pin_untouched() {
        let mut pin = Pin::create("a", &new_pin("hi"), &place(40.7128, -74.0060), now()).unwrap();
        let before = pin.clone();
        let bad = PinUpdate {
            place_id: "p".into(),
            content: "".into(),
            shared: false,
        };
        assert!(pin.apply_update(&bad, &place(44.9778, -93.2650)).is_err());
        assert_eq!(pin, before);
    }

    #[test]
    fn stored_tag_is_ignored_on_load() {
        let raw = json!({
            "id": "6f1c2a1e-0000-4000-8000-000000000001",
            "ownerId": "alice",
            "content": "hello",
            "location": { "latitude": 40.7128, "longitude": -74.0060 },
            "geoTag": "zzzzzz",
            "shared": true,
            "createdAt": "2025-01-02T12:00:00Z"
        });
        let pin: Pin = serde_json::from_value(raw).unwrap();
        assert_eq!(pin.geo_tag().as_str(), "dr5reg");
        assert_eq!(pin.category(), PIN_CATEGORY);
    }

    #[test]
    fn serializes_tag_and_type() {
        let pin = Pin::create("a", &new_pin("hi"), &place(40.7128, -74.0060), now()).unwrap();
        let v = serde_json::to_value(&pin).unwrap();
        assert_eq!(v["geoTag"], "dr5reg");
        assert_eq!(v["type"], "food");
        assert_eq!(v["ownerId"], "a");
    }
}
