// Test doubles for the discovery engine.
//
// One double per collaborator trait:
// - MockEventSource (EventSource): fixed payload list, records requested windows
// - MockPlaceSource (PlaceSource): per-category results, each branch can fail or panic
// - MemoryRecordStore (RecordStore): Vec-backed pin store
// - MockPlaceResolver (PlaceResolver): HashMap-based place id → ResolvedPlace
//
// Plus helpers for building event payloads, place records and points.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use localgeo_common::GeoPoint;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::pin::Pin;
use crate::place::{PlaceCategory, PlaceRecord};
use crate::traits::{EventSource, EventWindow, PlaceResolver, PlaceSource, RecordStore, ResolvedPlace};

// ---------------------------------------------------------------------------
// Test constants
// ---------------------------------------------------------------------------

/// Downtown Minneapolis, MN coordinates.
pub const MINNEAPOLIS: (f64, f64) = (44.9778, -93.2650);
/// St. Paul, MN coordinates.
pub const ST_PAUL: (f64, f64) = (44.9537, -93.0900);
/// Duluth, MN coordinates.
pub const DULUTH: (f64, f64) = (46.7867, -92.1005);
/// New York, NY coordinates.
pub const NYC: (f64, f64) = (40.7128, -74.0060);

pub fn point(coords: (f64, f64)) -> GeoPoint {
    GeoPoint::new(coords.0, coords.1).expect("test coordinates are valid")
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Behavior {
    #[default]
    Succeed,
    Fail,
    Panic,
}

// ---------------------------------------------------------------------------
// MockEventSource
// ---------------------------------------------------------------------------

/// Returns the same payloads for every window and remembers each request.
pub struct MockEventSource {
    id: String,
    payloads: Vec<Value>,
    behavior: Behavior,
    windows: Mutex<Vec<EventWindow>>,
}

impl MockEventSource {
    pub fn new() -> Self {
        Self {
            id: "mock-events".to_string(),
            payloads: Vec::new(),
            behavior: Behavior::Succeed,
            windows: Mutex::new(Vec::new()),
        }
    }

    pub fn on_event(mut self, payload: Value) -> Self {
        self.payloads.push(payload);
        self
    }

    pub fn failing(mut self) -> Self {
        self.behavior = Behavior::Fail;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.behavior = Behavior::Panic;
        self
    }

    /// Every window requested so far, oldest first.
    pub fn windows(&self) -> Vec<EventWindow> {
        self.windows.lock().unwrap().clone()
    }
}

impl Default for MockEventSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSource for MockEventSource {
    fn source_id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self, window: &EventWindow) -> Result<Vec<Value>> {
        self.windows.lock().unwrap().push(window.clone());
        match self.behavior {
            Behavior::Succeed => Ok(self.payloads.clone()),
            Behavior::Fail => bail!("MockEventSource: upstream returned 503"),
            Behavior::Panic => panic!("MockEventSource: induced panic"),
        }
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<Value>> {
        match self.behavior {
            Behavior::Succeed => Ok(self.payloads.iter().find(|p| p["id"] == id).cloned()),
            Behavior::Fail => bail!("MockEventSource: upstream returned 503"),
            Behavior::Panic => panic!("MockEventSource: induced panic"),
        }
    }
}

/// Eventbrite-shaped payload.
pub fn event_payload(name: &str, start_utc: &str, venue: &str, at: Option<(f64, f64)>) -> Value {
    let mut payload = json!({
        "id": format!("{name}@{start_utc}"),
        "name": { "text": name },
        "start": { "utc": start_utc },
        "venue": { "name": venue, "address": { "city": "Minneapolis" } }
    });
    if let Some((lat, lng)) = at {
        payload["venue"]["address"]["latitude"] = json!(lat.to_string());
        payload["venue"]["address"]["longitude"] = json!(lng.to_string());
    }
    payload
}

// ---------------------------------------------------------------------------
// MockPlaceSource
// ---------------------------------------------------------------------------

pub struct MockPlaceSource {
    restaurants: Vec<PlaceRecord>,
    attractions: Vec<PlaceRecord>,
    restaurants_behavior: Behavior,
    attractions_behavior: Behavior,
}

impl MockPlaceSource {
    pub fn new() -> Self {
        Self {
            restaurants: Vec::new(),
            attractions: Vec::new(),
            restaurants_behavior: Behavior::Succeed,
            attractions_behavior: Behavior::Succeed,
        }
    }

    pub fn on_place(mut self, place: PlaceRecord) -> Self {
        match place.category {
            PlaceCategory::Restaurants => self.restaurants.push(place),
            PlaceCategory::Attractions => self.attractions.push(place),
        }
        self
    }

    pub fn restaurants_behave(mut self, behavior: Behavior) -> Self {
        self.restaurants_behavior = behavior;
        self
    }

    pub fn attractions_behave(mut self, behavior: Behavior) -> Self {
        self.attractions_behavior = behavior;
        self
    }

    fn respond(behavior: Behavior, places: &[PlaceRecord], what: &str) -> Result<Vec<PlaceRecord>> {
        match behavior {
            Behavior::Succeed => Ok(places.to_vec()),
            Behavior::Fail => bail!("MockPlaceSource: {what} lookup timed out"),
            Behavior::Panic => panic!("MockPlaceSource: induced panic in {what}"),
        }
    }
}

impl Default for MockPlaceSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaceSource for MockPlaceSource {
    fn source_id(&self) -> &str {
        "mock"
    }

    async fn restaurants(&self, _region: &str, _near: Option<&GeoPoint>) -> Result<Vec<PlaceRecord>> {
        Self::respond(self.restaurants_behavior, &self.restaurants, "restaurants")
    }

    async fn attractions(&self, _region: &str, _near: Option<&GeoPoint>) -> Result<Vec<PlaceRecord>> {
        Self::respond(self.attractions_behavior, &self.attractions, "attractions")
    }

    /// Looks in both categories; each obeys its own behavior.
    async fn place_by_id(&self, id: &str) -> Result<Option<PlaceRecord>> {
        for (behavior, places, what) in [
            (self.restaurants_behavior, &self.restaurants, "restaurants"),
            (self.attractions_behavior, &self.attractions, "attractions"),
        ] {
            if let Some(found) = Self::respond(behavior, places, what)?
                .into_iter()
                .find(|p| p.id == id)
            {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}

pub fn place_record(id: &str, name: &str, category: PlaceCategory, address: &str) -> PlaceRecord {
    PlaceRecord {
        id: id.to_string(),
        name: name.to_string(),
        category,
        source: "mock".to_string(),
        address: Some(address.to_string()),
        vicinity: None,
        location: None,
        rating: Some(4.5),
        user_ratings_total: Some(120),
        price_level: None,
    }
}

// ---------------------------------------------------------------------------
// MemoryRecordStore
// ---------------------------------------------------------------------------

/// Vec-backed store. `put` replaces by id, otherwise appends.
pub struct MemoryRecordStore {
    pins: Mutex<Vec<Pin>>,
    failing: bool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::with_pins(Vec::new())
    }

    pub fn with_pins(pins: Vec<Pin>) -> Self {
        Self {
            pins: Mutex::new(pins),
            failing: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn pins(&self) -> Vec<Pin> {
        self.pins.lock().unwrap().clone()
    }

    fn check(&self) -> Result<()> {
        if self.failing {
            bail!("MemoryRecordStore: connection refused");
        }
        Ok(())
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn scan_all(&self) -> Result<Vec<Pin>> {
        self.check()?;
        Ok(self.pins())
    }

    async fn put(&self, pin: &Pin) -> Result<()> {
        self.check()?;
        let mut pins = self.pins.lock().unwrap();
        match pins.iter_mut().find(|p| p.id() == pin.id()) {
            Some(existing) => *existing = pin.clone(),
            None => pins.push(pin.clone()),
        }
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        self.check()?;
        self.pins.lock().unwrap().retain(|p| p.id() != id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockPlaceResolver
// ---------------------------------------------------------------------------

/// Returns `Err` for unregistered place ids.
pub struct MockPlaceResolver {
    places: HashMap<String, ResolvedPlace>,
}

impl MockPlaceResolver {
    pub fn new() -> Self {
        Self {
            places: HashMap::new(),
        }
    }

    pub fn on_poi(self, place_id: &str, name: &str, at: (f64, f64)) -> Self {
        self.on_place(place_id, name, at, "poi")
    }

    pub fn on_place(mut self, place_id: &str, name: &str, at: (f64, f64), feature_type: &str) -> Self {
        self.places.insert(
            place_id.to_string(),
            ResolvedPlace {
                point: point(at),
                display_name: Some(name.to_string()),
                feature_type: feature_type.to_string(),
            },
        );
        self
    }
}

impl Default for MockPlaceResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaceResolver for MockPlaceResolver {
    async fn resolve(&self, place_id: &str) -> Result<ResolvedPlace> {
        self.places
            .get(place_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockPlaceResolver: no place registered for {place_id}"))
    }
}
