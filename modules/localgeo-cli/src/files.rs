//! JSON-file collaborators for running the engine locally.
//!
//! Events and places files are read on every call. The pin store rewrites the
//! whole file on each write, serialized through a mutex.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use localgeo_common::{parse_start_time, GeoPoint};
use localgeo_discovery::{
    EventSource, EventWindow, Pin, PlaceCategory, PlaceRecord, PlaceSource, RawEventRecord,
    RecordStore,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

const FILE_SOURCE_ID: &str = "file";
const PLACES_SOURCE_ID: &str = "file-places";

/// Read a JSON array, treating a missing file as empty.
async fn read_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Raw event payloads from a JSON array file, filtered to the window.
pub struct JsonFileEventSource {
    path: PathBuf,
}

impl JsonFileEventSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Region matches the venue city when the payload has one; keyword matches
/// the name. Payloads with unparseable start times are kept.
fn in_window(payload: &Value, window: &EventWindow) -> bool {
    let event = RawEventRecord::from_payload(payload, FILE_SOURCE_ID);

    if !window.region.is_empty() {
        if let Some(city) = &event.city {
            if !city.eq_ignore_ascii_case(&window.region) {
                return false;
            }
        }
    }
    if let Some(keyword) = &window.keyword {
        if !event.name.to_lowercase().contains(&keyword.to_lowercase()) {
            return false;
        }
    }
    match parse_start_time(&event.start_time_utc) {
        Ok(start) => window.start <= start && start <= window.end,
        Err(_) => true,
    }
}

#[async_trait]
impl EventSource for JsonFileEventSource {
    fn source_id(&self) -> &str {
        FILE_SOURCE_ID
    }

    async fn fetch(&self, window: &EventWindow) -> Result<Vec<Value>> {
        let payloads: Vec<Value> = read_list(&self.path).await?;
        let total = payloads.len();
        let kept: Vec<Value> = payloads
            .into_iter()
            .filter(|p| in_window(p, window))
            .collect();
        debug!(path = %self.path.display(), total, kept = kept.len(), "Read events file");
        Ok(kept)
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<Value>> {
        let payloads: Vec<Value> = read_list(&self.path).await?;
        Ok(payloads.into_iter().find(|p| p["id"] == id))
    }
}

// ---------------------------------------------------------------------------
// Places
// ---------------------------------------------------------------------------

/// Place records from an optional JSON array file. No file, no places.
pub struct JsonFilePlaceSource {
    path: Option<PathBuf>,
}

impl JsonFilePlaceSource {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    async fn all(&self) -> Result<Vec<PlaceRecord>> {
        match &self.path {
            Some(path) => read_list(path).await,
            None => Ok(Vec::new()),
        }
    }

    async fn of_category(&self, category: PlaceCategory) -> Result<Vec<PlaceRecord>> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .filter(|p| p.category == category)
            .collect())
    }
}

#[async_trait]
impl PlaceSource for JsonFilePlaceSource {
    fn source_id(&self) -> &str {
        PLACES_SOURCE_ID
    }

    async fn restaurants(&self, _region: &str, _near: Option<&GeoPoint>) -> Result<Vec<PlaceRecord>> {
        self.of_category(PlaceCategory::Restaurants).await
    }

    async fn attractions(&self, _region: &str, _near: Option<&GeoPoint>) -> Result<Vec<PlaceRecord>> {
        self.of_category(PlaceCategory::Attractions).await
    }

    async fn place_by_id(&self, id: &str) -> Result<Option<PlaceRecord>> {
        Ok(self.all().await?.into_iter().find(|p| p.id == id))
    }
}

// ---------------------------------------------------------------------------
// Pins
// ---------------------------------------------------------------------------

pub struct JsonFilePinStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFilePinStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn write_all(&self, pins: &[Pin]) -> Result<()> {
        let json = serde_json::to_vec_pretty(pins)?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("writing {}", self.path.display()))
    }
}

#[async_trait]
impl RecordStore for JsonFilePinStore {
    async fn scan_all(&self) -> Result<Vec<Pin>> {
        read_list(&self.path).await
    }

    async fn put(&self, pin: &Pin) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut pins: Vec<Pin> = read_list(&self.path).await?;
        match pins.iter_mut().find(|p| p.id() == pin.id()) {
            Some(existing) => *existing = pin.clone(),
            None => pins.push(pin.clone()),
        }
        self.write_all(&pins).await
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut pins: Vec<Pin> = read_list(&self.path).await?;
        pins.retain(|p| p.id() != id);
        self.write_all(&pins).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;

    fn window(region: &str, keyword: Option<&str>) -> EventWindow {
        EventWindow {
            region: region.to_string(),
            start: Utc.with_ymd_and_hms(2025, 1, 2, 18, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 1, 3, 2, 0, 0).unwrap(),
            keyword: keyword.map(str::to_string),
        }
    }

    fn payload(name: &str, start: &str, city: Option<&str>) -> Value {
        let mut p = json!({ "name": { "text": name }, "start": { "utc": start }, "venue": { "name": "v" } });
        if let Some(city) = city {
            p["venue"]["address"] = json!({ "city": city });
        }
        p
    }

    #[test]
    fn window_filter_rules() {
        let w = window("Minneapolis", None);
        assert!(in_window(&payload("a", "2025-01-02T20:00:00Z", Some("minneapolis")), &w));
        assert!(in_window(&payload("a", "2025-01-02T20:00:00Z", None), &w));
        assert!(!in_window(&payload("a", "2025-01-02T20:00:00Z", Some("Duluth")), &w));
        assert!(!in_window(&payload("a", "2025-01-03T20:00:00Z", None), &w));
        assert!(in_window(&payload("a", "whenever", None), &w));

        let search = window("", Some("jazz"));
        assert!(in_window(&payload("Midnight Jazz", "2025-01-02T20:00:00Z", Some("Duluth")), &search));
        assert!(!in_window(&payload("Trivia", "2025-01-02T20:00:00Z", None), &search));
    }

    #[tokio::test]
    async fn event_source_reads_and_filters_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        let payloads = json!([
            payload("Jazz Night", "2025-01-02T20:00:00Z", Some("Minneapolis")),
            payload("Next Week", "2025-01-09T20:00:00Z", Some("Minneapolis")),
        ]);
        std::fs::write(&path, payloads.to_string()).unwrap();

        let source = JsonFileEventSource::new(&path);
        let found = source.fetch(&window("Minneapolis", None)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["name"]["text"], "Jazz Night");
    }

    #[tokio::test]
    async fn malformed_events_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        std::fs::write(&path, "{ not json").unwrap();

        let source = JsonFileEventSource::new(&path);
        assert!(source.fetch(&window("", None)).await.is_err());
    }

    #[tokio::test]
    async fn places_without_file_are_empty() {
        let source = JsonFilePlaceSource::new(None);
        assert!(source.restaurants("x", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn places_are_split_by_category() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("places.json");
        let places = json!([
            { "id": "r1", "name": "Hell's Kitchen", "category": "restaurants", "source": "file" },
            { "id": "a1", "name": "Walker Art Center", "category": "attractions", "source": "file" }
        ]);
        std::fs::write(&path, places.to_string()).unwrap();

        let source = JsonFilePlaceSource::new(Some(path));
        let restaurants = source.restaurants("", None).await.unwrap();
        let attractions = source.attractions("", None).await.unwrap();
        assert_eq!(restaurants.len(), 1);
        assert_eq!(restaurants[0].id, "r1");
        assert_eq!(attractions.len(), 1);
        assert_eq!(attractions[0].id, "a1");

        assert_eq!(source.place_by_id("a1").await.unwrap().unwrap().name, "Walker Art Center");
        assert!(source.place_by_id("zz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn event_source_finds_payload_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        let mut jazz = payload("Jazz Night", "2025-01-02T20:00:00Z", None);
        jazz["id"] = json!("evt-1");
        std::fs::write(&path, json!([jazz]).to_string()).unwrap();

        let source = JsonFileEventSource::new(&path);
        let found = source.fetch_by_id("evt-1").await.unwrap().unwrap();
        assert_eq!(found["name"]["text"], "Jazz Night");
        assert!(source.fetch_by_id("evt-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn pin_store_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pins.json");
        let stored = json!([{
            "id": "6f1c2a1e-0000-4000-8000-000000000001",
            "ownerId": "alice",
            "content": "hello",
            "location": { "latitude": 44.9778, "longitude": -93.265 },
            "shared": true,
            "createdAt": "2025-01-02T12:00:00Z"
        }]);
        std::fs::write(&path, stored.to_string()).unwrap();

        let store = JsonFilePinStore::new(&path);
        let pins = store.scan_all().await.unwrap();
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].geo_tag().as_str(), "9zvxve");

        store.remove(pins[0].id()).await.unwrap();
        assert!(store.scan_all().await.unwrap().is_empty());

        store.put(&pins[0]).await.unwrap();
        store.put(&pins[0]).await.unwrap();
        assert_eq!(store.scan_all().await.unwrap(), pins);
    }

    #[tokio::test]
    async fn missing_pin_file_scans_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFilePinStore::new(dir.path().join("absent.json"));
        assert!(store.scan_all().await.unwrap().is_empty());
    }
}
