// Trait abstractions for the external collaborators the engine talks to.
//
// EventSource: raw event payloads for a region/time window.
// PlaceSource: restaurants and attractions for the combined discovery view.
// RecordStore: pin persistence; the proximity path only ever scans it.
// PlaceResolver: place id → coordinates, used when pins are written.
//
// Implementations live outside this crate (HTTP clients, databases). The
// in-memory doubles in `testing` cover them in tests.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use localgeo_common::GeoPoint;
use serde_json::Value;
use uuid::Uuid;

use crate::pin::Pin;
use crate::place::PlaceRecord;

// ---------------------------------------------------------------------------
// EventSource
// ---------------------------------------------------------------------------

/// Time window (and optional filters) for one event-source request.
#[derive(Debug, Clone, PartialEq)]
pub struct EventWindow {
    /// Free-form region, usually a city. Empty means "anywhere".
    pub region: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub keyword: Option<String>,
}

#[async_trait]
pub trait EventSource: Send + Sync {
    /// Stable identifier stamped onto every record this source produces.
    fn source_id(&self) -> &str;

    /// Fetch raw event payloads for the window, across however many pages
    /// the upstream API needs.
    async fn fetch(&self, window: &EventWindow) -> Result<Vec<Value>>;

    /// A single raw payload by upstream id. Sources without direct lookup
    /// report `None`.
    async fn fetch_by_id(&self, _id: &str) -> Result<Option<Value>> {
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// PlaceSource
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PlaceSource: Send + Sync {
    /// Provider name callers use to address this source, e.g. `google_places`.
    fn source_id(&self) -> &str;

    async fn restaurants(&self, region: &str, near: Option<&GeoPoint>) -> Result<Vec<PlaceRecord>>;

    async fn attractions(&self, region: &str, near: Option<&GeoPoint>) -> Result<Vec<PlaceRecord>>;

    async fn place_by_id(&self, id: &str) -> Result<Option<PlaceRecord>>;
}

// ---------------------------------------------------------------------------
// RecordStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// A momentarily consistent snapshot of every stored pin.
    async fn scan_all(&self) -> Result<Vec<Pin>>;

    /// Insert or replace a pin by id.
    async fn put(&self, pin: &Pin) -> Result<()>;

    async fn remove(&self, id: Uuid) -> Result<()>;

    async fn find(&self, id: Uuid) -> Result<Option<Pin>> {
        Ok(self.scan_all().await?.into_iter().find(|p| p.id() == id))
    }
}

// ---------------------------------------------------------------------------
// PlaceResolver
// ---------------------------------------------------------------------------

/// A place id resolved to coordinates by a geocoder.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPlace {
    pub point: GeoPoint,
    pub display_name: Option<String>,
    /// Geocoder feature type, e.g. `poi`, `address`, `place`.
    pub feature_type: String,
}

impl ResolvedPlace {
    /// Only public points of interest may be pinned.
    pub fn is_public_poi(&self) -> bool {
        self.feature_type.eq_ignore_ascii_case("poi")
    }
}

#[async_trait]
pub trait PlaceResolver: Send + Sync {
    async fn resolve(&self, place_id: &str) -> Result<ResolvedPlace>;
}
