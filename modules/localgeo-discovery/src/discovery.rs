//! Combined discovery: events, restaurants and attractions for one region.
//!
//! Branches run concurrently under a fixed bound and are always joined. A
//! branch that errors or panics contributes an empty list and a warning; its
//! siblings are unaffected. Nothing is spawned, so dropping the returned
//! future abandons every in-flight branch.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use localgeo_common::{Config, GeoPoint, MAX_TONIGHT_WINDOW_HOURS};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use typed_builder::TypedBuilder;

use crate::aggregator::{panic_reason, EventAggregator};
use crate::enrichment::enrich;
use crate::event::{EnrichedEvent, RawEventRecord};
use crate::place::{PlaceCategory, PlaceRecord};
use crate::ranking::select_and_rank;
use crate::traits::PlaceSource;

#[derive(Debug, Clone, TypedBuilder)]
pub struct TonightQuery {
    #[builder(setter(into))]
    pub region: String,
    #[builder(default)]
    pub viewer: Option<GeoPoint>,
    #[builder(default)]
    pub mood: Option<String>,
    /// Falls back to the configured default radius.
    #[builder(default)]
    pub radius_miles: Option<f64>,
}

/// One list per category. A failed branch leaves its list empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryBundle {
    pub events: Vec<EnrichedEvent>,
    pub restaurants: Vec<PlaceRecord>,
    pub attractions: Vec<PlaceRecord>,
}

impl DiscoveryBundle {
    pub fn total(&self) -> usize {
        self.events.len() + self.restaurants.len() + self.attractions.len()
    }
}

/// Category names accepted by [`DiscoveryService::fetch_by_category`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryCategory {
    Events,
    Places(PlaceCategory),
}

impl DiscoveryCategory {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "events" | "concerts" => Some(Self::Events),
            "restaurants" | "food" | "dining" => Some(Self::Places(PlaceCategory::Restaurants)),
            "attractions" | "parks" | "museums" | "nature" => {
                Some(Self::Places(PlaceCategory::Attractions))
            }
            _ => None,
        }
    }
}

/// A single entry looked up by source and id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "item", rename_all = "camelCase")]
pub enum DiscoveryItem {
    Event(RawEventRecord),
    Place(PlaceRecord),
}

enum BranchOutput {
    Events(Vec<EnrichedEvent>),
    Places(PlaceCategory, Vec<PlaceRecord>),
}

impl BranchOutput {
    fn merge_into(self, bundle: &mut DiscoveryBundle) {
        match self {
            Self::Events(events) => bundle.events = events,
            Self::Places(PlaceCategory::Restaurants, places) => bundle.restaurants = places,
            Self::Places(PlaceCategory::Attractions, places) => bundle.attractions = places,
        }
    }
}

type Branch<'a> = (&'static str, BoxFuture<'a, anyhow::Result<BranchOutput>>);

pub struct DiscoveryService {
    events: EventAggregator,
    places: Arc<dyn PlaceSource>,
    config: Config,
}

impl DiscoveryService {
    pub fn new(events: EventAggregator, places: Arc<dyn PlaceSource>, config: Config) -> Self {
        Self {
            events,
            places,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Events starting within the configured window from now.
    pub async fn tonight(&self, query: &TonightQuery) -> Vec<EnrichedEvent> {
        self.tonight_at(query, Utc::now()).await
    }

    /// Window hours outside `1..=MAX_TONIGHT_WINDOW_HOURS` are clamped.
    pub async fn tonight_at(&self, query: &TonightQuery, now: DateTime<Utc>) -> Vec<EnrichedEvent> {
        let end = self.tonight_end(now);
        let raw = self.events.fetch_window(&query.region, now, end, None).await;
        let radius = query
            .radius_miles
            .unwrap_or(self.config.default_radius_miles);

        let ranked = select_and_rank(
            enrich(raw, query.viewer.as_ref()),
            radius,
            query.mood.as_deref(),
        );
        info!(
            region = query.region.as_str(),
            radius_miles = radius,
            mood = query.mood.as_deref().unwrap_or(""),
            results = ranked.len(),
            "Tonight query"
        );
        ranked
    }

    fn tonight_end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let configured = self.config.tonight_window_hours;
        let hours = configured.clamp(1, MAX_TONIGHT_WINDOW_HOURS);
        if hours != configured {
            warn!(configured, hours, "Tonight window out of range, clamping");
        }
        Duration::try_hours(hours)
            .and_then(|window| now.checked_add_signed(window))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Events for `date` (default today), restaurants and attractions.
    pub async fn fetch_all(
        &self,
        region: &str,
        viewer: Option<&GeoPoint>,
        date: Option<NaiveDate>,
    ) -> DiscoveryBundle {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        let branches = vec![
            self.events_branch(region, viewer, date),
            self.places_branch(PlaceCategory::Restaurants, region, viewer),
            self.places_branch(PlaceCategory::Attractions, region, viewer),
        ];
        let bundle = self.join(branches).await;

        info!(
            region,
            events = bundle.events.len(),
            restaurants = bundle.restaurants.len(),
            attractions = bundle.attractions.len(),
            "Discovery fan-out complete"
        );
        bundle
    }

    /// A single category. Unknown names log a warning and return nothing.
    pub async fn fetch_by_category(
        &self,
        category: &str,
        region: &str,
        viewer: Option<&GeoPoint>,
        date: Option<NaiveDate>,
    ) -> DiscoveryBundle {
        let branch = match DiscoveryCategory::parse(category) {
            Some(DiscoveryCategory::Events) => {
                let date = date.unwrap_or_else(|| Utc::now().date_naive());
                self.events_branch(region, viewer, date)
            }
            Some(DiscoveryCategory::Places(kind)) => self.places_branch(kind, region, viewer),
            None => {
                warn!(category, "Unknown discovery category");
                return DiscoveryBundle::default();
            }
        };
        self.join(vec![branch]).await
    }

    /// Everything from [`fetch_all`](Self::fetch_all) whose name (or place
    /// address) contains `query`, case-insensitively.
    pub async fn search_all(
        &self,
        query: &str,
        region: &str,
        viewer: Option<&GeoPoint>,
    ) -> DiscoveryBundle {
        let needle = query.trim().to_lowercase();
        let mut bundle = self.fetch_all(region, viewer, None).await;

        bundle
            .events
            .retain(|e| e.event.name.to_lowercase().contains(&needle));
        bundle.restaurants.retain(|p| p.matches_text(&needle));
        bundle.attractions.retain(|p| p.matches_text(&needle));
        bundle
    }

    /// Look up one entry. `source` names either the event source or the
    /// place source (case-insensitive); anything else is unknown and yields
    /// `None`, as does a failed lookup.
    pub async fn item_by_id(&self, source: &str, id: &str) -> Option<DiscoveryItem> {
        let source = source.trim();
        if source.eq_ignore_ascii_case(self.events.source_id()) {
            return self.events.fetch_by_id(id).await.map(DiscoveryItem::Event);
        }
        if !source.eq_ignore_ascii_case(self.places.source_id()) {
            warn!(source, id, "Unknown item source");
            return None;
        }

        match AssertUnwindSafe(self.places.place_by_id(id))
            .catch_unwind()
            .await
        {
            Ok(Ok(place)) => place.map(DiscoveryItem::Place),
            Ok(Err(e)) => {
                warn!(source, id, error = %e, "Place lookup failed");
                None
            }
            Err(panic) => {
                let reason = panic_reason(panic.as_ref());
                warn!(source, id, reason = %reason, "Place source panicked during lookup");
                None
            }
        }
    }

    fn events_branch<'a>(
        &'a self,
        region: &'a str,
        viewer: Option<&GeoPoint>,
        date: NaiveDate,
    ) -> Branch<'a> {
        let viewer = viewer.copied();
        let fut = async move {
            let raw = self.events.fetch_day(region, date, None).await;
            Ok::<_, anyhow::Error>(BranchOutput::Events(enrich(raw, viewer.as_ref())))
        };
        ("events", fut.boxed())
    }

    fn places_branch<'a>(
        &'a self,
        kind: PlaceCategory,
        region: &'a str,
        viewer: Option<&GeoPoint>,
    ) -> Branch<'a> {
        let viewer = viewer.copied();
        let places = Arc::clone(&self.places);
        let fut = async move {
            let found = match kind {
                PlaceCategory::Restaurants => places.restaurants(region, viewer.as_ref()).await?,
                PlaceCategory::Attractions => places.attractions(region, viewer.as_ref()).await?,
            };
            Ok::<_, anyhow::Error>(BranchOutput::Places(kind, found))
        };
        (kind.as_str(), fut.boxed())
    }

    async fn join(&self, branches: Vec<Branch<'_>>) -> DiscoveryBundle {
        let limit = self.config.max_concurrent_branches.max(1);
        let outputs: Vec<Option<BranchOutput>> = stream::iter(branches)
            .map(|(name, fut)| run_branch(name, fut))
            .buffer_unordered(limit)
            .collect()
            .await;

        let mut bundle = DiscoveryBundle::default();
        for output in outputs.into_iter().flatten() {
            output.merge_into(&mut bundle);
        }
        bundle
    }
}

/// Await one branch, turning an error or panic into `None`.
async fn run_branch(
    name: &'static str,
    fut: BoxFuture<'_, anyhow::Result<BranchOutput>>,
) -> Option<BranchOutput> {
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(output)) => Some(output),
        Ok(Err(e)) => {
            warn!(branch = name, error = %e, "Discovery branch failed, returning empty list");
            None
        }
        Err(panic) => {
            let reason = panic_reason(panic.as_ref());
            warn!(branch = name, reason = %reason, "Discovery branch panicked, returning empty list");
            None
        }
    }
}
