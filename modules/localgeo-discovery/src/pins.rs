//! Pin write path and the shared-pins feed.
//!
//! Writes resolve the place first and fail the single request on any
//! collaborator error. The feed is a proximity scan over a store snapshot.

use std::sync::Arc;

use chrono::Utc;
use localgeo_common::{GeoPoint, LocalGeoError};
use thiserror::Error;
use tracing::{debug, info};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::pin::{validate_content, validate_pin_type, NewPin, Pin, PinUpdate};
use crate::proximity::{ProximityIndex, ScanIndex};
use crate::traits::{PlaceResolver, RecordStore, ResolvedPlace};

#[derive(Error, Debug)]
pub enum PinError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Place {0} is not a public point of interest")]
    NotPublicPlace(String),

    #[error("Pin {0} not found")]
    NotFound(Uuid),

    #[error("Collaborator error: {0}")]
    Collaborator(#[from] anyhow::Error),
}

impl From<LocalGeoError> for PinError {
    fn from(e: LocalGeoError) -> Self {
        match e {
            LocalGeoError::Validation(msg) => Self::Validation(msg),
            other => Self::Collaborator(anyhow::Error::new(other)),
        }
    }
}

/// Query for the shared-pins feed.
#[derive(Debug, Clone, TypedBuilder)]
pub struct FeedQuery {
    pub center: GeoPoint,
    #[builder(default)]
    pub radius_miles: Option<f64>,
    #[builder(default)]
    pub page: usize,
    #[builder(default = 20)]
    pub size: usize,
    /// `"all"` disables the type filter.
    #[builder(default = String::from("all"), setter(into))]
    pub pin_type: String,
}

/// Shared pins near `query.center`, newest first, one page at a time.
pub async fn shared_feed(store: &dyn RecordStore, query: &FeedQuery) -> Result<Vec<Pin>, PinError> {
    let index = ScanIndex::new(store.scan_all().await?);
    let any_type = query.pin_type.eq_ignore_ascii_case("all");

    let mut feed: Vec<Pin> = index
        .nearby(&query.center, query.radius_miles)
        .into_iter()
        .filter(|p| p.is_user_pin() && p.is_shared())
        .filter(|p| any_type || p.pin_type() == Some(query.pin_type.as_str()))
        .cloned()
        .collect();
    feed.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

    debug!(
        scanned = index.len(),
        matched = feed.len(),
        page = query.page,
        size = query.size,
        "Shared feed"
    );

    Ok(feed
        .into_iter()
        .skip(query.page.saturating_mul(query.size))
        .take(query.size)
        .collect())
}

pub struct PinService {
    store: Arc<dyn RecordStore>,
    resolver: Arc<dyn PlaceResolver>,
}

impl PinService {
    pub fn new(store: Arc<dyn RecordStore>, resolver: Arc<dyn PlaceResolver>) -> Self {
        Self { store, resolver }
    }

    pub async fn create_pin(&self, owner_id: &str, new: NewPin) -> Result<Pin, PinError> {
        validate_content(&new.content)?;
        validate_pin_type(new.pin_type.as_deref())?;
        let place = self.resolve_public(&new.place_id).await?;

        let pin = Pin::create(owner_id, &new, &place, Utc::now())?;
        self.store.put(&pin).await?;

        info!(
            pin_id = %pin.id(),
            owner_id,
            geo_tag = %pin.geo_tag(),
            shared = pin.is_shared(),
            "Created pin"
        );
        Ok(pin)
    }

    pub async fn update_pin(
        &self,
        owner_id: &str,
        pin_id: Uuid,
        update: PinUpdate,
    ) -> Result<Pin, PinError> {
        validate_content(&update.content)?;
        let mut pin = self.owned(owner_id, pin_id).await?;
        let place = self.resolve_public(&update.place_id).await?;

        pin.apply_update(&update, &place)?;
        self.store.put(&pin).await?;

        info!(pin_id = %pin_id, owner_id, geo_tag = %pin.geo_tag(), "Updated pin");
        Ok(pin)
    }

    pub async fn delete_pin(&self, owner_id: &str, pin_id: Uuid) -> Result<(), PinError> {
        self.owned(owner_id, pin_id).await?;
        self.store.remove(pin_id).await?;
        info!(pin_id = %pin_id, owner_id, "Deleted pin");
        Ok(())
    }

    /// The owner's own pins, newest first.
    pub async fn my_pins(&self, owner_id: &str) -> Result<Vec<Pin>, PinError> {
        let mut pins: Vec<Pin> = self
            .store
            .scan_all()
            .await?
            .into_iter()
            .filter(|p| p.is_owned_by(owner_id) && p.is_user_pin())
            .collect();
        pins.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(pins)
    }

    pub async fn shared_feed(&self, query: &FeedQuery) -> Result<Vec<Pin>, PinError> {
        shared_feed(self.store.as_ref(), query).await
    }

    /// A pin the caller owns. Someone else's pin reads as missing.
    async fn owned(&self, owner_id: &str, pin_id: Uuid) -> Result<Pin, PinError> {
        match self.store.find(pin_id).await? {
            Some(pin) if pin.is_owned_by(owner_id) => Ok(pin),
            _ => Err(PinError::NotFound(pin_id)),
        }
    }

    async fn resolve_public(&self, place_id: &str) -> Result<ResolvedPlace, PinError> {
        let place_id = place_id.trim();
        if place_id.is_empty() {
            return Err(PinError::Validation("placeId is required".into()));
        }
        let place = self.resolver.resolve(place_id).await?;
        if !place.is_public_poi() {
            return Err(PinError::NotPublicPlace(place_id.to_string()));
        }
        Ok(place)
    }
}
