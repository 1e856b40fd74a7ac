pub mod aggregator;
pub mod discovery;
pub mod enrichment;
pub mod event;
pub mod mood;
pub mod pin;
pub mod pins;
pub mod place;
pub mod proximity;
pub mod ranking;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use aggregator::EventAggregator;
pub use discovery::{
    DiscoveryBundle, DiscoveryCategory, DiscoveryItem, DiscoveryService, TonightQuery,
};
pub use enrichment::enrich;
pub use event::{DedupeKey, EnrichedEvent, RawEventRecord, TravelEstimate};
pub use mood::{Mood, MoodClassifier};
pub use pin::{NewPin, Pin, PinUpdate, PIN_CATEGORY};
pub use pins::{shared_feed, FeedQuery, PinError, PinService};
pub use place::{PlaceCategory, PlaceRecord};
pub use proximity::{nearby, Located, ProximityIndex, ScanIndex};
pub use ranking::{select_and_rank, select_and_rank_with, DEFAULT_RADIUS_MILES};
pub use traits::{EventSource, EventWindow, PlaceResolver, PlaceSource, RecordStore, ResolvedPlace};
