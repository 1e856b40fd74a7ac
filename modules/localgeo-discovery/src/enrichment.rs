use localgeo_common::{
    distance_miles, estimate_drive_minutes, estimate_walk_minutes, round_to_tenth, GeoPoint,
};

use crate::event::{EnrichedEvent, RawEventRecord, TravelEstimate};

/// Attach viewer-relative distance and travel estimates.
///
/// Without a viewer, or for events with no location, the event passes through
/// with no travel fields. Never drops an event.
pub fn enrich(events: Vec<RawEventRecord>, viewer: Option<&GeoPoint>) -> Vec<EnrichedEvent> {
    events
        .into_iter()
        .map(|event| {
            let travel = match (viewer, event.location.as_ref()) {
                (Some(viewer), Some(location)) => Some(estimate(viewer, location)),
                _ => None,
            };
            EnrichedEvent { event, travel }
        })
        .collect()
}

fn estimate(viewer: &GeoPoint, location: &GeoPoint) -> TravelEstimate {
    let miles = distance_miles(viewer, location);
    // Travel times come from the unrounded distance.
    TravelEstimate {
        distance_miles: round_to_tenth(miles),
        drive_time_minutes: estimate_drive_minutes(miles),
        walk_time_minutes: estimate_walk_minutes(miles),
    }
}
