use std::cmp::Ordering;

use crate::event::EnrichedEvent;
use crate::mood::MoodClassifier;

/// Radius applied to "tonight" results when the caller gives none.
pub const DEFAULT_RADIUS_MILES: f64 = 25.0;

/// Filter by radius and mood, then order by start time and distance.
///
/// - Events with unknown distance always pass the radius test.
/// - Order is ascending start time (unparseable times count as the epoch),
///   then ascending distance with unknown distance last.
/// - The sort is stable: full ties keep their input order.
pub fn select_and_rank(
    events: Vec<EnrichedEvent>,
    radius_miles: f64,
    mood: Option<&str>,
) -> Vec<EnrichedEvent> {
    select_and_rank_with(&MoodClassifier::default(), events, radius_miles, mood)
}

pub fn select_and_rank_with(
    classifier: &MoodClassifier,
    events: Vec<EnrichedEvent>,
    radius_miles: f64,
    mood: Option<&str>,
) -> Vec<EnrichedEvent> {
    let mut keyed: Vec<_> = events
        .into_iter()
        .filter(|e| e.distance_miles().map_or(true, |d| d <= radius_miles))
        .filter(|e| classifier.matches(&e.event, mood))
        .map(|e| {
            let start = e.event.start_instant();
            let distance = e.distance_miles().unwrap_or(f64::INFINITY);
            (start, distance, e)
        })
        .collect();

    keyed.sort_by(|a, b| match a.0.cmp(&b.0) {
        Ordering::Equal => a.1.total_cmp(&b.1),
        other => other,
    });

    keyed.into_iter().map(|(_, _, e)| e).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::event::{RawEventRecord, TravelEstimate};

    fn event(name: &str, start: &str, distance: Option<f64>) -> EnrichedEvent {
        let event = RawEventRecord::from_payload(
            &json!({ "name": { "text": name }, "start": { "utc": start } }),
            "test",
        );
        EnrichedEvent {
            event,
            travel: distance.map(|d| TravelEstimate {
                distance_miles: d,
                drive_time_minutes: 2,
                walk_time_minutes: 1,
            }),
        }
    }

    fn names(events: &[EnrichedEvent]) -> Vec<&str> {
        events.iter().map(|e| e.event.name.as_str()).collect()
    }

    #[test]
    fn sorts_by_time_then_distance_with_unknown_last() {
        let out = select_and_rank(
            vec![
                event("ten@20", "2025-01-02T20:00Z", Some(10.0)),
                event("null@18", "2025-01-02T18:00Z", None),
                event("two@18", "2025-01-02T18:00Z", Some(2.0)),
            ],
            DEFAULT_RADIUS_MILES,
            None,
        );
        assert_eq!(names(&out), vec!["two@18", "null@18", "ten@20"]);
    }

    #[test]
    fn unknown_distance_is_never_dropped_by_radius() {
        let out = select_and_rank(
            vec![event("nowhere", "2025-01-02T18:00Z", None)],
            0.0,
            None,
        );
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn radius_boundary_is_inclusive() {
        let out = select_and_rank(
            vec![
                event("edge", "2025-01-02T18:00Z", Some(25.0)),
                event("beyond", "2025-01-02T18:00Z", Some(25.1)),
            ],
            25.0,
            None,
        );
        assert_eq!(names(&out), vec!["edge"]);
    }

    #[test]
    fn mood_filter_applies() {
        let out = select_and_rank(
            vec![
                event("Midnight Jazz Set", "2025-01-02T23:00Z", Some(1.0)),
                event("Sports Bar Trivia Night", "2025-01-02T19:00Z", Some(1.0)),
            ],
            25.0,
            Some("chill"),
        );
        assert_eq!(names(&out), vec!["Midnight Jazz Set"]);
    }

    #[test]
    fn unparseable_start_sorts_first() {
        let out = select_and_rank(
            vec![
                event("timed", "2025-01-02T18:00Z", Some(1.0)),
                event("garbled", "sometime tonight", Some(5.0)),
            ],
            25.0,
            None,
        );
        assert_eq!(names(&out), vec!["garbled", "timed"]);
    }

    #[test]
    fn full_ties_keep_input_order() {
        let out = select_and_rank(
            vec![
                event("first", "2025-01-02T18:00Z", Some(3.0)),
                event("second", "2025-01-02T18:00Z", Some(3.0)),
                event("third", "2025-01-02T18:00Z", Some(3.0)),
                event("u1", "2025-01-02T18:00Z", None),
                event("u2", "2025-01-02T18:00Z", None),
            ],
            25.0,
            None,
        );
        assert_eq!(names(&out), vec!["first", "second", "third", "u1", "u2"]);
    }

    #[test]
    fn equivalent_instants_in_different_offsets_tie_on_time() {
        let out = select_and_rank(
            vec![
                event("far", "2025-01-02T20:00:00-05:00", Some(8.0)),
                event("near", "2025-01-03T01:00:00Z", Some(1.0)),
            ],
            25.0,
            None,
        );
        assert_eq!(names(&out), vec!["near", "far"]);
    }
}
