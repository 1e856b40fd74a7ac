//! Event aggregation: fetch a window from an event source, normalize every
//! payload, and collapse duplicates.
//!
//! The aggregator is the containment boundary for event-source failures. A
//! transport or parse error, or a panic inside the source, is logged and
//! turns into an empty result; callers never see it.

use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use futures::FutureExt;
use tracing::{info, warn};

use crate::event::{DedupeKey, RawEventRecord};
use crate::traits::{EventSource, EventWindow};

pub struct EventAggregator {
    source: Arc<dyn EventSource>,
}

impl EventAggregator {
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self { source }
    }

    pub fn source_id(&self) -> &str {
        self.source.source_id()
    }

    /// Normalized, deduplicated events for `[start, end]` in `region`.
    pub async fn fetch_window(
        &self,
        region: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        keyword: Option<&str>,
    ) -> Vec<RawEventRecord> {
        let window = EventWindow {
            region: region.to_string(),
            start,
            end,
            keyword: keyword
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
        };
        let source_id = self.source.source_id();

        let payloads = match AssertUnwindSafe(self.source.fetch(&window))
            .catch_unwind()
            .await
        {
            Ok(Ok(p)) => p,
            Ok(Err(e)) => {
                warn!(
                    source = source_id,
                    region,
                    error = %e,
                    "Event source fetch failed, returning no events"
                );
                return Vec::new();
            }
            Err(panic) => {
                warn!(
                    source = source_id,
                    region,
                    reason = %panic_reason(panic.as_ref()),
                    "Event source panicked, returning no events"
                );
                return Vec::new();
            }
        };

        let raw_count = payloads.len();
        let events = dedupe(
            payloads
                .iter()
                .map(|p| RawEventRecord::from_payload(p, source_id)),
        );

        info!(
            source = source_id,
            region,
            raw = raw_count,
            unique = events.len(),
            "Fetched event window"
        );
        events
    }

    /// Events on a calendar day, `00:00:00Z` through `23:59:59Z`.
    pub async fn fetch_day(
        &self,
        region: &str,
        date: NaiveDate,
        keyword: Option<&str>,
    ) -> Vec<RawEventRecord> {
        let (start, end) = day_window(date);
        self.fetch_window(region, start, end, keyword).await
    }

    /// Keyword (artist, performer, title) search over today's events in any
    /// region.
    pub async fn search_by_keyword(&self, keyword: &str, today: NaiveDate) -> Vec<RawEventRecord> {
        self.fetch_day("", today, Some(keyword)).await
    }

    /// One event by upstream id, normalized. Failures are contained the same
    /// way as window fetches and read as "not found".
    pub async fn fetch_by_id(&self, id: &str) -> Option<RawEventRecord> {
        let source_id = self.source.source_id();
        match AssertUnwindSafe(self.source.fetch_by_id(id))
            .catch_unwind()
            .await
        {
            Ok(Ok(payload)) => payload.map(|p| RawEventRecord::from_payload(&p, source_id)),
            Ok(Err(e)) => {
                warn!(source = source_id, id, error = %e, "Event lookup failed");
                None
            }
            Err(panic) => {
                warn!(
                    source = source_id,
                    id,
                    reason = %panic_reason(panic.as_ref()),
                    "Event source panicked during lookup"
                );
                None
            }
        }
    }
}

/// Message carried by a caught panic payload.
pub(crate) fn panic_reason(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// UTC bounds of a calendar day.
pub fn day_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    let end = date
        .and_hms_opt(23, 59, 59)
        .map(|dt| dt.and_utc())
        .unwrap_or(start);
    (start, end)
}

/// Collapse records sharing a [`DedupeKey`]. The first record seen for a key
/// wins, and survivors keep their arrival order.
pub fn dedupe(records: impl IntoIterator<Item = RawEventRecord>) -> Vec<RawEventRecord> {
    let mut seen: HashSet<DedupeKey> = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.dedupe_key()))
        .collect()
}
