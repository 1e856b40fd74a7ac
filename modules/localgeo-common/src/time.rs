use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

/// A start time that cannot be pinned to a UTC instant.
///
/// Never surfaces to callers of the ranking pipeline: [`parse_start_time`]
/// callers fall back to the Unix epoch via [`start_time_or_epoch`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("ambiguous or malformed timestamp: {0:?}")]
pub struct AmbiguousParseError(pub String);

/// Parse an ISO-8601 UTC instant.
///
/// Accepts RFC 3339 (`2025-01-02T20:00:00Z`, `...+02:00`) and the minute
/// precision form `2025-01-02T20:00Z`. Zone-less local times are rejected as
/// ambiguous.
pub fn parse_start_time(raw: &str) -> Result<DateTime<Utc>, AmbiguousParseError> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Some(naive) = s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M") {
            return Ok(dt.and_utc());
        }
    }
    Err(AmbiguousParseError(raw.to_string()))
}

/// Parse a start time, mapping anything unparseable to the Unix epoch so it
/// sorts first.
pub fn start_time_or_epoch(raw: &str) -> DateTime<Utc> {
    parse_start_time(raw).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_rfc3339_utc() {
        let dt = parse_start_time("2025-01-02T20:00:00Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 2, 20, 0, 0).unwrap());
    }

    #[test]
    fn parses_minute_precision() {
        let dt = parse_start_time("2025-01-02T18:00Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 2, 18, 0, 0).unwrap());
    }

    #[test]
    fn normalizes_offsets_to_utc() {
        let dt = parse_start_time("2025-01-02T20:00:00-05:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 3, 1, 0, 0).unwrap());
    }

    #[test]
    fn zone_less_local_time_is_ambiguous() {
        assert!(parse_start_time("2025-01-02T20:00:00").is_err());
    }

    #[test]
    fn garbage_falls_back_to_epoch() {
        assert_eq!(start_time_or_epoch("tonight-ish"), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(start_time_or_epoch(""), DateTime::<Utc>::UNIX_EPOCH);
    }
}
