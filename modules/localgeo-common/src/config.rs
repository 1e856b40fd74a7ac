use std::env;
use std::str::FromStr;

use tracing::info;

use crate::error::{LocalGeoError, Result};

/// Longest accepted "tonight" window: one week.
pub const MAX_TONIGHT_WINDOW_HOURS: i64 = 168;

/// Engine configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Forward-looking window for "tonight" queries.
    pub tonight_window_hours: i64,
    /// Radius applied to ranked event results when the caller gives none.
    pub default_radius_miles: f64,
    /// Upper bound on concurrently running fan-out branches.
    pub max_concurrent_branches: usize,
    pub feed_page_size: usize,

    // File-backed collaborators (CLI)
    pub pins_file: Option<String>,
    pub events_file: Option<String>,
    pub places_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tonight_window_hours: 8,
            default_radius_miles: 25.0,
            max_concurrent_branches: 3,
            feed_page_size: 20,
            pins_file: None,
            events_file: None,
            places_file: None,
        }
    }
}

impl Config {
    /// Load configuration from `LOCALGEO_*` environment variables, falling
    /// back to defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            tonight_window_hours: parsed(&lookup, "LOCALGEO_TONIGHT_WINDOW_HOURS")?
                .unwrap_or(defaults.tonight_window_hours),
            default_radius_miles: parsed(&lookup, "LOCALGEO_DEFAULT_RADIUS_MILES")?
                .unwrap_or(defaults.default_radius_miles),
            max_concurrent_branches: parsed(&lookup, "LOCALGEO_MAX_CONCURRENT_BRANCHES")?
                .unwrap_or(defaults.max_concurrent_branches),
            feed_page_size: parsed(&lookup, "LOCALGEO_FEED_PAGE_SIZE")?
                .unwrap_or(defaults.feed_page_size),
            pins_file: lookup("LOCALGEO_PINS_FILE").filter(|v| !v.is_empty()),
            events_file: lookup("LOCALGEO_EVENTS_FILE").filter(|v| !v.is_empty()),
            places_file: lookup("LOCALGEO_PLACES_FILE").filter(|v| !v.is_empty()),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(1..=MAX_TONIGHT_WINDOW_HOURS).contains(&self.tonight_window_hours) {
            return Err(LocalGeoError::Config(format!(
                "LOCALGEO_TONIGHT_WINDOW_HOURS must be between 1 and {MAX_TONIGHT_WINDOW_HOURS}"
            )));
        }
        if !(self.default_radius_miles.is_finite() && self.default_radius_miles >= 0.0) {
            return Err(LocalGeoError::Config(
                "LOCALGEO_DEFAULT_RADIUS_MILES must be a non-negative number".into(),
            ));
        }
        if self.max_concurrent_branches == 0 {
            return Err(LocalGeoError::Config(
                "LOCALGEO_MAX_CONCURRENT_BRANCHES must be at least 1".into(),
            ));
        }
        if self.feed_page_size == 0 {
            return Err(LocalGeoError::Config(
                "LOCALGEO_FEED_PAGE_SIZE must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Log the effective configuration.
    pub fn log_summary(&self) {
        info!(
            tonight_window_hours = self.tonight_window_hours,
            default_radius_miles = self.default_radius_miles,
            max_concurrent_branches = self.max_concurrent_branches,
            feed_page_size = self.feed_page_size,
            pins_file = self.pins_file.as_deref().unwrap_or("<unset>"),
            events_file = self.events_file.as_deref().unwrap_or("<unset>"),
            places_file = self.places_file.as_deref().unwrap_or("<unset>"),
            "Configuration loaded"
        );
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Ok(None),
        Some(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| LocalGeoError::Config(format!("{key} has invalid value {v:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.tonight_window_hours, 8);
        assert_eq!(config.default_radius_miles, 25.0);
        assert_eq!(config.max_concurrent_branches, 3);
    }

    #[test]
    fn overrides_are_applied() {
        let config = Config::from_lookup(lookup_from(&[
            ("LOCALGEO_DEFAULT_RADIUS_MILES", "10.5"),
            ("LOCALGEO_MAX_CONCURRENT_BRANCHES", "5"),
            ("LOCALGEO_PINS_FILE", "/tmp/pins.json"),
        ]))
        .unwrap();
        assert_eq!(config.default_radius_miles, 10.5);
        assert_eq!(config.max_concurrent_branches, 5);
        assert_eq!(config.pins_file.as_deref(), Some("/tmp/pins.json"));
    }

    #[test]
    fn unparseable_value_is_config_error() {
        let err = Config::from_lookup(lookup_from(&[("LOCALGEO_FEED_PAGE_SIZE", "twenty")]))
            .unwrap_err();
        assert!(matches!(err, LocalGeoError::Config(_)));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let result =
            Config::from_lookup(lookup_from(&[("LOCALGEO_MAX_CONCURRENT_BRANCHES", "0")]));
        assert!(result.is_err());
    }

    #[test]
    fn tonight_window_is_capped_at_one_week() {
        let week = Config::from_lookup(lookup_from(&[("LOCALGEO_TONIGHT_WINDOW_HOURS", "168")]))
            .unwrap();
        assert_eq!(week.tonight_window_hours, MAX_TONIGHT_WINDOW_HOURS);

        for hours in ["169", "9223372036854775807", "0", "-4"] {
            let err = Config::from_lookup(lookup_from(&[("LOCALGEO_TONIGHT_WINDOW_HOURS", hours)]))
                .unwrap_err();
            assert!(matches!(err, LocalGeoError::Config(_)), "{hours} accepted");
        }
    }
}
