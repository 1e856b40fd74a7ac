use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::event::RawEventRecord;

/// Coarse event-tone buckets a viewer can filter by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Chill,
    Loud,
    Date,
}

/// One row of the keyword table: a mood filter containing `trigger` selects
/// `mood`, and an event matches if its name contains any of `keywords`.
#[derive(Debug)]
pub struct MoodRule {
    pub mood: Mood,
    pub trigger: &'static str,
    pub keywords: &'static [&'static str],
}

/// Checked in order; the first trigger contained in the filter wins.
pub static DEFAULT_MOOD_RULES: &[MoodRule] = &[
    MoodRule {
        mood: Mood::Chill,
        trigger: "chill",
        keywords: &["jazz", "acoustic", "open mic"],
    },
    MoodRule {
        mood: Mood::Loud,
        trigger: "loud",
        keywords: &["karaoke", "bar", "dj", "trivia"],
    },
    MoodRule {
        mood: Mood::Date,
        trigger: "date",
        keywords: &["jazz", "dinner", "live"],
    },
];

/// Keyword heuristic deciding whether an event fits a mood filter.
///
/// An empty filter, or one naming no known mood, matches every event.
#[derive(Debug, Clone, Copy)]
pub struct MoodClassifier {
    rules: &'static [MoodRule],
}

impl Default for MoodClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_MOOD_RULES)
    }
}

impl MoodClassifier {
    pub fn new(rules: &'static [MoodRule]) -> Self {
        Self { rules }
    }

    /// The rule a free-text mood filter selects, if any.
    pub fn rule_for(&self, mood: &str) -> Option<&'static MoodRule> {
        let mood = mood.to_lowercase();
        self.rules.iter().find(|r| mood.contains(r.trigger))
    }

    pub fn detect(&self, mood: &str) -> Option<Mood> {
        self.rule_for(mood).map(|r| r.mood)
    }

    pub fn matches(&self, event: &RawEventRecord, mood: Option<&str>) -> bool {
        self.matches_name(&event.name, mood)
    }

    pub fn matches_name(&self, event_name: &str, mood: Option<&str>) -> bool {
        let Some(mood) = mood.filter(|m| !m.is_empty()) else {
            return true;
        };
        let Some(rule) = self.rule_for(mood) else {
            return true;
        };
        let name = event_name.to_lowercase();
        rule.keywords.iter().any(|k| name.contains(k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> MoodClassifier {
        MoodClassifier::default()
    }

    #[test]
    fn no_mood_matches_everything() {
        assert!(classifier().matches_name("Anything", None));
        assert!(classifier().matches_name("Anything", Some("")));
    }

    #[test]
    fn chill_matches_jazz_not_trivia() {
        assert!(classifier().matches_name("Midnight Jazz Set", Some("Chill")));
        assert!(!classifier().matches_name("Sports Bar Trivia Night", Some("Chill")));
    }

    #[test]
    fn loud_keywords() {
        let c = classifier();
        assert!(c.matches_name("Karaoke Thursdays", Some("loud")));
        assert!(c.matches_name("Sports Bar Trivia Night", Some("LOUD")));
        assert!(c.matches_name("Resident DJ", Some("loud")));
        assert!(!c.matches_name("Acoustic Brunch", Some("loud")));
    }

    #[test]
    fn date_keywords() {
        let c = classifier();
        assert!(c.matches_name("Dinner & a Show", Some("date night")));
        assert!(c.matches_name("LIVE at the Fitz", Some("date")));
        assert!(!c.matches_name("Karaoke Thursdays", Some("date")));
    }

    #[test]
    fn open_mic_phrase_matches_chill() {
        assert!(classifier().matches_name("Tuesday Open Mic", Some("chill")));
    }

    #[test]
    fn unknown_mood_passes_through() {
        assert!(classifier().matches_name("Monster Truck Rally", Some("adventurous")));
    }

    #[test]
    fn first_trigger_in_table_order_wins() {
        let c = classifier();
        assert_eq!(c.detect("chill date"), Some(Mood::Chill));
        assert_eq!(c.detect("loud date"), Some(Mood::Loud));
        // "Dinner" is a date keyword but chill is checked first.
        assert!(!c.matches_name("Dinner Cruise", Some("chill date")));
    }

    #[test]
    fn substring_semantics_are_preserved() {
        // "bar" matches inside "Barbecue"; the heuristic is intentionally coarse.
        assert!(classifier().matches_name("Barbecue Fest", Some("loud")));
    }
}
