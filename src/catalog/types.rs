//! Core data types for the event catalog
//!
//! - `RawEvent`: a record as delivered by the upstream agenda, every field optional
//! - `RawSession`: one begin/end pair, possibly malformed
//! - `NormalizedEvent`: the canonical, immutable form produced by the normalizer

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::time::Timestamp;

/// An event record as delivered by the upstream source
///
/// Every field is kept as a raw JSON value so that a missing or oddly-typed
/// field never rejects the whole record. Accessors below extract what they
/// can and fall back to empty values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RawEvent {
    pub uid: Value,
    pub title: Value,
    pub description: Value,
    pub long_description: Value,
    pub location: Value,
    pub keywords: Value,
    pub timings: Value,
    pub canonical_url: Value,
}

/// One begin/end pair as supplied upstream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSession {
    pub begin: Option<String>,
    pub end: Option<String>,
}

impl RawSession {
    pub fn new(begin: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            begin: Some(begin.into()),
            end: Some(end.into()),
        }
    }
}

impl RawEvent {
    /// Source identifier, stringified whether it was sent as a number or a string
    pub fn id(&self) -> String {
        match &self.uid {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        }
    }

    /// Title in `lang`, falling back to any available language
    pub fn title(&self, lang: &str) -> Option<String> {
        localized(&self.title, lang)
    }

    /// Long description when present, short description otherwise
    pub fn description(&self, lang: &str) -> Option<String> {
        localized(&self.long_description, lang).or_else(|| localized(&self.description, lang))
    }

    /// "name, address, city postalCode" with empty parts omitted
    pub fn location_text(&self) -> String {
        let field = |key: &str| -> String {
            match self.location.get(key) {
                Some(Value::String(s)) => s.trim().to_string(),
                Some(Value::Number(n)) => n.to_string(),
                _ => String::new(),
            }
        };

        let city_line = format!("{} {}", field("city"), field("postalCode"))
            .trim()
            .to_string();

        [field("name"), field("address"), city_line]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Keywords in `lang` (or any language), comma separated
    pub fn keywords(&self, lang: &str) -> String {
        let list = match &self.keywords {
            Value::Array(_) => Some(&self.keywords),
            Value::Object(map) => map
                .get(lang)
                .filter(|v| v.is_array())
                .or_else(|| map.values().find(|v| v.is_array())),
            _ => None,
        };

        list.and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default()
    }

    /// Canonical URL, if any
    pub fn url(&self) -> Option<String> {
        self.canonical_url
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Timing pairs; entries that are not objects yield empty sessions
    pub fn raw_sessions(&self) -> Vec<RawSession> {
        let Some(timings) = self.timings.as_array() else {
            return Vec::new();
        };

        timings
            .iter()
            .map(|timing| RawSession {
                begin: timing.get("begin").and_then(Value::as_str).map(str::to_string),
                end: timing.get("end").and_then(Value::as_str).map(str::to_string),
            })
            .collect()
    }
}

/// Read a localized field: a plain string, or a `{lang: text}` map
fn localized(value: &Value, lang: &str) -> Option<String> {
    let text = match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map
            .get(lang)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .or_else(|| map.values().filter_map(Value::as_str).find(|s| !s.trim().is_empty())),
        _ => None,
    }?;

    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// One valid session after parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub begin: Timestamp,
    pub end: Timestamp,
}

/// Canonical form of an event, produced once per rebuild
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    /// Opaque source identifier
    pub id: String,
    pub title: String,
    pub description: String,
    pub location_text: String,
    pub keywords: String,
    pub url: Option<String>,
    /// Begin and end instants of every valid session, sorted and deduplicated
    pub sessions: Vec<Timestamp>,
    /// Begin instants at or after normalization time, ascending
    pub future_sessions: Vec<Timestamp>,
    /// Begin instants before normalization time, ascending
    pub past_sessions: Vec<Timestamp>,
    /// Earliest instant of `sessions`, 0 when there is none
    pub start_ts: Timestamp,
    /// Latest instant of `sessions`, 0 when there is none
    pub end_ts: Timestamp,
    /// Compact description used for embedding
    pub search_text: String,
    /// Verbose description used to ground generation
    pub full_context: String,
}

impl NormalizedEvent {
    /// Whether at least one timing pair could be parsed
    pub fn has_schedule(&self) -> bool {
        !self.sessions.is_empty()
    }

    /// Whether any session begins at or after normalization time
    pub fn is_upcoming(&self) -> bool {
        !self.future_sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> RawEvent {
        serde_json::from_value(json!({
            "uid": 123,
            "title": {"fr": "Concert de Jazz", "en": "Jazz concert"},
            "longDescription": {"fr": "Un super concert de jazz au parc."},
            "description": {"fr": "Concert"},
            "location": {
                "name": "Parc Floral",
                "address": "Route de la Pyramide",
                "city": "Paris",
                "postalCode": "75012"
            },
            "keywords": {"fr": ["jazz", "concert", "musique"]},
            "timings": [
                {"begin": "2026-06-10T18:00:00+02:00", "end": "2026-06-10T20:00:00+02:00"},
                {"begin": "2026-06-11T18:00:00+02:00"},
                "garbage"
            ],
            "canonicalUrl": "https://openagenda.com/event/123"
        }))
        .unwrap()
    }

    #[test]
    fn test_accessors() {
        let event = sample();

        assert_eq!(event.id(), "123");
        assert_eq!(event.title("fr").as_deref(), Some("Concert de Jazz"));
        assert_eq!(event.title("en").as_deref(), Some("Jazz concert"));
        assert_eq!(
            event.description("fr").as_deref(),
            Some("Un super concert de jazz au parc.")
        );
        assert_eq!(
            event.location_text(),
            "Parc Floral, Route de la Pyramide, Paris 75012"
        );
        assert_eq!(event.keywords("fr"), "jazz, concert, musique");
        assert_eq!(event.url().as_deref(), Some("https://openagenda.com/event/123"));
    }

    #[test]
    fn test_raw_sessions_keep_malformed_entries() {
        let sessions = sample().raw_sessions();

        assert_eq!(sessions.len(), 3);
        assert!(sessions[0].begin.is_some() && sessions[0].end.is_some());
        assert!(sessions[1].end.is_none());
        assert_eq!(sessions[2], RawSession::default());
    }

    #[test]
    fn test_missing_fields_are_tolerated() {
        let event: RawEvent = serde_json::from_value(json!({
            "uid": "456",
            "title": {"fr": "Expo Photo"},
            "description": {"fr": "Une belle expo."},
            "location": {"city": "Lyon"},
            "keywords": {},
            "timings": "not a list"
        }))
        .unwrap();

        assert_eq!(event.id(), "456");
        assert_eq!(event.description("fr").as_deref(), Some("Une belle expo."));
        assert_eq!(event.location_text(), "Lyon");
        assert_eq!(event.keywords("fr"), "");
        assert_eq!(event.url(), None);
        assert!(event.raw_sessions().is_empty());
    }

    #[test]
    fn test_language_fallback() {
        let event: RawEvent = serde_json::from_value(json!({
            "title": {"en": "Only English"},
            "keywords": ["a", " ", "b"]
        }))
        .unwrap();

        assert_eq!(event.title("fr").as_deref(), Some("Only English"));
        assert_eq!(event.keywords("fr"), "a, b");
        assert_eq!(event.id(), "");
    }
}
