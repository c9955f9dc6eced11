//! Upstream event sources
//!
//! - `OpenAgendaSource`: the v2 API when a key is configured, the public JSON export otherwise
//! - `FileSource`: a raw-events snapshot on disk
//! - `MockSource`: one synthetic event, for CI and offline runs

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, SecondsFormat};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;

use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::normalizer::parse_instant;
use crate::catalog::types::RawEvent;
use crate::config::SourceConfig;
use crate::time::Clock;

/// Fields requested from the v2 API
const INCLUDE_FIELDS: &[&str] = &[
    "uid",
    "title",
    "description",
    "longDescription",
    "location",
    "timings",
    "keywords",
    "canonicalUrl",
];

/// Common trait for everything that can supply raw events
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Fetch the full list of raw events
    async fn fetch_events(&self) -> CatalogResult<Vec<RawEvent>>;
}

/// Build the source described by the configuration
pub fn from_config(config: &SourceConfig, clock: Clock) -> CatalogResult<Box<dyn EventSource>> {
    if config.mock {
        tracing::warn!("Mock mode enabled: serving a synthetic event");
        return Ok(Box::new(MockSource::new(clock)));
    }
    Ok(Box::new(OpenAgendaSource::new(config.clone())?))
}

/// Agenda envelope, `{"events": [...]}`
#[derive(Debug, Deserialize)]
struct EventsEnvelope {
    #[serde(default)]
    events: Vec<serde_json::Value>,
}

/// OpenAgenda HTTP client
pub struct OpenAgendaSource {
    client: Client,
    config: SourceConfig,
}

impl OpenAgendaSource {
    pub fn new(config: SourceConfig) -> CatalogResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("Almanac/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn request(&self) -> reqwest::RequestBuilder {
        match self.config.api_key.as_deref() {
            Some(key) => {
                let url = format!(
                    "{}/agendas/{}/events",
                    self.config.api_base_url.trim_end_matches('/'),
                    self.config.agenda_uid
                );
                let mut params: Vec<(&str, String)> = vec![("key", key.to_string())];
                params.extend(INCLUDE_FIELDS.iter().map(|f| ("includeFields[]", f.to_string())));
                params.push(("relative[]", "current".to_string()));
                params.push(("relative[]", "upcoming".to_string()));
                params.push(("limit", self.config.limit.to_string()));

                self.client.get(url).query(&params)
            }
            None => {
                let url = format!(
                    "{}/{}/events.json",
                    self.config.legacy_base_url.trim_end_matches('/'),
                    self.config.agenda_uid
                );
                self.client.get(url)
            }
        }
    }
}

#[async_trait]
impl EventSource for OpenAgendaSource {
    fn name(&self) -> &str {
        "openagenda"
    }

    async fn fetch_events(&self) -> CatalogResult<Vec<RawEvent>> {
        tracing::info!(
            agenda = %self.config.agenda_uid,
            authenticated = self.config.api_key.is_some(),
            "Fetching events from OpenAgenda"
        );

        let response = self.request().send().await.map_err(|e| {
            if e.is_timeout() {
                CatalogError::Timeout
            } else if e.is_connect() {
                CatalogError::Unavailable(e.to_string())
            } else {
                CatalogError::Request(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: EventsEnvelope = response
            .json()
            .await
            .map_err(|e| CatalogError::Serialization(e.to_string()))?;

        Ok(decode_events(envelope.events))
    }
}

/// Decode records one by one so a single odd record is skipped, not fatal
fn decode_events(values: Vec<serde_json::Value>) -> Vec<RawEvent> {
    let total = values.len();
    let events: Vec<RawEvent> = values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!("Skipping undecodable event record: {}", e);
                None
            }
        })
        .collect();

    tracing::info!(decoded = events.len(), total, "Decoded raw events");
    events
}

/// Raw events read from a JSON snapshot
///
/// Accepts either a bare array or an `{"events": [...]}` envelope.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl EventSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch_events(&self) -> CatalogResult<Vec<RawEvent>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let value: serde_json::Value = serde_json::from_str(&content)?;

        let records = match value {
            serde_json::Value::Array(items) => items,
            other => serde_json::from_value::<EventsEnvelope>(other)?.events,
        };

        Ok(decode_events(records))
    }
}

/// A single synthetic event whose session starts now
pub struct MockSource {
    clock: Clock,
}

impl MockSource {
    pub fn new(clock: Clock) -> Self {
        Self { clock }
    }

    /// The synthetic record for a given instant
    pub fn event_at(now: DateTime<FixedOffset>) -> RawEvent {
        let begin = now.to_rfc3339_opts(SecondsFormat::Secs, false);
        let end = (now + Duration::days(1)).to_rfc3339_opts(SecondsFormat::Secs, false);

        serde_json::from_value(json!({
            "uid": 999999,
            "title": {"fr": "Atelier Cuisine Sauvage Mock"},
            "description": {"fr": "Un événement factice pour les tests."},
            "location": {
                "name": "Bois de Vincennes",
                "address": "Paris",
                "city": "Paris",
                "postalCode": "75012"
            },
            "timings": [{"begin": begin, "end": end}],
            "keywords": {"fr": ["cuisine", "sauvage"]},
            "canonicalUrl": "http://mock.url"
        }))
        .unwrap_or_default()
    }
}

#[async_trait]
impl EventSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_events(&self) -> CatalogResult<Vec<RawEvent>> {
        Ok(vec![Self::event_at(self.clock.now())])
    }
}

/// Keep events that are recent or upcoming
///
/// An event is kept when at least one session ends at or after
/// `now - days`. Events without any parsable end are kept too: they are
/// still indexed, with unspecified dates.
pub fn filter_recent(
    events: Vec<RawEvent>,
    now: DateTime<FixedOffset>,
    days: i64,
) -> Vec<RawEvent> {
    let cutoff = (now - Duration::days(days)).timestamp_millis();
    let offset = *now.offset();
    let total = events.len();

    let kept: Vec<RawEvent> = events
        .into_iter()
        .filter(|event| {
            let ends: Vec<i64> = event
                .raw_sessions()
                .iter()
                .filter_map(|s| s.end.as_deref().and_then(|e| parse_instant(e, offset)))
                .collect();
            ends.is_empty() || ends.iter().any(|&end| end >= cutoff)
        })
        .collect();

    tracing::info!(
        days,
        kept = kept.len(),
        total,
        "Applied recency filter"
    );
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2025, 12, 22, 10, 0, 0)
            .unwrap()
    }

    fn with_end(end: &str) -> RawEvent {
        serde_json::from_value(json!({
            "uid": end,
            "timings": [{"begin": "2020-01-01T00:00:00Z", "end": end}]
        }))
        .unwrap()
    }

    #[test]
    fn test_filter_recent() {
        let events = vec![
            with_end("2025-12-01T00:00:00Z"),
            with_end("2023-01-01T00:00:00Z"),
            with_end("not-a-date"),
            RawEvent::default(),
        ];

        let kept = filter_recent(events, now(), 365);
        let ids: Vec<String> = kept.iter().map(RawEvent::id).collect();

        assert_eq!(ids, vec!["2025-12-01T00:00:00Z", "not-a-date", ""]);
    }

    #[test]
    fn test_mock_event_starts_now() {
        let event = MockSource::event_at(now());
        let sessions = event.raw_sessions();

        assert_eq!(event.id(), "999999");
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].begin.as_deref(), Some("2025-12-22T10:00:00+01:00"));
        assert_eq!(sessions[0].end.as_deref(), Some("2025-12-23T10:00:00+01:00"));
    }

    #[tokio::test]
    async fn test_file_source_accepts_array_and_envelope() {
        let mut array = tempfile::NamedTempFile::new().unwrap();
        write!(array, r#"[{{"uid": 1}}, {{"uid": "2"}}]"#).unwrap();
        let events = FileSource::new(array.path()).fetch_events().await.unwrap();
        assert_eq!(events.len(), 2);

        let mut envelope = tempfile::NamedTempFile::new().unwrap();
        write!(envelope, r#"{{"total": 1, "events": [{{"uid": 3}}]}}"#).unwrap();
        let events = FileSource::new(envelope.path()).fetch_events().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id(), "3");
    }

    #[test]
    fn test_decode_skips_non_objects() {
        let events = decode_events(vec![json!({"uid": 1}), json!("nope"), json!(42)]);
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_mock_source_from_config() {
        let config = SourceConfig {
            mock: true,
            ..Default::default()
        };
        let source = from_config(&config, Clock::utc()).unwrap();

        assert_eq!(source.name(), "mock");
        assert_eq!(source.fetch_events().await.unwrap().len(), 1);
    }
}
