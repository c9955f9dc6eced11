//! Timing Normalizer
//!
//! Turns an event's irregular list of begin/end pairs into:
//!
//! ```text
//! timings ──parse──▶ valid pairs ──┬──▶ sessions (begin + end instants, sorted set)
//!    │                             ├──▶ future / past begin instants
//!    └─ malformed pairs dropped    ├──▶ start_ts / end_ts
//!                                  └──▶ "Dates à venir" / "Dates passées" blocks
//! ```
//!
//! The output is a pure function of the raw record and the ingestion instant,
//! so running it twice on the same input yields identical text.

use chrono::{DateTime, FixedOffset, NaiveDateTime};

use crate::catalog::types::{NormalizedEvent, RawEvent, RawSession, Session};
use crate::time::{
    format_hour, format_long_date, format_numeric_date, local_timestamp, Clock, Timestamp,
};

/// Date text used when no timing pair could be parsed
pub const UNSPECIFIED_DATES: &str = "non spécifiée";

const DEFAULT_TITLE: &str = "Sans titre";
const UPCOMING_HEADER: &str = "Dates à venir";
const ARCHIVED_HEADER: &str = "Dates passées (archivées, ne pas proposer)";

/// Naive formats accepted when a timing is not RFC 3339
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse an upstream instant
///
/// RFC 3339 strings carry their own offset; naive date-times are read in the
/// catalog clock's offset.
pub fn parse_instant(raw: &str, offset: FixedOffset) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| local_timestamp(naive, offset))
}

/// Temporal view of one event's timings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    /// Valid pairs, ordered by begin then end
    pub pairs: Vec<Session>,
    /// Begin and end instants of every valid pair, sorted set
    pub sessions: Vec<Timestamp>,
    pub future: Vec<Timestamp>,
    pub past: Vec<Timestamp>,
    pub start_ts: Timestamp,
    pub end_ts: Timestamp,
    /// Number of pairs that could not be parsed
    pub dropped: usize,
}

impl Schedule {
    /// Parse raw pairs and partition them around `now`
    pub fn build(raw: &[RawSession], now: Timestamp, offset: FixedOffset) -> Self {
        let mut pairs = Vec::with_capacity(raw.len());
        let mut dropped = 0;

        for session in raw {
            let begin = session.begin.as_deref().and_then(|s| parse_instant(s, offset));
            let end = session.end.as_deref().and_then(|s| parse_instant(s, offset));

            match (begin, end) {
                (Some(begin), Some(end)) => pairs.push(Session { begin, end }),
                _ => {
                    dropped += 1;
                    tracing::debug!(
                        begin = ?session.begin,
                        end = ?session.end,
                        "Dropping unparsable timing pair"
                    );
                }
            }
        }

        pairs.sort_by_key(|s| (s.begin, s.end));
        pairs.dedup();

        let mut sessions: Vec<Timestamp> =
            pairs.iter().flat_map(|s| [s.begin, s.end]).collect();
        sessions.sort_unstable();
        sessions.dedup();

        let (future, past): (Vec<Timestamp>, Vec<Timestamp>) =
            pairs.iter().map(|s| s.begin).partition(|&begin| begin >= now);

        Self {
            start_ts: sessions.first().copied().unwrap_or(0),
            end_ts: sessions.last().copied().unwrap_or(0),
            pairs,
            sessions,
            future,
            past,
            dropped,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Converts raw records into `NormalizedEvent`s
#[derive(Debug, Clone)]
pub struct TimingNormalizer {
    clock: Clock,
    lang: String,
}

impl TimingNormalizer {
    /// Create a normalizer reading localized fields in `lang`
    pub fn new(clock: Clock, lang: impl Into<String>) -> Self {
        Self {
            clock,
            lang: lang.into(),
        }
    }

    /// Normalize a batch of records at ingestion instant `now`
    pub fn normalize_all(
        &self,
        events: &[RawEvent],
        now: DateTime<FixedOffset>,
    ) -> Vec<NormalizedEvent> {
        let normalized: Vec<NormalizedEvent> =
            events.iter().map(|event| self.normalize(event, now)).collect();

        let unscheduled = normalized.iter().filter(|e| !e.has_schedule()).count();
        let upcoming = normalized.iter().filter(|e| e.is_upcoming()).count();
        tracing::info!(
            events = normalized.len(),
            upcoming,
            unscheduled,
            "Normalized event timings"
        );

        normalized
    }

    /// Normalize a single record at ingestion instant `now`
    pub fn normalize(&self, event: &RawEvent, now: DateTime<FixedOffset>) -> NormalizedEvent {
        let id = event.id();
        let schedule = Schedule::build(
            &event.raw_sessions(),
            now.timestamp_millis(),
            self.clock.offset(),
        );
        if schedule.dropped > 0 {
            tracing::debug!(
                event_id = %id,
                dropped = schedule.dropped,
                kept = schedule.pairs.len(),
                "Event has malformed timings"
            );
        }

        let title = event
            .title(&self.lang)
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let description = event.description(&self.lang).unwrap_or_default();
        let location_text = event.location_text();
        let keywords = event.keywords(&self.lang);
        let url = event.url();

        let search_text = format!(
            "Titre: {}\nDescription: {}\nLieu: {}\nDates: {}\nMots-clés: {}",
            title,
            description,
            location_text,
            self.date_summary(&schedule),
            keywords
        );

        let full_context = format!(
            "Titre: {}\nDescription: {}\nLieu: {}\n{}\nMots-clés: {}\nLien: {}",
            title,
            description,
            location_text,
            self.date_blocks(&schedule, now.timestamp_millis()),
            keywords,
            url.as_deref().unwrap_or("non communiqué")
        );

        NormalizedEvent {
            id,
            title,
            description,
            location_text,
            keywords,
            url,
            sessions: schedule.sessions,
            future_sessions: schedule.future,
            past_sessions: schedule.past,
            start_ts: schedule.start_ts,
            end_ts: schedule.end_ts,
            search_text,
            full_context,
        }
    }

    /// One-line summary for the embedded text
    ///
    /// "du 10/06/2026 au 12/06/2026, 3 séances à venir"
    fn date_summary(&self, schedule: &Schedule) -> String {
        if schedule.is_empty() {
            return UNSPECIFIED_DATES.to_string();
        }
        let (Some(first), Some(last)) = (
            self.clock.local(schedule.start_ts),
            self.clock.local(schedule.end_ts),
        ) else {
            return UNSPECIFIED_DATES.to_string();
        };

        let span = if first.date_naive() == last.date_naive() {
            format!("le {}", format_long_date(&first))
        } else {
            format!(
                "du {} au {}",
                format_numeric_date(&first),
                format_numeric_date(&last)
            )
        };

        let status = match schedule.future.len() {
            0 => "aucune séance à venir".to_string(),
            1 => "1 séance à venir".to_string(),
            n => format!("{n} séances à venir"),
        };

        format!("{span}, {status}")
    }

    /// Upcoming block (ascending) followed by the archived block (most recent first)
    fn date_blocks(&self, schedule: &Schedule, now: Timestamp) -> String {
        if schedule.is_empty() {
            return format!("Dates: {UNSPECIFIED_DATES}");
        }

        let (upcoming, archived): (Vec<&Session>, Vec<&Session>) =
            schedule.pairs.iter().partition(|s| s.begin >= now);

        let mut out = format!("{UPCOMING_HEADER}:");
        push_lines(&mut out, upcoming.iter().map(|s| self.session_line(s)));
        out.push('\n');
        out.push_str(ARCHIVED_HEADER);
        out.push(':');
        push_lines(&mut out, archived.iter().rev().map(|s| self.session_line(s)));
        out
    }

    /// "mardi 23 décembre 2025 de 18h00 à 20h00"
    fn session_line(&self, session: &Session) -> String {
        let (Some(begin), Some(end)) = (self.clock.local(session.begin), self.clock.local(session.end))
        else {
            return UNSPECIFIED_DATES.to_string();
        };

        if begin.date_naive() == end.date_naive() {
            format!(
                "{} de {} à {}",
                format_long_date(&begin),
                format_hour(&begin),
                format_hour(&end)
            )
        } else {
            format!(
                "du {} {} au {} {}",
                format_long_date(&begin),
                format_hour(&begin),
                format_long_date(&end),
                format_hour(&end)
            )
        }
    }
}

fn push_lines(out: &mut String, lines: impl Iterator<Item = String>) {
    let mut any = false;
    for line in lines {
        out.push_str("\n- ");
        out.push_str(&line);
        any = true;
    }
    if !any {
        out.push_str(" aucune");
    }
}
