//! Temporal Intent Extractor
//!
//! Maps a question and the current instant to exactly one `IntentWindow`.
//! Markers are tried in a fixed order and the first match wins:
//!
//! ```text
//! greeting > tomorrow > this weekend > next month > summer > named month > any future
//! ```

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

use crate::time::{
    first_of_next_month, format_long_date, format_month_year, format_short_day, local_midnight,
    TimeWindow,
};

/// Display label of the open-ended default window
pub const ANY_FUTURE_DISPLAY: &str = "les dates à venir";

/// Whole-query greetings, compared after trimming punctuation
const GREETINGS: &[&str] = &[
    "bonjour",
    "bonsoir",
    "salut",
    "coucou",
    "hello",
    "hi",
    "hey",
    "yo",
    "merci",
    "merci beaucoup",
    "bonjour à tous",
    "salut à tous",
    "bonne journée",
    "bonne soirée",
    "au revoir",
    "ça va",
    "ca va",
    "good morning",
    "good evening",
    "thanks",
    "thank you",
];

// =============================================================================
// Compiled markers
// =============================================================================

struct Markers {
    tomorrow: Regex,
    weekend: Regex,
    next_month: Regex,
    summer: Regex,
    /// "a été", "ont été": past participle of être, not the season
    participle: Regex,
    month: Regex,
}

static MARKERS: LazyLock<Markers> = LazyLock::new(|| Markers {
    tomorrow: Regex::new(r"\b(?:demain|tomorrow)\b").expect("Invalid tomorrow regex"),
    weekend: Regex::new(
        r"\b(?:ce\s+week[-\s]?end|ce\s+we|cette\s+fin\s+de\s+semaine|this\s+week[-\s]?end)\b",
    )
    .expect("Invalid weekend regex"),
    next_month: Regex::new(r"\b(?:mois\s+prochain|next\s+month)\b")
        .expect("Invalid next month regex"),
    summer: Regex::new(r"\b(?:été|summer)\b").expect("Invalid summer regex"),
    participle: Regex::new(
        r"\b(?:a|ai|as|avons|avez|ont|avait|avaient|aura|auront|aurait|avoir)\s+été\b",
    )
    .expect("Invalid participle regex"),
    month: Regex::new(concat!(
        r"\b(janvier|février|fevrier|mars|avril|mai|juin|juillet|août|aout|septembre|",
        r"octobre|novembre|décembre|decembre|january|february|march|april|may|june|july|",
        r"august|september|october|november|december)\b"
    ))
    .expect("Invalid month regex"),
});

fn month_number(name: &str) -> Option<u32> {
    let number = match name {
        "janvier" | "january" => 1,
        "février" | "fevrier" | "february" => 2,
        "mars" | "march" => 3,
        "avril" | "april" => 4,
        "mai" | "may" => 5,
        "juin" | "june" => 6,
        "juillet" | "july" => 7,
        "août" | "aout" | "august" => 8,
        "septembre" | "september" => 9,
        "octobre" | "october" => 10,
        "novembre" | "november" => 11,
        "décembre" | "decembre" | "december" => 12,
        _ => return None,
    };
    Some(number)
}

// =============================================================================
// Types
// =============================================================================

/// Which kind of period a question asks about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Greeting,
    Day,
    Weekend,
    Month,
    Season,
    SpecificMonth,
    AnyFuture,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::Greeting => "greeting",
            IntentKind::Day => "day",
            IntentKind::Weekend => "weekend",
            IntentKind::Month => "month",
            IntentKind::Season => "season",
            IntentKind::SpecificMonth => "specific_month",
            IntentKind::AnyFuture => "any_future",
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The period a question refers to
///
/// Every kind except `Greeting` carries bounds and a French display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentWindow {
    pub kind: IntentKind,
    pub bounds: Option<TimeWindow>,
    pub display: String,
}

impl IntentWindow {
    pub fn greeting() -> Self {
        Self {
            kind: IntentKind::Greeting,
            bounds: None,
            display: String::new(),
        }
    }

    pub fn new(kind: IntentKind, bounds: TimeWindow, display: impl Into<String>) -> Self {
        Self {
            kind,
            bounds: Some(bounds),
            display: display.into(),
        }
    }

    /// Open-ended window starting at `now`
    pub fn any_future(now: &DateTime<FixedOffset>) -> Self {
        Self::new(
            IntentKind::AnyFuture,
            TimeWindow::unbounded_from(now.timestamp_millis()),
            ANY_FUTURE_DISPLAY,
        )
    }

    pub fn is_greeting(&self) -> bool {
        self.kind == IntentKind::Greeting
    }
}

// =============================================================================
// Extraction
// =============================================================================

/// Resolve the period `query` asks about, relative to `now`
///
/// Calendar boundaries are computed in `now`'s offset.
pub fn extract_intent(query: &str, now: DateTime<FixedOffset>) -> IntentWindow {
    let query = query.trim().to_lowercase();
    let markers = &*MARKERS;

    if is_greeting(&query) {
        return IntentWindow::greeting();
    }

    let resolved = if markers.tomorrow.is_match(&query) {
        tomorrow(&now)
    } else if markers.weekend.is_match(&query) {
        this_weekend(&now)
    } else if markers.next_month.is_match(&query) {
        next_month(&now)
    } else if markers.summer.is_match(&query) && !markers.participle.is_match(&query) {
        summer(&now)
    } else if let Some(name) = markers.month.captures(&query).and_then(|c| c.get(1)) {
        month_number(name.as_str()).and_then(|month| named_month(&now, month))
    } else {
        None
    };

    let intent = resolved.unwrap_or_else(|| IntentWindow::any_future(&now));
    tracing::debug!(kind = %intent.kind, display = %intent.display, "Extracted intent");
    intent
}

/// A greeting is a whole-query match against the vocabulary, or a lone word
fn is_greeting(query: &str) -> bool {
    let trimmed = query.trim_matches(|c: char| !c.is_alphanumeric());
    let words: Vec<&str> = trimmed.split_whitespace().collect();

    if words.len() <= 1 {
        return true;
    }
    let normalized = words.join(" ");
    GREETINGS.contains(&normalized.as_str())
}

fn tomorrow(now: &DateTime<FixedOffset>) -> Option<IntentWindow> {
    let date = now.date_naive() + Duration::days(1);
    let label = format_long_date(&at_midnight(date, *now.offset())?);
    Some(IntentWindow::new(
        IntentKind::Day,
        TimeWindow::day(date, *now.offset()),
        label,
    ))
}

/// Saturday and Sunday of the current week, never rolled forward
fn this_weekend(now: &DateTime<FixedOffset>) -> Option<IntentWindow> {
    let offset = *now.offset();
    let weekday = now.weekday().num_days_from_monday() as i64;
    let saturday = now.date_naive() + Duration::days(5 - weekday);
    let sunday = saturday + Duration::days(1);

    let label = format!(
        "{} et {}",
        format_short_day(&at_midnight(saturday, offset)?),
        format_short_day(&at_midnight(sunday, offset)?)
    );
    Some(IntentWindow::new(
        IntentKind::Weekend,
        TimeWindow::days(saturday, sunday, offset),
        label,
    ))
}

fn next_month(now: &DateTime<FixedOffset>) -> Option<IntentWindow> {
    let first = first_of_next_month(now.date_naive())?;
    month_window(IntentKind::Month, first, *now.offset())
}

/// June 21 to September 21, next year's once September is over
fn summer(now: &DateTime<FixedOffset>) -> Option<IntentWindow> {
    let year = if now.month() > 9 { now.year() + 1 } else { now.year() };
    let first = NaiveDate::from_ymd_opt(year, 6, 21)?;
    let last = NaiveDate::from_ymd_opt(year, 9, 21)?;

    Some(IntentWindow::new(
        IntentKind::Season,
        TimeWindow::days(first, last, *now.offset()),
        format!("l'été {year}"),
    ))
}

/// The named month this year, or next year if it is already behind us
fn named_month(now: &DateTime<FixedOffset>, month: u32) -> Option<IntentWindow> {
    let year = if month < now.month() { now.year() + 1 } else { now.year() };
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    month_window(IntentKind::SpecificMonth, first, *now.offset())
}

fn month_window(kind: IntentKind, first: NaiveDate, offset: FixedOffset) -> Option<IntentWindow> {
    let bounds = TimeWindow::month(first.year(), first.month(), offset)?;
    let label = format_month_year(&at_midnight(first, offset)?);
    Some(IntentWindow::new(kind, bounds, label))
}

fn at_midnight(date: NaiveDate, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    DateTime::from_timestamp_millis(local_midnight(date, offset)).map(|dt| dt.with_timezone(&offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{IsoWeek, TimeZone, Timelike};

    fn paris() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<FixedOffset> {
        paris().with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn local(ts: i64) -> DateTime<FixedOffset> {
        DateTime::from_timestamp_millis(ts).unwrap().with_timezone(&paris())
    }

    fn bounds(intent: &IntentWindow) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
        let window = intent.bounds.unwrap();
        (local(window.start), local(window.end))
    }

    #[test]
    fn test_greetings() {
        let now = at(2025, 12, 22, 10);
        for query in ["Bonjour !", "salut", "  Hello...", "merci beaucoup", "jazz", "?"] {
            let intent = extract_intent(query, now);
            assert!(intent.is_greeting(), "{query}");
            assert!(intent.bounds.is_none());
        }
        assert!(!extract_intent("bonjour, que faire demain ?", now).is_greeting());
    }

    #[test]
    fn test_tomorrow_is_one_full_day() {
        let intent = extract_intent("Que faire demain ?", at(2025, 12, 22, 15));
        let (start, end) = bounds(&intent);

        assert_eq!(intent.kind, IntentKind::Day);
        assert_eq!(intent.display, "mardi 23 décembre 2025");
        assert_eq!((start.day(), start.hour(), start.minute()), (23, 0, 0));
        assert_eq!((end.day(), end.hour(), end.minute(), end.second()), (23, 23, 59, 59));
        assert_eq!(end.timestamp_millis() - start.timestamp_millis(), 86_400_000 - 1);
    }

    #[test]
    fn test_tomorrow_wins_over_weekend() {
        let intent = extract_intent("demain ou ce week-end ?", at(2025, 12, 22, 10));
        assert_eq!(intent.kind, IntentKind::Day);
    }

    #[test]
    fn test_weekend_on_monday() {
        let intent = extract_intent("Que faire ce week-end ?", at(2025, 12, 22, 10));
        let (saturday, sunday) = bounds(&intent);

        assert_eq!(intent.kind, IntentKind::Weekend);
        assert_eq!(intent.display, "samedi 27/12 et dimanche 28/12");
        assert_eq!((saturday.day(), saturday.hour()), (27, 0));
        assert_eq!((sunday.day(), sunday.hour(), sunday.minute()), (28, 23, 59));
    }

    #[test]
    fn test_weekend_spellings() {
        for query in [
            "concerts ce week-end",
            "concerts ce weekend",
            "concerts ce week end",
            "concerts this week end",
            "concerts cette fin de semaine",
        ] {
            let intent = extract_intent(query, at(2025, 12, 22, 10));
            assert_eq!(intent.kind, IntentKind::Weekend, "{query}");
        }
    }

    #[test]
    fn test_weekend_on_saturday_and_sunday() {
        for day in [27, 28] {
            let intent = extract_intent("this weekend", at(2025, 12, day, 10));
            let (saturday, sunday) = bounds(&intent);
            assert_eq!(saturday.day(), 27);
            assert_eq!(sunday.day(), 28);
        }
    }

    #[test]
    fn test_weekend_stays_in_iso_week_on_weekdays() {
        for day in 22..=26 {
            let now = at(2025, 12, day, 9);
            let intent = extract_intent("ce weekend", now);
            let (saturday, sunday) = bounds(&intent);
            let week: IsoWeek = now.iso_week();
            assert_eq!(saturday.iso_week(), week);
            assert_eq!(sunday.iso_week(), week);
        }
    }

    #[test]
    fn test_next_month_wraps_year() {
        let intent = extract_intent("des idées pour le mois prochain", at(2025, 12, 22, 10));
        let (start, end) = bounds(&intent);

        assert_eq!(intent.kind, IntentKind::Month);
        assert_eq!(intent.display, "janvier 2026");
        assert_eq!((start.year(), start.month(), start.day()), (2026, 1, 1));
        assert_eq!((end.month(), end.day(), end.hour()), (1, 31, 23));
    }

    #[test]
    fn test_summer() {
        let intent = extract_intent("Festivals cet été ?", at(2025, 3, 10, 10));
        let (start, end) = bounds(&intent);

        assert_eq!(intent.kind, IntentKind::Season);
        assert_eq!(intent.display, "l'été 2025");
        assert_eq!((start.month(), start.day()), (6, 21));
        assert_eq!((end.month(), end.day(), end.hour()), (9, 21, 23));

        let autumn = extract_intent("summer concerts", at(2025, 10, 1, 10));
        assert_eq!(autumn.display, "l'été 2026");
    }

    #[test]
    fn test_participle_is_not_summer() {
        let intent = extract_intent("le concert a été annulé ?", at(2025, 3, 10, 10));
        assert_eq!(intent.kind, IntentKind::AnyFuture);
    }

    #[test]
    fn test_named_month() {
        let now = at(2025, 12, 22, 10);

        let february = extract_intent("Expositions en février ?", now);
        let (start, _) = bounds(&february);
        assert_eq!(february.kind, IntentKind::SpecificMonth);
        assert_eq!(february.display, "février 2026");
        assert_eq!((start.year(), start.month()), (2026, 2));

        let december = extract_intent("concerts in december", now);
        assert_eq!(december.display, "décembre 2025");

        let unaccented = extract_intent("sorties en aout", now);
        assert_eq!(unaccented.display, "août 2026");
    }

    #[test]
    fn test_month_needs_word_boundary() {
        let intent = extract_intent("une maison hantée", at(2025, 12, 22, 10));
        assert_eq!(intent.kind, IntentKind::AnyFuture);
    }

    #[test]
    fn test_default_any_future() {
        let now = at(2025, 12, 22, 10);
        let intent = extract_intent("Un concert de jazz ?", now);
        let window = intent.bounds.unwrap();

        assert_eq!(intent.kind, IntentKind::AnyFuture);
        assert_eq!(intent.display, ANY_FUTURE_DISPLAY);
        assert_eq!(window.start, now.timestamp_millis());
        assert!(window.is_open_ended());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(IntentKind::SpecificMonth.to_string(), "specific_month");
        assert_eq!(
            serde_json::to_string(&IntentKind::AnyFuture).unwrap(),
            "\"any_future\""
        );
    }
}
