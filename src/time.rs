//! Time primitives shared by ingestion and query time
//!
//! All instants are Unix timestamps in milliseconds. Calendar arithmetic
//! (day, week, month boundaries) happens in a single fixed UTC offset, the
//! catalog's wall clock, so that "tomorrow" means the same thing for the
//! normalizer and for the intent extractor.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Locale, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    Utc,
};
use std::fmt;
use std::str::FromStr;

/// Unix timestamp in milliseconds
pub type Timestamp = i64;

/// Wall clock of the catalog: "now" plus the offset used for calendar math
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    offset: FixedOffset,
}

impl Clock {
    /// Create a clock for a fixed UTC offset
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// UTC clock
    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    /// The offset used for calendar boundaries
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Current instant, expressed in the clock's offset
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    /// Convert a timestamp into a local date-time, if representable
    pub fn local(&self, ts: Timestamp) -> Option<DateTime<FixedOffset>> {
        DateTime::from_timestamp_millis(ts).map(|dt| dt.with_timezone(&self.offset))
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::utc()
    }
}

impl FromStr for Clock {
    type Err = String;

    /// Parse an offset such as `+01:00`, `-05:30` or `Z`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
            return Ok(Self::utc());
        }

        let (sign, rest) = match s.as_bytes().first() {
            Some(b'+') => (1, &s[1..]),
            Some(b'-') => (-1, &s[1..]),
            _ => return Err(format!("offset must start with '+' or '-': {s}")),
        };
        let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
        let hours: i32 = hours.parse().map_err(|_| format!("invalid hours in offset: {s}"))?;
        let minutes: i32 = minutes
            .parse()
            .map_err(|_| format!("invalid minutes in offset: {s}"))?;

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(Self::new)
            .ok_or_else(|| format!("offset out of range: {s}"))
    }
}

/// Closed time window `[start, end]`, both bounds inclusive
///
/// An open-ended window uses `Timestamp::MAX` as its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// First instant of the window (inclusive), in milliseconds
    pub start: Timestamp,
    /// Last instant of the window (inclusive), in milliseconds
    pub end: Timestamp,
}

impl TimeWindow {
    /// Create a window, returning None if `start > end`
    pub fn try_new(start: Timestamp, end: Timestamp) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Window starting at `start` with no upper bound
    pub fn unbounded_from(start: Timestamp) -> Self {
        Self {
            start,
            end: Timestamp::MAX,
        }
    }

    /// Whether the window has no upper bound
    pub fn is_open_ended(&self) -> bool {
        self.end == Timestamp::MAX
    }

    /// Check if an instant falls within this window (bounds included)
    pub fn contains(&self, ts: Timestamp) -> bool {
        ts >= self.start && ts <= self.end
    }

    /// Check if `[start, end]` shares at least one instant with this window
    pub fn overlaps(&self, start: Timestamp, end: Timestamp) -> bool {
        start <= self.end && end >= self.start
    }

    /// The whole calendar day `date` in `offset`
    pub fn day(date: NaiveDate, offset: FixedOffset) -> Self {
        let start = local_midnight(date, offset);
        let end = local_midnight(date + Duration::days(1), offset) - 1;
        Self { start, end }
    }

    /// From the first instant of `first` to the last instant of `last`
    pub fn days(first: NaiveDate, last: NaiveDate, offset: FixedOffset) -> Self {
        Self {
            start: Self::day(first, offset).start,
            end: Self::day(last, offset).end,
        }
    }

    /// The whole calendar month `month` of `year` in `offset`
    pub fn month(year: i32, month: u32, offset: FixedOffset) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let last = first_of_next_month(first)? - Duration::days(1);
        Some(Self::days(first, last, offset))
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_open_ended() {
            write!(f, "[{}, +inf)", self.start)
        } else {
            write!(f, "[{}, {}]", self.start, self.end)
        }
    }
}

/// Timestamp of 00:00:00.000 on `date` in `offset`
pub fn local_midnight(date: NaiveDate, offset: FixedOffset) -> Timestamp {
    // Millisecond arithmetic stays in range for every representable date
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
        - offset.local_minus_utc() as i64 * 1000
}

/// Timestamp of a naive wall-clock date-time interpreted in `offset`
///
/// None when shifting to UTC leaves chrono's representable range.
pub fn local_timestamp(naive: NaiveDateTime, offset: FixedOffset) -> Option<Timestamp> {
    naive
        .checked_sub_signed(Duration::seconds(offset.local_minus_utc() as i64))
        .map(|utc| utc.and_utc().timestamp_millis())
}

/// First day of the month following `date`'s month
pub fn first_of_next_month(date: NaiveDate) -> Option<NaiveDate> {
    if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    }
}

// ============================================
// French labels
// ============================================

/// "mardi 23 décembre 2025"
pub fn format_long_date(dt: &DateTime<FixedOffset>) -> String {
    dt.format_localized("%A %-d %B %Y", Locale::fr_FR).to_string()
}

/// "samedi 27/12"
pub fn format_short_day(dt: &DateTime<FixedOffset>) -> String {
    dt.format_localized("%A %d/%m", Locale::fr_FR).to_string()
}

/// "janvier 2026"
pub fn format_month_year(dt: &DateTime<FixedOffset>) -> String {
    dt.format_localized("%B %Y", Locale::fr_FR).to_string()
}

/// "23/12/2025"
pub fn format_numeric_date(dt: &DateTime<FixedOffset>) -> String {
    dt.format("%d/%m/%Y").to_string()
}

/// "18h30"
pub fn format_hour(dt: &DateTime<FixedOffset>) -> String {
    dt.format("%Hh%M").to_string()
}
