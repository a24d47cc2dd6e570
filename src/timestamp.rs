//! Calendar and instant helpers shared by the normalizer and the bucketizer.
//!
//! All "local" interpretation happens in an explicit reference timezone; no
//! function here reads the system clock.

pub mod relative;

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone};
use chrono_tz::Tz;

pub use relative::normalize;

/// Reference timezone used when nothing else is configured
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Tokyo;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Offset-less timestamps, read as local time in the reference timezone
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Timestamps with an offset that RFC 3339 parsing rejects (no seconds)
const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M%:z"];

/// Parse a strict `YYYY-MM-DD` calendar date
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

/// Parse an ISO-8601 date or timestamp into an instant in `tz`.
///
/// A bare date is local midnight. A timestamp carrying an offset (or `Z`)
/// is converted; one without an offset is taken as local time.
///
/// # Arguments
/// * `s` - Due value as stored (e.g., "2025-06-10", "2025-06-10T09:00:00+09:00")
/// * `tz` - Reference timezone for bare dates and offset-less timestamps
///
/// # Returns
/// The instant in `tz`, or None if `s` is not ISO-8601
pub fn parse_iso_instant(s: &str, tz: Tz) -> Option<DateTime<Tz>> {
    if let Some(date) = parse_iso_date(s) {
        return Some(start_of_day(date, tz));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&tz));
    }

    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.with_timezone(&tz));
        }
    }

    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .map(|naive| local_datetime(naive, tz))
}

/// True when `s` is a valid ISO-8601 calendar date or timestamp
pub fn is_iso(s: &str) -> bool {
    parse_iso_instant(s, Tz::UTC).is_some()
}

/// Calendar date of an ISO value as seen in `tz`
pub fn due_calendar_date(s: &str, tz: Tz) -> Option<NaiveDate> {
    parse_iso_date(s).or_else(|| parse_iso_instant(s, tz).map(|dt| dt.date_naive()))
}

/// Which instant a repeated wall-clock time maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fold {
    Earlier,
    Later,
}

/// Resolve a wall-clock time in `tz`, taking the earlier of two repeated
/// instants. See [`local_datetime_with`].
pub fn local_datetime(naive: NaiveDateTime, tz: Tz) -> DateTime<Tz> {
    local_datetime_with(naive, tz, Fold::Earlier)
}

/// Resolve a wall-clock time in `tz`.
///
/// A time skipped by a DST gap is pushed forward by the length of the gap,
/// so it stays on the same calendar day and never lands before the gap.
pub fn local_datetime_with(naive: NaiveDateTime, tz: Tz, fold: Fold) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earlier, later) => match fold {
            Fold::Earlier => earlier,
            Fold::Later => later,
        },
        LocalResult::None => {
            // Transitions are far more than a day apart, so the offset a day
            // earlier is the one in force just before the gap.
            let probe = naive.checked_sub_signed(Duration::days(1)).unwrap_or(naive);
            let before = tz.offset_from_utc_datetime(&probe).fix();
            let utc = naive
                .checked_sub_signed(Duration::seconds(i64::from(before.local_minus_utc())))
                .unwrap_or(naive);
            tz.from_utc_datetime(&utc)
        }
    }
}

/// 00:00:00 of `date` in `tz`
pub fn start_of_day(date: NaiveDate, tz: Tz) -> DateTime<Tz> {
    local_datetime(date.and_time(NaiveTime::MIN), tz)
}

/// 23:59:59 of `date` in `tz`, the later one when the last hour repeats
pub fn end_of_day(date: NaiveDate, tz: Tz) -> DateTime<Tz> {
    let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    local_datetime_with(date.and_time(last_second), tz, Fold::Later)
}

/// Today's date in `tz` for the given UTC instant
pub fn today_in(now: DateTime<chrono::Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Parse an IANA timezone name
pub fn parse_timezone(name: &str) -> Option<Tz> {
    name.trim().parse().ok()
}
