use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::borrow::Cow;
use tracing::debug;

use super::is_iso;

/// How a term is recognised
#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    /// Exact match against one of the listed terms
    OneOf(&'static [&'static str]),
    /// A weekday name, see [`parse_weekday`]
    Weekday,
}

/// How a recognised term becomes a date
#[derive(Debug, Clone, Copy)]
pub enum Resolution {
    /// `today` plus a fixed number of days
    Offset(u64),
    /// First date on or after `today` falling on the named weekday
    NextWeekday,
}

/// Relative terms in match order; the first matching rule wins
pub static RELATIVE_RULES: &[(Matcher, Resolution)] = &[
    (Matcher::OneOf(&["今日", "本日", "きょう"]), Resolution::Offset(0)),
    (Matcher::OneOf(&["明日", "あした"]), Resolution::Offset(1)),
    (Matcher::OneOf(&["あさって", "明後日"]), Resolution::Offset(2)),
    (Matcher::Weekday, Resolution::NextWeekday),
];

const WEEKDAY_KANJI: [(char, Weekday); 7] = [
    ('月', Weekday::Mon),
    ('火', Weekday::Tue),
    ('水', Weekday::Wed),
    ('木', Weekday::Thu),
    ('金', Weekday::Fri),
    ('土', Weekday::Sat),
    ('日', Weekday::Sun),
];

const WEEKDAY_ENGLISH: [(&str, &str, Weekday); 7] = [
    ("monday", "mon", Weekday::Mon),
    ("tuesday", "tue", Weekday::Tue),
    ("wednesday", "wed", Weekday::Wed),
    ("thursday", "thu", Weekday::Thu),
    ("friday", "fri", Weekday::Fri),
    ("saturday", "sat", Weekday::Sat),
    ("sunday", "sun", Weekday::Sun),
];

/// Normalize a raw due expression produced by the extraction step.
///
/// ISO dates and timestamps pass through untouched (borrowed). Known
/// relative terms resolve against `today` into an owned `YYYY-MM-DD`.
///
/// # Arguments
/// * `value` - Raw due expression (e.g., "明日", "金曜", "2025-06-10"), if any
/// * `today` - Reference date in the reference calendar
///
/// # Returns
/// The resolved date string, or None for empty, unknown or out-of-range
/// terms; callers treat that as "no due date"
pub fn normalize(value: Option<&str>, today: NaiveDate) -> Option<Cow<'_, str>> {
    let value = value.filter(|v| !v.is_empty())?;

    if is_iso(value) {
        return Some(Cow::Borrowed(value));
    }

    match resolve_relative(value, today) {
        Some(date) => Some(Cow::Owned(date.format("%Y-%m-%d").to_string())),
        None => {
            debug!(term = value, "unresolved due expression");
            None
        }
    }
}

/// Resolve a relative term against `today` using [`RELATIVE_RULES`]
pub fn resolve_relative(term: &str, today: NaiveDate) -> Option<NaiveDate> {
    let term = term.trim();

    RELATIVE_RULES.iter().find_map(|(matcher, resolution)| {
        let weekday = match matcher {
            Matcher::OneOf(terms) if terms.iter().any(|t| *t == term) => None,
            Matcher::OneOf(_) => return None,
            Matcher::Weekday => Some(parse_weekday(term)?),
        };
        match resolution {
            Resolution::Offset(days) => today.checked_add_days(Days::new(*days)),
            Resolution::NextWeekday => weekday.and_then(|target| next_weekday_on_or_after(today, target)),
        }
    })
}

/// Recognise a weekday term.
///
/// Accepted forms: `金`, `金曜`, `金曜日`, the same wrapped in `()` or `（）`,
/// and English full or three-letter names in any case.
pub fn parse_weekday(term: &str) -> Option<Weekday> {
    let term = term.trim();
    let inner = term
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .or_else(|| term.strip_prefix('（').and_then(|t| t.strip_suffix('）')))
        .unwrap_or(term);
    let stem = inner
        .strip_suffix("曜日")
        .or_else(|| inner.strip_suffix('曜'))
        .unwrap_or(inner);

    let mut chars = stem.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if let Some((_, weekday)) = WEEKDAY_KANJI.iter().find(|(k, _)| *k == c) {
            return Some(*weekday);
        }
    }

    let lower = inner.to_ascii_lowercase();
    WEEKDAY_ENGLISH
        .iter()
        .find(|(full, short, _)| lower == *full || lower == *short)
        .map(|(_, _, weekday)| *weekday)
}

/// First date in `today..today+6` whose weekday is `target`, or None past
/// the end of the calendar
pub fn next_weekday_on_or_after(today: NaiveDate, target: Weekday) -> Option<NaiveDate> {
    (0..7)
        .filter_map(|i| today.checked_add_days(Days::new(i)))
        .find(|d| d.weekday() == target)
}
