//! Temporal phrase detection
//!
//! Finds English date/time expressions inside free text ("tomorrow at 6pm",
//! "next friday", "in 20 minutes", "May 5th") and resolves them against a
//! reference instant. Several independent patterns are run over the text; the
//! leftmost candidate wins, ties going to the longest. Candidates that do not
//! resolve to a real instant (Feb 30, 25pm) are skipped.

use chrono::{
    DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
};
use regex::{Captures, Regex};
use std::cmp::Reverse;
use std::sync::LazyLock;

/// Hour used when a phrase names a day but no time
pub const DEFAULT_REMINDER_HOUR: u32 = 9;

const WEEKDAY: &str = r"monday|tuesday|wednesday|thursday|friday|saturday|sunday";
const MONTH: &str = r"january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec";
const COUNT: &str = r"\d+|a\s+couple\s+of|an|a|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve";

fn date_fragment() -> String {
    format!(
        r"(?:(?P<rel>day\s+after\s+tomorrow|today|tonight|tomorrow|tmrw)\b|(?:(?P<wdmod>this|next)\s+)?(?P<wd>{WEEKDAY})\b|(?P<mdm>{MONTH})\.?\s+(?P<mdd>\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(?P<mdy>\d{{4}})\b)?|(?P<dmd>\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?(?P<dmm>{MONTH})\b(?:,?\s+(?P<dmy>\d{{4}})\b)?|(?P<iso>\d{{4}}-\d{{2}}-\d{{2}})\b)"
    )
}

const TIME: &str = r"(?:(?P<h12>\d{1,2})(?::(?P<m12>\d{2}))?\s*(?P<ampm>[ap])\.?m\b\.?|(?P<h24>\d{1,2}):(?P<m24>\d{2})\b|(?P<named>noon|midnight)\b)";

const PART: &str = r"(?P<part>morning|afternoon|evening|night)\b";

/// Which resolution rule a pattern feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatternKind {
    /// Any combination of a date, a time and a part of day
    Calendar,
    /// "in 3 days", "in an hour"
    Relative,
    /// "next week", "next month"
    NextPeriod,
}

struct Patterns {
    all: Vec<(PatternKind, Regex)>,
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| {
    let date = date_fragment();
    let sources = [
        // date first: "tomorrow at 6pm", "on friday evening", "tomorrow morning at 7am"
        (
            PatternKind::Calendar,
            format!(r"(?i)\b(?:(?:on|by)\s+)?{date}(?:\s+(?:in\s+the\s+)?{PART})?(?:\s+(?:at\s+|@\s*)?{TIME})?"),
        ),
        // time first: "at 6pm", "6pm tomorrow", "7am tomorrow morning"
        (
            PatternKind::Calendar,
            format!(r"(?i)(?:\b(?:at|by)\s+|@\s*)?\b{TIME}(?:\s+(?:on\s+)?{date}(?:\s+(?:in\s+the\s+)?{PART})?)?"),
        ),
        // part of day alone: "this evening", "in the morning"
        (
            PatternKind::Calendar,
            format!(r"(?i)\b(?:this|in\s+the)\s+{PART}"),
        ),
        (
            PatternKind::Relative,
            format!(r"(?i)\bin\s+(?P<count>{COUNT})\s+(?P<unit>minutes?|mins?|hours?|hrs?|days?|weeks?|months?)\b"),
        ),
        (
            PatternKind::NextPeriod,
            r"(?i)\bnext\s+(?P<period>week|month)\b".to_string(),
        ),
    ];
    let all = sources
        .into_iter()
        .map(|(kind, source)| {
            (kind, Regex::new(&source).expect("Invalid temporal phrase pattern"))
        })
        .collect();
    Patterns { all }
});

/// A detected temporal expression
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalMatch<Tz: TimeZone> {
    /// Byte offset of the match in the scanned text
    pub start: usize,
    /// Byte offset one past the match
    pub end: usize,
    /// Matched text, as written
    pub text: String,
    /// Resolved instant
    pub at: DateTime<Tz>,
}

/// Date/time phrase detector
#[derive(Debug, Clone, Copy)]
pub struct DateDetector {
    default_hour: u32,
}

impl Default for DateDetector {
    fn default() -> Self {
        Self::new(DEFAULT_REMINDER_HOUR)
    }
}

impl DateDetector {
    /// Create a detector; hours outside 0..=23 fall back to the default
    pub fn new(default_hour: u32) -> Self {
        let default_hour = if default_hour < 24 {
            default_hour
        } else {
            DEFAULT_REMINDER_HOUR
        };
        Self { default_hour }
    }

    pub fn default_hour(&self) -> u32 {
        self.default_hour
    }

    /// Find the first (leftmost) resolvable temporal expression in `text`
    pub fn find<Tz: TimeZone>(&self, text: &str, now: &DateTime<Tz>) -> Option<TemporalMatch<Tz>> {
        let mut candidates: Vec<(PatternKind, Captures<'_>)> = Vec::new();
        for (kind, regex) in &PATTERNS.all {
            for caps in regex.captures_iter(text) {
                candidates.push((*kind, caps));
            }
        }
        candidates.sort_by_key(|(_, caps)| {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            (whole.start, Reverse(whole.end))
        });

        for (kind, caps) in candidates {
            let Some(whole) = caps.get(0) else { continue };
            // "#tomorrow" is a label, not a date
            if text[..whole.start()].ends_with('#') {
                continue;
            }
            let resolved = match kind {
                PatternKind::Calendar => self.resolve_calendar(&caps, now),
                PatternKind::Relative => resolve_relative(&caps, now),
                PatternKind::NextPeriod => self.resolve_next_period(&caps, now),
            };
            if let Some(at) = resolved {
                return Some(TemporalMatch {
                    start: whole.start(),
                    end: whole.end(),
                    text: whole.as_str().to_string(),
                    at,
                });
            }
        }
        None
    }

    fn resolve_calendar<Tz: TimeZone>(&self, caps: &Captures<'_>, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let today = now.date_naive();
        let date = resolve_date(caps, today);
        let time = resolve_time(caps);
        let part = caps.name("part").map(|m| part_of_day_hour(m.as_str()));

        let naive = match (date, time) {
            (Some((date, implied)), time) => {
                let time = match (time, part, implied) {
                    (Some(Ok(time)), _, _) => time,
                    (Some(Err(())), _, _) => return None,
                    (None, Some(hour), _) | (None, None, Some(hour)) => hms(hour)?,
                    (None, None, None) => hms(self.default_hour)?,
                };
                date.and_time(time)
            }
            (None, Some(time)) => {
                let time = time.ok()?;
                // A bare time that already passed today means tomorrow
                let candidate = today.and_time(time);
                if candidate <= now.naive_local() {
                    today.succ_opt()?.and_time(time)
                } else {
                    candidate
                }
            }
            (None, None) => today.and_time(hms(part?)?),
        };
        localize(&now.timezone(), naive)
    }

    fn resolve_next_period<Tz: TimeZone>(&self, caps: &Captures<'_>, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let today = now.date_naive();
        let date = match caps.name("period")?.as_str().to_lowercase().as_str() {
            "week" => today.checked_add_signed(Duration::days(7))?,
            "month" => today.checked_add_months(Months::new(1))?,
            _ => return None,
        };
        localize(&now.timezone(), date.and_time(hms(self.default_hour)?))
    }
}

/// Resolve the date part of a calendar match.
/// Returns the date plus the hour the phrase implies on its own ("tonight").
/// `Some(Err)`-style failures collapse to `None`, which rejects the candidate.
fn resolve_date(caps: &Captures<'_>, today: NaiveDate) -> Option<(NaiveDate, Option<u32>)> {
    if let Some(rel) = caps.name("rel") {
        let rel = rel.as_str().to_lowercase();
        return match rel.as_str() {
            "today" => Some((today, None)),
            "tonight" => Some((today, Some(20))),
            "tomorrow" | "tmrw" => Some((today.succ_opt()?, None)),
            _ => Some((today.checked_add_signed(Duration::days(2))?, None)),
        };
    }

    if let Some(wd) = caps.name("wd") {
        let target = weekday_index(wd.as_str())?;
        let current = today.weekday().num_days_from_monday();
        let mut ahead = (target + 7 - current) % 7;
        let is_next = caps
            .name("wdmod")
            .map_or(false, |m| m.as_str().eq_ignore_ascii_case("next"));
        if is_next && ahead == 0 {
            ahead = 7;
        }
        return Some((today.checked_add_signed(Duration::days(i64::from(ahead)))?, None));
    }

    if let (Some(month), Some(day)) = (caps.name("mdm"), caps.name("mdd")) {
        let date = month_day(month.as_str(), day.as_str(), caps.name("mdy").map(|m| m.as_str()), today)?;
        return Some((date, None));
    }

    if let (Some(day), Some(month)) = (caps.name("dmd"), caps.name("dmm")) {
        let date = month_day(month.as_str(), day.as_str(), caps.name("dmy").map(|m| m.as_str()), today)?;
        return Some((date, None));
    }

    if let Some(iso) = caps.name("iso") {
        return NaiveDate::parse_from_str(iso.as_str(), "%Y-%m-%d")
            .ok()
            .map(|date| (date, None));
    }

    None
}

/// Resolve the time part of a calendar match.
/// `None` means no time was written; `Some(Err)` means an impossible one.
fn resolve_time(caps: &Captures<'_>) -> Option<Result<NaiveTime, ()>> {
    if let Some(hour) = caps.name("h12") {
        let hour: u32 = hour.as_str().parse().ok()?;
        let minute: u32 = match caps.name("m12") {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        let pm = caps
            .name("ampm")
            .map_or(false, |m| m.as_str().eq_ignore_ascii_case("p"));
        if hour == 0 || hour > 12 {
            return Some(Err(()));
        }
        let hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
        return Some(NaiveTime::from_hms_opt(hour, minute, 0).ok_or(()));
    }

    if let (Some(hour), Some(minute)) = (caps.name("h24"), caps.name("m24")) {
        let hour: u32 = hour.as_str().parse().ok()?;
        let minute: u32 = minute.as_str().parse().ok()?;
        return Some(NaiveTime::from_hms_opt(hour, minute, 0).ok_or(()));
    }

    if let Some(named) = caps.name("named") {
        let hour = if named.as_str().eq_ignore_ascii_case("noon") { 12 } else { 0 };
        return Some(NaiveTime::from_hms_opt(hour, 0, 0).ok_or(()));
    }

    None
}

fn resolve_relative<Tz: TimeZone>(caps: &Captures<'_>, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let count = count_value(caps.name("count")?.as_str())?;
    let unit = caps.name("unit")?.as_str().to_lowercase();
    let now = now.clone();
    if unit.starts_with("min") {
        now.checked_add_signed(Duration::minutes(count))
    } else if unit.starts_with('h') {
        now.checked_add_signed(Duration::hours(count))
    } else if unit.starts_with('d') {
        now.checked_add_signed(Duration::days(count))
    } else if unit.starts_with('w') {
        now.checked_add_signed(Duration::weeks(count))
    } else {
        now.checked_add_months(Months::new(u32::try_from(count).ok()?))
    }
}

fn count_value(word: &str) -> Option<i64> {
    let word = word.to_lowercase();
    let value = match word.as_str() {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        w if w.starts_with('a') => 2, // "a couple of"
        digits => digits.parse().ok()?,
    };
    // Reject absurd spans instead of overflowing
    if (1..=10_000).contains(&value) {
        Some(value)
    } else {
        None
    }
}

fn month_day(month: &str, day: &str, year: Option<&str>, today: NaiveDate) -> Option<NaiveDate> {
    let month = month_index(month)?;
    let day: u32 = day.parse().ok()?;
    match year {
        Some(year) => NaiveDate::from_ymd_opt(year.parse().ok()?, month, day),
        // Next occurrence on or after today; Feb 29 can be up to 8 years out
        None => (today.year()..=today.year() + 8)
            .filter_map(|year| NaiveDate::from_ymd_opt(year, month, day))
            .find(|date| *date >= today),
    }
}

fn month_index(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    let index = match lower.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(index)
}

/// Monday = 0
fn weekday_index(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    let index = match lower.get(..3)? {
        "mon" => 0,
        "tue" => 1,
        "wed" => 2,
        "thu" => 3,
        "fri" => 4,
        "sat" => 5,
        "sun" => 6,
        _ => return None,
    };
    Some(index)
}

fn part_of_day_hour(part: &str) -> u32 {
    match part.to_lowercase().as_str() {
        "morning" => 9,
        "afternoon" => 15,
        "evening" => 18,
        _ => 20,
    }
}

fn hms(hour: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(hour, 0, 0)
}

/// Map a wall-clock time into `tz`.
/// Ambiguous times take the earlier instant; times inside a DST gap move forward an hour.
pub fn localize<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&naive).earliest().or_else(|| {
        let shifted = naive.checked_add_signed(Duration::hours(1))?;
        tz.from_local_datetime(&shifted).earliest()
    })
}
