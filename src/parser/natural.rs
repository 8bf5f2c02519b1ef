//! Free text → task title, reminder and labels

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::detector::DateDetector;

static LABEL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\w+)").expect("Invalid label regex pattern"));
static LABEL_TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*#\w+\s*").expect("Invalid label token regex pattern"));
static WHITESPACE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex pattern"));
static STRANDED_PUNCTUATION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([,.;:!?])").expect("Invalid punctuation regex pattern"));

/// Structured result of parsing one piece of input text.
/// Transient: consumed once to build a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedResult {
    pub title: String,
    pub reminder_at: Option<DateTime<Utc>>,
    pub labels: Vec<String>,
}

impl ParsedResult {
    pub fn new(title: impl Into<String>, reminder_at: Option<DateTime<Utc>>) -> Self {
        Self {
            title: title.into(),
            reminder_at,
            labels: Vec::new(),
        }
    }

    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

/// On-device natural language parser.
///
/// Deterministic for a given input, reference instant and zone. Never fails:
/// a missing date or missing labels is a normal outcome, and an empty title is
/// returned as-is for the caller to reject.
pub struct NaturalLanguageParser<Tz: TimeZone> {
    now: DateTime<Tz>,
    detector: DateDetector,
}

impl<Tz: TimeZone> NaturalLanguageParser<Tz> {
    pub fn new(now: DateTime<Tz>) -> Self {
        Self {
            now,
            detector: DateDetector::default(),
        }
    }

    pub fn with_detector(mut self, detector: DateDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn parse(&self, input: &str) -> ParsedResult {
        let mut working = input.to_string();
        let mut reminder_at = None;

        // Only the first phrase counts; anything later stays in the title
        if let Some(found) = self.detector.find(input, &self.now) {
            reminder_at = Some(found.at.with_timezone(&Utc));
            working.replace_range(found.start..found.end, " ");
        }

        let labels: Vec<String> = LABEL_PATTERN
            .captures_iter(&working)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
            .collect();
        let without_labels = LABEL_TOKEN_PATTERN.replace_all(&working, " ");

        ParsedResult {
            title: normalize_whitespace(&without_labels),
            reminder_at,
            labels,
        }
    }

    /// Just the reminder instant, for commands that take a bare date phrase
    pub fn parse_instant(&self, input: &str) -> Option<DateTime<Utc>> {
        self.detector
            .find(input, &self.now)
            .map(|found| found.at.with_timezone(&Utc))
    }
}

/// Collapse whitespace left behind by removed phrases and labels.
/// Separators that end up at either edge of the title are dropped.
fn normalize_whitespace(text: &str) -> String {
    let collapsed = WHITESPACE_PATTERN.replace_all(text.trim(), " ");
    let attached = STRANDED_PUNCTUATION_PATTERN.replace_all(&collapsed, "$1");
    attached
        .trim_matches(|c: char| c == ',' || c == ';' || c == ':' || c.is_whitespace())
        .to_string()
}
