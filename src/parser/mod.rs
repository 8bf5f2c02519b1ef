//! Parsing strategies that turn raw text into parsed task results
//!
//! - `natural`: on-device parser (exactly one result per input)
//! - `remote`: external extraction service (zero to ten results)
//!
//! Both sit behind [`TaskExtractor`], so the pipeline never knows which one
//! it is talking to.

pub mod detector;
pub mod natural;
pub mod remote;

pub use detector::{DateDetector, TemporalMatch, DEFAULT_REMINDER_HOUR};
pub use natural::{NaturalLanguageParser, ParsedResult};
pub use remote::{
    CommandExtractionService, ExtractionError, ExtractionService, RemoteTaskExtractor,
    MAX_EXTRACTED_TASKS,
};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local};

/// Capability: obtain parsed results for a piece of raw text
#[async_trait]
pub trait TaskExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<Vec<ParsedResult>, ExtractionError>;
}

/// Extractor backed by [`NaturalLanguageParser`]
#[derive(Debug, Clone, Default)]
pub struct LocalExtractor {
    detector: DateDetector,
    reference: Option<DateTime<FixedOffset>>,
}

impl LocalExtractor {
    pub fn new(detector: DateDetector) -> Self {
        Self {
            detector,
            reference: None,
        }
    }

    /// Pin the reference instant instead of reading the clock
    pub fn with_reference(mut self, now: DateTime<FixedOffset>) -> Self {
        self.reference = Some(now);
        self
    }

    pub fn parse(&self, text: &str) -> ParsedResult {
        match &self.reference {
            Some(now) => NaturalLanguageParser::new(*now)
                .with_detector(self.detector)
                .parse(text),
            None => NaturalLanguageParser::new(Local::now())
                .with_detector(self.detector)
                .parse(text),
        }
    }
}

#[async_trait]
impl TaskExtractor for LocalExtractor {
    async fn extract(&self, text: &str) -> Result<Vec<ParsedResult>, ExtractionError> {
        Ok(vec![self.parse(text)])
    }
}
