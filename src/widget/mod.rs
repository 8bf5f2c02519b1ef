//! Home-screen widget projection
//!
//! The widget process never writes the task list. It projects the tasks due
//! today into a cached timeline entry and rebuilds that entry when the app
//! signals a change, or when the day rolls over.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::models::{is_due_today, Task};
use crate::store::TaskStoreReader;

/// Widget kind refreshed after every successful save
pub const WIDGET_KIND: &str = "TaskifyWidget";

/// Sink for "the task list changed" signals
pub trait WidgetCenter: Send + Sync {
    fn reload_timelines(&self, kind: &str);
}

/// Signals widgets by rewriting `<dir>/<kind>.reload`.
/// The file holds the signal time and a unique token.
#[derive(Debug, Clone)]
pub struct StampWidgetCenter {
    dir: PathBuf,
}

impl StampWidgetCenter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl WidgetCenter for StampWidgetCenter {
    fn reload_timelines(&self, kind: &str) {
        let token = format!("{} {}", Utc::now().to_rfc3339(), Uuid::new_v4().simple());
        let result = fs::create_dir_all(&self.dir)
            .and_then(|_| fs::write(stamp_path(&self.dir, kind), token));
        if let Err(e) = result {
            log::warn!("Could not signal widget '{}': {}", kind, e);
        }
    }
}

/// Widgets that ignore signals
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopWidgetCenter;

impl WidgetCenter for NoopWidgetCenter {
    fn reload_timelines(&self, _kind: &str) {}
}

fn stamp_path(dir: &Path, kind: &str) -> PathBuf {
    dir.join(format!("{}.reload", kind))
}

fn timeline_path(dir: &Path, kind: &str) -> PathBuf {
    dir.join(format!("{}.timeline.json", kind))
}

/// Open tasks whose reminder falls on `now`'s calendar day, soonest first
pub fn due_today<Tz: TimeZone>(now: &DateTime<Tz>, tasks: &[Task]) -> Vec<Task> {
    let mut due: Vec<Task> = tasks
        .iter()
        .filter(|task| is_due_today(task, now))
        .cloned()
        .collect();
    due.sort_by_key(|task| task.reminder_at());
    due
}

/// One rendered widget snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub date: DateTime<Utc>,
    pub day: NaiveDate,
    pub tasks: Vec<Task>,
    /// Contents of the reload stamp this entry was built against
    #[serde(default)]
    pub token: Option<String>,
}

/// Cached timeline for one widget kind
#[derive(Debug, Clone)]
pub struct WidgetTimeline {
    dir: PathBuf,
    kind: String,
}

impl WidgetTimeline {
    pub fn new(dir: impl Into<PathBuf>, kind: &str) -> Self {
        Self {
            dir: dir.into(),
            kind: kind.to_string(),
        }
    }

    fn current_token(&self) -> Option<String> {
        fs::read_to_string(stamp_path(&self.dir, &self.kind)).ok()
    }

    fn cached(&self) -> Option<TimelineEntry> {
        let bytes = fs::read(timeline_path(&self.dir, &self.kind)).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Discarding unreadable widget cache: {}", e);
                None
            }
        }
    }

    /// Entry for `now`: the cache when it is still valid, otherwise a fresh
    /// projection of the store.
    pub fn current(&self, reader: &TaskStoreReader, now: DateTime<Local>) -> TimelineEntry {
        let token = self.current_token();
        if let Some(entry) = self.cached() {
            if entry.token == token && entry.day == now.date_naive() {
                log::debug!("Widget cache for '{}' is current", self.kind);
                return entry;
            }
        }
        self.rebuild_with_token(reader, now, token)
    }

    /// Project the store unconditionally and refresh the cache
    pub fn rebuild(&self, reader: &TaskStoreReader, now: DateTime<Local>) -> TimelineEntry {
        self.rebuild_with_token(reader, now, self.current_token())
    }

    fn rebuild_with_token(
        &self,
        reader: &TaskStoreReader,
        now: DateTime<Local>,
        token: Option<String>,
    ) -> TimelineEntry {
        let entry = TimelineEntry {
            date: now.with_timezone(&Utc),
            day: now.date_naive(),
            tasks: due_today(&now, &reader.load()),
            token,
        };
        if let Err(e) = self.write_cache(&entry) {
            log::warn!("Could not write widget cache: {}", e);
        }
        entry
    }

    fn write_cache(&self, entry: &TimelineEntry) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(timeline_path(&self.dir, &self.kind), serde_json::to_vec(entry)?)?;
        Ok(())
    }
}

/// Plain-text rendering of an entry
pub fn render_entry(entry: &TimelineEntry) -> String {
    let mut out = format!("Today ({})\n", entry.day.format("%a %b %-d"));
    if entry.tasks.is_empty() {
        out.push_str("  Nothing due today\n");
        return out;
    }
    for task in &entry.tasks {
        let time = task
            .reminder_at()
            .map(|at| at.with_timezone(&Local).format("%H:%M").to_string())
            .unwrap_or_default();
        if task.is_quick_tic {
            out.push_str(&format!("  {}  {} *\n", time, task.title));
        } else {
            out.push_str(&format!("  {}  {}\n", time, task.title));
        }
    }
    out
}
