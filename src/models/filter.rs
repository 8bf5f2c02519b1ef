use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use super::Task;

/// Maximum number of filters that can be active at once
pub const MAX_SELECTED_FILTERS: usize = 3;

/// Display filters over the task list.
/// Filters produce derived views and never reorder the stored list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskFilter {
    All,
    Upcoming,
    Completed,
    Today,
    QuickTics,
}

impl TaskFilter {
    pub const ALL_OPTIONS: [TaskFilter; 5] = [
        TaskFilter::All,
        TaskFilter::Upcoming,
        TaskFilter::Completed,
        TaskFilter::Today,
        TaskFilter::QuickTics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskFilter::All => "all",
            TaskFilter::Upcoming => "upcoming",
            TaskFilter::Completed => "completed",
            TaskFilter::Today => "today",
            TaskFilter::QuickTics => "quick-tics",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskFilter::All => "All",
            TaskFilter::Upcoming => "Upcoming",
            TaskFilter::Completed => "Completed",
            TaskFilter::Today => "Today",
            TaskFilter::QuickTics => "Quick Tics",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "all" => Some(TaskFilter::All),
            "upcoming" => Some(TaskFilter::Upcoming),
            "completed" | "done" => Some(TaskFilter::Completed),
            "today" => Some(TaskFilter::Today),
            "quick-tics" | "quicktics" | "quick" => Some(TaskFilter::QuickTics),
            _ => None,
        }
    }

    /// Apply the filter relative to `now`
    pub fn apply<'a, Tz: TimeZone>(&self, tasks: &'a [Task], now: &DateTime<Tz>) -> Vec<&'a Task> {
        match self {
            TaskFilter::All => tasks.iter().rev().filter(|t| !t.is_done()).collect(),
            TaskFilter::Upcoming => {
                let mut upcoming: Vec<&Task> = tasks
                    .iter()
                    .filter(|t| !t.is_done() && t.reminder_at().map_or(false, |at| at > *now))
                    .collect();
                upcoming.sort_by_key(|t| t.reminder_at());
                upcoming
            }
            TaskFilter::Completed => tasks.iter().filter(|t| t.is_done()).collect(),
            TaskFilter::Today => {
                let mut today: Vec<&Task> = tasks.iter().filter(|t| is_due_today(t, now)).collect();
                today.sort_by_key(|t| t.reminder_at());
                today
            }
            TaskFilter::QuickTics => tasks
                .iter()
                .filter(|t| t.is_quick_tic && !t.is_done())
                .collect(),
        }
    }
}

/// Open task whose reminder falls on `now`'s calendar day in `now`'s zone
pub fn is_due_today<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> bool {
    if task.is_done() {
        return false;
    }
    match task.reminder_at() {
        Some(at) => at.with_timezone(&now.timezone()).date_naive() == now.date_naive(),
        None => false,
    }
}

/// The set of filters offered in the list view, passed explicitly to whoever needs it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    filters: Vec<TaskFilter>,
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self {
            filters: vec![TaskFilter::All, TaskFilter::Upcoming, TaskFilter::QuickTics],
        }
    }
}

impl FilterSelection {
    /// Build a selection, dropping duplicates and anything past the cap
    pub fn new(filters: impl IntoIterator<Item = TaskFilter>) -> Self {
        let mut selected = Vec::new();
        for filter in filters {
            if selected.len() == MAX_SELECTED_FILTERS {
                break;
            }
            if !selected.contains(&filter) {
                selected.push(filter);
            }
        }
        if selected.is_empty() {
            return Self::default();
        }
        Self { filters: selected }
    }

    /// Parse a comma-separated list such as `all,today,quick-tics`
    pub fn parse(list: &str) -> Result<Self, String> {
        let mut filters = Vec::new();
        for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let filter = TaskFilter::from_str(name).ok_or_else(|| {
                format!(
                    "Unknown filter: '{}'. Valid filters: all, upcoming, completed, today, quick-tics",
                    name
                )
            })?;
            filters.push(filter);
        }
        Ok(Self::new(filters))
    }

    pub fn filters(&self) -> &[TaskFilter] {
        &self.filters
    }

    /// Filter shown when none is requested explicitly
    pub fn primary(&self) -> TaskFilter {
        self.filters[0]
    }

    pub fn contains(&self, filter: TaskFilter) -> bool {
        self.filters.contains(&filter)
    }
}
