// Output formatting utilities

use chrono::{DateTime, Local, TimeZone, Utc};
use std::io::IsTerminal;

use crate::models::{ReminderState, Task, TaskFilter, FilterSelection};
use crate::pipeline::ReminderWarning;
use crate::reminder::DueNotification;

// ANSI escape codes for terminal formatting
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_DIM: &str = "\x1b[2m";
const ANSI_RESET: &str = "\x1b[0m";

const ID_WIDTH: usize = 8;
const STATE_WIDTH: usize = 3;
const REMINDER_WIDTH: usize = 18;
const MIN_TITLE_WIDTH: usize = 12;

/// Check if stdout is a terminal (TTY)
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width dynamically
///
/// Uses the `terminal_size` crate, with fallback to the COLUMNS environment
/// variable and a sensible default.
pub fn get_terminal_width() -> usize {
    if let Some((terminal_size::Width(w), _)) = terminal_size::terminal_size() {
        if w > 0 {
            return w as usize;
        }
    }

    if let Ok(cols) = std::env::var("COLUMNS") {
        if let Ok(width) = cols.parse::<usize>() {
            if width > 0 && width < 10000 {
                return width;
            }
        }
    }

    120
}

fn style_if_tty(text: &str, style: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", style, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

fn pad(text: &str, width: usize) -> String {
    format!("{}{}", text, " ".repeat(width.saturating_sub(text.chars().count())))
}

/// Reminder time relative to `now`: "today 18:00", "tomorrow 09:00",
/// "Mon May 6 09:00", or a full date further out.
pub fn format_reminder<Tz: TimeZone>(at: DateTime<Utc>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let local = at.with_timezone(&now.timezone());
    let days = (local.date_naive() - now.date_naive()).num_days();
    let time = local.format("%H:%M");
    match days {
        0 => format!("today {}", time),
        1 => format!("tomorrow {}", time),
        -1 => format!("yesterday {}", time),
        2..=6 => format!("{} {}", local.format("%a %b %-d"), time),
        _ => local.format("%Y-%m-%d %H:%M").to_string(),
    }
}

fn reminder_cell<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match task.reminder_state() {
        ReminderState::NoReminder => String::new(),
        ReminderState::Unscheduled(at) => format!("{} !", format_reminder(at, now)),
        ReminderState::Pending(at, _) => format_reminder(at, now),
    }
}

fn state_cell(task: &Task) -> &'static str {
    match (task.is_done(), task.is_quick_tic) {
        (true, _) => "[x]",
        (false, true) => "[*]",
        (false, false) => "[ ]",
    }
}

/// Segmented header: the offered filters, the active one bracketed
pub fn format_filter_bar(selection: &FilterSelection, active: TaskFilter) -> String {
    let mut filters: Vec<TaskFilter> = selection.filters().to_vec();
    if !selection.contains(active) {
        filters.push(active);
    }
    filters
        .iter()
        .map(|filter| {
            if *filter == active {
                format!("[{}]", filter.label())
            } else {
                filter.label().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// Format a list of tasks as a table sized to the terminal
pub fn format_task_list_table<Tz: TimeZone>(
    tasks: &[&Task],
    now: &DateTime<Tz>,
    width: usize,
    is_tty: bool,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    if tasks.is_empty() {
        return "No tasks.\n".to_string();
    }

    let fixed = ID_WIDTH + STATE_WIDTH + REMINDER_WIDTH + 3;
    let title_width = width.saturating_sub(fixed).max(MIN_TITLE_WIDTH);

    let mut output = String::new();
    let header = format!(
        "{} {} {} {}",
        pad("ID", ID_WIDTH),
        pad("", STATE_WIDTH),
        pad("Title", title_width),
        "Reminder"
    );
    output.push_str(&style_if_tty(header.trim_end(), ANSI_BOLD, is_tty));
    output.push('\n');

    for task in tasks {
        let mut title = task.title.clone();
        if !task.labels.is_empty() {
            let labels: Vec<String> = task.labels.iter().map(|l| format!("#{}", l)).collect();
            title = format!("{} {}", title, labels.join(" "));
        }
        let row = format!(
            "{} {} {} {}",
            task.short_id(),
            state_cell(task),
            pad(&truncate(&title, title_width), title_width),
            reminder_cell(task, now)
        );
        let row = row.trim_end();
        if task.is_done() {
            output.push_str(&style_if_tty(row, ANSI_DIM, is_tty));
        } else {
            output.push_str(row);
        }
        output.push('\n');
    }
    output
}

/// Detailed view of a single task
pub fn format_task_summary(task: &Task, now: &DateTime<Local>) -> String {
    let mut output = String::new();

    let header = format!("Task {}: {}", task.short_id(), task.title);
    output.push_str(&header);
    output.push('\n');
    output.push_str(&"=".repeat(header.chars().count().max(40)));
    output.push_str("\n\n");

    output.push_str(&format!("  ID:          {}\n", task.id));
    output.push_str(&format!(
        "  Status:      {}\n",
        if task.is_done() { "done" } else { "open" }
    ));
    output.push_str(&format!(
        "  Quick tic:   {}\n",
        if task.is_quick_tic { "yes" } else { "no" }
    ));
    output.push_str(&format!(
        "  Created:     {}\n",
        task.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
    ));

    match task.reminder_state() {
        ReminderState::NoReminder => output.push_str("  Reminder:    (none)\n"),
        ReminderState::Unscheduled(at) => output.push_str(&format!(
            "  Reminder:    {} (no notification scheduled)\n",
            format_reminder(at, now)
        )),
        ReminderState::Pending(at, handle) => {
            output.push_str(&format!("  Reminder:    {}\n", format_reminder(at, now)));
            output.push_str(&format!("  Handle:      {}\n", handle));
        }
    }

    if task.labels.is_empty() {
        output.push_str("  Labels:      (none)\n");
    } else {
        output.push_str(&format!("  Labels:      {}\n", task.labels.join(", ")));
    }
    output
}

/// One-line confirmation for a created or changed task
pub fn format_task_line(task: &Task, now: &DateTime<Local>) -> String {
    match task.reminder_at() {
        Some(at) => format!("{}: {} (reminder {})", task.short_id(), task.title, format_reminder(at, now)),
        None => format!("{}: {}", task.short_id(), task.title),
    }
}

pub fn format_reminder_warning(warning: &ReminderWarning) -> String {
    format!(
        "Warning: reminder for '{}' saved without a notification: {}",
        warning.title, warning.error
    )
}

pub fn format_due_notification(due: &DueNotification) -> String {
    format!(
        "{}: {} (due {})",
        due.title,
        due.body,
        due.fire_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    )
}
