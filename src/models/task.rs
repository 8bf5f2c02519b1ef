use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of a scheduled notification.
///
/// A task carries one only while a notification is believed to be pending for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderHandle(String);

impl ReminderHandle {
    /// Mint a fresh, never-before-used handle
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ReminderHandle {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for ReminderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reminder sub-state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderState<'a> {
    /// No reminder time at all
    NoReminder,
    /// A reminder time is recorded but no notification is pending for it
    Unscheduled(DateTime<Utc>),
    /// A notification is pending under the given handle
    Pending(DateTime<Utc>, &'a ReminderHandle),
}

/// Task model
///
/// Serialized field names are camelCase so the blob stays readable by every
/// process that shares it. Fields added after the first release default when
/// missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    is_done: bool,
    #[serde(default)]
    reminder_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_quick_tic: bool,
    #[serde(default, rename = "reminderID")]
    reminder_handle: Option<ReminderHandle>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a new task
    pub fn new(title: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            is_done: false,
            reminder_at: None,
            is_quick_tic: false,
            reminder_handle: None,
            labels: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.is_done
    }

    pub fn reminder_at(&self) -> Option<DateTime<Utc>> {
        self.reminder_at
    }

    pub fn reminder_handle(&self) -> Option<&ReminderHandle> {
        self.reminder_handle.as_ref()
    }

    pub fn reminder_state(&self) -> ReminderState<'_> {
        match (self.reminder_at, self.reminder_handle.as_ref()) {
            (Some(at), Some(handle)) => ReminderState::Pending(at, handle),
            (Some(at), None) => ReminderState::Unscheduled(at),
            (None, _) => ReminderState::NoReminder,
        }
    }

    /// Record a reminder that has a pending notification behind it
    pub fn attach_reminder(&mut self, at: DateTime<Utc>, handle: ReminderHandle) {
        self.reminder_at = Some(at);
        self.reminder_handle = Some(handle);
    }

    /// Record a reminder time with no notification behind it
    /// (permission denied, scheduling failed, reminders disabled).
    pub fn set_unscheduled_reminder(&mut self, at: DateTime<Utc>) {
        self.reminder_at = Some(at);
        self.reminder_handle = None;
    }

    /// Forget the handle only; the reminder time stays.
    /// Used once the notification is known to be gone (delivered or cancelled).
    pub fn forget_handle(&mut self) -> Option<ReminderHandle> {
        self.reminder_handle.take()
    }

    pub fn clear_reminder(&mut self) {
        self.reminder_at = None;
        self.reminder_handle = None;
    }

    /// Set completion state. Completing a task drops its reminder;
    /// the caller must cancel the notification first.
    pub fn set_done(&mut self, done: bool) {
        self.is_done = done;
        if done {
            self.clear_reminder();
        }
    }

    /// Repair records that break the handle invariant.
    /// Returns true when something had to change.
    pub fn normalize(&mut self) -> bool {
        let mut changed = false;
        if self.reminder_at.is_none() && self.reminder_handle.is_some() {
            self.reminder_handle = None;
            changed = true;
        }
        if self.is_done && self.reminder_at.is_some() {
            self.clear_reminder();
            changed = true;
        }
        changed
    }

    /// Short id for display and lookup by prefix
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }
}
