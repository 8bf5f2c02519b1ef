//! Reminder scheduling
//!
//! A task has at most one pending notification, referenced by the handle
//! stored on the task. Every reschedule cancels the previous handle before a
//! new one is minted, and removal is matched by handle only.

pub mod ledger;

pub use ledger::{DueNotification, LedgerNotificationCenter};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ReminderHandle, Task};

/// Soft failures of reminder scheduling.
/// The task is still kept, with its reminder time but without a handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReminderError {
    #[error("notification permission denied")]
    PermissionDenied,
    #[error("could not schedule notification: {0}")]
    Scheduling(String),
    #[error("notification center unavailable: {0}")]
    Unavailable(String),
}

/// What a notification shows when it fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub task_id: Uuid,
    pub title: String,
    pub body: String,
}

impl NotificationPayload {
    pub fn for_task(task: &Task) -> Self {
        Self {
            task_id: task.id,
            title: "Reminder".to_string(),
            body: task.title.clone(),
        }
    }
}

/// Platform notification facility
#[async_trait]
pub trait NotificationCenter: Send + Sync {
    /// Whether the user allows notifications
    async fn request_permission(&self) -> bool;

    /// Schedule a one-shot notification, returning its handle
    async fn schedule_at(
        &self,
        at: DateTime<Utc>,
        payload: NotificationPayload,
    ) -> Result<ReminderHandle, ReminderError>;

    /// Cancel a pending notification; unknown handles are not an error
    async fn cancel(&self, handle: &ReminderHandle) -> Result<(), ReminderError>;

    /// Handles of all notifications still waiting to fire
    async fn list_pending(&self) -> Result<Vec<ReminderHandle>, ReminderError>;
}

#[async_trait]
impl<C: NotificationCenter + ?Sized> NotificationCenter for Arc<C> {
    async fn request_permission(&self) -> bool {
        (**self).request_permission().await
    }

    async fn schedule_at(
        &self,
        at: DateTime<Utc>,
        payload: NotificationPayload,
    ) -> Result<ReminderHandle, ReminderError> {
        (**self).schedule_at(at, payload).await
    }

    async fn cancel(&self, handle: &ReminderHandle) -> Result<(), ReminderError> {
        (**self).cancel(handle).await
    }

    async fn list_pending(&self) -> Result<Vec<ReminderHandle>, ReminderError> {
        (**self).list_pending().await
    }
}

/// Outcome of [`ReminderScheduler::schedule`]
#[derive(Debug, Clone, PartialEq)]
pub struct Scheduled {
    pub task: Task,
    /// Set when the reminder time was kept without a pending notification
    pub warning: Option<ReminderError>,
}

#[async_trait]
pub trait ReminderScheduler: Send + Sync {
    /// Attach a reminder at `at` to `task`, replacing any pending one
    async fn schedule(&self, task: Task, at: DateTime<Utc>) -> Scheduled;

    /// Cancel the notification referenced by the task's handle.
    /// Does nothing when the task has no handle; never mutates the task.
    async fn remove(&self, task: &Task);

    /// Handles still pending, when the backend can tell
    async fn pending_handles(&self) -> Option<Vec<ReminderHandle>>;
}

/// Scheduler backed by a [`NotificationCenter`]
pub struct NotificationScheduler<C> {
    center: C,
}

impl<C: NotificationCenter> NotificationScheduler<C> {
    pub fn new(center: C) -> Self {
        Self { center }
    }

    async fn cancel_handle(&self, handle: &ReminderHandle) {
        if let Err(e) = self.center.cancel(handle).await {
            log::warn!("Failed to cancel notification {}: {}", handle, e);
        }
    }
}

#[async_trait]
impl<C: NotificationCenter> ReminderScheduler for NotificationScheduler<C> {
    async fn schedule(&self, mut task: Task, at: DateTime<Utc>) -> Scheduled {
        if let Some(old) = task.forget_handle() {
            self.cancel_handle(&old).await;
        }

        if !self.center.request_permission().await {
            log::warn!("Notifications not permitted; reminder for task {} kept unscheduled", task.id);
            task.set_unscheduled_reminder(at);
            return Scheduled {
                task,
                warning: Some(ReminderError::PermissionDenied),
            };
        }

        match self.center.schedule_at(at, NotificationPayload::for_task(&task)).await {
            Ok(handle) => {
                log::debug!("Scheduled notification {} for task {} at {}", handle, task.id, at);
                task.attach_reminder(at, handle);
                Scheduled { task, warning: None }
            }
            Err(e) => {
                log::warn!("Scheduling reminder for task {} failed: {}", task.id, e);
                task.set_unscheduled_reminder(at);
                Scheduled {
                    task,
                    warning: Some(e),
                }
            }
        }
    }

    async fn remove(&self, task: &Task) {
        if let Some(handle) = task.reminder_handle() {
            self.cancel_handle(handle).await;
        }
    }

    async fn pending_handles(&self) -> Option<Vec<ReminderHandle>> {
        match self.center.list_pending().await {
            Ok(handles) => Some(handles),
            Err(e) => {
                log::warn!("Could not list pending notifications: {}", e);
                None
            }
        }
    }
}

/// Scheduler for when reminders are switched off: times are recorded,
/// nothing is ever delivered.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopScheduler;

#[async_trait]
impl ReminderScheduler for NoopScheduler {
    async fn schedule(&self, mut task: Task, at: DateTime<Utc>) -> Scheduled {
        task.set_unscheduled_reminder(at);
        Scheduled { task, warning: None }
    }

    async fn remove(&self, _task: &Task) {}

    async fn pending_handles(&self) -> Option<Vec<ReminderHandle>> {
        None
    }
}
