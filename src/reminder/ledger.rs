use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{NotificationCenter, NotificationPayload, ReminderError};
use crate::models::ReminderHandle;

/// A notification whose time has come
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueNotification {
    pub handle: ReminderHandle,
    pub task_id: Uuid,
    pub fire_at: DateTime<Utc>,
    pub title: String,
    pub body: String,
}

/// Notification center that keeps pending notifications in the
/// `notifications` table of the shared database.
/// Delivery happens when something calls [`LedgerNotificationCenter::take_due`].
pub struct LedgerNotificationCenter {
    conn: Mutex<Connection>,
    permission: bool,
}

fn format_instant(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn db_error(e: rusqlite::Error) -> ReminderError {
    ReminderError::Unavailable(e.to_string())
}

impl LedgerNotificationCenter {
    pub fn new(conn: Connection, permission: bool) -> Self {
        Self {
            conn: Mutex::new(conn),
            permission,
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|err| err.into_inner())
    }

    /// Remove and return every notification due at or before `now`, oldest first
    pub fn take_due(&self, now: DateTime<Utc>) -> Result<Vec<DueNotification>, ReminderError> {
        let mut conn = self.conn();
        let tx = conn.transaction().map_err(db_error)?;
        let cutoff = format_instant(now);

        let rows = {
            let mut stmt = tx
                .prepare(
                    "SELECT handle, task_id, fire_at, title, body FROM notifications
                     WHERE fire_at <= ?1 ORDER BY fire_at, created_ts",
                )
                .map_err(db_error)?;
            let rows = stmt
                .query_map([&cutoff], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                })
                .map_err(db_error)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(db_error)?;
            rows
        };

        let mut due = Vec::with_capacity(rows.len());
        for (handle, task_id, fire_at, title, body) in rows {
            tx.execute("DELETE FROM notifications WHERE handle = ?1", [&handle])
                .map_err(db_error)?;
            let (Ok(task_id), Ok(fire_at)) = (
                Uuid::parse_str(&task_id),
                DateTime::parse_from_rfc3339(&fire_at),
            ) else {
                log::warn!("Dropping malformed notification record {}", handle);
                continue;
            };
            due.push(DueNotification {
                handle: ReminderHandle::from(handle),
                task_id,
                fire_at: fire_at.with_timezone(&Utc),
                title,
                body,
            });
        }
        tx.commit().map_err(db_error)?;
        Ok(due)
    }
}

#[async_trait]
impl NotificationCenter for LedgerNotificationCenter {
    async fn request_permission(&self) -> bool {
        self.permission
    }

    async fn schedule_at(
        &self,
        at: DateTime<Utc>,
        payload: NotificationPayload,
    ) -> Result<ReminderHandle, ReminderError> {
        let handle = ReminderHandle::generate();
        self.conn()
            .execute(
                "INSERT INTO notifications (handle, task_id, fire_at, title, body, created_ts)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    handle.as_str(),
                    payload.task_id.to_string(),
                    format_instant(at),
                    payload.title,
                    payload.body,
                    Utc::now().timestamp(),
                ],
            )
            .map_err(|e| ReminderError::Scheduling(e.to_string()))?;
        Ok(handle)
    }

    async fn cancel(&self, handle: &ReminderHandle) -> Result<(), ReminderError> {
        self.conn()
            .execute("DELETE FROM notifications WHERE handle = ?1", [handle.as_str()])
            .map_err(db_error)?;
        Ok(())
    }

    async fn list_pending(&self) -> Result<Vec<ReminderHandle>, ReminderError> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT handle FROM notifications ORDER BY fire_at, created_ts")
            .map_err(db_error)?;
        let handles = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(db_error)?
            .map(|row| row.map(ReminderHandle::from))
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_error)?;
        Ok(handles)
    }
}
