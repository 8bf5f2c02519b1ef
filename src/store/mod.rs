//! Task list persistence over the shared key-value container
//!
//! The application process writes through [`TaskStore`]; widget processes read
//! through [`TaskStoreReader`], which has no write path at all. Writes replace
//! the whole list (last write wins) and readers always see a complete list.

pub mod codec;
pub mod defaults;

pub use codec::{decode_tasks, encode_tasks, STORE_FORMAT_VERSION};
pub use defaults::SharedDefaults;

use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::db::DbConnection;
use crate::models::Task;
use crate::widget::{WidgetCenter, WIDGET_KIND};

/// Key of the task list blob
pub const TASKS_KEY: &str = "saved_todos";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("shared storage error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("could not encode task list: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Read/write access for the owning process
pub struct TaskStore {
    defaults: SharedDefaults,
    widgets: Arc<dyn WidgetCenter>,
}

impl TaskStore {
    pub fn new(conn: Connection, widgets: Arc<dyn WidgetCenter>) -> Self {
        Self {
            defaults: SharedDefaults::new(conn),
            widgets,
        }
    }

    /// Write the full list and, on success, ask widgets to refresh
    pub fn try_save(&self, tasks: &[Task]) -> Result<(), StoreError> {
        let bytes = encode_tasks(tasks)?;
        self.defaults.set(TASKS_KEY, &bytes)?;
        log::debug!("Saved {} task(s)", tasks.len());
        self.widgets.reload_timelines(WIDGET_KIND);
        Ok(())
    }

    /// Best-effort save. Failures are logged and swallowed; the in-memory list
    /// stays authoritative for this process.
    pub fn save(&self, tasks: &[Task]) {
        if let Err(e) = self.try_save(tasks) {
            log::error!("Failed to persist {} task(s): {}", tasks.len(), e);
        }
    }

    /// Load the persisted list; never fails
    pub fn load(&self) -> Vec<Task> {
        load_from(&self.defaults)
    }
}

/// Read-only access for projection processes
pub struct TaskStoreReader {
    defaults: Option<SharedDefaults>,
}

impl TaskStoreReader {
    pub fn new(conn: Connection) -> Self {
        Self {
            defaults: Some(SharedDefaults::new(conn)),
        }
    }

    /// Open the shared database read-only. A missing or unreadable file gives
    /// a reader that sees an empty list.
    pub fn open(db_path: &Path) -> Self {
        match DbConnection::open_read_only(db_path) {
            Ok(conn) => Self::new(conn),
            Err(e) => {
                log::warn!("Task store unavailable, showing no tasks: {:#}", e);
                Self { defaults: None }
            }
        }
    }

    pub fn load(&self) -> Vec<Task> {
        match &self.defaults {
            Some(defaults) => load_from(defaults),
            None => Vec::new(),
        }
    }
}

fn load_from(defaults: &SharedDefaults) -> Vec<Task> {
    let bytes = match defaults.data(TASKS_KEY) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return Vec::new(),
        Err(e) => {
            log::warn!("Could not read task list: {}", e);
            return Vec::new();
        }
    };
    match decode_tasks(&bytes) {
        Ok(tasks) => tasks,
        Err(e) => {
            log::warn!("Stored task list is unreadable, starting empty: {}", e);
            Vec::new()
        }
    }
}
