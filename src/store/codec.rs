//! Blob encoding for the persisted task list
//!
//! Current layout: `{"version": 1, "tasks": [...]}`. The first release wrote a
//! bare array; it is still accepted on read.

use serde::{Deserialize, Serialize};

use crate::models::Task;

/// Format version written by this build
pub const STORE_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct StoredTasksRef<'a> {
    version: u32,
    tasks: &'a [Task],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredTasks {
    Versioned { version: u32, tasks: Vec<Task> },
    Legacy(Vec<Task>),
}

pub fn encode_tasks(tasks: &[Task]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&StoredTasksRef {
        version: STORE_FORMAT_VERSION,
        tasks,
    })
}

/// Decode a blob, repairing records that break the reminder invariants
pub fn decode_tasks(bytes: &[u8]) -> Result<Vec<Task>, serde_json::Error> {
    let mut tasks = match serde_json::from_slice::<StoredTasks>(bytes)? {
        StoredTasks::Versioned { version, tasks } => {
            if version > STORE_FORMAT_VERSION {
                log::warn!(
                    "Task list was written by a newer format (v{}); reading what is understood",
                    version
                );
            }
            tasks
        }
        StoredTasks::Legacy(tasks) => tasks,
    };

    for task in &mut tasks {
        if task.normalize() {
            log::warn!("Repaired inconsistent reminder state on task {}", task.id);
        }
    }
    Ok(tasks)
}
