// Error handling utilities for consistent error messages and exit codes

use thiserror::Error;
use uuid::Uuid;

use crate::models::Task;
use crate::pipeline::{IngestionError, TaskError};

/// A failure caused by the user's input or configuration (exit code 1).
/// Anything else that reaches `main` is an internal error (exit code 2).
#[derive(Debug, Error)]
#[error("{0}")]
pub struct UserError(pub String);

pub fn user_error(message: impl Into<String>) -> anyhow::Error {
    UserError(message.into()).into()
}

/// Whether an error should be reported as a user error
pub fn is_user_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        if cause.is::<UserError>() {
            return true;
        }
        if let Some(e) = cause.downcast_ref::<IngestionError>() {
            return !matches!(e, IngestionError::Interrupted);
        }
        if let Some(e) = cause.downcast_ref::<TaskError>() {
            return !matches!(e, TaskError::Interrupted);
        }
        false
    })
}

/// Validate that a string is not empty
pub fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}

/// Resolve a task from a full id or an unambiguous prefix of its hex form
pub fn resolve_task_id(tasks: &[Task], spec: &str) -> Result<Uuid, String> {
    let needle = spec.trim().to_lowercase().replace('-', "");
    if needle.is_empty() {
        return Err("Task ID cannot be empty".to_string());
    }
    if !needle.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!(
            "Invalid task ID: '{}'. Use the ID shown by 'taskify list'.",
            spec
        ));
    }

    let matches: Vec<&Task> = tasks
        .iter()
        .filter(|task| task.id.simple().to_string().starts_with(&needle))
        .collect();
    match matches.as_slice() {
        [task] => Ok(task.id),
        [] => Err(format!("Task {} not found", spec)),
        many => Err(format!(
            "Task ID '{}' is ambiguous ({} tasks match). Use more characters.",
            spec,
            many.len()
        )),
    }
}
