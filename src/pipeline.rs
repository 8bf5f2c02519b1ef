//! Task ingestion and list mutations
//!
//! The in-memory list is the working copy for this process. Every change runs
//! on a spawned task while holding the list lock, and is persisted before the
//! lock is released. Dropping a caller's future therefore never leaves a change
//! half applied.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{ReminderState, Task};
use crate::parser::{ParsedResult, TaskExtractor, MAX_EXTRACTED_TASKS};
use crate::reminder::{ReminderError, ReminderScheduler, Scheduled};
use crate::store::TaskStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestionError {
    #[error("nothing to add: the input is empty")]
    EmptyInput,
    #[error("no task could be read from the input")]
    ParseProducedNothing,
    #[error("ingestion was interrupted before it finished")]
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("no task with id {0}")]
    NotFound(Uuid),
    #[error("title cannot be empty")]
    EmptyTitle,
    #[error("task {0} is done; reopen it first")]
    AlreadyDone(Uuid),
    #[error("the operation was interrupted before it finished")]
    Interrupted,
}

/// A reminder kept without a pending notification
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderWarning {
    pub task_id: Uuid,
    pub title: String,
    pub error: ReminderError,
}

/// Result of one successful submission
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ingestion {
    pub created: Vec<Task>,
    pub warnings: Vec<ReminderWarning>,
}

struct Inner {
    tasks: Mutex<Vec<Task>>,
    extractor: Arc<dyn TaskExtractor>,
    scheduler: Arc<dyn ReminderScheduler>,
    store: TaskStore,
}

/// Orchestrates parsing, reminder scheduling and persistence
#[derive(Clone)]
pub struct TaskIngestionPipeline {
    inner: Arc<Inner>,
}

/// Run `fut` on its own task so that it completes even if the caller goes away
async fn detached<T, F>(fut: F) -> Option<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(fut).await {
        Ok(value) => Some(value),
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(_) => None,
    }
}

fn position(tasks: &[Task], id: Uuid) -> Result<usize, TaskError> {
    tasks
        .iter()
        .position(|task| task.id == id)
        .ok_or(TaskError::NotFound(id))
}

impl TaskIngestionPipeline {
    /// Create a pipeline over the list currently persisted in `store`
    pub fn new(
        store: TaskStore,
        extractor: Arc<dyn TaskExtractor>,
        scheduler: Arc<dyn ReminderScheduler>,
    ) -> Self {
        let tasks = store.load();
        log::debug!("Loaded {} task(s)", tasks.len());
        Self {
            inner: Arc::new(Inner {
                tasks: Mutex::new(tasks),
                extractor,
                scheduler,
                store,
            }),
        }
    }

    /// Turn raw text into zero or more persisted tasks
    pub async fn submit(&self, raw_text: &str) -> Result<Ingestion, IngestionError> {
        if raw_text.trim().is_empty() {
            return Err(IngestionError::EmptyInput);
        }
        let inner = self.inner.clone();
        let text = raw_text.to_string();
        detached(async move { inner.ingest(&text).await })
            .await
            .unwrap_or(Err(IngestionError::Interrupted))
    }

    async fn run<T, F, Fut>(&self, op: F) -> Result<T, TaskError>
    where
        F: FnOnce(Arc<Inner>) -> Fut,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
        T: Send + 'static,
    {
        detached(op(self.inner.clone()))
            .await
            .unwrap_or(Err(TaskError::Interrupted))
    }

    /// Snapshot of the list in storage order
    pub async fn tasks(&self) -> Vec<Task> {
        self.inner.tasks.lock().await.clone()
    }

    pub async fn set_done(&self, id: Uuid, done: bool) -> Result<Task, TaskError> {
        self.run(move |inner| async move { inner.set_done(id, Some(done)).await })
            .await
    }

    pub async fn toggle_done(&self, id: Uuid) -> Result<Task, TaskError> {
        self.run(move |inner| async move { inner.set_done(id, None).await })
            .await
    }

    pub async fn toggle_quick_tic(&self, id: Uuid) -> Result<Task, TaskError> {
        self.run(move |inner| async move { inner.toggle_quick_tic(id).await })
            .await
    }

    /// Retitle a task. A pending reminder is rescheduled so the notification
    /// shows the new title; if that fails the warning is returned with the task.
    pub async fn rename(&self, id: Uuid, title: &str) -> Result<Scheduled, TaskError> {
        let title = title.trim().to_string();
        self.run(move |inner| async move { inner.rename(id, title).await })
            .await
    }

    /// Attach or move the reminder of a task
    pub async fn set_reminder(&self, id: Uuid, at: DateTime<Utc>) -> Result<Scheduled, TaskError> {
        self.run(move |inner| async move { inner.set_reminder(id, at).await })
            .await
    }

    pub async fn clear_reminder(&self, id: Uuid) -> Result<Task, TaskError> {
        self.run(move |inner| async move { inner.clear_reminder(id).await })
            .await
    }

    /// Delete a task, cancelling its notification first. Returns the removed task.
    pub async fn delete(&self, id: Uuid) -> Result<Task, TaskError> {
        self.run(move |inner| async move { inner.delete(id).await })
            .await
    }

    /// Forget handles whose notification is no longer pending.
    /// Returns how many tasks changed.
    pub async fn reconcile_reminders(&self) -> usize {
        let inner = self.inner.clone();
        detached(async move { inner.reconcile_reminders().await })
            .await
            .unwrap_or(0)
    }
}

impl Inner {
    async fn ingest(&self, text: &str) -> Result<Ingestion, IngestionError> {
        let results = match self.extractor.extract(text).await {
            Ok(results) => results,
            Err(e) => {
                log::warn!("Extraction failed: {}", e);
                Vec::new()
            }
        };
        let results: Vec<ParsedResult> = results
            .into_iter()
            .filter(ParsedResult::has_title)
            .take(MAX_EXTRACTED_TASKS)
            .collect();
        if results.is_empty() {
            return Err(IngestionError::ParseProducedNothing);
        }

        let mut tasks = self.tasks.lock().await;
        let mut ingestion = Ingestion::default();
        for result in results {
            let mut task = Task::new(result.title.trim().to_string());
            task.labels = result.labels;
            if let Some(at) = result.reminder_at {
                let scheduled = self.scheduler.schedule(task, at).await;
                task = scheduled.task;
                if let Some(error) = scheduled.warning {
                    ingestion.warnings.push(ReminderWarning {
                        task_id: task.id,
                        title: task.title.clone(),
                        error,
                    });
                }
            }
            log::info!("Added task {} '{}'", task.short_id(), task.title);
            tasks.push(task.clone());
            ingestion.created.push(task);
        }
        self.store.save(&tasks);
        Ok(ingestion)
    }

    /// `done = None` toggles
    async fn set_done(&self, id: Uuid, done: Option<bool>) -> Result<Task, TaskError> {
        let mut tasks = self.tasks.lock().await;
        let idx = position(&tasks, id)?;
        let done = done.unwrap_or(!tasks[idx].is_done());
        if done && !tasks[idx].is_done() {
            self.scheduler.remove(&tasks[idx]).await;
        }
        tasks[idx].set_done(done);
        let task = tasks[idx].clone();
        self.store.save(&tasks);
        Ok(task)
    }

    async fn toggle_quick_tic(&self, id: Uuid) -> Result<Task, TaskError> {
        let mut tasks = self.tasks.lock().await;
        let idx = position(&tasks, id)?;
        tasks[idx].is_quick_tic = !tasks[idx].is_quick_tic;
        let task = tasks[idx].clone();
        self.store.save(&tasks);
        Ok(task)
    }

    async fn rename(&self, id: Uuid, title: String) -> Result<Scheduled, TaskError> {
        if title.is_empty() {
            return Err(TaskError::EmptyTitle);
        }
        let mut tasks = self.tasks.lock().await;
        let idx = position(&tasks, id)?;
        tasks[idx].title = title;
        // The pending notification still shows the old title
        let pending_at = match tasks[idx].reminder_state() {
            ReminderState::Pending(at, _) => Some(at),
            _ => None,
        };
        let mut warning = None;
        if let Some(at) = pending_at {
            let scheduled = self.scheduler.schedule(tasks[idx].clone(), at).await;
            tasks[idx] = scheduled.task;
            warning = scheduled.warning;
        }
        let task = tasks[idx].clone();
        self.store.save(&tasks);
        Ok(Scheduled { task, warning })
    }

    async fn set_reminder(&self, id: Uuid, at: DateTime<Utc>) -> Result<Scheduled, TaskError> {
        let mut tasks = self.tasks.lock().await;
        let idx = position(&tasks, id)?;
        if tasks[idx].is_done() {
            return Err(TaskError::AlreadyDone(id));
        }
        let scheduled = self.scheduler.schedule(tasks[idx].clone(), at).await;
        tasks[idx] = scheduled.task.clone();
        self.store.save(&tasks);
        Ok(scheduled)
    }

    async fn clear_reminder(&self, id: Uuid) -> Result<Task, TaskError> {
        let mut tasks = self.tasks.lock().await;
        let idx = position(&tasks, id)?;
        self.scheduler.remove(&tasks[idx]).await;
        tasks[idx].clear_reminder();
        let task = tasks[idx].clone();
        self.store.save(&tasks);
        Ok(task)
    }

    async fn delete(&self, id: Uuid) -> Result<Task, TaskError> {
        let mut tasks = self.tasks.lock().await;
        let idx = position(&tasks, id)?;
        self.scheduler.remove(&tasks[idx]).await;
        let task = tasks.remove(idx);
        log::info!("Deleted task {} '{}'", task.short_id(), task.title);
        self.store.save(&tasks);
        Ok(task)
    }

    async fn reconcile_reminders(&self) -> usize {
        let mut tasks = self.tasks.lock().await;
        let Some(pending) = self.scheduler.pending_handles().await else {
            return 0;
        };
        let pending: HashSet<_> = pending.into_iter().collect();

        let mut changed = 0;
        for task in tasks.iter_mut() {
            if task.reminder_handle().is_some_and(|h| !pending.contains(h)) {
                task.forget_handle();
                changed += 1;
            }
        }
        if changed > 0 {
            log::debug!("Forgot {} delivered notification handle(s)", changed);
            self.store.save(&tasks);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use crate::parser::{ExtractionError, LocalExtractor};
    use crate::reminder::NotificationScheduler;
    use crate::store::TaskStoreReader;
    use crate::testing::{FakeNotificationCenter, RecordingWidgetCenter};
    use async_trait::async_trait;
    use chrono::{FixedOffset, TimeZone};
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        db_path: PathBuf,
        center: Arc<FakeNotificationCenter>,
        pipeline: TaskIngestionPipeline,
    }

    impl Fixture {
        fn persisted(&self) -> Vec<Task> {
            TaskStoreReader::open(&self.db_path).load()
        }
    }

    fn fixture_with(center: FakeNotificationCenter, extractor: Arc<dyn TaskExtractor>) -> Fixture {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("shared.db");
        let store = TaskStore::new(
            DbConnection::connect(&db_path).unwrap(),
            Arc::new(RecordingWidgetCenter::default()),
        );
        let center = Arc::new(center);
        let scheduler = Arc::new(NotificationScheduler::new(center.clone()));
        Fixture {
            _dir: dir,
            db_path,
            center,
            pipeline: TaskIngestionPipeline::new(store, extractor, scheduler),
        }
    }

    fn local_extractor() -> Arc<dyn TaskExtractor> {
        let now = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 4, 10, 0, 0)
            .unwrap();
        Arc::new(LocalExtractor::default().with_reference(now))
    }

    fn fixture(center: FakeNotificationCenter) -> Fixture {
        fixture_with(center, local_extractor())
    }

    /// Extractor replaying a fixed answer
    struct CannedExtractor(Result<Vec<ParsedResult>, ExtractionError>);

    #[async_trait]
    impl TaskExtractor for CannedExtractor {
        async fn extract(&self, _text: &str) -> Result<Vec<ParsedResult>, ExtractionError> {
            match &self.0 {
                Ok(results) => Ok(results.clone()),
                Err(_) => Err(ExtractionError::Service("unavailable".to_string())),
            }
        }
    }

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, d, h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_submit_scenario() {
        let fx = fixture(FakeNotificationCenter::granted());
        let ingestion = fx.pipeline.submit("Buy milk tomorrow at 6pm #errands").await.unwrap();

        assert_eq!(ingestion.created.len(), 1);
        assert!(ingestion.warnings.is_empty());
        let task = &ingestion.created[0];
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.reminder_at(), Some(at(5, 18)));
        assert_eq!(task.labels, vec!["errands".to_string()]);
        assert!(!task.is_done());
        assert!(!task.is_quick_tic);
        assert_eq!(fx.center.pending(), vec![task.reminder_handle().cloned().unwrap()]);

        assert_eq!(fx.pipeline.tasks().await, ingestion.created);
        assert_eq!(fx.persisted(), ingestion.created);
    }

    #[tokio::test]
    async fn test_blank_input_is_rejected() {
        let fx = fixture(FakeNotificationCenter::granted());
        for text in ["", "   ", "\n\t "] {
            assert_eq!(fx.pipeline.submit(text).await, Err(IngestionError::EmptyInput));
        }
        assert!(fx.pipeline.tasks().await.is_empty());
        assert!(fx.persisted().is_empty());
    }

    #[tokio::test]
    async fn test_nothing_parsed_appends_nothing() {
        let fx = fixture(FakeNotificationCenter::granted());
        assert_eq!(
            fx.pipeline.submit("tomorrow at 6pm").await,
            Err(IngestionError::ParseProducedNothing)
        );
        assert!(fx.pipeline.tasks().await.is_empty());
        assert!(fx.center.pending().is_empty());
    }

    #[tokio::test]
    async fn test_permission_denied_still_persists() {
        let fx = fixture(FakeNotificationCenter::denied());
        let ingestion = fx.pipeline.submit("Call mom tomorrow at 6pm").await.unwrap();

        assert_eq!(ingestion.warnings.len(), 1);
        assert_eq!(ingestion.warnings[0].error, ReminderError::PermissionDenied);
        assert_eq!(ingestion.warnings[0].title, "Call mom");

        let saved = fx.persisted();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].reminder_state(), ReminderState::Unscheduled(at(5, 18)));
    }

    #[tokio::test]
    async fn test_remote_results_are_capped_and_filtered() {
        let mut results: Vec<ParsedResult> = (0..12)
            .map(|i| ParsedResult::new(format!("Task {}", i), None))
            .collect();
        results.insert(0, ParsedResult::new("   ", None));
        let fx = fixture_with(
            FakeNotificationCenter::granted(),
            Arc::new(CannedExtractor(Ok(results))),
        );

        let ingestion = fx.pipeline.submit("a long brain dump").await.unwrap();
        assert_eq!(ingestion.created.len(), MAX_EXTRACTED_TASKS);
        assert_eq!(ingestion.created[0].title, "Task 0");
        assert_eq!(fx.persisted().len(), MAX_EXTRACTED_TASKS);
    }

    #[tokio::test]
    async fn test_extraction_failure_produces_nothing() {
        let fx = fixture_with(
            FakeNotificationCenter::granted(),
            Arc::new(CannedExtractor(Err(ExtractionError::Service(String::new())))),
        );
        assert_eq!(
            fx.pipeline.submit("anything").await,
            Err(IngestionError::ParseProducedNothing)
        );
        let fx = fixture_with(FakeNotificationCenter::granted(), Arc::new(CannedExtractor(Ok(vec![]))));
        assert_eq!(
            fx.pipeline.submit("anything").await,
            Err(IngestionError::ParseProducedNothing)
        );
    }

    #[tokio::test]
    async fn test_completing_removes_reminder() {
        let fx = fixture(FakeNotificationCenter::granted());
        let task = fx.pipeline.submit("Pay rent tomorrow at 9am").await.unwrap().created.remove(0);
        let handle = task.reminder_handle().cloned().unwrap();

        let done = fx.pipeline.toggle_done(task.id).await.unwrap();
        assert!(done.is_done());
        assert_eq!(done.reminder_state(), ReminderState::NoReminder);
        assert_eq!(fx.center.cancelled(), vec![handle]);
        assert!(fx.center.pending().is_empty());

        // Reopening only clears the flag
        let reopened = fx.pipeline.set_done(task.id, false).await.unwrap();
        assert!(!reopened.is_done());
        assert_eq!(reopened.reminder_at(), None);
        assert_eq!(fx.persisted(), vec![reopened]);
    }

    #[tokio::test]
    async fn test_set_reminder_reschedules() {
        let fx = fixture(FakeNotificationCenter::granted());
        let task = fx.pipeline.submit("Water plants tomorrow").await.unwrap().created.remove(0);
        let old = task.reminder_handle().cloned().unwrap();

        let scheduled = fx.pipeline.set_reminder(task.id, at(6, 7)).await.unwrap();
        assert!(scheduled.warning.is_none());
        let new = scheduled.task.reminder_handle().cloned().unwrap();
        assert_eq!(fx.center.cancelled(), vec![old]);
        assert_eq!(fx.center.pending(), vec![new]);
        assert_eq!(fx.persisted()[0].reminder_at(), Some(at(6, 7)));

        let cleared = fx.pipeline.clear_reminder(task.id).await.unwrap();
        assert_eq!(cleared.reminder_state(), ReminderState::NoReminder);
        assert!(fx.center.pending().is_empty());
    }

    #[tokio::test]
    async fn test_set_reminder_on_done_task_is_rejected() {
        let fx = fixture(FakeNotificationCenter::granted());
        let task = fx.pipeline.submit("Old chore").await.unwrap().created.remove(0);
        fx.pipeline.set_done(task.id, true).await.unwrap();
        assert_eq!(
            fx.pipeline.set_reminder(task.id, at(6, 7)).await,
            Err(TaskError::AlreadyDone(task.id))
        );
    }

    #[tokio::test]
    async fn test_rename_and_quick_tic() {
        let fx = fixture(FakeNotificationCenter::granted());
        let task = fx.pipeline.submit("Buy mlik tomorrow at 6pm").await.unwrap().created.remove(0);

        assert_eq!(fx.pipeline.rename(task.id, "   ").await, Err(TaskError::EmptyTitle));

        let renamed = fx.pipeline.rename(task.id, " Buy milk ").await.unwrap();
        assert!(renamed.warning.is_none());
        let renamed = renamed.task;
        assert_eq!(renamed.title, "Buy milk");
        assert_eq!(renamed.reminder_at(), Some(at(5, 18)));
        assert_eq!(fx.center.pending().len(), 1);
        assert_eq!(fx.center.payloads().last().unwrap().body, "Buy milk");

        assert!(fx.pipeline.toggle_quick_tic(task.id).await.unwrap().is_quick_tic);
        assert!(fx.persisted()[0].is_quick_tic);
    }

    #[tokio::test]
    async fn test_rename_reports_failed_reschedule() {
        let fx = fixture(FakeNotificationCenter::granted());
        let task = fx.pipeline.submit("Buy milk tomorrow at 6pm").await.unwrap().created.remove(0);
        let old = task.reminder_handle().cloned().unwrap();
        fx.center.start_failing();

        let renamed = fx.pipeline.rename(task.id, "Buy oat milk").await.unwrap();
        assert!(matches!(renamed.warning, Some(ReminderError::Scheduling(_))));
        assert_eq!(renamed.task.title, "Buy oat milk");
        assert_eq!(renamed.task.reminder_state(), ReminderState::Unscheduled(at(5, 18)));
        assert_eq!(fx.center.cancelled(), vec![old]);
        assert!(fx.center.pending().is_empty());
        assert_eq!(fx.persisted(), vec![renamed.task]);
    }

    #[tokio::test]
    async fn test_rename_without_reminder_never_schedules() {
        let fx = fixture(FakeNotificationCenter::granted());
        let task = fx.pipeline.submit("Buy milk").await.unwrap().created.remove(0);
        fx.center.start_failing();

        let renamed = fx.pipeline.rename(task.id, "Buy oat milk").await.unwrap();
        assert!(renamed.warning.is_none());
        assert_eq!(renamed.task.reminder_state(), ReminderState::NoReminder);
    }

    #[tokio::test]
    async fn test_delete_cancels_by_handle() {
        let fx = fixture(FakeNotificationCenter::granted());
        let a = fx.pipeline.submit("Same tomorrow").await.unwrap().created.remove(0);
        let b = fx.pipeline.submit("Same tomorrow").await.unwrap().created.remove(0);

        let deleted = fx.pipeline.delete(a.id).await.unwrap();
        assert_eq!(deleted.id, a.id);
        assert_eq!(fx.center.pending(), vec![b.reminder_handle().cloned().unwrap()]);
        assert_eq!(fx.persisted(), vec![b]);
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let fx = fixture(FakeNotificationCenter::granted());
        let id = Uuid::new_v4();
        assert_eq!(fx.pipeline.toggle_done(id).await, Err(TaskError::NotFound(id)));
        assert_eq!(fx.pipeline.delete(id).await, Err(TaskError::NotFound(id)));
    }

    #[tokio::test]
    async fn test_reconcile_forgets_delivered_handles() {
        let fx = fixture(FakeNotificationCenter::granted());
        let a = fx.pipeline.submit("First tomorrow").await.unwrap().created.remove(0);
        let b = fx.pipeline.submit("Second tomorrow").await.unwrap().created.remove(0);

        fx.center.deliver(a.reminder_handle().unwrap());
        assert_eq!(fx.pipeline.reconcile_reminders().await, 1);

        let saved = fx.persisted();
        assert_eq!(saved[0].reminder_state(), ReminderState::Unscheduled(a.reminder_at().unwrap()));
        assert_eq!(saved[1], b);
        assert_eq!(fx.pipeline.reconcile_reminders().await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submissions_are_serialized() {
        let fx = fixture(FakeNotificationCenter::granted());
        let submissions = (0..10).map(|i| {
            let pipeline = fx.pipeline.clone();
            tokio::spawn(async move { pipeline.submit(&format!("Task {} tomorrow", i)).await })
        });
        for handle in submissions.collect::<Vec<_>>() {
            handle.await.unwrap().unwrap();
        }

        let tasks = fx.pipeline.tasks().await;
        assert_eq!(tasks.len(), 10);
        assert_eq!(fx.persisted(), tasks);
        assert_eq!(fx.center.pending().len(), 10);
    }

    #[tokio::test]
    async fn test_dropped_submission_still_completes() {
        let fx = fixture(FakeNotificationCenter::granted());
        let _ = tokio::time::timeout(Duration::ZERO, fx.pipeline.submit("Survive the drop")).await;

        for _ in 0..200 {
            if !fx.pipeline.tasks().await.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(fx.persisted().len(), 1);
        assert_eq!(fx.persisted()[0].title, "Survive the drop");
    }

    #[tokio::test]
    async fn test_pipeline_loads_existing_list() {
        let fx = fixture(FakeNotificationCenter::granted());
        fx.pipeline.submit("Persist me").await.unwrap();

        let store = TaskStore::new(
            DbConnection::connect(&fx.db_path).unwrap(),
            Arc::new(RecordingWidgetCenter::default()),
        );
        let reloaded = TaskIngestionPipeline::new(store, local_extractor(), Arc::new(crate::reminder::NoopScheduler));
        assert_eq!(reloaded.tasks().await, fx.pipeline.tasks().await);
    }
}
