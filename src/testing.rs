//! Test doubles shared by unit tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::models::ReminderHandle;
use crate::reminder::{NotificationCenter, NotificationPayload, ReminderError};
use crate::widget::WidgetCenter;

#[derive(Default)]
struct FakeState {
    pending: Vec<(ReminderHandle, DateTime<Utc>)>,
    cancelled: Vec<ReminderHandle>,
    payloads: Vec<NotificationPayload>,
}

/// In-memory notification center
pub struct FakeNotificationCenter {
    permission: bool,
    fail: AtomicBool,
    state: Mutex<FakeState>,
}

impl FakeNotificationCenter {
    pub fn granted() -> Self {
        Self {
            permission: true,
            fail: AtomicBool::new(false),
            state: Mutex::default(),
        }
    }

    pub fn denied() -> Self {
        Self {
            permission: false,
            ..Self::granted()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: AtomicBool::new(true),
            ..Self::granted()
        }
    }

    /// Reject every schedule request from now on
    pub fn start_failing(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn pending(&self) -> Vec<ReminderHandle> {
        self.state.lock().unwrap().pending.iter().map(|(h, _)| h.clone()).collect()
    }

    pub fn cancelled(&self) -> Vec<ReminderHandle> {
        self.state.lock().unwrap().cancelled.clone()
    }

    pub fn payloads(&self) -> Vec<NotificationPayload> {
        self.state.lock().unwrap().payloads.clone()
    }

    /// Simulate delivery: the notification is no longer pending
    pub fn deliver(&self, handle: &ReminderHandle) {
        self.state.lock().unwrap().pending.retain(|(h, _)| h != handle);
    }
}

#[async_trait]
impl NotificationCenter for FakeNotificationCenter {
    async fn request_permission(&self) -> bool {
        self.permission
    }

    async fn schedule_at(
        &self,
        at: DateTime<Utc>,
        payload: NotificationPayload,
    ) -> Result<ReminderHandle, ReminderError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ReminderError::Scheduling("center rejected request".to_string()));
        }
        let handle = ReminderHandle::generate();
        let mut state = self.state.lock().unwrap();
        state.pending.push((handle.clone(), at));
        state.payloads.push(payload);
        Ok(handle)
    }

    async fn cancel(&self, handle: &ReminderHandle) -> Result<(), ReminderError> {
        let mut state = self.state.lock().unwrap();
        state.pending.retain(|(h, _)| h != handle);
        state.cancelled.push(handle.clone());
        Ok(())
    }

    async fn list_pending(&self) -> Result<Vec<ReminderHandle>, ReminderError> {
        Ok(self.pending())
    }
}

/// Widget center that records every signal
#[derive(Default)]
pub struct RecordingWidgetCenter {
    kinds: Mutex<Vec<String>>,
}

impl RecordingWidgetCenter {
    pub fn kinds(&self) -> Vec<String> {
        self.kinds.lock().unwrap().clone()
    }
}

impl WidgetCenter for RecordingWidgetCenter {
    fn reload_timelines(&self, kind: &str) {
        self.kinds.lock().unwrap().push(kind.to_string());
    }
}
