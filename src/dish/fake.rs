//! Scripted [`DishClient`] for exercising the poller without a dish.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::client::{DishClient, RequestKind};
use super::data::{DeviceInfo, HistoryWindow, StatusSnapshot};
use crate::error::{ExporterError, Result};

#[derive(Default)]
struct Script {
    device_info: VecDeque<Result<DeviceInfo>>,
    status: VecDeque<Result<StatusSnapshot>>,
    history: VecDeque<Result<HistoryWindow>>,
    calls: Vec<RequestKind>,
    delay: Option<Duration>,
}

/// Replays queued replies in order. Clones share the same script, so a test
/// can keep a handle after moving a clone into a poller.
///
/// A call whose queue is empty fails with [`ExporterError::Timeout`].
#[derive(Clone, Default)]
pub struct FakeDish {
    script: Arc<Mutex<Script>>,
}

impl FakeDish {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every reply, simulating a slow dish.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.lock().delay = Some(delay);
        self
    }

    pub fn push_device_info(&self, reply: Result<DeviceInfo>) {
        self.lock().device_info.push_back(reply);
    }

    pub fn push_status(&self, reply: Result<StatusSnapshot>) {
        self.lock().status.push_back(reply);
    }

    pub fn push_history(&self, reply: Result<HistoryWindow>) {
        self.lock().history.push_back(reply);
    }

    /// Calls made so far, in order.
    pub fn calls(&self) -> Vec<RequestKind> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        // A panicking test thread must not hide the script from the others.
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn reply<T>(
        &self,
        kind: RequestKind,
        next: impl FnOnce(&mut Script) -> Option<Result<T>>,
    ) -> Result<T> {
        let (reply, delay) = {
            let mut script = self.lock();
            script.calls.push(kind);
            (next(&mut script), script.delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        reply.unwrap_or(Err(ExporterError::Timeout { request: kind }))
    }
}

impl DishClient for FakeDish {
    async fn device_info(&mut self) -> Result<DeviceInfo> {
        self.reply(RequestKind::DeviceInfo, |s| s.device_info.pop_front())
            .await
    }

    async fn status(&mut self) -> Result<StatusSnapshot> {
        self.reply(RequestKind::Status, |s| s.status.pop_front()).await
    }

    async fn history(&mut self) -> Result<HistoryWindow> {
        self.reply(RequestKind::History, |s| s.history.pop_front())
            .await
    }
}
