//! Single-slot debounce timer.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use super::TrackerMessage;

/// Posts [`TrackerMessage::FlushDue`] once the delay passes without a re-arm.
///
/// Arming aborts the previous timer, so at most one is ever pending.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    timer: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub const fn new(delay: Duration) -> Self {
        Self { delay, timer: None }
    }

    pub const fn delay(&self) -> Duration {
        self.delay
    }

    pub const fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    pub fn arm(&mut self, messages: &UnboundedSender<TrackerMessage>) {
        self.cancel();

        let messages = messages.clone();
        let delay = self.delay;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = messages.send(TrackerMessage::FlushDue);
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.timer.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
