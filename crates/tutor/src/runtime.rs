use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::scheduler::{SessionEvent, TimerHandle, TimerService};

/// Timers as sleeping tokio tasks that post their event into the session's
/// channel. Must be used inside a tokio runtime.
pub struct TokioTimers {
    events: UnboundedSender<SessionEvent>,
    next: u64,
    tasks: HashMap<TimerHandle, JoinHandle<()>>,
}

impl TokioTimers {
    pub fn new(events: UnboundedSender<SessionEvent>) -> Self {
        Self {
            events,
            next: 0,
            tasks: HashMap::new(),
        }
    }

    /// Timers scheduled and neither fired nor cancelled.
    pub fn pending(&self) -> usize {
        self.tasks.values().filter(|task| !task.is_finished()).count()
    }
}

impl TimerService for TokioTimers {
    fn schedule(&mut self, after: Duration, event: SessionEvent) -> TimerHandle {
        self.tasks.retain(|_, task| !task.is_finished());
        let handle = TimerHandle(self.next);
        self.next += 1;
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = events.send(event);
        });
        trace!(handle = handle.0, ?after, ?event, "timer armed");
        self.tasks.insert(handle, task);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(task) = self.tasks.remove(&handle) {
            task.abort();
            trace!(handle = handle.0, "timer cancelled");
        }
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}
