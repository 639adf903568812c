//! Test doubles shared by the session and scheduler tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::scheduler::{SessionEvent, TimerHandle, TimerService};

#[derive(Debug, Default)]
struct Timers {
    next: u64,
    pending: Vec<(TimerHandle, Duration, SessionEvent)>,
    cancelled: Vec<TimerHandle>,
}

/// Timers that only fire when a test says so. Clones share state, so a test
/// can keep one handle while the session owns another.
#[derive(Clone, Debug, Default)]
pub struct ManualTimers {
    inner: Rc<RefCell<Timers>>,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Vec<(TimerHandle, Duration, SessionEvent)> {
        self.inner.borrow().pending.clone()
    }

    pub fn cancelled(&self) -> Vec<TimerHandle> {
        self.inner.borrow().cancelled.clone()
    }

    /// Removes and returns the first pending event matching `predicate`, as
    /// though its timer had just fired.
    pub fn fire(&self, predicate: impl Fn(&SessionEvent) -> bool) -> Option<SessionEvent> {
        let mut inner = self.inner.borrow_mut();
        let index = inner
            .pending
            .iter()
            .position(|(_, _, event)| predicate(event))?;
        Some(inner.pending.remove(index).2)
    }

    pub fn fire_round_elapsed(&self) -> Option<SessionEvent> {
        self.fire(|event| matches!(event, SessionEvent::RoundElapsed { .. }))
    }

    pub fn fire_auto_advance(&self) -> Option<SessionEvent> {
        self.fire(|event| matches!(event, SessionEvent::AutoAdvance { .. }))
    }

    pub fn fire_hint_expired(&self) -> Option<SessionEvent> {
        self.fire(|event| matches!(event, SessionEvent::HintExpired { .. }))
    }
}

impl TimerService for ManualTimers {
    fn schedule(&mut self, after: Duration, event: SessionEvent) -> TimerHandle {
        let mut inner = self.inner.borrow_mut();
        let handle = TimerHandle(inner.next);
        inner.next += 1;
        inner.pending.push((handle, after, event));
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        let mut inner = self.inner.borrow_mut();
        let before = inner.pending.len();
        inner.pending.retain(|(pending, _, _)| *pending != handle);
        if inner.pending.len() != before {
            inner.cancelled.push(handle);
        }
    }
}
