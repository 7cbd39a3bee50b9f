//! Coalescing of rapid configuration changes.
//!
//! [`Debouncer`] is a plain state machine with no timer of its own: the owner
//! pushes values, sleeps until [`Debouncer::deadline`], then calls
//! [`Debouncer::poll`]. The first push after a flush starts the window; later
//! pushes only replace the value, so a burst yields one flush of its last
//! value and a steady stream of changes is still written once per window.

use std::time::Duration;

use tokio::time::Instant;

/// Latest pending value plus the instant it becomes due.
#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<T>,
    deadline: Option<Instant>,
}

impl<T> Debouncer<T> {
    /// Empty debouncer with the given window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            deadline: None,
        }
    }

    /// Replace the pending value, starting the window if none is running.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some(value);
        let _ = self.deadline.get_or_insert(now + self.window);
    }

    /// When the pending value becomes due, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether a value is waiting.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending value if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if deadline <= now => self.drain(),
            _ => None,
        }
    }

    /// Take the pending value regardless of the deadline.
    pub fn drain(&mut self) -> Option<T> {
        self.deadline = None;
        self.pending.take()
    }
}
