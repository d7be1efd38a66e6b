//! Cancellable one-shot timers used for debouncing.
//!
//! A [`ScheduledTask`] never runs anything by itself: the owner arms it,
//! and on each poll asks whether it is due. Re-arming pushes the deadline
//! back, which is what turns a burst of calls into a single firing.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct ScheduledTask {
    delay: Duration,
    deadline: Option<Instant>,
}

impl ScheduledTask {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)arm the task to fire `delay` after `now`, superseding any pending firing.
    pub fn arm(&mut self, now: Instant) {
        let deadline = now.checked_add(self.delay).unwrap_or(now);
        self.deadline = Some(deadline);
    }

    /// Cancel a pending firing. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true exactly once when the deadline has passed, disarming the task.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            Some(_) | None => false,
        }
    }
}

/// Earliest of two optional deadlines.
pub fn earliest(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}
