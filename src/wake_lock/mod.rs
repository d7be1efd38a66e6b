//! The single screen wake lock of the process.
//!
//! [`WakeLockResource`] wraps a [`WakeLockProvider`] and guarantees that at
//! most one [`LockHandle`] is live. Requests and releases are debounced with
//! [`ScheduledTask`]s; the newest intent supersedes a pending task of the
//! opposite kind. All failures are turned into [`WakeLockEvent::Error`]
//! events, nothing is returned to the caller.

use crate::constants::{RELEASE_DEBOUNCE, REQUEST_DEBOUNCE};
use crate::error::WakefulError;
use crate::platform::{Acquisition, LockHandle, Ticket, WakeLockProvider};
use crate::schedule::{earliest, ScheduledTask};
use log::{debug, error, info, warn};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WakeLockEvent {
    Request,
    Release,
    Error { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceConfig {
    pub request_debounce: Duration,
    pub release_debounce: Duration,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            request_debounce: REQUEST_DEBOUNCE,
            release_debounce: RELEASE_DEBOUNCE,
        }
    }
}

pub struct WakeLockResource {
    provider: Box<dyn WakeLockProvider>,
    current: Option<(Ticket, Box<dyn LockHandle>)>,
    /// Acquisition started but not yet completed.
    pending: Option<Ticket>,
    next_ticket: Ticket,
    /// Last intent expressed through `request`/`release`.
    wanted: bool,
    request_task: ScheduledTask,
    release_task: ScheduledTask,
    events: Vec<WakeLockEvent>,
}

impl WakeLockResource {
    pub fn new(
        provider: Box<dyn WakeLockProvider>,
        config: ResourceConfig,
    ) -> Result<Self, WakefulError> {
        if !provider.supported() {
            warn!("{} wake lock provider is not supported", provider.name());
            return Err(WakefulError::Unsupported);
        }
        info!("using {} wake lock provider", provider.name());

        Ok(Self {
            provider,
            current: None,
            pending: None,
            next_ticket: 1,
            wanted: false,
            request_task: ScheduledTask::new(config.request_debounce),
            release_task: ScheduledTask::new(config.release_debounce),
            events: Vec::new(),
        })
    }

    /// Whether a live handle is currently held.
    pub fn active(&self) -> bool {
        matches!(&self.current, Some((_, handle)) if !handle.is_released())
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Ask for the lock. Bursts collapse into one acquisition attempt.
    pub fn request(&mut self, now: Instant) {
        self.detect_autonomous_release();
        self.wanted = true;
        if self.release_task.cancel() {
            debug!("pending release superseded by request");
        }
        if self.current.is_some() || self.pending.is_some() {
            debug!("already requested.");
            return;
        }
        self.request_task.arm(now);
    }

    /// Give the lock back after the release debounce window.
    pub fn release(&mut self, now: Instant) {
        self.detect_autonomous_release();
        self.wanted = false;
        if self.request_task.cancel() {
            debug!("pending request superseded by release");
        }
        if self.current.is_none() {
            debug!("not requested or already released.");
            return;
        }
        self.release_task.arm(now);
    }

    /// Cancel anything scheduled and release the live handle before returning.
    pub fn release_now(&mut self) {
        self.wanted = false;
        self.request_task.cancel();
        self.release_task.cancel();
        self.release_current();
    }

    /// Drive due tasks. Call at [`next_deadline`](Self::next_deadline) or later.
    pub fn poll(&mut self, now: Instant) {
        self.detect_autonomous_release();

        if self.release_task.fire_if_due(now) {
            self.release_current();
        }
        if self.request_task.fire_if_due(now) {
            self.acquire();
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        earliest(self.request_task.deadline(), self.release_task.deadline())
    }

    /// Completion of an acquisition the provider reported as pending.
    pub fn complete_acquisition(
        &mut self,
        ticket: Ticket,
        result: Result<Box<dyn LockHandle>, WakefulError>,
    ) {
        if self.pending != Some(ticket) {
            debug!("ignoring stale acquisition #{ticket}");
            if let Ok(mut handle) = result {
                if let Err(e) = handle.release() {
                    warn!("failed to release stale handle #{ticket}: {e}");
                }
            }
            return;
        }
        self.pending = None;

        match result {
            Ok(mut handle) if !self.wanted => {
                debug!("acquisition #{ticket} superseded by release, giving it back");
                if let Err(e) = handle.release() {
                    warn!("failed to release superseded handle #{ticket}: {e}");
                }
            }
            Ok(handle) => self.install(ticket, handle),
            Err(e) => self.report_failure(&e),
        }
    }

    /// The platform revoked the handle identified by `ticket` on its own.
    pub fn handle_released(&mut self, ticket: Ticket) {
        match &self.current {
            Some((live, _)) if *live == ticket => {
                self.current = None;
                self.release_task.cancel();
                debug!("released!");
                self.events.push(WakeLockEvent::Release);
            }
            Some(_) | None => debug!("release notification for unknown handle #{ticket}"),
        }
    }

    /// Forces the lock off and forgets any pending acquisition.
    pub fn shutdown(&mut self) {
        self.release_now();
        if let Some(ticket) = self.pending.take() {
            debug!("dropping pending acquisition #{ticket} on shutdown");
        }
    }

    pub fn drain_events(&mut self) -> Vec<WakeLockEvent> {
        std::mem::take(&mut self.events)
    }

    fn acquire(&mut self) {
        self.detect_autonomous_release();
        // Re-validate: the world may have changed since the task was armed.
        if !self.wanted || self.current.is_some() || self.pending.is_some() {
            debug!("already requested.");
            return;
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        debug!("requesting #{ticket}...");

        match self.provider.acquire(ticket) {
            Acquisition::Granted(handle) => self.install(ticket, handle),
            Acquisition::Denied(e) => self.report_failure(&e),
            Acquisition::Pending => self.pending = Some(ticket),
        }
    }

    fn install(&mut self, ticket: Ticket, handle: Box<dyn LockHandle>) {
        if handle.is_released() {
            debug!("handle #{ticket} was revoked before it was installed");
            return;
        }
        self.current = Some((ticket, handle));
        self.events.push(WakeLockEvent::Request);
    }

    fn release_current(&mut self) {
        let Some((ticket, mut handle)) = self.current.take() else {
            debug!("not requested or already released.");
            return;
        };

        match handle.release() {
            Ok(()) => {
                debug!("released!");
                self.events.push(WakeLockEvent::Release);
            }
            Err(e) => {
                error!("{e}");
                self.events.push(WakeLockEvent::Error {
                    reason: e.to_string(),
                });
                self.current = Some((ticket, handle));
            }
        }
    }

    fn detect_autonomous_release(&mut self) {
        let revoked = matches!(&self.current, Some((_, handle)) if handle.is_released());
        if revoked {
            self.current = None;
            self.release_task.cancel();
            debug!("released by the system!");
            self.events.push(WakeLockEvent::Release);
        }
    }

    fn report_failure(&mut self, e: &WakefulError) {
        if e.is_transient() {
            warn!("{e}");
        } else {
            error!("{e}");
        }
        self.events.push(WakeLockEvent::Error {
            reason: e.to_string(),
        });
    }
}
