//! Shared test utilities for Wakeful.
//!
//! Fakes for every external collaborator plus small harnesses that wire them
//! together the way the controller does.

#![cfg(test)]

use crate::controller::{ControllerParts, WakeLockController};
use crate::error::WakefulError;
use crate::platform::{Acquisition, LockHandle, Ticket, WakeLockProvider};
use crate::settings::{Settings, SettingsPersistence};
use crate::signals::{Ambient, Signal, SignalBus};
use crate::strategy::{ActivationStrategy, Strategy, StrategyContext, StrategyKind};
use crate::ui::{IndicatorState, NoticeSink, StatusIndicator, WakeLockObserver};
use crate::wake_lock::{ResourceConfig, WakeLockEvent, WakeLockResource};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AcquireMode {
    #[default]
    Grant,
    Deny,
    Pending,
}

/// Observable state behind [`FakeProvider`] and its handles.
#[derive(Debug, Default)]
pub struct FakeBackend {
    pub mode: AcquireMode,
    pub attempts: usize,
    /// Handles granted and not yet released.
    pub live: usize,
    pub fail_release: bool,
    grants: Vec<Rc<Cell<bool>>>,
}

impl FakeBackend {
    /// Simulate the platform dropping every outstanding grant.
    pub fn revoke_all(&mut self) {
        for released in &self.grants {
            if !released.get() {
                released.set(true);
                self.live -= 1;
            }
        }
    }
}

pub struct FakeProvider {
    backend: Rc<RefCell<FakeBackend>>,
    supported: bool,
}

impl FakeProvider {
    pub fn new() -> (Self, Rc<RefCell<FakeBackend>>) {
        let backend = Rc::new(RefCell::new(FakeBackend::default()));
        let provider = Self {
            backend: Rc::clone(&backend),
            supported: true,
        };
        (provider, backend)
    }

    pub fn unsupported() -> (Self, Rc<RefCell<FakeBackend>>) {
        let (mut provider, backend) = Self::new();
        provider.supported = false;
        (provider, backend)
    }

    /// A fresh live handle, as a pending acquisition would deliver it.
    pub fn grant(backend: &Rc<RefCell<FakeBackend>>) -> Box<dyn LockHandle> {
        let released = Rc::new(Cell::new(false));
        {
            let mut state = backend.borrow_mut();
            state.live += 1;
            state.grants.push(Rc::clone(&released));
        }
        Box::new(FakeHandle {
            backend: Rc::clone(backend),
            released,
        })
    }
}

impl WakeLockProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn supported(&self) -> bool {
        self.supported
    }

    fn acquire(&mut self, _ticket: Ticket) -> Acquisition {
        let mode = {
            let mut state = self.backend.borrow_mut();
            state.attempts += 1;
            state.mode
        };
        match mode {
            AcquireMode::Grant => Acquisition::Granted(Self::grant(&self.backend)),
            AcquireMode::Deny => Acquisition::Denied(WakefulError::AcquisitionFailed {
                reason: "denied by fake".into(),
            }),
            AcquireMode::Pending => Acquisition::Pending,
        }
    }
}

struct FakeHandle {
    backend: Rc<RefCell<FakeBackend>>,
    released: Rc<Cell<bool>>,
}

impl LockHandle for FakeHandle {
    fn release(&mut self) -> Result<(), WakefulError> {
        let mut state = self.backend.borrow_mut();
        if state.fail_release {
            return Err(WakefulError::ReleaseFailed {
                reason: "release refused by fake".into(),
            });
        }
        if !self.released.get() {
            self.released.set(true);
            state.live -= 1;
        }
        Ok(())
    }

    fn is_released(&self) -> bool {
        self.released.get()
    }
}

pub fn fake_resource() -> (WakeLockResource, Rc<RefCell<FakeBackend>>) {
    fake_resource_with(ResourceConfig::default())
}

pub fn fake_resource_with(config: ResourceConfig) -> (WakeLockResource, Rc<RefCell<FakeBackend>>) {
    let (provider, backend) = FakeProvider::new();
    let lock = WakeLockResource::new(Box::new(provider), config)
        .expect("fake provider is supported");
    (lock, backend)
}

/// A strategy wired to a fake lock and bus, delivering signals the way the
/// controller does.
pub struct StrategyHarness {
    pub lock: WakeLockResource,
    pub backend: Rc<RefCell<FakeBackend>>,
    pub bus: SignalBus,
    pub ambient: Ambient,
    pub strategy: Strategy,
    pub delay: Duration,
}

impl StrategyHarness {
    pub fn new(kind: StrategyKind) -> Self {
        let (lock, backend) = fake_resource();
        let ambient = Ambient::default();
        let delay = Duration::from_secs(5);
        Self {
            lock,
            backend,
            bus: SignalBus::new(),
            strategy: Strategy::new(kind, delay, &ambient),
            ambient,
            delay,
        }
    }

    /// Recreate the strategy so it picks up a modified `ambient`.
    pub fn rebuild(&mut self) {
        self.strategy = Strategy::new(self.strategy.kind(), self.delay, &self.ambient);
    }

    pub fn enable(&mut self, now: Instant) {
        self.with_ctx(now, |strategy, ctx| strategy.enable(ctx));
    }

    pub fn disable(&mut self, now: Instant) {
        self.with_ctx(now, |strategy, ctx| strategy.disable(ctx));
    }

    pub fn signal(&mut self, signal: Signal, now: Instant) {
        self.ambient.apply(&signal);
        if self.strategy.is_attached() && self.bus.is_subscribed(signal.kind()) {
            self.with_ctx(now, |strategy, ctx| strategy.on_signal(&signal, ctx));
        }
    }

    pub fn poll(&mut self, now: Instant) {
        self.with_ctx(now, |strategy, ctx| strategy.poll(ctx));
        self.lock.poll(now);
    }

    /// Disable the current strategy and enable a fresh one of `kind`.
    pub fn swap(&mut self, kind: StrategyKind, now: Instant) {
        self.disable(now);
        self.strategy = Strategy::new(kind, self.delay, &self.ambient);
        self.enable(now);
    }

    pub fn drain(&mut self) -> Vec<WakeLockEvent> {
        self.lock.drain_events()
    }

    pub fn strategy_dialog_open(&self) -> bool {
        match &self.strategy {
            Strategy::Always(_) | Strategy::EditorTyping(_) => false,
            Strategy::EditorFocused(s) => s.settings_dialog_open(),
        }
    }

    pub fn has_pending_typing_request(&self) -> bool {
        match &self.strategy {
            Strategy::EditorTyping(s) => s.has_pending_request(),
            Strategy::Always(_) | Strategy::EditorFocused(_) => false,
        }
    }

    fn with_ctx<F>(&mut self, now: Instant, f: F)
    where
        F: FnOnce(&mut Strategy, &mut StrategyContext<'_>),
    {
        let mut ctx = StrategyContext {
            lock: &mut self.lock,
            bus: &mut self.bus,
            ambient: &self.ambient,
            now,
        };
        f(&mut self.strategy, &mut ctx);
    }
}

#[derive(Debug, Default)]
pub struct MemoryState {
    pub stored: Option<Settings>,
    pub saves: usize,
    pub fail_saves: bool,
}

/// In-memory [`SettingsPersistence`].
pub struct MemorySettings {
    state: Rc<RefCell<MemoryState>>,
}

impl MemorySettings {
    pub fn empty() -> (Self, Rc<RefCell<MemoryState>>) {
        let state = Rc::new(RefCell::new(MemoryState::default()));
        (
            Self {
                state: Rc::clone(&state),
            },
            state,
        )
    }

    pub fn with(settings: Settings) -> (Self, Rc<RefCell<MemoryState>>) {
        let (persistence, state) = Self::empty();
        state.borrow_mut().stored = Some(settings);
        (persistence, state)
    }
}

impl SettingsPersistence for MemorySettings {
    fn load(&self) -> Result<Option<Settings>, WakefulError> {
        Ok(self.state.borrow().stored.clone())
    }

    fn save(&mut self, settings: &Settings) -> Result<(), WakefulError> {
        let mut state = self.state.borrow_mut();
        if state.fail_saves {
            return Err(std::io::Error::other("disk full").into());
        }
        state.stored = Some(settings.clone());
        state.saves += 1;
        Ok(())
    }
}

pub struct RecordingNotices {
    messages: Rc<RefCell<Vec<String>>>,
}

impl RecordingNotices {
    pub fn new() -> (Self, Rc<RefCell<Vec<String>>>) {
        let messages = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                messages: Rc::clone(&messages),
            },
            messages,
        )
    }
}

impl NoticeSink for RecordingNotices {
    fn notice(&mut self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

#[derive(Debug, Default)]
pub struct IndicatorLog {
    pub states: Vec<IndicatorState>,
    pub visible: Option<bool>,
}

impl IndicatorLog {
    pub fn last(&self) -> Option<IndicatorState> {
        self.states.last().copied()
    }
}

pub struct RecordingIndicator {
    log: Rc<RefCell<IndicatorLog>>,
}

impl RecordingIndicator {
    pub fn new() -> (Self, Rc<RefCell<IndicatorLog>>) {
        let log = Rc::new(RefCell::new(IndicatorLog::default()));
        (
            Self {
                log: Rc::clone(&log),
            },
            log,
        )
    }
}

impl StatusIndicator for RecordingIndicator {
    fn set_state(&mut self, state: IndicatorState) {
        self.log.borrow_mut().states.push(state);
    }

    fn set_visible(&mut self, visible: bool) {
        self.log.borrow_mut().visible = Some(visible);
    }
}

pub struct RecordingObserver {
    events: Rc<RefCell<Vec<WakeLockEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> (Self, Rc<RefCell<Vec<WakeLockEvent>>>) {
        let events = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                events: Rc::clone(&events),
            },
            events,
        )
    }
}

impl WakeLockObserver for RecordingObserver {
    fn on_event(&mut self, event: &WakeLockEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

/// Handles onto everything a controller under test talks to.
pub struct ControllerFakes {
    pub backend: Rc<RefCell<FakeBackend>>,
    pub saved: Rc<RefCell<MemoryState>>,
    pub indicator: Rc<RefCell<IndicatorLog>>,
    pub notices: Rc<RefCell<Vec<String>>>,
    pub events: Rc<RefCell<Vec<WakeLockEvent>>>,
}

/// Start a controller on fakes. `stored` is what persistence returns on load.
pub fn start_controller(
    stored: Option<Settings>,
    now: Instant,
) -> (WakeLockController, ControllerFakes) {
    let (provider, backend) = FakeProvider::new();
    let (persistence, saved) = match stored {
        Some(settings) => MemorySettings::with(settings),
        None => MemorySettings::empty(),
    };
    let (indicator_sink, indicator) = RecordingIndicator::new();
    let (notice_sink, notices) = RecordingNotices::new();
    let (observer, events) = RecordingObserver::new();

    let parts = ControllerParts {
        provider: Box::new(provider),
        persistence: Box::new(persistence),
        indicator: Box::new(indicator_sink),
        notices: Box::new(notice_sink),
    };
    let mut controller =
        WakeLockController::start(parts, ResourceConfig::default(), Ambient::default(), now)
            .expect("controller starts on a supported fake");
    controller.observe(Box::new(observer));

    let fakes = ControllerFakes {
        backend,
        saved,
        indicator,
        notices,
        events,
    };
    (controller, fakes)
}

pub struct UnsupportedStart {
    pub result: Result<WakeLockController, WakefulError>,
    pub indicator: Rc<RefCell<IndicatorLog>>,
    pub notices: Rc<RefCell<Vec<String>>>,
}

pub fn start_unsupported() -> UnsupportedStart {
    let (provider, _backend) = FakeProvider::unsupported();
    let (persistence, _saved) = MemorySettings::empty();
    let (indicator_sink, indicator) = RecordingIndicator::new();
    let (notice_sink, notices) = RecordingNotices::new();

    let parts = ControllerParts {
        provider: Box::new(provider),
        persistence: Box::new(persistence),
        indicator: Box::new(indicator_sink),
        notices: Box::new(notice_sink),
    };
    let result =
        WakeLockController::start(parts, ResourceConfig::default(), Ambient::default(), Instant::now());
    UnsupportedStart {
        result,
        indicator,
        notices,
    }
}
