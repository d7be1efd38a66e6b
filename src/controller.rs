//! Glue between settings, the active strategy, the wake lock and the UI.
//!
//! Exactly one strategy exists at a time. It is attached only while the
//! plugin is enabled, and a swap always disables the old strategy (lock
//! released, listeners removed) before the new one is enabled.

use crate::constants::APP_NAME;
use crate::error::WakefulError;
use crate::logging;
use crate::platform::{LockHandle, Ticket, WakeLockProvider};
use crate::schedule::earliest;
use crate::settings::{Settings, SettingsChange, SettingsPersistence, SettingsStore};
use crate::signals::{Ambient, Signal, SignalBus, SignalKind};
use crate::strategy::{ActivationStrategy, Strategy, StrategyContext, StrategyKind};
use crate::ui::{IndicatorState, NoticeSink, Notifier, StatusIndicator, WakeLockObserver};
use crate::wake_lock::{ResourceConfig, WakeLockEvent, WakeLockResource};
use log::{debug, info, warn};
use std::time::Instant;

/// External collaborators handed to the controller at start-up.
pub struct ControllerParts {
    pub provider: Box<dyn WakeLockProvider>,
    pub persistence: Box<dyn SettingsPersistence>,
    pub indicator: Box<dyn StatusIndicator>,
    pub notices: Box<dyn NoticeSink>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerState {
    pub enabled: bool,
    pub strategy: StrategyKind,
    pub lock_active: bool,
    pub indicator: IndicatorState,
    pub subscriptions: Vec<SignalKind>,
}

pub struct WakeLockController {
    settings: SettingsStore,
    lock: WakeLockResource,
    strategy: Strategy,
    bus: SignalBus,
    ambient: Ambient,
    indicator: Box<dyn StatusIndicator>,
    indicator_state: IndicatorState,
    notifier: Notifier,
    observers: Vec<Box<dyn WakeLockObserver>>,
}

impl WakeLockController {
    /// Build the controller and enable the configured strategy.
    ///
    /// An unsupported provider posts a one-time notice, shows the indicator
    /// as disabled and fails with [`WakefulError::Unsupported`].
    pub fn start(
        parts: ControllerParts,
        config: ResourceConfig,
        ambient: Ambient,
        now: Instant,
    ) -> Result<Self, WakefulError> {
        let ControllerParts {
            provider,
            persistence,
            mut indicator,
            notices,
        } = parts;
        let mut notifier = Notifier::new(notices, true);

        let lock = match WakeLockResource::new(provider, config) {
            Ok(lock) => lock,
            Err(e) => {
                notifier.notify_always(&format!("{APP_NAME} not supported, disabling plugin."));
                indicator.set_state(IndicatorState::Disabled);
                return Err(e);
            }
        };

        let settings = SettingsStore::load(persistence)?;
        let current = settings.settings();
        logging::set_dev_mode(current.dev_mode);
        notifier.set_show(current.show_notifications);
        indicator.set_visible(current.show_in_status_bar);

        let indicator_state = if current.enabled {
            IndicatorState::Off
        } else {
            IndicatorState::Disabled
        };
        indicator.set_state(indicator_state);

        info!("{} strategy selected", current.strategy);
        let strategy = Strategy::new(current.strategy, current.delay(), &ambient);
        let enabled = current.enabled;

        let mut controller = Self {
            settings,
            lock,
            strategy,
            bus: SignalBus::new(),
            ambient,
            indicator,
            indicator_state,
            notifier,
            observers: Vec::new(),
        };
        if enabled {
            controller.with_strategy(now, |strategy, ctx| strategy.enable(ctx));
        }
        Ok(controller)
    }

    pub fn observe(&mut self, observer: Box<dyn WakeLockObserver>) {
        self.observers.push(observer);
    }

    pub fn settings(&self) -> &Settings {
        self.settings.settings()
    }

    pub fn ambient(&self) -> &Ambient {
        &self.ambient
    }

    pub fn bus(&self) -> &SignalBus {
        &self.bus
    }

    pub fn lock_active(&self) -> bool {
        self.lock.active()
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    pub fn is_attached(&self) -> bool {
        self.strategy.is_attached()
    }

    pub fn state(&self) -> ControllerState {
        ControllerState {
            enabled: self.settings().enabled,
            strategy: self.strategy.kind(),
            lock_active: self.lock.active(),
            indicator: self.indicator_state,
            subscriptions: self.bus.subscribed_kinds(),
        }
    }

    /// Record the signal and hand it to the strategy if it listens for it.
    pub fn handle_signal(&mut self, signal: Signal, now: Instant) {
        self.ambient.apply(&signal);

        if !self.strategy.is_attached() || !self.bus.is_subscribed(signal.kind()) {
            debug!("no listener for {:?}", signal.kind());
            return;
        }
        self.with_strategy(now, |strategy, ctx| strategy.on_signal(&signal, ctx));
    }

    /// Fire whatever is due. Call at [`next_deadline`](Self::next_deadline) or later.
    pub fn poll(&mut self, now: Instant) {
        self.with_strategy(now, |strategy, ctx| {
            if strategy.is_attached() {
                strategy.poll(ctx);
            }
            ctx.lock.poll(ctx.now);
        });
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        earliest(self.strategy.next_deadline(), self.lock.next_deadline())
    }

    pub fn complete_acquisition(
        &mut self,
        ticket: Ticket,
        result: Result<Box<dyn LockHandle>, WakefulError>,
    ) {
        self.lock.complete_acquisition(ticket, result);
        self.dispatch_events();
    }

    pub fn handle_released(&mut self, ticket: Ticket) {
        self.lock.handle_released(ticket);
        self.dispatch_events();
    }

    pub fn toggle(&mut self, now: Instant) -> Result<(), WakefulError> {
        let enabled = !self.settings().enabled;
        self.set_enabled(enabled, now)
    }

    pub fn set_enabled(&mut self, enabled: bool, now: Instant) -> Result<(), WakefulError> {
        let change = self.settings.set_enabled(enabled)?;
        self.apply(change, now);
        Ok(())
    }

    pub fn set_strategy(&mut self, kind: StrategyKind, now: Instant) -> Result<(), WakefulError> {
        let change = self.settings.set_strategy(kind)?;
        self.apply(change, now);
        Ok(())
    }

    pub fn set_delay_secs(&mut self, delay: f64, now: Instant) -> Result<(), WakefulError> {
        let change = self.settings.set_delay_secs(delay)?;
        self.apply(change, now);
        Ok(())
    }

    pub fn set_show_in_status_bar(&mut self, show: bool, now: Instant) -> Result<(), WakefulError> {
        let change = self.settings.set_show_in_status_bar(show)?;
        self.apply(change, now);
        Ok(())
    }

    pub fn set_show_notifications(&mut self, show: bool, now: Instant) -> Result<(), WakefulError> {
        let change = self.settings.set_show_notifications(show)?;
        self.apply(change, now);
        Ok(())
    }

    pub fn set_dev_mode(&mut self, dev_mode: bool, now: Instant) -> Result<(), WakefulError> {
        let change = self.settings.set_dev_mode(dev_mode)?;
        self.apply(change, now);
        Ok(())
    }

    /// Re-read persisted settings and apply every field that differs.
    ///
    /// The whole record is adopted at once; a failed save leaves both the
    /// file and the running state untouched.
    pub fn reload_settings(&mut self, now: Instant) -> Result<(), WakefulError> {
        let persisted = self.settings.read_persisted()?;
        for change in self.settings.replace(persisted)? {
            self.apply(Some(change), now);
        }
        Ok(())
    }

    /// Tear down: detach the strategy and force the lock off.
    pub fn shutdown(&mut self, now: Instant) {
        info!("shutting down");
        self.with_strategy(now, |strategy, ctx| {
            strategy.disable(ctx);
            ctx.lock.shutdown();
        });
    }

    fn apply(&mut self, change: Option<SettingsChange>, now: Instant) {
        let Some(change) = change else {
            return;
        };
        debug!("settings changed: {change:?}");

        match change {
            SettingsChange::Enabled(true) => {
                self.notifier.notify(&format!("{APP_NAME} enabled!"));
                self.set_indicator(IndicatorState::Off);
                self.with_strategy(now, |strategy, ctx| strategy.enable(ctx));
            }
            SettingsChange::Enabled(false) => {
                self.notifier.notify(&format!("{APP_NAME} disabled!"));
                self.with_strategy(now, |strategy, ctx| strategy.disable(ctx));
                self.set_indicator(IndicatorState::Disabled);
            }
            SettingsChange::Strategy(_) => self.rebuild_strategy(now),
            SettingsChange::Delay(_) => {
                if self.strategy.kind().uses_delay() {
                    self.rebuild_strategy(now);
                }
            }
            SettingsChange::ShowInStatusBar(show) => self.indicator.set_visible(show),
            SettingsChange::ShowNotifications(show) => self.notifier.set_show(show),
            SettingsChange::DevMode(dev_mode) => logging::set_dev_mode(dev_mode),
        }
    }

    /// Replace the strategy from current settings. An attached strategy is
    /// fully disabled before the new one is enabled.
    fn rebuild_strategy(&mut self, now: Instant) {
        if self.strategy.is_attached() {
            debug!("detach old strategy and set new one");
            self.with_strategy(now, |strategy, ctx| strategy.disable(ctx));
        }

        let current = self.settings.settings();
        self.strategy = Strategy::new(current.strategy, current.delay(), &self.ambient);

        if current.enabled {
            self.with_strategy(now, |strategy, ctx| strategy.enable(ctx));
        }
    }

    fn with_strategy<F>(&mut self, now: Instant, f: F)
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
        self.dispatch_events();
    }

    fn dispatch_events(&mut self) {
        for event in self.lock.drain_events() {
            match &event {
                WakeLockEvent::Request => {
                    self.notifier.notify(&format!("{APP_NAME} on."));
                    self.set_indicator(IndicatorState::On);
                }
                WakeLockEvent::Release => {
                    let state = if self.settings().enabled {
                        IndicatorState::Off
                    } else {
                        IndicatorState::Disabled
                    };
                    self.set_indicator(state);
                }
                WakeLockEvent::Error { reason } => {
                    warn!("wake lock error: {reason}");
                    self.notifier.notify(&format!("{APP_NAME} request failed."));
                }
            }
            for observer in &mut self.observers {
                observer.on_event(&event);
            }
        }
    }

    fn set_indicator(&mut self, state: IndicatorState) {
        self.indicator_state = state;
        self.indicator.set_state(state);
    }
}
