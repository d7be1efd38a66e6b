use super::{ActivationStrategy, StrategyContext, StrategyKind, Watchers};
use crate::signals::{Ambient, Signal, SignalBus, SignalKind};
use log::{debug, info};

const SIGNALS: &[SignalKind] = &[
    SignalKind::Visibility,
    SignalKind::WindowFocus,
    SignalKind::Orientation,
    SignalKind::ActiveView,
    SignalKind::DialogPresence,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DialogTransition {
    Opened,
    Closed,
    Unchanged,
}

/// Holds the lock while an editing view is active in a visible window and no
/// settings dialog is open.
#[derive(Debug)]
pub struct EditorFocusedStrategy {
    watchers: Watchers,
    settings_dialog_open: bool,
}

impl EditorFocusedStrategy {
    pub fn new(ambient: &Ambient) -> Self {
        Self::with_signals(SIGNALS, ambient)
    }

    pub(super) fn with_signals(kinds: &'static [SignalKind], ambient: &Ambient) -> Self {
        Self {
            watchers: Watchers::new(kinds),
            settings_dialog_open: ambient.settings_dialog_open,
        }
    }

    pub fn settings_dialog_open(&self) -> bool {
        self.settings_dialog_open
    }

    /// Dialog first, then visibility, then the active view.
    pub fn should_hold(&self, ambient: &Ambient) -> bool {
        !self.settings_dialog_open && ambient.visible && ambient.editor_active
    }

    pub(super) fn track_dialog(&mut self, open: bool) -> DialogTransition {
        match (self.settings_dialog_open, open) {
            (false, true) => {
                debug!("settings window opened");
                self.settings_dialog_open = true;
                DialogTransition::Opened
            }
            (true, false) => {
                debug!("settings window closed");
                self.settings_dialog_open = false;
                DialogTransition::Closed
            }
            (false, false) | (true, true) => DialogTransition::Unchanged,
        }
    }

    fn evaluate(&self, ctx: &mut StrategyContext<'_>) {
        if self.should_hold(ctx.ambient) {
            ctx.lock.request(ctx.now);
        } else {
            ctx.lock.release(ctx.now);
        }
    }
}

impl ActivationStrategy for EditorFocusedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::EditorActive
    }

    fn is_attached(&self) -> bool {
        self.watchers.is_attached()
    }

    fn attach(&mut self, bus: &mut SignalBus) {
        self.watchers.attach(bus);
    }

    fn detach(&mut self, bus: &mut SignalBus) {
        self.watchers.detach(bus);
    }

    fn enable(&mut self, ctx: &mut StrategyContext<'_>) {
        info!("enable active editor view strategy");
        self.attach(ctx.bus);
        self.track_dialog(ctx.ambient.settings_dialog_open);
        self.evaluate(ctx);
    }

    fn disable(&mut self, ctx: &mut StrategyContext<'_>) {
        info!("disable active editor view strategy");
        ctx.lock.release_now();
        self.detach(ctx.bus);
    }

    fn on_signal(&mut self, signal: &Signal, ctx: &mut StrategyContext<'_>) {
        match signal {
            Signal::SettingsDialog { open } => match self.track_dialog(*open) {
                DialogTransition::Opened => ctx.lock.release(ctx.now),
                DialogTransition::Closed => self.evaluate(ctx),
                DialogTransition::Unchanged => {}
            },
            Signal::VisibilityChanged(_)
            | Signal::WindowFocused
            | Signal::OrientationChanged
            | Signal::ActiveViewChanged { .. } => self.evaluate(ctx),
            Signal::WindowBlurred | Signal::EditorChanged => {}
        }
    }
}
