use super::{ActivationStrategy, StrategyContext, StrategyKind, Watchers};
use crate::signals::{Signal, SignalBus, SignalKind};
use log::{debug, info};

const SIGNALS: &[SignalKind] = &[
    SignalKind::Visibility,
    SignalKind::WindowFocus,
    SignalKind::Orientation,
];

/// Holds the lock whenever the host window is visible.
#[derive(Debug)]
pub struct AlwaysStrategy {
    watchers: Watchers,
}

impl AlwaysStrategy {
    pub fn new() -> Self {
        Self {
            watchers: Watchers::new(SIGNALS),
        }
    }

    fn evaluate(ctx: &mut StrategyContext<'_>) {
        if ctx.ambient.visible {
            ctx.lock.request(ctx.now);
        } else {
            ctx.lock.release(ctx.now);
        }
    }
}

impl Default for AlwaysStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivationStrategy for AlwaysStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Always
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
        info!("enable always strategy");
        self.attach(ctx.bus);
        Self::evaluate(ctx);
    }

    fn disable(&mut self, ctx: &mut StrategyContext<'_>) {
        info!("disable always strategy");
        ctx.lock.release_now();
        self.detach(ctx.bus);
    }

    fn on_signal(&mut self, signal: &Signal, ctx: &mut StrategyContext<'_>) {
        match signal {
            Signal::VisibilityChanged(visibility) => {
                debug!("visibilityChange -> {visibility:?}");
                Self::evaluate(ctx);
            }
            Signal::WindowFocused | Signal::OrientationChanged => Self::evaluate(ctx),
            Signal::WindowBlurred
            | Signal::ActiveViewChanged { .. }
            | Signal::EditorChanged
            | Signal::SettingsDialog { .. } => {}
        }
    }
}
