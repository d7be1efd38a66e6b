//! Activation strategies decide, from ambient signals, whether the wake lock
//! should be held right now.
//!
//! Each variant implements [`ActivationStrategy`]. Refinements reuse the
//! previous variant by holding it (`EditorTypingStrategy` wraps an
//! `EditorFocusedStrategy`) rather than by inheritance. [`Strategy`] is the
//! tagged union the controller stores.
//!
//! Precedence when signals disagree: an open settings dialog wins over
//! everything, a hidden window wins over the editor view state.

mod always;
mod editor_focused;
mod editor_typing;

pub use always::AlwaysStrategy;
pub use editor_focused::EditorFocusedStrategy;
pub use editor_typing::EditorTypingStrategy;

use crate::error::WakefulError;
use crate::signals::{Ambient, Signal, SignalBus, SignalKind};
use crate::wake_lock::WakeLockResource;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    #[serde(rename = "always")]
    Always,
    #[serde(rename = "editor-active")]
    EditorActive,
    #[serde(rename = "editor-typing")]
    EditorTyping,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Always => "always",
            StrategyKind::EditorActive => "editor-active",
            StrategyKind::EditorTyping => "editor-typing",
        }
    }

    /// Human readable label, as shown in a settings dropdown.
    pub fn label(&self) -> &'static str {
        match self {
            StrategyKind::Always => "Always on",
            StrategyKind::EditorActive => "Editor focus",
            StrategyKind::EditorTyping => "Editor typing",
        }
    }

    /// Whether the activation delay setting affects this strategy.
    pub fn uses_delay(&self) -> bool {
        matches!(self, StrategyKind::EditorTyping)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = WakefulError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(StrategyKind::Always),
            "editor-active" => Ok(StrategyKind::EditorActive),
            "editor-typing" => Ok(StrategyKind::EditorTyping),
            other => Err(WakefulError::InvalidInput {
                field: "strategy",
                reason: format!("unknown strategy '{other}'"),
            }),
        }
    }
}

/// What a strategy may touch while handling a call.
pub struct StrategyContext<'a> {
    pub lock: &'a mut WakeLockResource,
    pub bus: &'a mut SignalBus,
    pub ambient: &'a Ambient,
    pub now: Instant,
}

pub trait ActivationStrategy {
    fn kind(&self) -> StrategyKind;

    fn is_attached(&self) -> bool;

    /// Register signal subscriptions. No-op when already attached.
    fn attach(&mut self, bus: &mut SignalBus);

    /// Unregister signal subscriptions. No-op when not attached.
    fn detach(&mut self, bus: &mut SignalBus);

    /// Attach and evaluate the current state.
    fn enable(&mut self, ctx: &mut StrategyContext<'_>);

    /// Release the lock and detach. Nothing scheduled survives this call.
    fn disable(&mut self, ctx: &mut StrategyContext<'_>);

    fn on_signal(&mut self, signal: &Signal, ctx: &mut StrategyContext<'_>);

    fn poll(&mut self, _ctx: &mut StrategyContext<'_>) {}

    fn next_deadline(&self) -> Option<Instant> {
        None
    }
}

/// Attach/detach bookkeeping shared by every variant.
#[derive(Debug)]
pub struct Watchers {
    kinds: &'static [SignalKind],
    attached: bool,
}

impl Watchers {
    pub fn new(kinds: &'static [SignalKind]) -> Self {
        Self {
            kinds,
            attached: false,
        }
    }

    pub fn kinds(&self) -> &'static [SignalKind] {
        self.kinds
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn attach(&mut self, bus: &mut SignalBus) {
        if self.attached {
            return;
        }
        debug!("attach listeners");
        for kind in self.kinds {
            bus.subscribe(*kind);
        }
        self.attached = true;
    }

    pub fn detach(&mut self, bus: &mut SignalBus) {
        if !self.attached {
            return;
        }
        debug!("detach listeners");
        for kind in self.kinds {
            bus.unsubscribe(*kind);
        }
        self.attached = false;
    }
}

pub enum Strategy {
    Always(AlwaysStrategy),
    EditorFocused(EditorFocusedStrategy),
    EditorTyping(EditorTypingStrategy),
}

impl Strategy {
    pub fn new(kind: StrategyKind, delay: Duration, ambient: &Ambient) -> Self {
        match kind {
            StrategyKind::Always => Strategy::Always(AlwaysStrategy::new()),
            StrategyKind::EditorActive => {
                Strategy::EditorFocused(EditorFocusedStrategy::new(ambient))
            }
            StrategyKind::EditorTyping => {
                Strategy::EditorTyping(EditorTypingStrategy::new(ambient, delay))
            }
        }
    }

    fn inner(&self) -> &dyn ActivationStrategy {
        match self {
            Strategy::Always(s) => s,
            Strategy::EditorFocused(s) => s,
            Strategy::EditorTyping(s) => s,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ActivationStrategy {
        match self {
            Strategy::Always(s) => s,
            Strategy::EditorFocused(s) => s,
            Strategy::EditorTyping(s) => s,
        }
    }
}

impl ActivationStrategy for Strategy {
    fn kind(&self) -> StrategyKind {
        self.inner().kind()
    }

    fn is_attached(&self) -> bool {
        self.inner().is_attached()
    }

    fn attach(&mut self, bus: &mut SignalBus) {
        self.inner_mut().attach(bus);
    }

    fn detach(&mut self, bus: &mut SignalBus) {
        self.inner_mut().detach(bus);
    }

    fn enable(&mut self, ctx: &mut StrategyContext<'_>) {
        self.inner_mut().enable(ctx);
    }

    fn disable(&mut self, ctx: &mut StrategyContext<'_>) {
        self.inner_mut().disable(ctx);
    }

    fn on_signal(&mut self, signal: &Signal, ctx: &mut StrategyContext<'_>) {
        self.inner_mut().on_signal(signal, ctx);
    }

    fn poll(&mut self, ctx: &mut StrategyContext<'_>) {
        self.inner_mut().poll(ctx);
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.inner().next_deadline()
    }
}
