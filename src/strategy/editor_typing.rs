use super::editor_focused::DialogTransition;
use super::{ActivationStrategy, EditorFocusedStrategy, StrategyContext, StrategyKind};
use crate::schedule::ScheduledTask;
use crate::signals::{Ambient, Signal, SignalBus, SignalKind};
use log::{debug, info};
use std::time::{Duration, Instant};

const SIGNALS: &[SignalKind] = &[
    SignalKind::Visibility,
    SignalKind::WindowFocus,
    SignalKind::Orientation,
    SignalKind::ActiveView,
    SignalKind::DialogPresence,
    SignalKind::EditorChange,
];

/// Engages the lock once the editor has been left alone for `delay`.
///
/// Every qualifying signal (including each keystroke) releases the lock and
/// restarts the delay, so a burst of typing produces a single request, `delay`
/// after its last keystroke. The view and dialog rules are those of
/// [`EditorFocusedStrategy`], which this strategy wraps.
#[derive(Debug)]
pub struct EditorTypingStrategy {
    focused: EditorFocusedStrategy,
    delayed_request: ScheduledTask,
}

impl EditorTypingStrategy {
    pub fn new(ambient: &Ambient, delay: Duration) -> Self {
        Self {
            focused: EditorFocusedStrategy::with_signals(SIGNALS, ambient),
            delayed_request: ScheduledTask::new(delay),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delayed_request.delay()
    }

    pub fn has_pending_request(&self) -> bool {
        self.delayed_request.is_armed()
    }

    fn evaluate(&mut self, ctx: &mut StrategyContext<'_>) {
        if self.focused.should_hold(ctx.ambient) {
            ctx.lock.release(ctx.now);
            self.delayed_request.arm(ctx.now);
        } else {
            self.cancel_and_release(ctx);
        }
    }

    fn cancel_and_release(&mut self, ctx: &mut StrategyContext<'_>) {
        if self.delayed_request.cancel() {
            debug!("delayed request cancelled");
        }
        ctx.lock.release(ctx.now);
    }
}

impl ActivationStrategy for EditorTypingStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::EditorTyping
    }

    fn is_attached(&self) -> bool {
        self.focused.is_attached()
    }

    fn attach(&mut self, bus: &mut SignalBus) {
        self.focused.attach(bus);
    }

    fn detach(&mut self, bus: &mut SignalBus) {
        self.focused.detach(bus);
    }

    fn enable(&mut self, ctx: &mut StrategyContext<'_>) {
        info!("enable editor typing strategy ({:?} delay)", self.delay());
        self.attach(ctx.bus);
        self.focused.track_dialog(ctx.ambient.settings_dialog_open);
        self.evaluate(ctx);
    }

    fn disable(&mut self, ctx: &mut StrategyContext<'_>) {
        info!("disable editor typing strategy");
        self.delayed_request.cancel();
        ctx.lock.release_now();
        self.detach(ctx.bus);
    }

    fn on_signal(&mut self, signal: &Signal, ctx: &mut StrategyContext<'_>) {
        match signal {
            Signal::SettingsDialog { open } => match self.focused.track_dialog(*open) {
                DialogTransition::Opened => self.cancel_and_release(ctx),
                DialogTransition::Closed => self.evaluate(ctx),
                DialogTransition::Unchanged => {}
            },
            Signal::VisibilityChanged(_)
            | Signal::WindowFocused
            | Signal::OrientationChanged
            | Signal::ActiveViewChanged { .. }
            | Signal::EditorChanged => self.evaluate(ctx),
            Signal::WindowBlurred => {}
        }
    }

    fn poll(&mut self, ctx: &mut StrategyContext<'_>) {
        if !self.delayed_request.fire_if_due(ctx.now) {
            return;
        }
        if self.focused.should_hold(ctx.ambient) {
            ctx.lock.request(ctx.now);
        } else {
            debug!("delayed request no longer qualifies");
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.delayed_request.deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::Visibility;
    use crate::test_utils::StrategyHarness;
    use crate::wake_lock::WakeLockEvent;

    const MS: Duration = Duration::from_millis(1);

    fn typing_harness(t0: Instant) -> StrategyHarness {
        let mut h = StrategyHarness::new(StrategyKind::EditorTyping);
        h.ambient.editor_active = true;
        h.enable(t0);
        h
    }

    #[test]
    fn test_enable_schedules_delayed_request() {
        let t0 = Instant::now();
        let mut h = typing_harness(t0);

        h.poll(t0 + 4999 * MS);
        assert!(!h.lock.active());

        h.poll(t0 + 5000 * MS);
        assert!(h.lock.active());
        assert_eq!(h.drain(), vec![WakeLockEvent::Request]);
    }

    #[test]
    fn test_typing_burst_yields_one_request_after_last_keystroke() {
        let t0 = Instant::now();
        let mut h = typing_harness(t0);

        let mut last = t0;
        for i in 1..=20 {
            last = t0 + i * 300 * MS;
            h.signal(Signal::EditorChanged, last);
            h.poll(last);
        }
        assert!(!h.lock.active());

        h.poll(last + 4999 * MS);
        assert!(!h.lock.active());
        assert_eq!(h.backend.borrow().attempts, 0);

        h.poll(last + 5000 * MS);
        assert!(h.lock.active());
        assert_eq!(h.backend.borrow().attempts, 1);
        assert_eq!(h.drain(), vec![WakeLockEvent::Request]);
    }

    #[test]
    fn test_typing_releases_held_lock() {
        let t0 = Instant::now();
        let mut h = typing_harness(t0);
        h.poll(t0 + 5000 * MS);
        assert!(h.lock.active());

        h.signal(Signal::EditorChanged, t0 + 6000 * MS);
        h.poll(t0 + 6500 * MS);
        assert!(!h.lock.active());
        assert!(h.has_pending_typing_request());

        h.poll(t0 + 11_000 * MS);
        assert!(h.lock.active());
        assert_eq!(
            h.drain(),
            vec![
                WakeLockEvent::Request,
                WakeLockEvent::Release,
                WakeLockEvent::Request
            ]
        );
    }

    #[test]
    fn test_disable_cancels_delayed_request() {
        let t0 = Instant::now();
        let mut h = typing_harness(t0);
        h.signal(Signal::EditorChanged, t0 + 100 * MS);

        h.disable(t0 + 200 * MS);
        h.poll(t0 + 10_000 * MS);

        assert!(!h.lock.active());
        assert!(!h.has_pending_typing_request());
        assert_eq!(h.backend.borrow().attempts, 0);
        assert!(h.bus.is_empty());
    }

    #[test]
    fn test_dialog_open_cancels_delayed_request() {
        let t0 = Instant::now();
        let mut h = typing_harness(t0);

        h.signal(Signal::SettingsDialog { open: true }, t0 + MS);
        h.signal(Signal::EditorChanged, t0 + 2 * MS);
        h.poll(t0 + 10_000 * MS);
        assert!(!h.lock.active());

        h.signal(Signal::SettingsDialog { open: false }, t0 + 10_001 * MS);
        h.poll(t0 + 15_001 * MS);
        assert!(h.lock.active());
    }

    #[test]
    fn test_hidden_before_delay_elapses_prevents_request() {
        let t0 = Instant::now();
        let mut h = typing_harness(t0);

        h.signal(Signal::VisibilityChanged(Visibility::Hidden), t0 + 1000 * MS);
        h.poll(t0 + 10_000 * MS);

        assert!(!h.lock.active());
        assert_eq!(h.backend.borrow().attempts, 0);
    }

    #[test]
    fn test_next_deadline_tracks_delay() {
        let t0 = Instant::now();
        let h = typing_harness(t0);
        assert_eq!(h.strategy.next_deadline(), Some(t0 + 5000 * MS));
    }

    #[test]
    fn test_custom_delay() {
        let strategy = EditorTypingStrategy::new(&Ambient::default(), 2500 * MS);
        assert_eq!(strategy.delay(), 2500 * MS);
        assert!(!strategy.has_pending_request());
    }
}
