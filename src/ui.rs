//! Passive UI collaborators: the status indicator and the notice sink.

use crate::constants::APP_NAME;
use crate::wake_lock::WakeLockEvent;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorState {
    On,
    Off,
    Disabled,
}

impl IndicatorState {
    pub fn icon(&self) -> &'static str {
        match self {
            IndicatorState::On => "monitor-check",
            IndicatorState::Off => "monitor",
            IndicatorState::Disabled => "monitor-x",
        }
    }

    pub fn label(&self) -> String {
        let state = match self {
            IndicatorState::On => "On",
            IndicatorState::Off => "Off",
            IndicatorState::Disabled => "Disabled",
        };
        format!("{APP_NAME}: {state}")
    }
}

pub trait StatusIndicator {
    fn set_state(&mut self, state: IndicatorState);
    fn set_visible(&mut self, visible: bool);
}

pub trait NoticeSink {
    fn notice(&mut self, message: &str);
}

/// Receives every wake lock event after the controller handled it.
pub trait WakeLockObserver {
    fn on_event(&mut self, event: &WakeLockEvent);
}

/// Forwards notices to a sink unless notifications are turned off.
/// Every notice is logged either way.
pub struct Notifier {
    sink: Box<dyn NoticeSink>,
    show: bool,
}

impl Notifier {
    pub fn new(sink: Box<dyn NoticeSink>, show: bool) -> Self {
        Self { sink, show }
    }

    pub fn set_show(&mut self, show: bool) {
        self.show = show;
    }

    pub fn notify(&mut self, message: &str) {
        if self.show {
            self.sink.notice(message);
        }
        debug!("{message}");
    }

    /// Bypasses the setting; used before settings exist.
    pub fn notify_always(&mut self, message: &str) {
        self.sink.notice(message);
        debug!("{message}");
    }
}
