pub mod constants;
pub mod controller;
pub mod error;
pub mod logging;
pub mod native_host;
pub mod platform;
pub mod schedule;
pub mod settings;
pub mod signals;
pub mod strategy;
#[cfg(test)]
mod test_utils;
pub mod ui;
pub mod validation;
pub mod wake_lock;

pub use controller::{ControllerParts, ControllerState, WakeLockController};
pub use error::WakefulError;
pub use settings::{JsonFileSettings, Settings, SettingsPersistence};
pub use signals::{Ambient, Signal, SignalKind, Visibility};
pub use strategy::StrategyKind;
pub use wake_lock::{ResourceConfig, WakeLockEvent, WakeLockResource};
