//! User settings and the store that persists them.
//!
//! Setters persist first and then hand back a [`SettingsChange`] describing
//! what changed; the controller reacts to that change. Setting a value equal
//! to the current one is a no-op and yields no change.

mod file;

pub use file::JsonFileSettings;

use crate::constants::DEFAULT_DELAY_SECS;
use crate::error::WakefulError;
use crate::strategy::StrategyKind;
use crate::validation::validate_delay_secs;
use log::warn;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    #[serde(rename = "isActive")]
    pub enabled: bool,
    pub strategy: StrategyKind,
    #[serde(rename = "wakeLockDelay")]
    pub delay_secs: f64,
    pub show_in_status_bar: bool,
    pub show_notifications: bool,
    pub dev_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            strategy: StrategyKind::Always,
            delay_secs: DEFAULT_DELAY_SECS,
            show_in_status_bar: true,
            show_notifications: true,
            dev_mode: false,
        }
    }
}

impl Settings {
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_DELAY_SECS))
    }

    /// Replace values that fail validation with their defaults.
    fn sanitized(mut self) -> Self {
        if let Err(e) = validate_delay_secs(self.delay_secs) {
            warn!("{e}, using default of {DEFAULT_DELAY_SECS}s");
            self.delay_secs = DEFAULT_DELAY_SECS;
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingsChange {
    Enabled(bool),
    Strategy(StrategyKind),
    Delay(f64),
    ShowInStatusBar(bool),
    ShowNotifications(bool),
    DevMode(bool),
}

/// External key-value persistence for [`Settings`].
pub trait SettingsPersistence {
    /// `None` when nothing was saved yet.
    fn load(&self) -> Result<Option<Settings>, WakefulError>;
    fn save(&mut self, settings: &Settings) -> Result<(), WakefulError>;
}

pub struct SettingsStore {
    data: Settings,
    persistence: Box<dyn SettingsPersistence>,
}

impl SettingsStore {
    /// Load settings on start-up, falling back to defaults for missing values.
    pub fn load(persistence: Box<dyn SettingsPersistence>) -> Result<Self, WakefulError> {
        let data = persistence.load()?.unwrap_or_default().sanitized();
        Ok(Self { data, persistence })
    }

    pub fn settings(&self) -> &Settings {
        &self.data
    }

    /// Re-read persisted settings without applying them.
    pub fn read_persisted(&self) -> Result<Settings, WakefulError> {
        Ok(self
            .persistence
            .load()?
            .unwrap_or_else(|| self.data.clone())
            .sanitized())
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Result<Option<SettingsChange>, WakefulError> {
        if self.data.enabled == enabled {
            return Ok(None);
        }
        self.update(|s| s.enabled = enabled)?;
        Ok(Some(SettingsChange::Enabled(enabled)))
    }

    pub fn set_strategy(
        &mut self,
        strategy: StrategyKind,
    ) -> Result<Option<SettingsChange>, WakefulError> {
        if self.data.strategy == strategy {
            return Ok(None);
        }
        self.update(|s| s.strategy = strategy)?;
        Ok(Some(SettingsChange::Strategy(strategy)))
    }

    pub fn set_delay_secs(&mut self, delay: f64) -> Result<Option<SettingsChange>, WakefulError> {
        let delay = validate_delay_secs(delay)?;
        if (self.data.delay_secs - delay).abs() < f64::EPSILON {
            return Ok(None);
        }
        self.update(|s| s.delay_secs = delay)?;
        Ok(Some(SettingsChange::Delay(delay)))
    }

    pub fn set_show_in_status_bar(
        &mut self,
        show: bool,
    ) -> Result<Option<SettingsChange>, WakefulError> {
        if self.data.show_in_status_bar == show {
            return Ok(None);
        }
        self.update(|s| s.show_in_status_bar = show)?;
        Ok(Some(SettingsChange::ShowInStatusBar(show)))
    }

    pub fn set_show_notifications(
        &mut self,
        show: bool,
    ) -> Result<Option<SettingsChange>, WakefulError> {
        if self.data.show_notifications == show {
            return Ok(None);
        }
        self.update(|s| s.show_notifications = show)?;
        Ok(Some(SettingsChange::ShowNotifications(show)))
    }

    pub fn set_dev_mode(&mut self, dev_mode: bool) -> Result<Option<SettingsChange>, WakefulError> {
        if self.data.dev_mode == dev_mode {
            return Ok(None);
        }
        self.update(|s| s.dev_mode = dev_mode)?;
        Ok(Some(SettingsChange::DevMode(dev_mode)))
    }

    /// Adopt a whole record, saving once. Returns what changed, with the
    /// enabled flag last so a newly enabled strategy is built only once.
    pub fn replace(&mut self, next: Settings) -> Result<Vec<SettingsChange>, WakefulError> {
        let next = next.sanitized();
        let current = &self.data;

        let mut changes = Vec::new();
        if current.strategy != next.strategy {
            changes.push(SettingsChange::Strategy(next.strategy));
        }
        if (current.delay_secs - next.delay_secs).abs() >= f64::EPSILON {
            changes.push(SettingsChange::Delay(next.delay_secs));
        }
        if current.show_in_status_bar != next.show_in_status_bar {
            changes.push(SettingsChange::ShowInStatusBar(next.show_in_status_bar));
        }
        if current.show_notifications != next.show_notifications {
            changes.push(SettingsChange::ShowNotifications(next.show_notifications));
        }
        if current.dev_mode != next.dev_mode {
            changes.push(SettingsChange::DevMode(next.dev_mode));
        }
        if current.enabled != next.enabled {
            changes.push(SettingsChange::Enabled(next.enabled));
        }

        if changes.is_empty() {
            return Ok(changes);
        }
        self.persistence.save(&next)?;
        self.data = next;
        Ok(changes)
    }

    /// Apply `mutate` and persist. On a failed save the previous value is kept.
    fn update(&mut self, mutate: impl FnOnce(&mut Settings)) -> Result<(), WakefulError> {
        let mut next = self.data.clone();
        mutate(&mut next);
        self.persistence.save(&next)?;
        self.data = next;
        Ok(())
    }
}
