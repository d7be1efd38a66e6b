//! stderr logging for the host.
//!
//! stdout carries native messaging frames, so log output must stay on
//! stderr. Records from the `log` facade are bridged into a
//! `tracing-subscriber` fmt layer. Developer mode raises the level to debug.

use log::warn;
use std::sync::OnceLock;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, reload, Registry};

static LEVEL: OnceLock<reload::Handle<LevelFilter, Registry>> = OnceLock::new();

/// Installs the global subscriber. Fails if one is already installed.
pub fn init(dev_mode: bool) -> Result<(), TryInitError> {
    let (filter, handle) = reload::Layer::new(level_for(dev_mode));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .try_init()?;
    LEVEL.get_or_init(|| handle);
    set_dev_mode(dev_mode);
    Ok(())
}

/// Switches between debug and info output. A no-op for the subscriber
/// until [`init`] has run.
pub fn set_dev_mode(dev_mode: bool) {
    log::set_max_level(log_level_for(dev_mode));
    if let Some(handle) = LEVEL.get() {
        if let Err(e) = handle.reload(level_for(dev_mode)) {
            warn!("failed to switch log level: {e}");
        }
    }
}

fn level_for(dev_mode: bool) -> LevelFilter {
    if dev_mode {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}

fn log_level_for(dev_mode: bool) -> log::LevelFilter {
    if dev_mode {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    }
}
