use crate::constants::{DELAY_STEP_SECS, MAX_DELAY_SECS, MIN_DELAY_SECS};
use crate::error::WakefulError;
use crate::strategy::StrategyKind;

/// Validate the activation delay in seconds.
/// Returns Ok(delay) if it lies within bounds on a 0.25s step.
pub fn validate_delay_secs(delay: f64) -> Result<f64, WakefulError> {
    let err = |reason: String| WakefulError::InvalidInput {
        field: "delay",
        reason,
    };

    if !delay.is_finite() {
        return Err(err("must be a number".into()));
    }
    if !(MIN_DELAY_SECS..=MAX_DELAY_SECS).contains(&delay) {
        return Err(err(format!(
            "must be between {MIN_DELAY_SECS} and {MAX_DELAY_SECS} seconds"
        )));
    }

    let steps = delay / DELAY_STEP_SECS;
    if (steps - steps.round()).abs() > 1e-9 {
        return Err(err(format!("must be a multiple of {DELAY_STEP_SECS} seconds")));
    }

    Ok(delay)
}

/// Validate a strategy name as used in settings files and host messages.
pub fn validate_strategy_name(name: &str) -> Result<StrategyKind, WakefulError> {
    name.trim().parse()
}
