use std::time::Duration;

/// Name shown in notices and indicator labels
pub const APP_NAME: &str = "WakeLock";

/// Debounce window for wake lock requests (fires on the next poll)
pub const REQUEST_DEBOUNCE: Duration = Duration::ZERO;

/// Debounce window for wake lock releases
pub const RELEASE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Default delay before the typing strategy engages, in seconds
pub const DEFAULT_DELAY_SECS: f64 = 5.0;

/// Smallest accepted activation delay, in seconds
pub const MIN_DELAY_SECS: f64 = 0.5;

/// Largest accepted activation delay, in seconds
pub const MAX_DELAY_SECS: f64 = 10.0;

/// Activation delay granularity, in seconds
pub const DELAY_STEP_SECS: f64 = 0.25;

/// Native messaging limits a single message to 1MB (1024 * 1024 bytes)
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Environment variable selecting the host's wake lock backend
pub const BACKEND_ENV: &str = "WAKEFUL_BACKEND";

/// File name of the persisted settings inside the config directory
pub const SETTINGS_FILE_NAME: &str = "settings.json";
