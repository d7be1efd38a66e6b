use thiserror::Error;

/// Application error type
#[derive(Debug, Error)]
pub enum WakefulError {
    #[error("WakeLock not supported on this platform")]
    Unsupported,

    #[error("WakeLock request failed: {reason}")]
    AcquisitionFailed { reason: String },

    #[error("WakeLock release failed: {reason}")]
    ReleaseFailed { reason: String },

    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("Could not determine settings directory")]
    NoSettingsDir,

    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings format error: {0}")]
    Json(#[from] serde_json::Error),
}

// For native host replies - converts WakefulError to String
impl From<WakefulError> for String {
    fn from(e: WakefulError) -> Self {
        e.to_string()
    }
}

impl WakefulError {
    /// Transient failures that the next qualifying signal may recover from.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            WakefulError::AcquisitionFailed { .. } | WakefulError::ReleaseFailed { .. }
        )
    }
}
