//! Error types for the monitoring engine
//!
//! Configuration errors are reported through the session's error message
//! rather than returned from `start`. Move failures are recorded as events.
//! Everything else surfaces through this enum.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, MonitorError>;

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Invalid profile configuration: {reason}")]
    InvalidProfile { reason: String },

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("No active profile set")]
    NoActiveProfile,

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("Destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MonitorError {
    pub fn invalid_profile(reason: impl Into<String>) -> Self {
        MonitorError::InvalidProfile {
            reason: reason.into(),
        }
    }

    /// Whether this error belongs to the configuration class (start refused).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            MonitorError::InvalidProfile { .. }
                | MonitorError::NoActiveProfile
                | MonitorError::InvalidSetting(_)
        )
    }
}
