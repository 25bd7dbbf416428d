//! Core error types for pomodoro-core.
//!
//! The timer engine itself has a single recoverable failure
//! (`InvalidArgument`); everything else here belongs to the configuration
//! layer and the alert boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pomodoro-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// An operation was called with a value outside its contract.
    #[error("Invalid argument '{name}': {message}")]
    InvalidArgument { name: String, message: String },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub fn invalid_argument(name: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Could not determine where the configuration lives
    #[error("Could not determine configuration directory")]
    NoConfigDir,
}

/// Failures raised by an alert sink.
///
/// These never reach the timer engine; [`crate::alert::dispatch`] logs and
/// drops them.
#[derive(Error, Debug)]
pub enum AlertError {
    /// The sink is not allowed to notify (e.g. permission denied).
    #[error("notification permission denied: {0}")]
    PermissionDenied(String),

    /// Playing the sound or writing the bell failed.
    #[error("alert playback failed: {0}")]
    Playback(String),

    /// An external notifier command could not be run or exited non-zero.
    #[error("notifier command '{command}' failed: {message}")]
    Command { command: String, message: String },
}

impl From<std::io::Error> for AlertError {
    fn from(err: std::io::Error) -> Self {
        AlertError::Playback(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_message_names_the_argument() {
        let err = CoreError::invalid_argument("delta_secs", "must be positive, got 0");
        assert_eq!(
            err.to_string(),
            "Invalid argument 'delta_secs': must be positive, got 0"
        );
    }

    #[test]
    fn config_error_converts_into_core_error() {
        let err: CoreError = ConfigError::UnknownKey("timer.nope".into()).into();
        assert!(matches!(err, CoreError::Config(ConfigError::UnknownKey(_))));
        assert_eq!(err.to_string(), "Configuration error: unknown config key: timer.nope");
    }

    #[test]
    fn io_error_becomes_playback_alert_error() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        let err: AlertError = io.into();
        assert!(matches!(err, AlertError::Playback(_)));
    }
}
