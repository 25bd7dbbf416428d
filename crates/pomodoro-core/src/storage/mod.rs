mod config;

pub use config::{Config, DisplayConfig, NotificationsConfig, TimerConfig};

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "POMODORO_CONFIG_DIR";

/// Returns `$POMODORO_CONFIG_DIR` if set, otherwise `~/.config/pomodoro/`.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::home_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join(".config")
            .join("pomodoro"),
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
