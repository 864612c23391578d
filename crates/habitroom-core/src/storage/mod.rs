mod config;
pub mod habit_db;
pub mod migrations;

pub use config::{Config, DisplayConfig, EngineConfig};
pub use habit_db::HabitDb;

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns the directory holding the database and config file.
///
/// `HABITROOM_DATA_DIR` wins when set. Otherwise this is
/// `~/.config/habitroom/`, or `~/.config/habitroom-dev/` when
/// `HABITROOM_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("HABITROOM_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .ok_or_else(|| ConfigError::NoDataDir("home directory not found".into()))?
                .join(".config");
            let env = std::env::var("HABITROOM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("habitroom-dev")
            } else {
                base_dir.join("habitroom")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
