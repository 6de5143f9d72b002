mod config;
pub mod database;
pub mod migrations;

pub use config::{MicroBreakConfig, PhaseDurations, Settings};
pub use database::{Database, Stats};

use std::path::PathBuf;

use crate::error::CoreError;

/// Returns the data directory, creating it if needed.
///
/// `POMOLOOP_DATA_DIR` overrides the location. Otherwise this is
/// `~/.config/pomoloop/`, or `~/.config/pomoloop-dev/` with `POMOLOOP_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, CoreError> {
    let dir = match std::env::var_os("POMOLOOP_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("POMOLOOP_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomoloop-dev")
            } else {
                base_dir.join("pomoloop")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
