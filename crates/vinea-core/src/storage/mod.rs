mod config;
pub mod database;
pub mod migrations;

pub use config::Config;
pub use database::{Database, SessionRecord, TodayStats};

use std::path::PathBuf;

/// Returns `~/.config/vinea[-dev]/` based on VINEA_ENV.
///
/// Set VINEA_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the config directory cannot be created.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("VINEA_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("vinea-dev")
    } else {
        base_dir.join("vinea")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
