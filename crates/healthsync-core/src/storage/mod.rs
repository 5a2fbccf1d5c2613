mod config;
pub mod database;
pub mod migrations;

pub use config::Config;
pub use database::{Database, Habit, HabitCompletion, NewHabit, Profile, UnlockedAchievement};

use std::path::PathBuf;

use crate::error::Result;

/// Returns the data directory, creating it if needed.
///
/// `HEALTHSYNC_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/healthsync[-dev]/`, with `HEALTHSYNC_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("HEALTHSYNC_DATA_DIR") {
        Some(explicit) if !explicit.is_empty() => PathBuf::from(explicit),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env =
                std::env::var("HEALTHSYNC_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("healthsync-dev")
            } else {
                base_dir.join("healthsync")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
