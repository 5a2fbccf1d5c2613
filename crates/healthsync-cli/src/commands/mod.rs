pub mod achievements;
pub mod analytics;
pub mod config;
pub mod daily;
pub mod dashboard;
pub mod habit;
pub mod profile;

use chrono::{Local, NaiveDate};
use serde::Serialize;

use healthsync_core::{Config, Database, HealthTracker};

/// Open the database with engines built from the stored config.
pub fn open_tracker() -> Result<HealthTracker, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    Ok(HealthTracker::with_config(db, &config)?)
}

/// Resolve a profile id from its username.
pub fn profile_id(tracker: &HealthTracker, username: &str) -> Result<i64, Box<dyn std::error::Error>> {
    Ok(tracker.profile_by_name(username)?.id)
}

/// The given date, or today in local time.
pub fn date_or_today(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
