//! Core error types for healthsync-core.
//!
//! The scoring engines only ever fail with [`ValidationError`]; everything
//! the storage layer and configuration can raise is folded into
//! [`CoreError`] so callers get one type to match on.

use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use thiserror::Error;

/// Core error type for healthsync-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Structurally invalid input rejected by an engine
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A referenced record does not exist (or belongs to another profile)
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

impl CoreError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
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

    /// Key does not name a configuration field
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Numeric value outside its permitted range
    #[error("Value {value} for '{field}' is outside [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Date later than the anchor it is evaluated against
    #[error("Date {date} for '{field}' is after the anchor date {anchor}")]
    FutureDate {
        field: String,
        date: NaiveDate,
        anchor: NaiveDate,
    },
}

impl ValidationError {
    /// Reject non-finite values and values outside `[min, max]`.
    pub(crate) fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), Self> {
        if value.is_finite() && value >= min && value <= max {
            Ok(())
        } else {
            Err(ValidationError::OutOfRange {
                field: field.to_string(),
                value,
                min,
                max,
            })
        }
    }

    /// `anchor` moved back by `days`, rejected instead of overflowing when
    /// the result falls outside the supported calendar.
    pub(crate) fn days_before(field: &str, anchor: NaiveDate, days: i64) -> Result<NaiveDate, Self> {
        anchor
            .checked_sub_signed(Duration::days(days))
            .ok_or_else(|| ValidationError::InvalidValue {
                field: field.to_string(),
                message: format!("{days} days before {anchor} is outside the supported calendar"),
            })
    }
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked
                    || inner.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_range_rejects_nan_and_bounds() {
        assert!(ValidationError::check_range("x", 5.0, 0.0, 10.0).is_ok());
        assert!(ValidationError::check_range("x", 0.0, 0.0, 10.0).is_ok());
        assert!(ValidationError::check_range("x", -0.1, 0.0, 10.0).is_err());
        assert!(ValidationError::check_range("x", 10.5, 0.0, 10.0).is_err());
        assert!(ValidationError::check_range("x", f64::NAN, 0.0, 10.0).is_err());
    }

    #[test]
    fn days_before_rejects_dates_past_the_calendar_start() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(
            ValidationError::days_before("date", day, 9).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(ValidationError::days_before("date", NaiveDate::MIN, 1).is_err());
        assert!(ValidationError::check_range("x", f64::INFINITY, 0.0, f64::MAX).is_err());
    }

    #[test]
    fn locked_database_maps_to_locked() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert!(matches!(DatabaseError::from(err), DatabaseError::Locked));
    }

    #[test]
    fn not_found_message_names_entity() {
        let err = CoreError::not_found("habit", 42);
        assert_eq!(err.to_string(), "habit not found: 42");
    }
}
