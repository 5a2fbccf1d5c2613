//! Period analytics and dashboard progress.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::daily::DailyRecord;
use crate::error::ValidationError;

/// Completion statistics of one habit over a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitPeriodStats {
    pub habit_id: i64,
    pub name: String,
    pub completed_days: u32,
    /// Mean achieved value over completed days, 0 when none.
    pub avg_value: f64,
    pub target_value: Option<i64>,
}

/// Aggregated view of a user's data between two dates (inclusive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days_tracked: u32,
    pub avg_steps: f64,
    pub avg_water_ml: f64,
    /// Unlogged sleep counts as zero hours.
    pub avg_sleep_hours: f64,
    pub avg_balance: f64,
    pub daily: Vec<DailyRecord>,
    pub habits: Vec<HabitPeriodStats>,
}

/// Reject periods whose start lies after their end.
///
/// # Errors
/// Returns an error if `start > end`.
pub fn validate_period(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
    if start > end {
        return Err(ValidationError::InvalidValue {
            field: "period".to_string(),
            message: format!("start {start} is after end {end}"),
        });
    }
    Ok(())
}

impl PeriodSummary {
    /// Summarize the records that fall inside `[start, end]`.
    ///
    /// Records are returned in date order.
    ///
    /// # Errors
    /// Returns an error if `start > end`.
    pub fn from_records(
        start: NaiveDate,
        end: NaiveDate,
        records: Vec<DailyRecord>,
        habits: Vec<HabitPeriodStats>,
    ) -> Result<Self, ValidationError> {
        validate_period(start, end)?;

        let mut daily: Vec<DailyRecord> = records
            .into_iter()
            .filter(|r| r.facts.date >= start && r.facts.date <= end)
            .collect();
        daily.sort_by_key(|r| r.facts.date);

        Ok(Self {
            start,
            end,
            days_tracked: daily.len() as u32,
            avg_steps: mean(&daily, |r| f64::from(r.facts.steps)),
            avg_water_ml: mean(&daily, |r| f64::from(r.facts.water_ml)),
            avg_sleep_hours: mean(&daily, |r| r.facts.sleep_hours.unwrap_or(0.0)),
            avg_balance: mean(&daily, |r| r.score.balance),
            daily,
            habits,
        })
    }
}

fn mean(records: &[DailyRecord], field: impl Fn(&DailyRecord) -> f64) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().map(field).sum::<f64>() / records.len() as f64
}

/// Share of today's habits completed, as a percentage with one decimal.
pub fn daily_progress(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (completed as f64 / total as f64 * 1000.0).round() / 10.0
}
