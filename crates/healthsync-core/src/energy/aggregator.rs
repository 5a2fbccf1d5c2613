//! Trailing-window energy aggregation.
//!
//! The profile energy level is the plain mean of the daily balances found in
//! the trailing window. Days without a score are left out of the mean rather
//! than counted as zero, and an empty window falls back to a neutral level.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Lower bound of the energy scale.
pub const ENERGY_MIN: f64 = 0.0;
/// Upper bound of the energy scale.
pub const ENERGY_MAX: f64 = 100.0;

/// Longest accepted trailing window, ten years.
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// One day's aggregate balance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceSample {
    pub date: NaiveDate,
    pub balance: f64,
}

impl BalanceSample {
    pub fn new(date: NaiveDate, balance: f64) -> Self {
        Self { date, balance }
    }
}

/// Settings for the energy aggregation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnergyConfig {
    /// Days in the trailing window, including the anchor date.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    /// Energy reported when the window holds no samples.
    #[serde(default = "default_neutral")]
    pub neutral_default: f64,
}

fn default_window_days() -> u32 {
    7
}
fn default_neutral() -> f64 {
    50.0
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            neutral_default: default_neutral(),
        }
    }
}

/// Computes the smoothed energy level from balance history.
#[derive(Debug, Clone)]
pub struct EnergyAggregator {
    window_days: u32,
    neutral_default: f64,
}

impl Default for EnergyAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl EnergyAggregator {
    /// Seven-day window with a neutral default of 50.
    pub fn new() -> Self {
        let config = EnergyConfig::default();
        Self {
            window_days: config.window_days,
            neutral_default: config.neutral_default,
        }
    }

    /// Create an aggregator with custom settings.
    ///
    /// # Errors
    /// Returns an error if the window is empty or longer than
    /// [`MAX_WINDOW_DAYS`], or the neutral default lies outside the energy
    /// scale.
    pub fn with_config(config: &EnergyConfig) -> Result<Self, ValidationError> {
        ValidationError::check_range(
            "energy.window_days",
            f64::from(config.window_days),
            1.0,
            f64::from(MAX_WINDOW_DAYS),
        )?;
        ValidationError::check_range(
            "energy.neutral_default",
            config.neutral_default,
            ENERGY_MIN,
            ENERGY_MAX,
        )?;
        Ok(Self {
            window_days: config.window_days,
            neutral_default: config.neutral_default,
        })
    }

    pub fn window_days(&self) -> u32 {
        self.window_days
    }

    pub fn neutral_default(&self) -> f64 {
        self.neutral_default
    }

    /// First date of the window that ends at `anchor`.
    ///
    /// # Errors
    /// Returns an error if the window reaches past the start of the calendar.
    pub fn window_start(&self, anchor: NaiveDate) -> Result<NaiveDate, ValidationError> {
        ValidationError::days_before("date", anchor, i64::from(self.window_days) - 1)
    }

    /// Whether `date` falls inside the window ending at `anchor`.
    pub fn in_window(&self, date: NaiveDate, anchor: NaiveDate) -> bool {
        // A window cut off by the calendar start holds every earlier date.
        date <= anchor && self.window_start(anchor).map_or(true, |start| date >= start)
    }

    /// Mean balance over the window ending at `anchor`.
    ///
    /// Samples outside the window are ignored, so callers may pass a wider
    /// history than needed. The result does not depend on sample order.
    ///
    /// # Errors
    /// Returns an error if an in-window balance is outside [0, 100] or not
    /// finite.
    pub fn compute(
        &self,
        history: &[BalanceSample],
        anchor: NaiveDate,
    ) -> Result<f64, ValidationError> {
        let mut total = 0.0;
        let mut count = 0usize;

        for sample in history.iter().filter(|s| self.in_window(s.date, anchor)) {
            ValidationError::check_range("balance", sample.balance, ENERGY_MIN, ENERGY_MAX)?;
            total += sample.balance;
            count += 1;
        }

        if count == 0 {
            return Ok(self.neutral_default);
        }

        Ok((total / count as f64).clamp(ENERGY_MIN, ENERGY_MAX))
    }
}

/// Energy level over the default seven-day window ending at `anchor`.
///
/// # Errors
/// See [`EnergyAggregator::compute`].
pub fn compute_energy_level(
    history: &[BalanceSample],
    anchor: NaiveDate,
) -> Result<f64, ValidationError> {
    EnergyAggregator::new().compute(history, anchor)
}
