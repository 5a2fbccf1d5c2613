//! Habit streak computation.
//!
//! A streak is the run of consecutive completed days ending at an anchor
//! date. Only the most recent `lookback` completions are inspected, so the
//! current streak is evaluated against the trailing window rather than the
//! whole history.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Configuration for streak evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreakConfig {
    /// Number of most recent completions inspected per evaluation.
    #[serde(default = "default_lookback")]
    pub lookback: u32,
}

fn default_lookback() -> u32 {
    7
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            lookback: default_lookback(),
        }
    }
}

/// Result of one streak evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakComputation {
    /// Consecutive days ending at the anchor.
    pub current: u32,
    /// Candidate for the stored longest streak.
    pub longest_candidate: u32,
}

/// Persisted streak counters of a habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakState {
    pub current: u32,
    pub longest: u32,
}

impl StreakState {
    pub fn new(current: u32, longest: u32) -> Self {
        Self {
            current,
            longest: longest.max(current),
        }
    }

    /// Fold a fresh computation into the stored counters.
    ///
    /// `current` is overwritten and may drop when a streak breaks; `longest`
    /// never decreases.
    pub fn apply(&self, computation: StreakComputation) -> StreakState {
        let longest = self
            .longest
            .max(computation.longest_candidate)
            .max(computation.current);
        StreakState {
            current: computation.current,
            longest,
        }
    }
}

/// Count consecutive days ending at `anchor` in a newest-first,
/// de-duplicated list of dates.
///
/// Position `i` must hold `anchor - i days`; counting stops at the first
/// mismatch. `limit` bounds how many entries are inspected.
pub fn count_consecutive_days(dates: &[NaiveDate], anchor: NaiveDate, limit: Option<usize>) -> u32 {
    let inspected = limit.unwrap_or(dates.len()).min(dates.len());
    let mut run = 0u32;
    for (i, date) in dates[..inspected].iter().enumerate() {
        let Some(expected) = anchor.checked_sub_signed(Duration::days(i as i64)) else {
            break;
        };
        if *date != expected {
            break;
        }
        run += 1;
    }
    run
}

/// Sort dates newest-first and drop duplicates.
pub(crate) fn newest_first(dates: &[NaiveDate]) -> Vec<NaiveDate> {
    let mut sorted = dates.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();
    sorted
}

/// Streak calculator.
#[derive(Debug, Clone)]
pub struct StreakTracker {
    config: StreakConfig,
}

impl Default for StreakTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StreakTracker {
    /// Create a tracker with the default seven-completion lookback.
    pub fn new() -> Self {
        Self {
            config: StreakConfig::default(),
        }
    }

    /// Create with custom config.
    ///
    /// # Errors
    /// Returns an error if the lookback is zero.
    pub fn with_config(config: StreakConfig) -> Result<Self, ValidationError> {
        if config.lookback == 0 {
            return Err(ValidationError::InvalidValue {
                field: "streak.lookback".to_string(),
                message: "must inspect at least one completion".to_string(),
            });
        }
        Ok(Self { config })
    }

    pub fn lookback(&self) -> u32 {
        self.config.lookback
    }

    /// Compute the streak ending at `anchor` from completed dates.
    ///
    /// Completions are expected newest-first; they are re-sorted and
    /// de-duplicated so a repeated date never counts twice.
    ///
    /// # Errors
    /// Returns an error if any completion is dated after `anchor`.
    pub fn compute(
        &self,
        completions: &[NaiveDate],
        anchor: NaiveDate,
    ) -> Result<StreakComputation, ValidationError> {
        if let Some(future) = completions.iter().find(|d| **d > anchor) {
            return Err(ValidationError::FutureDate {
                field: "completion".to_string(),
                date: *future,
                anchor,
            });
        }

        let ordered = newest_first(completions);
        let current =
            count_consecutive_days(&ordered, anchor, Some(self.config.lookback as usize));

        Ok(StreakComputation {
            current,
            longest_candidate: current,
        })
    }

    /// Compute and fold into previously stored counters.
    ///
    /// # Errors
    /// See [`StreakTracker::compute`].
    pub fn update(
        &self,
        previous: StreakState,
        completions: &[NaiveDate],
        anchor: NaiveDate,
    ) -> Result<StreakState, ValidationError> {
        let computation = self.compute(completions, anchor)?;
        Ok(previous.apply(computation))
    }
}

/// Compute the streak with the default lookback.
///
/// # Errors
/// See [`StreakTracker::compute`].
pub fn compute_streak(
    completions: &[NaiveDate],
    anchor: NaiveDate,
) -> Result<StreakComputation, ValidationError> {
    StreakTracker::new().compute(completions, anchor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
    }

    fn days_ago(n: i64) -> NaiveDate {
        today() - Duration::days(n)
    }

    #[test]
    fn empty_history_has_no_streak() {
        let result = compute_streak(&[], today()).unwrap();
        assert_eq!(result.current, 0);
        assert_eq!(result.longest_candidate, 0);
    }

    #[test]
    fn single_completion_today() {
        assert_eq!(compute_streak(&[today()], today()).unwrap().current, 1);
    }

    #[test]
    fn three_consecutive_days() {
        let completions = [today(), days_ago(1), days_ago(2)];
        assert_eq!(compute_streak(&completions, today()).unwrap().current, 3);
    }

    #[test]
    fn gap_breaks_streak() {
        let completions = [today(), days_ago(2)];
        assert_eq!(compute_streak(&completions, today()).unwrap().current, 1);
    }

    #[test]
    fn missing_anchor_day_means_zero() {
        let completions = [days_ago(1), days_ago(2)];
        assert_eq!(compute_streak(&completions, today()).unwrap().current, 0);
    }

    #[test]
    fn lookback_bounds_the_streak() {
        let completions: Vec<_> = (0..10).map(days_ago).collect();
        assert_eq!(compute_streak(&completions, today()).unwrap().current, 7);

        let tracker = StreakTracker::with_config(StreakConfig { lookback: 30 }).unwrap();
        assert_eq!(tracker.compute(&completions, today()).unwrap().current, 10);
    }

    #[test]
    fn unordered_and_duplicate_input_is_normalized() {
        let completions = [days_ago(1), today(), days_ago(1), days_ago(2)];
        assert_eq!(compute_streak(&completions, today()).unwrap().current, 3);
    }

    #[test]
    fn future_completion_is_rejected() {
        let err = compute_streak(&[today() + Duration::days(1)], today()).unwrap_err();
        assert!(matches!(err, ValidationError::FutureDate { .. }));
    }

    #[test]
    fn longest_never_decreases() {
        let stored = StreakState::new(4, 5);
        let next = stored.apply(StreakComputation {
            current: 2,
            longest_candidate: 2,
        });
        assert_eq!(next.current, 2);
        assert_eq!(next.longest, 5);

        let next = next.apply(StreakComputation {
            current: 6,
            longest_candidate: 6,
        });
        assert_eq!(next.longest, 6);
        assert!(next.longest >= next.current);
    }

    #[test]
    fn update_combines_compute_and_apply() {
        let tracker = StreakTracker::new();
        let state = tracker
            .update(StreakState::new(0, 5), &[today(), days_ago(2)], today())
            .unwrap();
        assert_eq!(state, StreakState { current: 1, longest: 5 });
    }

    #[test]
    fn state_new_restores_invariant() {
        assert_eq!(StreakState::new(3, 1).longest, 3);
    }

    #[test]
    fn count_consecutive_days_without_limit() {
        let dates: Vec<_> = (0..12).map(days_ago).collect();
        assert_eq!(count_consecutive_days(&dates, today(), None), 12);
        assert_eq!(count_consecutive_days(&dates, today(), Some(4)), 4);
        assert_eq!(count_consecutive_days(&dates, days_ago(1), None), 0);
    }

    #[test]
    fn zero_lookback_is_rejected() {
        assert!(StreakTracker::with_config(StreakConfig { lookback: 0 }).is_err());
    }

    #[test]
    fn walk_stops_at_the_calendar_start() {
        let dates = [NaiveDate::MIN, NaiveDate::MIN];
        assert_eq!(count_consecutive_days(&dates, NaiveDate::MIN, None), 1);
    }
}
