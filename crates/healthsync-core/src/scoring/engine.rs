//! Score engine and daily score types.

use serde::{Deserialize, Serialize};

use crate::daily::{DailyFacts, Mood};
use crate::error::ValidationError;

/// Ceiling of every sub-score.
pub const SUB_SCORE_MAX: f64 = 25.0;

/// Derived scores for one day. Always recomputed in full from the facts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct DailyScore {
    pub activity: f64,
    pub nutrition: f64,
    pub recovery: f64,
    pub mental: f64,
    /// Sum of the four sub-scores, in [0, 100].
    pub balance: f64,
}

impl DailyScore {
    fn from_parts(activity: f64, nutrition: f64, recovery: f64, mental: f64) -> Self {
        Self {
            activity,
            nutrition,
            recovery,
            mental,
            balance: activity + nutrition + recovery + mental,
        }
    }
}

/// Goals the proportional sub-scores are measured against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringConfig {
    /// Steps that earn the full activity score.
    #[serde(default = "default_step_goal")]
    pub step_goal: u32,
    /// Hours of sleep that earn the full recovery score.
    #[serde(default = "default_sleep_goal_hours")]
    pub sleep_goal_hours: f64,
}

fn default_step_goal() -> u32 {
    10_000
}
fn default_sleep_goal_hours() -> f64 {
    8.0
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            step_goal: default_step_goal(),
            sleep_goal_hours: default_sleep_goal_hours(),
        }
    }
}

impl ScoringConfig {
    /// # Errors
    /// Returns an error if either goal is zero, negative or not finite.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.step_goal == 0 {
            return Err(ValidationError::InvalidValue {
                field: "scoring.step_goal".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if !(self.sleep_goal_hours.is_finite() && self.sleep_goal_hours > 0.0) {
            return Err(ValidationError::InvalidValue {
                field: "scoring.sleep_goal_hours".to_string(),
                message: "must be a positive number of hours".to_string(),
            });
        }
        Ok(())
    }
}

/// Mental sub-score for a mood. Unset mood scores as neutral, not zero.
pub fn mental_score(mood: Option<Mood>) -> f64 {
    match mood {
        Some(Mood::Excellent) => 25.0,
        Some(Mood::Good) => 20.0,
        Some(Mood::Neutral) | None => 15.0,
        Some(Mood::Bad) => 5.0,
        Some(Mood::Terrible) => 0.0,
    }
}

/// Pure scorer for [`DailyFacts`].
#[derive(Debug, Clone, Default)]
pub struct ScoreEngine {
    config: ScoringConfig,
}

impl ScoreEngine {
    /// Create an engine with the default 10,000 step / 8 hour goals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with custom goals.
    ///
    /// # Errors
    /// Returns an error if the goals are not positive.
    pub fn with_config(config: ScoringConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score one day.
    ///
    /// # Errors
    /// Returns an error if the facts are structurally invalid (negative or
    /// non-finite sleep).
    pub fn compute(&self, facts: &DailyFacts) -> Result<DailyScore, ValidationError> {
        facts.validate()?;

        let activity = proportional(f64::from(facts.steps), f64::from(self.config.step_goal));
        let recovery = proportional(
            facts.sleep_hours.unwrap_or(0.0),
            self.config.sleep_goal_hours,
        );
        let nutrition = f64::from(facts.meals_eaten()) / 3.0 * SUB_SCORE_MAX;
        let mental = mental_score(facts.mood);

        Ok(DailyScore::from_parts(activity, nutrition, recovery, mental))
    }
}

/// `value / goal` scaled to the sub-score ceiling and capped there.
fn proportional(value: f64, goal: f64) -> f64 {
    if value <= 0.0 {
        return 0.0;
    }
    (value / goal * SUB_SCORE_MAX).min(SUB_SCORE_MAX)
}

/// Score one day with the default goals.
///
/// # Errors
/// See [`ScoreEngine::compute`].
pub fn compute_scores(facts: &DailyFacts) -> Result<DailyScore, ValidationError> {
    ScoreEngine::new().compute(facts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn facts() -> DailyFacts {
        DailyFacts::empty(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
    }

    #[test]
    fn empty_day_scores_only_neutral_mood() {
        let score = compute_scores(&facts()).unwrap();
        assert_eq!(score.activity, 0.0);
        assert_eq!(score.nutrition, 0.0);
        assert_eq!(score.recovery, 0.0);
        assert_eq!(score.mental, 15.0);
        assert_eq!(score.balance, 15.0);
    }

    #[test]
    fn activity_caps_at_goal() {
        let mut f = facts();
        f.steps = 10_000;
        assert_eq!(compute_scores(&f).unwrap().activity, 25.0);
        f.steps = 20_000;
        assert_eq!(compute_scores(&f).unwrap().activity, 25.0);
        f.steps = 2_500;
        assert_eq!(compute_scores(&f).unwrap().activity, 6.25);
    }

    #[test]
    fn recovery_is_proportional_to_sleep() {
        let mut f = facts();
        f.sleep_hours = Some(4.0);
        assert_eq!(compute_scores(&f).unwrap().recovery, 12.5);
        f.sleep_hours = Some(0.0);
        assert_eq!(compute_scores(&f).unwrap().recovery, 0.0);
        f.sleep_hours = Some(11.0);
        assert_eq!(compute_scores(&f).unwrap().recovery, 25.0);
    }

    #[test]
    fn water_does_not_affect_score() {
        let mut f = facts();
        let before = compute_scores(&f).unwrap();
        f.water_ml = 3000;
        assert_eq!(compute_scores(&f).unwrap(), before);
    }

    #[test]
    fn mental_score_table() {
        assert_eq!(mental_score(Some(Mood::Excellent)), 25.0);
        assert_eq!(mental_score(Some(Mood::Good)), 20.0);
        assert_eq!(mental_score(Some(Mood::Neutral)), 15.0);
        assert_eq!(mental_score(None), 15.0);
        assert_eq!(mental_score(Some(Mood::Bad)), 5.0);
        assert_eq!(mental_score(Some(Mood::Terrible)), 0.0);
    }

    #[test]
    fn negative_sleep_is_rejected() {
        let mut f = facts();
        f.sleep_hours = Some(-2.0);
        assert!(compute_scores(&f).is_err());
        f.sleep_hours = Some(f64::NAN);
        assert!(compute_scores(&f).is_err());
    }

    #[test]
    fn custom_goals() {
        let engine = ScoreEngine::with_config(ScoringConfig {
            step_goal: 5_000,
            sleep_goal_hours: 7.0,
        })
        .unwrap();
        let mut f = facts();
        f.steps = 5_000;
        f.sleep_hours = Some(3.5);
        let score = engine.compute(&f).unwrap();
        assert_eq!(score.activity, 25.0);
        assert_eq!(score.recovery, 12.5);
    }

    #[test]
    fn zero_goals_are_rejected() {
        assert!(ScoreEngine::with_config(ScoringConfig {
            step_goal: 0,
            ..Default::default()
        })
        .is_err());
        assert!(ScoreEngine::with_config(ScoringConfig {
            sleep_goal_hours: 0.0,
            ..Default::default()
        })
        .is_err());
    }
}
