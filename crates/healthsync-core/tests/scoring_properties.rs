//! Property tests for daily scoring.
//!
//! Every possible day must score within bounds, and scoring the same facts
//! twice must give the same result.

use chrono::NaiveDate;
use healthsync_core::scoring::SUB_SCORE_MAX;
use healthsync_core::{compute_scores, DailyFacts, Mood, ScoreEngine, ScoringConfig};
use proptest::prelude::*;

fn mood_strategy() -> impl Strategy<Value = Option<Mood>> {
    prop_oneof![
        Just(None),
        proptest::sample::select(Mood::ALL.to_vec()).prop_map(Some),
    ]
}

prop_compose! {
    fn facts_strategy()(
        steps in any::<u32>(),
        water_ml in any::<u32>(),
        sleep_hours in proptest::option::of(0.0f64..48.0),
        breakfast in any::<bool>(),
        lunch in any::<bool>(),
        dinner in any::<bool>(),
        mood in mood_strategy(),
    ) -> DailyFacts {
        DailyFacts {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            steps,
            water_ml,
            sleep_hours,
            breakfast,
            lunch,
            dinner,
            mood,
            notes: None,
        }
    }
}

proptest! {
    #[test]
    fn scores_stay_in_bounds(facts in facts_strategy()) {
        let score = compute_scores(&facts).unwrap();
        for sub in [score.activity, score.nutrition, score.recovery, score.mental] {
            prop_assert!((0.0..=SUB_SCORE_MAX).contains(&sub), "sub-score {sub} out of range");
        }
        prop_assert!((0.0..=100.0).contains(&score.balance));
        let sum = score.activity + score.nutrition + score.recovery + score.mental;
        prop_assert!((score.balance - sum).abs() < 1e-9);
    }

    #[test]
    fn scoring_is_idempotent(facts in facts_strategy()) {
        let first = compute_scores(&facts).unwrap();
        let second = compute_scores(&facts).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn steps_beyond_goal_cap_activity(steps in 10_000u32..) {
        let mut facts = DailyFacts::empty(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        facts.steps = steps;
        prop_assert_eq!(compute_scores(&facts).unwrap().activity, 25.0);
    }

    #[test]
    fn custom_goals_keep_bounds(
        facts in facts_strategy(),
        step_goal in 1u32..50_000,
        sleep_goal_hours in 0.5f64..16.0,
    ) {
        let engine = ScoreEngine::with_config(ScoringConfig { step_goal, sleep_goal_hours }).unwrap();
        let score = engine.compute(&facts).unwrap();
        prop_assert!((0.0..=100.0).contains(&score.balance));
    }
}

#[test]
fn reference_day_scores_as_expected() {
    let facts = DailyFacts {
        date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
        steps: 5_000,
        water_ml: 1_000,
        sleep_hours: Some(6.0),
        breakfast: true,
        lunch: true,
        dinner: false,
        mood: Some(Mood::Good),
        notes: None,
    };
    let score = compute_scores(&facts).unwrap();

    assert_eq!(score.activity, 12.5);
    assert!((score.nutrition - 16.667).abs() < 1e-3);
    assert_eq!(score.recovery, 18.75);
    assert_eq!(score.mental, 20.0);
    assert!((score.balance - 67.917).abs() < 1e-3);
}

#[test]
fn water_does_not_change_the_score() {
    let mut facts = DailyFacts::empty(NaiveDate::from_ymd_opt(2024, 4, 2).unwrap());
    let dry = compute_scores(&facts).unwrap();
    facts.water_ml = 3_000;
    assert_eq!(compute_scores(&facts).unwrap(), dry);
}

#[test]
fn non_finite_sleep_is_rejected() {
    let mut facts = DailyFacts::empty(NaiveDate::from_ymd_opt(2024, 4, 2).unwrap());
    facts.sleep_hours = Some(f64::NAN);
    assert!(compute_scores(&facts).is_err());
    facts.sleep_hours = Some(f64::INFINITY);
    assert!(compute_scores(&facts).is_err());
}
