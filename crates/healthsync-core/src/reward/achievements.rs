//! Achievement catalog and unlock rules.
//!
//! Achievements are evaluated after every write flow against the freshly
//! computed scores, energy level and streaks. Evaluation is pure; the caller
//! passes the codes already unlocked so each achievement pays out once.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::daily::DailyFacts;
use crate::streak::{count_consecutive_days, newest_first};

/// What has to hold for an achievement to unlock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Requirement {
    /// At least this many days with a daily record.
    DaysTracked { days: u32 },
    /// Any habit with a current streak of at least this length.
    HabitStreak { days: u32 },
    /// Water intake on the evaluated day.
    DailyWater { min_ml: u32 },
    /// Step goal met on consecutive days ending at the evaluated day.
    StepStreak { min_steps: u32, days: u32 },
    /// Sleep goal met on consecutive nights ending at the evaluated day.
    SleepStreak { min_hours: f64, days: u32 },
    /// Profile energy level reached.
    EnergyLevel { min_level: f64 },
    /// Consecutive tracked days ending at the evaluated day.
    TrackingStreak { days: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    System,
    Streak,
    Water,
    Activity,
    Sleep,
    Energy,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Achievement {
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: AchievementCategory,
    pub requirement: Requirement,
    pub reward_coins: u32,
}

pub static CATALOG: [Achievement; 7] = [
    Achievement {
        code: "first_day",
        name: "First Day",
        description: "You started your path to better health!",
        category: AchievementCategory::System,
        requirement: Requirement::DaysTracked { days: 1 },
        reward_coins: 10,
    },
    Achievement {
        code: "week_of_discipline",
        name: "Week of Discipline",
        description: "Complete a habit 7 days in a row",
        category: AchievementCategory::Streak,
        requirement: Requirement::HabitStreak { days: 7 },
        reward_coins: 25,
    },
    Achievement {
        code: "hydration",
        name: "Hydration Balance",
        description: "Drink 2 litres of water in a day",
        category: AchievementCategory::Water,
        requirement: Requirement::DailyWater { min_ml: 2000 },
        reward_coins: 15,
    },
    Achievement {
        code: "step_master",
        name: "Step Master",
        description: "Walk 10,000 steps 5 days in a row",
        category: AchievementCategory::Activity,
        requirement: Requirement::StepStreak {
            min_steps: 10_000,
            days: 5,
        },
        reward_coins: 20,
    },
    Achievement {
        code: "good_sleep",
        name: "Good Sleep",
        description: "Sleep 7+ hours 3 nights in a row",
        category: AchievementCategory::Sleep,
        requirement: Requirement::SleepStreak {
            min_hours: 7.0,
            days: 3,
        },
        reward_coins: 15,
    },
    Achievement {
        code: "energizer",
        name: "Energizer",
        description: "Reach 100% energy",
        category: AchievementCategory::Energy,
        requirement: Requirement::EnergyLevel { min_level: 100.0 },
        reward_coins: 30,
    },
    Achievement {
        code: "month_of_health",
        name: "Month of Health",
        description: "Track your day 30 days in a row",
        category: AchievementCategory::System,
        requirement: Requirement::TrackingStreak { days: 30 },
        reward_coins: 50,
    },
];

/// Look up a catalog entry by code.
pub fn find_achievement(code: &str) -> Option<&'static Achievement> {
    CATALOG.iter().find(|a| a.code == code)
}

/// Everything an unlock rule may look at.
#[derive(Debug, Clone)]
pub struct AchievementContext<'a> {
    /// Day being evaluated (the day just written).
    pub date: NaiveDate,
    /// Daily records up to and including `date`, any order.
    pub history: &'a [DailyFacts],
    /// Total days with a daily record.
    pub days_tracked: u32,
    /// Highest current streak over the user's active habits.
    pub best_habit_streak: u32,
    pub energy_level: f64,
}

impl AchievementContext<'_> {
    fn today(&self) -> Option<&DailyFacts> {
        self.history.iter().find(|f| f.date == self.date)
    }

    /// Consecutive days ending at `date` whose record satisfies `pred`.
    fn run_where(&self, pred: impl Fn(&DailyFacts) -> bool) -> u32 {
        let dates: Vec<NaiveDate> = self
            .history
            .iter()
            .filter(|f| f.date <= self.date && pred(f))
            .map(|f| f.date)
            .collect();
        count_consecutive_days(&newest_first(&dates), self.date, None)
    }
}

impl Requirement {
    pub fn is_met(&self, ctx: &AchievementContext<'_>) -> bool {
        match *self {
            Requirement::DaysTracked { days } => ctx.days_tracked >= days,
            Requirement::HabitStreak { days } => ctx.best_habit_streak >= days,
            Requirement::DailyWater { min_ml } => {
                ctx.today().is_some_and(|f| f.water_ml >= min_ml)
            }
            Requirement::StepStreak { min_steps, days } => {
                ctx.run_where(|f| f.steps >= min_steps) >= days
            }
            Requirement::SleepStreak { min_hours, days } => {
                ctx.run_where(|f| f.sleep_hours.is_some_and(|h| h >= min_hours)) >= days
            }
            Requirement::EnergyLevel { min_level } => ctx.energy_level >= min_level,
            Requirement::TrackingStreak { days } => ctx.run_where(|_| true) >= days,
        }
    }
}

/// Evaluates unlock rules over a fixed catalog.
#[derive(Debug, Clone, Copy)]
pub struct AchievementEvaluator {
    catalog: &'static [Achievement],
}

impl Default for AchievementEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl AchievementEvaluator {
    pub fn new() -> Self {
        Self { catalog: &CATALOG }
    }

    pub fn catalog(&self) -> &'static [Achievement] {
        self.catalog
    }

    /// Catalog entries whose requirement holds and that are not yet unlocked.
    pub fn evaluate(
        &self,
        ctx: &AchievementContext<'_>,
        already_unlocked: &HashSet<String>,
    ) -> Vec<&'static Achievement> {
        self.catalog
            .iter()
            .filter(|a| !already_unlocked.contains(a.code))
            .filter(|a| a.requirement.is_met(ctx))
            .collect()
    }
}

/// Evaluate against the built-in catalog.
pub fn evaluate_achievements(
    ctx: &AchievementContext<'_>,
    already_unlocked: &HashSet<String>,
) -> Vec<&'static Achievement> {
    AchievementEvaluator::new().evaluate(ctx, already_unlocked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 30).unwrap()
    }

    fn day(offset: i64) -> DailyFacts {
        DailyFacts::empty(today() - Duration::days(offset))
    }

    fn ctx(history: &[DailyFacts]) -> AchievementContext<'_> {
        AchievementContext {
            date: today(),
            history,
            days_tracked: history.len() as u32,
            best_habit_streak: 0,
            energy_level: 50.0,
        }
    }

    fn codes(found: &[&Achievement]) -> Vec<&'static str> {
        found.iter().map(|a| a.code).collect()
    }

    #[test]
    fn catalog_codes_are_unique() {
        let unique: HashSet<_> = CATALOG.iter().map(|a| a.code).collect();
        assert_eq!(unique.len(), CATALOG.len());
        assert!(find_achievement("energizer").is_some());
        assert!(find_achievement("nope").is_none());
    }

    #[test]
    fn first_day_unlocks_once() {
        let history = [day(0)];
        let found = evaluate_achievements(&ctx(&history), &HashSet::new());
        assert_eq!(codes(&found), vec!["first_day"]);

        let unlocked: HashSet<String> = ["first_day".to_string()].into_iter().collect();
        assert!(evaluate_achievements(&ctx(&history), &unlocked).is_empty());
    }

    #[test]
    fn hydration_checks_the_evaluated_day_only() {
        let mut yesterday = day(1);
        yesterday.water_ml = 2500;
        let history = [day(0), yesterday];
        assert!(!Requirement::DailyWater { min_ml: 2000 }.is_met(&ctx(&history)));

        let mut today = day(0);
        today.water_ml = 2000;
        let history = [today];
        assert!(Requirement::DailyWater { min_ml: 2000 }.is_met(&ctx(&history)));
    }

    #[test]
    fn step_master_needs_five_consecutive_days() {
        let rule = CATALOG[3].requirement;
        let mut history: Vec<_> = (0..5)
            .map(|i| {
                let mut f = day(i);
                f.steps = 12_000;
                f
            })
            .collect();
        assert!(rule.is_met(&ctx(&history)));

        history[2].steps = 9_999;
        assert!(!rule.is_met(&ctx(&history)));
    }

    #[test]
    fn good_sleep_ignores_unlogged_nights() {
        let rule = Requirement::SleepStreak {
            min_hours: 7.0,
            days: 3,
        };
        let mut history: Vec<_> = (0..3)
            .map(|i| {
                let mut f = day(i);
                f.sleep_hours = Some(7.5);
                f
            })
            .collect();
        assert!(rule.is_met(&ctx(&history)));

        history[1].sleep_hours = None;
        assert!(!rule.is_met(&ctx(&history)));
    }

    #[test]
    fn streak_and_energy_rules() {
        let history = [day(0)];
        let mut c = ctx(&history);
        c.best_habit_streak = 7;
        c.energy_level = 100.0;
        let found = codes(&evaluate_achievements(&c, &HashSet::new()));
        assert!(found.contains(&"week_of_discipline"));
        assert!(found.contains(&"energizer"));
    }

    #[test]
    fn month_of_health_counts_consecutive_records() {
        let history: Vec<_> = (0..30).map(day).collect();
        assert!(Requirement::TrackingStreak { days: 30 }.is_met(&ctx(&history)));

        let gappy: Vec<_> = (0..31).filter(|i| *i != 10).map(day).collect();
        assert!(!Requirement::TrackingStreak { days: 30 }.is_met(&ctx(&gappy)));
    }
}
