//! Write flows over the database and the engines.
//!
//! [`HealthTracker`] is the one place where engine outputs are persisted.
//! Every write flow runs read, recompute and write inside a single SQLite
//! transaction, so a failed step leaves the stored state as it was.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::analytics::{daily_progress, validate_period, PeriodSummary};
use crate::daily::{DailyFacts, DailyFactsUpdate, DailyRecord};
use crate::energy::EnergyAggregator;
use crate::error::{CoreError, Result, ValidationError};
use crate::reward::{
    Achievement, AchievementContext, AchievementEvaluator, GamificationAccount, RewardDelta,
    RewardIssuer,
};
use crate::scoring::ScoreEngine;
use crate::storage::{
    Config, Database, Habit, HabitCompletion, NewHabit, Profile, UnlockedAchievement,
};
use crate::streak::{StreakState, StreakTracker};

/// Days of history handed to the unlock rules, ending at the written date.
/// Covers the longest consecutive-day requirement in the catalog.
const ACHIEVEMENT_HISTORY_DAYS: i64 = 30;

/// First day handed to the unlock rules for an evaluation at `date`.
fn achievement_history_start(date: NaiveDate) -> std::result::Result<NaiveDate, ValidationError> {
    ValidationError::days_before("date", date, ACHIEVEMENT_HISTORY_DAYS - 1)
}

/// Unlocks shown on the dashboard.
const RECENT_ACHIEVEMENTS: u32 = 5;

/// Result of writing a day's facts.
#[derive(Debug, Clone, Serialize)]
pub struct DailyOutcome {
    pub record: DailyRecord,
    pub energy_level: f64,
    pub account: GamificationAccount,
    pub unlocked: Vec<&'static Achievement>,
}

/// Result of completing a habit for a date.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionOutcome {
    pub habit: Habit,
    pub completion: HabitCompletion,
    /// Whether this call completed the (habit, date) key for the first time.
    pub first_completion: bool,
    pub streak: StreakState,
    /// Completion reward, paid only on a first completion.
    pub reward: Option<RewardDelta>,
    pub account: GamificationAccount,
    pub unlocked: Vec<&'static Achievement>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HabitStatus {
    #[serde(flatten)]
    pub habit: Habit,
    pub completed_today: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardProgress {
    pub completed_today: usize,
    pub total_habits: usize,
    /// Percentage of today's habits completed, one decimal.
    pub daily_progress: f64,
    pub days_tracked: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub profile: Profile,
    pub date: NaiveDate,
    pub today: DailyRecord,
    pub habits: Vec<HabitStatus>,
    pub recent_achievements: Vec<UnlockedAchievement>,
    pub progress: DashboardProgress,
}

/// A catalog entry and, if unlocked, when.
#[derive(Debug, Clone, Serialize)]
pub struct AchievementStatus {
    #[serde(flatten)]
    pub achievement: &'static Achievement,
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// Orchestrates the engines over a [`Database`].
pub struct HealthTracker {
    db: Database,
    scorer: ScoreEngine,
    energy: EnergyAggregator,
    streaks: StreakTracker,
    rewards: RewardIssuer,
    achievements: AchievementEvaluator,
}

impl HealthTracker {
    /// Create with default engine settings.
    pub fn new(db: Database) -> Self {
        Self {
            db,
            scorer: ScoreEngine::new(),
            energy: EnergyAggregator::new(),
            streaks: StreakTracker::new(),
            rewards: RewardIssuer::new(),
            achievements: AchievementEvaluator::new(),
        }
    }

    /// Create with engines built from `config`.
    ///
    /// # Errors
    /// Returns an error if any config section is invalid.
    pub fn with_config(db: Database, config: &Config) -> Result<Self> {
        Ok(Self {
            db,
            scorer: config.score_engine()?,
            energy: config.energy_aggregator()?,
            streaks: config.streak_tracker()?,
            rewards: config.reward_issuer()?,
            achievements: AchievementEvaluator::new(),
        })
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    // ── Profiles ─────────────────────────────────────────────────────

    pub fn create_profile(&self, username: &str) -> Result<Profile> {
        let profile = self.db.create_profile(username)?;
        tracing::info!(profile_id = profile.id, username = %profile.username, "profile created");
        Ok(profile)
    }

    /// # Errors
    /// Returns [`CoreError::NotFound`] if no such profile exists.
    pub fn profile(&self, profile_id: i64) -> Result<Profile> {
        self.db
            .get_profile(profile_id)?
            .ok_or_else(|| CoreError::not_found("profile", profile_id))
    }

    /// Look up a profile by username.
    ///
    /// # Errors
    /// Returns [`CoreError::NotFound`] if no such profile exists.
    pub fn profile_by_name(&self, username: &str) -> Result<Profile> {
        self.db
            .find_profile(username)?
            .ok_or_else(|| CoreError::not_found("profile", username))
    }

    // ── Daily facts ──────────────────────────────────────────────────

    /// The record for `date`, created empty and scored on first access.
    ///
    /// Creating the row does not touch the profile energy level; that is
    /// recomputed when facts are written.
    pub fn daily(&self, profile_id: i64, date: NaiveDate) -> Result<DailyRecord> {
        self.profile(profile_id)?;
        if let Some(record) = self.db.get_daily(profile_id, date)? {
            return Ok(record);
        }

        let facts = DailyFacts::empty(date);
        let score = self.scorer.compute(&facts)?;
        let record = DailyRecord { facts, score };
        self.db.save_daily(profile_id, &record)?;
        tracing::debug!(profile_id, %date, "daily record created");
        Ok(record)
    }

    /// Apply a partial update to a day's facts, then rescore the day,
    /// recompute the profile energy level and evaluate achievements.
    pub fn record_daily(
        &self,
        profile_id: i64,
        date: NaiveDate,
        update: &DailyFactsUpdate,
    ) -> Result<DailyOutcome> {
        let tx = self.db.conn().unchecked_transaction()?;

        let mut profile = self.profile(profile_id)?;
        let mut facts = self
            .db
            .get_daily(profile_id, date)?
            .map_or_else(|| DailyFacts::empty(date), |r| r.facts);
        update.apply_to(&mut facts)?;

        let score = self.scorer.compute(&facts)?;
        let record = DailyRecord { facts, score };
        self.db.save_daily(profile_id, &record)?;
        tracing::debug!(
            profile_id,
            %date,
            activity = score.activity,
            nutrition = score.nutrition,
            recovery = score.recovery,
            mental = score.mental,
            balance = score.balance,
            "daily score computed"
        );

        let history =
            self.db
                .balances_between(profile_id, self.energy.window_start(date)?, date)?;
        let energy_level = self.energy.compute(&history, date)?;
        self.db.set_energy_level(profile_id, energy_level)?;
        profile.energy_level = energy_level;
        tracing::debug!(profile_id, samples = history.len(), energy_level, "energy level recomputed");

        let (account, unlocked) = self.unlock_achievements(&profile, date)?;
        tx.commit()?;

        Ok(DailyOutcome {
            record,
            energy_level,
            account,
            unlocked,
        })
    }

    // ── Habits ───────────────────────────────────────────────────────

    pub fn add_habit(&self, profile_id: i64, habit: &NewHabit) -> Result<Habit> {
        self.profile(profile_id)?;
        let habit = self.db.create_habit(profile_id, habit)?;
        tracing::info!(profile_id, habit_id = habit.id, name = %habit.name, "habit added");
        Ok(habit)
    }

    pub fn habits(&self, profile_id: i64, include_archived: bool) -> Result<Vec<Habit>> {
        self.profile(profile_id)?;
        self.db.list_habits(profile_id, include_archived)
    }

    /// Deactivate a habit. Its completions and counters are kept.
    pub fn archive_habit(&self, profile_id: i64, habit_id: i64) -> Result<Habit> {
        let habit = self.owned_habit(profile_id, habit_id)?;
        self.db.archive_habit(habit.id)?;
        Ok(Habit {
            is_active: false,
            ..habit
        })
    }

    /// A habit that belongs to `profile_id`.
    fn owned_habit(&self, profile_id: i64, habit_id: i64) -> Result<Habit> {
        self.db
            .get_habit(habit_id)?
            .filter(|h| h.profile_id == profile_id)
            .ok_or_else(|| CoreError::not_found("habit", habit_id))
    }

    /// Mark a habit completed on `date`.
    ///
    /// `value` defaults to the habit's target. The streak is recomputed on
    /// every call, but the completion reward is paid only when this call
    /// completes the (habit, date) key for the first time, since
    /// [`RewardIssuer::apply_completion_reward`] pays on every invocation.
    pub fn complete_habit(
        &self,
        profile_id: i64,
        habit_id: i64,
        date: NaiveDate,
        value: Option<i64>,
    ) -> Result<CompletionOutcome> {
        let tx = self.db.conn().unchecked_transaction()?;

        let profile = self.profile(profile_id)?;
        let habit = self.owned_habit(profile_id, habit_id)?;
        if !habit.is_active {
            return Err(ValidationError::InvalidValue {
                field: "habit".to_string(),
                message: format!("habit {habit_id} is archived"),
            }
            .into());
        }

        let first_completion =
            self.db
                .upsert_completion(habit.id, date, value.or(habit.target_value))?;

        // A backfilled day must not cut the streak off before later completions.
        let anchor = self
            .db
            .latest_completion(habit.id)?
            .map_or(date, |latest| latest.max(date));
        let completed = self
            .db
            .completed_dates(habit.id, anchor, Some(self.streaks.lookback()))?;
        let streak = self.streaks.update(habit.streak(), &completed, anchor)?;
        self.db.save_streak(habit.id, streak)?;
        tracing::debug!(
            habit_id,
            %date,
            %anchor,
            current = streak.current,
            longest = streak.longest,
            "streak recomputed"
        );

        let before = profile.account();
        let reward = if first_completion {
            let after = self.rewards.apply_completion_reward(&before);
            self.db.update_account(profile_id, &after)?;
            let delta = RewardDelta::between(&before, &after);
            tracing::info!(
                profile_id,
                habit_id,
                coins = delta.coins,
                energy = delta.energy,
                "completion reward issued"
            );
            Some(delta)
        } else {
            tracing::debug!(habit_id, %date, "repeat completion, no reward");
            None
        };

        let profile = self.profile(profile_id)?;
        let (account, unlocked) = self.unlock_achievements(&profile, date)?;

        let completion = self
            .db
            .get_completion(habit.id, date)?
            .ok_or_else(|| CoreError::not_found("completion", format!("{habit_id}@{date}")))?;
        tx.commit()?;

        Ok(CompletionOutcome {
            habit: Habit {
                current_streak: streak.current,
                longest_streak: streak.longest,
                ..habit
            },
            completion,
            first_completion,
            streak,
            reward,
            account,
            unlocked,
        })
    }

    // ── Achievements ─────────────────────────────────────────────────

    /// Evaluate unlock rules for `date` and credit newly unlocked rewards.
    ///
    /// Runs inside the caller's transaction.
    fn unlock_achievements(
        &self,
        profile: &Profile,
        date: NaiveDate,
    ) -> Result<(GamificationAccount, Vec<&'static Achievement>)> {
        let already_unlocked = self.db.unlocked_codes(profile.id)?;
        let history: Vec<DailyFacts> = self
            .db
            .daily_between(profile.id, achievement_history_start(date)?, date)?
            .into_iter()
            .map(|r| r.facts)
            .collect();
        let best_habit_streak = self
            .db
            .list_habits(profile.id, false)?
            .iter()
            .map(|h| h.current_streak)
            .max()
            .unwrap_or(0);

        let ctx = AchievementContext {
            date,
            history: &history,
            days_tracked: self.db.count_tracked_days(profile.id)?,
            best_habit_streak,
            energy_level: profile.energy_level,
        };

        let mut account = profile.account();
        let mut unlocked = Vec::new();
        let now = Utc::now();
        for achievement in self.achievements.evaluate(&ctx, &already_unlocked) {
            if !self.db.record_unlock(profile.id, achievement.code, now)? {
                continue;
            }
            account = self
                .rewards
                .apply_achievement_reward(&account, achievement.reward_coins);
            tracing::info!(
                profile_id = profile.id,
                code = achievement.code,
                coins = achievement.reward_coins,
                "achievement unlocked"
            );
            unlocked.push(achievement);
        }

        if !unlocked.is_empty() {
            self.db.update_account(profile.id, &account)?;
        }
        Ok((account, unlocked))
    }

    /// The whole catalog, with unlock times for this profile.
    pub fn achievement_board(&self, profile_id: i64) -> Result<Vec<AchievementStatus>> {
        self.profile(profile_id)?;
        let unlocks = self.db.recent_unlocks(profile_id, u32::MAX)?;
        Ok(self
            .achievements
            .catalog()
            .iter()
            .map(|achievement| AchievementStatus {
                achievement,
                unlocked_at: unlocks
                    .iter()
                    .find(|u| u.code == achievement.code)
                    .map(|u| u.unlocked_at),
            })
            .collect())
    }

    // ── Reporting ────────────────────────────────────────────────────

    /// Aggregates over `[start, end]`.
    ///
    /// # Errors
    /// Returns a validation error if `start > end`.
    pub fn period_summary(
        &self,
        profile_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PeriodSummary> {
        validate_period(start, end)?;
        self.profile(profile_id)?;
        let records = self.db.daily_between(profile_id, start, end)?;
        let habits = self.db.habit_stats_between(profile_id, start, end)?;
        Ok(PeriodSummary::from_records(start, end, records, habits)?)
    }

    /// Snapshot for `date`. Creates the day's record if it does not exist.
    pub fn dashboard(&self, profile_id: i64, date: NaiveDate) -> Result<Dashboard> {
        let today = self.daily(profile_id, date)?;
        let profile = self.profile(profile_id)?;

        let done: HashSet<i64> = self.db.completed_habit_ids(profile_id, date)?;
        let habits: Vec<HabitStatus> = self
            .db
            .list_habits(profile_id, false)?
            .into_iter()
            .map(|habit| HabitStatus {
                completed_today: done.contains(&habit.id),
                habit,
            })
            .collect();
        let completed_today = habits.iter().filter(|h| h.completed_today).count();

        let progress = DashboardProgress {
            completed_today,
            total_habits: habits.len(),
            daily_progress: daily_progress(completed_today, habits.len()),
            days_tracked: self.db.count_tracked_days(profile_id)?,
        };

        Ok(Dashboard {
            recent_achievements: self.db.recent_unlocks(profile_id, RECENT_ACHIEVEMENTS)?,
            profile,
            date,
            today,
            habits,
            progress,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, day).unwrap()
    }

    fn tracker() -> (HealthTracker, Profile) {
        let tracker = HealthTracker::new(Database::open_memory().unwrap());
        let profile = tracker.create_profile("tess").unwrap();
        (tracker, profile)
    }

    #[test]
    fn achievement_history_covers_thirty_days() {
        assert_eq!(achievement_history_start(d(30)).unwrap(), d(1));
        assert!(matches!(
            achievement_history_start(NaiveDate::MIN),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn backfilled_completion_keeps_streak_at_latest_day() {
        let (t, p) = tracker();
        let habit = t.add_habit(p.id, &NewHabit::new("Walk")).unwrap();
        t.complete_habit(p.id, habit.id, d(10), None).unwrap();

        let outcome = t.complete_habit(p.id, habit.id, d(9), None).unwrap();
        assert_eq!(outcome.streak, StreakState { current: 2, longest: 2 });
        assert!(outcome.first_completion);

        let stored = t.db().get_habit(habit.id).unwrap().unwrap();
        assert_eq!(stored.current_streak, 2);
    }

    #[test]
    fn lazy_daily_record_is_scored() {
        let (t, p) = tracker();
        let record = t.daily(p.id, d(1)).unwrap();
        assert_eq!(record.facts, DailyFacts::empty(d(1)));
        assert_eq!(record.score.mental, 15.0);
        assert_eq!(record.score.balance, 15.0);
        assert_eq!(t.profile(p.id).unwrap().energy_level, 50.0);
    }

    #[test]
    fn unknown_profile_is_not_found() {
        let (t, p) = tracker();
        let err = t.daily(p.id + 1, d(1)).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: "profile", .. }));
    }

    #[test]
    fn invalid_update_rolls_back() {
        let (t, p) = tracker();
        let update = DailyFactsUpdate {
            steps: Some(1_000),
            sleep_hours: Some(-2.0),
            ..Default::default()
        };
        assert!(matches!(
            t.record_daily(p.id, d(1), &update),
            Err(CoreError::Validation(_))
        ));
        assert!(t.db().get_daily(p.id, d(1)).unwrap().is_none());
    }

    #[test]
    fn habit_of_other_profile_is_not_found() {
        let (t, p) = tracker();
        let other = t.create_profile("uma").unwrap();
        let habit = t.add_habit(other.id, &NewHabit::new("Run")).unwrap();
        let err = t.complete_habit(p.id, habit.id, d(1), None).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: "habit", .. }));
    }

    #[test]
    fn archived_habit_cannot_be_completed() {
        let (t, p) = tracker();
        let habit = t.add_habit(p.id, &NewHabit::new("Run")).unwrap();
        t.archive_habit(p.id, habit.id).unwrap();
        assert!(t.complete_habit(p.id, habit.id, d(1), None).is_err());
    }

    #[test]
    fn achievement_board_lists_full_catalog() {
        let (t, p) = tracker();
        t.record_daily(p.id, d(1), &DailyFactsUpdate::default()).unwrap();
        let board = t.achievement_board(p.id).unwrap();
        assert_eq!(board.len(), crate::reward::CATALOG.len());
        let first_day = board
            .iter()
            .find(|s| s.achievement.code == "first_day")
            .unwrap();
        assert!(first_day.unlocked_at.is_some());
    }
}
