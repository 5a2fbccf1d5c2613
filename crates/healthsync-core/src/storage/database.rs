//! SQLite-based storage for profiles, daily facts, habits and achievements.
//!
//! Provides persistent storage for:
//! - User profiles with their coin balance and energy level
//! - One daily record per (profile, date), facts and scores together
//! - Habits, their streak counters and per-date completions
//! - Achievement unlocks, at most one per (profile, code)
//!
//! The database only stores and retrieves. Scores, streaks and rewards are
//! computed by the engines and handed in ready-made.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::data_dir;
use super::migrations;
use crate::analytics::HabitPeriodStats;
use crate::daily::{DailyFacts, DailyRecord, Mood};
use crate::energy::BalanceSample;
use crate::error::{DatabaseError, Result, ValidationError};
use crate::reward::{find_achievement, GamificationAccount};
use crate::scoring::DailyScore;
use crate::streak::StreakState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub username: String,
    pub coins: u64,
    pub energy_level: f64,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// The gamification state carried by this profile.
    pub fn account(&self) -> GamificationAccount {
        GamificationAccount {
            coins: self.coins,
            energy_level: self.energy_level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: i64,
    pub profile_id: i64,
    pub name: String,
    /// Value recorded for a completion when none is given.
    pub target_value: Option<i64>,
    pub unit: String,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Habit {
    pub fn streak(&self) -> StreakState {
        StreakState::new(self.current_streak, self.longest_streak)
    }
}

/// Fields needed to create a habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHabit {
    pub name: String,
    #[serde(default)]
    pub target_value: Option<i64>,
    #[serde(default = "default_unit")]
    pub unit: String,
}

fn default_unit() -> String {
    "times".to_string()
}

impl NewHabit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_value: None,
            unit: default_unit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitCompletion {
    pub habit_id: i64,
    pub date: NaiveDate,
    pub completed_value: Option<i64>,
    pub is_completed: bool,
    pub completed_at: DateTime<Utc>,
}

/// An unlock joined with its catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockedAchievement {
    pub code: String,
    pub name: String,
    pub description: String,
    pub reward_coins: u32,
    pub unlocked_at: DateTime<Utc>,
}

const PROFILE_COLUMNS: &str = "id, username, coins, energy_level, created_at";

const DAILY_COLUMNS: &str = "date, steps, water_ml, sleep_hours, breakfast, lunch, dinner, mood, notes,
     activity_score, nutrition_score, recovery_score, mental_score, overall_balance";

const HABIT_COLUMNS: &str = "id, profile_id, name, target_value, unit, current_streak, longest_streak,
     is_active, created_at";

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row.get(0)?,
        username: row.get(1)?,
        coins: row.get(2)?,
        energy_level: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn daily_from_row(row: &Row<'_>) -> rusqlite::Result<DailyRecord> {
    let mood: Option<String> = row.get(7)?;
    Ok(DailyRecord {
        facts: DailyFacts {
            date: row.get(0)?,
            steps: row.get(1)?,
            water_ml: row.get(2)?,
            sleep_hours: row.get(3)?,
            breakfast: row.get(4)?,
            lunch: row.get(5)?,
            dinner: row.get(6)?,
            mood: mood.as_deref().and_then(Mood::parse_lenient),
            notes: row.get(8)?,
        },
        score: DailyScore {
            activity: row.get(9)?,
            nutrition: row.get(10)?,
            recovery: row.get(11)?,
            mental: row.get(12)?,
            balance: row.get(13)?,
        },
    })
}

fn habit_from_row(row: &Row<'_>) -> rusqlite::Result<Habit> {
    Ok(Habit {
        id: row.get(0)?,
        profile_id: row.get(1)?,
        name: row.get(2)?,
        target_value: row.get(3)?,
        unit: row.get(4)?,
        current_streak: row.get(5)?,
        longest_streak: row.get(6)?,
        is_active: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn non_blank(field: &str, value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: "must not be empty".to_string(),
        });
    }
    Ok(())
}

/// SQLite database for healthsync data.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/healthsync.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("healthsync.db");
        Self::open_at(&path)
    }

    /// Open the database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::init(conn)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        migrations::migrate(&self.conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    // ── Profiles ─────────────────────────────────────────────────────

    /// Create a profile with no coins and a neutral energy level.
    ///
    /// # Errors
    /// Returns a validation error if the username is blank or taken.
    pub fn create_profile(&self, username: &str) -> Result<Profile> {
        let username = username.trim();
        non_blank("username", username)?;
        if self.find_profile(username)?.is_some() {
            return Err(ValidationError::InvalidValue {
                field: "username".to_string(),
                message: format!("'{username}' is already taken"),
            }
            .into());
        }

        let account = GamificationAccount::default();
        self.conn.execute(
            "INSERT INTO profiles (username, coins, energy_level, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![username, account.coins, account.energy_level, Utc::now()],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_profile(id)?
            .ok_or_else(|| DatabaseError::QueryFailed(format!("profile {id} vanished after insert")).into())
    }

    pub fn get_profile(&self, id: i64) -> Result<Option<Profile>> {
        let profile = self
            .conn
            .query_row(
                &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1"),
                params![id],
                profile_from_row,
            )
            .optional()?;
        Ok(profile)
    }

    pub fn find_profile(&self, username: &str) -> Result<Option<Profile>> {
        let profile = self
            .conn
            .query_row(
                &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE username = ?1"),
                params![username],
                profile_from_row,
            )
            .optional()?;
        Ok(profile)
    }

    pub fn list_profiles(&self) -> Result<Vec<Profile>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY id"))?;
        let profiles = stmt
            .query_map([], profile_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(profiles)
    }

    /// Overwrite the coin balance and energy level of a profile.
    pub fn update_account(&self, profile_id: i64, account: &GamificationAccount) -> Result<()> {
        self.conn.execute(
            "UPDATE profiles SET coins = ?1, energy_level = ?2 WHERE id = ?3",
            params![account.coins, account.energy_level, profile_id],
        )?;
        Ok(())
    }

    pub fn set_energy_level(&self, profile_id: i64, energy_level: f64) -> Result<()> {
        self.conn.execute(
            "UPDATE profiles SET energy_level = ?1 WHERE id = ?2",
            params![energy_level, profile_id],
        )?;
        Ok(())
    }

    // ── Daily data ───────────────────────────────────────────────────

    pub fn get_daily(&self, profile_id: i64, date: NaiveDate) -> Result<Option<DailyRecord>> {
        let record = self
            .conn
            .query_row(
                &format!(
                    "SELECT {DAILY_COLUMNS} FROM daily_data WHERE profile_id = ?1 AND date = ?2"
                ),
                params![profile_id, date],
                daily_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Insert or replace the record for `(profile_id, record.facts.date)`.
    pub fn save_daily(&self, profile_id: i64, record: &DailyRecord) -> Result<()> {
        let facts = &record.facts;
        let score = &record.score;
        self.conn.execute(
            "INSERT INTO daily_data (
                profile_id, date, steps, water_ml, sleep_hours, breakfast, lunch, dinner,
                mood, notes, activity_score, nutrition_score, recovery_score, mental_score,
                overall_balance, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
             ON CONFLICT (profile_id, date) DO UPDATE SET
                steps = excluded.steps,
                water_ml = excluded.water_ml,
                sleep_hours = excluded.sleep_hours,
                breakfast = excluded.breakfast,
                lunch = excluded.lunch,
                dinner = excluded.dinner,
                mood = excluded.mood,
                notes = excluded.notes,
                activity_score = excluded.activity_score,
                nutrition_score = excluded.nutrition_score,
                recovery_score = excluded.recovery_score,
                mental_score = excluded.mental_score,
                overall_balance = excluded.overall_balance,
                updated_at = excluded.updated_at",
            params![
                profile_id,
                facts.date,
                facts.steps,
                facts.water_ml,
                facts.sleep_hours,
                facts.breakfast,
                facts.lunch,
                facts.dinner,
                facts.mood.map(|m| m.as_str()),
                facts.notes,
                score.activity,
                score.nutrition,
                score.recovery,
                score.mental,
                score.balance,
                Utc::now(),
            ],
        )?;
        Ok(())
    }

    /// Daily records with `start <= date <= end`, oldest first.
    pub fn daily_between(
        &self,
        profile_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DAILY_COLUMNS} FROM daily_data
             WHERE profile_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date"
        ))?;
        let records = stmt
            .query_map(params![profile_id, start, end], daily_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Stored balances with `start <= date <= end`.
    pub fn balances_between(
        &self,
        profile_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<BalanceSample>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, overall_balance FROM daily_data
             WHERE profile_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date",
        )?;
        let samples = stmt
            .query_map(params![profile_id, start, end], |row| {
                Ok(BalanceSample::new(row.get(0)?, row.get(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(samples)
    }

    /// Number of dates with a daily record.
    pub fn count_tracked_days(&self, profile_id: i64) -> Result<u32> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM daily_data WHERE profile_id = ?1",
            params![profile_id],
            |row| row.get::<_, u32>(0),
        )?;
        Ok(count)
    }

    // ── Habits ───────────────────────────────────────────────────────

    /// # Errors
    /// Returns a validation error if the name or unit is blank.
    pub fn create_habit(&self, profile_id: i64, habit: &NewHabit) -> Result<Habit> {
        non_blank("name", &habit.name)?;
        non_blank("unit", &habit.unit)?;
        self.conn.execute(
            "INSERT INTO habits (profile_id, name, target_value, unit, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                profile_id,
                habit.name.trim(),
                habit.target_value,
                habit.unit.trim(),
                Utc::now()
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_habit(id)?
            .ok_or_else(|| DatabaseError::QueryFailed(format!("habit {id} vanished after insert")).into())
    }

    pub fn get_habit(&self, habit_id: i64) -> Result<Option<Habit>> {
        let habit = self
            .conn
            .query_row(
                &format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1"),
                params![habit_id],
                habit_from_row,
            )
            .optional()?;
        Ok(habit)
    }

    /// Habits of a profile in creation order. Archived habits are skipped
    /// unless `include_archived` is set.
    pub fn list_habits(&self, profile_id: i64, include_archived: bool) -> Result<Vec<Habit>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {HABIT_COLUMNS} FROM habits
             WHERE profile_id = ?1 AND (is_active = 1 OR ?2)
             ORDER BY id"
        ))?;
        let habits = stmt
            .query_map(params![profile_id, include_archived], habit_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(habits)
    }

    /// Deactivate a habit. Returns `false` if no such habit exists.
    pub fn archive_habit(&self, habit_id: i64) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE habits SET is_active = 0 WHERE id = ?1",
            params![habit_id],
        )?;
        Ok(changed > 0)
    }

    pub fn save_streak(&self, habit_id: i64, streak: StreakState) -> Result<()> {
        self.conn.execute(
            "UPDATE habits SET current_streak = ?1, longest_streak = ?2 WHERE id = ?3",
            params![streak.current, streak.longest, habit_id],
        )?;
        Ok(())
    }

    // ── Completions ──────────────────────────────────────────────────

    pub fn get_completion(&self, habit_id: i64, date: NaiveDate) -> Result<Option<HabitCompletion>> {
        let completion = self
            .conn
            .query_row(
                "SELECT habit_id, date, completed_value, is_completed, completed_at
                 FROM habit_completions WHERE habit_id = ?1 AND date = ?2",
                params![habit_id, date],
                |row| {
                    Ok(HabitCompletion {
                        habit_id: row.get(0)?,
                        date: row.get(1)?,
                        completed_value: row.get(2)?,
                        is_completed: row.get(3)?,
                        completed_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(completion)
    }

    /// Mark `(habit_id, date)` completed with `value`.
    ///
    /// Returns `true` only when this call moved the key from not completed
    /// to completed. Repeats update the value and keep the first
    /// completion time.
    pub fn upsert_completion(
        &self,
        habit_id: i64,
        date: NaiveDate,
        value: Option<i64>,
    ) -> Result<bool> {
        let previous = self.get_completion(habit_id, date)?;
        self.conn.execute(
            "INSERT INTO habit_completions (habit_id, date, completed_value, is_completed, completed_at)
             VALUES (?1, ?2, ?3, 1, ?4)
             ON CONFLICT (habit_id, date) DO UPDATE SET
                completed_value = excluded.completed_value,
                is_completed = 1",
            params![habit_id, date, value, Utc::now()],
        )?;
        Ok(!previous.is_some_and(|c| c.is_completed))
    }

    /// The most recent completed date of a habit, if any.
    pub fn latest_completion(&self, habit_id: i64) -> Result<Option<NaiveDate>> {
        let latest = self.conn.query_row(
            "SELECT MAX(date) FROM habit_completions WHERE habit_id = ?1 AND is_completed = 1",
            params![habit_id],
            |row| row.get::<_, Option<NaiveDate>>(0),
        )?;
        Ok(latest)
    }

    /// Completed dates on or before `up_to`, newest first, at most `limit`.
    pub fn completed_dates(
        &self,
        habit_id: i64,
        up_to: NaiveDate,
        limit: Option<u32>,
    ) -> Result<Vec<NaiveDate>> {
        let mut stmt = self.conn.prepare(
            "SELECT date FROM habit_completions
             WHERE habit_id = ?1 AND is_completed = 1 AND date <= ?2
             ORDER BY date DESC
             LIMIT ?3",
        )?;
        // A negative LIMIT means no limit in SQLite.
        let limit = limit.map_or(-1, i64::from);
        let dates = stmt
            .query_map(params![habit_id, up_to, limit], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<NaiveDate>>>()?;
        Ok(dates)
    }

    /// Ids of the profile's habits completed on `date`.
    pub fn completed_habit_ids(&self, profile_id: i64, date: NaiveDate) -> Result<HashSet<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.habit_id FROM habit_completions c
             JOIN habits h ON h.id = c.habit_id
             WHERE h.profile_id = ?1 AND c.date = ?2 AND c.is_completed = 1",
        )?;
        let ids = stmt
            .query_map(params![profile_id, date], |row| row.get(0))?
            .collect::<rusqlite::Result<HashSet<i64>>>()?;
        Ok(ids)
    }

    /// Per-habit completion counts and mean value for the active habits.
    pub fn habit_stats_between(
        &self,
        profile_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HabitPeriodStats>> {
        let mut stmt = self.conn.prepare(
            "SELECT h.id, h.name, h.target_value,
                    COUNT(c.habit_id), COALESCE(AVG(c.completed_value), 0.0)
             FROM habits h
             LEFT JOIN habit_completions c
                ON c.habit_id = h.id AND c.is_completed = 1
               AND c.date >= ?2 AND c.date <= ?3
             WHERE h.profile_id = ?1 AND h.is_active = 1
             GROUP BY h.id
             ORDER BY h.id",
        )?;
        let stats = stmt
            .query_map(params![profile_id, start, end], |row| {
                Ok(HabitPeriodStats {
                    habit_id: row.get(0)?,
                    name: row.get(1)?,
                    target_value: row.get(2)?,
                    completed_days: row.get(3)?,
                    avg_value: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(stats)
    }

    // ── Achievements ─────────────────────────────────────────────────

    pub fn unlocked_codes(&self, profile_id: i64) -> Result<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT code FROM achievement_unlocks WHERE profile_id = ?1")?;
        let codes = stmt
            .query_map(params![profile_id], |row| row.get(0))?
            .collect::<rusqlite::Result<HashSet<String>>>()?;
        Ok(codes)
    }

    /// Record an unlock. Returns `false` if the code was already unlocked.
    pub fn record_unlock(&self, profile_id: i64, code: &str, at: DateTime<Utc>) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO achievement_unlocks (profile_id, code, unlocked_at)
             VALUES (?1, ?2, ?3)",
            params![profile_id, code, at],
        )?;
        Ok(inserted == 1)
    }

    /// Most recent unlocks first. Codes missing from the catalog are skipped.
    pub fn recent_unlocks(&self, profile_id: i64, limit: u32) -> Result<Vec<UnlockedAchievement>> {
        let mut stmt = self.conn.prepare(
            "SELECT code, unlocked_at FROM achievement_unlocks
             WHERE profile_id = ?1
             ORDER BY unlocked_at DESC, code
             LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![profile_id, limit], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, DateTime<Utc>>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(code, unlocked_at)| {
                let entry = find_achievement(&code)?;
                Some(UnlockedAchievement {
                    code,
                    name: entry.name.to_string(),
                    description: entry.description.to_string(),
                    reward_coins: entry.reward_coins,
                    unlocked_at,
                })
            })
            .collect())
    }
}
