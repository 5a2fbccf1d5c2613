//! # HealthSync Core Library
//!
//! This library provides the core logic of HealthSync, a personal health and
//! habit tracker. Raw daily facts are turned into wellness scores, a smoothed
//! energy level, habit streaks and gamification rewards. All operations are
//! available via the standalone CLI binary built on top of this crate.
//!
//! ## Architecture
//!
//! - **Engines**: pure, synchronous calculators with no I/O. Each takes its
//!   inputs as parameters and is configurable through [`Config`]
//! - **Storage**: SQLite-based persistence and TOML-based configuration
//! - **Tracker**: the write flows that run the engines and persist their
//!   results inside one transaction
//!
//! ## Key Components
//!
//! - [`ScoreEngine`]: daily facts to four sub-scores and a balance
//! - [`EnergyAggregator`]: trailing balances to the profile energy level
//! - [`StreakTracker`]: completion dates to current and longest streak
//! - [`RewardIssuer`]: coin and energy rewards for completions
//! - [`AchievementEvaluator`]: unlock rules over the achievement catalog
//! - [`HealthTracker`]: persistence-backed orchestration of the above

pub mod analytics;
pub mod daily;
pub mod energy;
pub mod error;
pub mod reward;
pub mod scoring;
pub mod storage;
pub mod streak;
pub mod tracker;

pub use analytics::{daily_progress, HabitPeriodStats, PeriodSummary};
pub use daily::{DailyFacts, DailyFactsUpdate, DailyRecord, Mood};
pub use energy::{compute_energy_level, BalanceSample, EnergyAggregator, EnergyConfig};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use reward::{
    apply_completion_reward, evaluate_achievements, Achievement, AchievementContext,
    AchievementEvaluator, GamificationAccount, RewardConfig, RewardDelta, RewardIssuer,
};
pub use scoring::{compute_scores, DailyScore, ScoreEngine, ScoringConfig};
pub use storage::{Config, Database, Habit, HabitCompletion, NewHabit, Profile};
pub use streak::{compute_streak, StreakComputation, StreakConfig, StreakState, StreakTracker};
pub use tracker::{CompletionOutcome, Dashboard, DailyOutcome, HealthTracker};
