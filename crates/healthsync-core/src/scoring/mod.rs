//! Daily wellness scoring.
//!
//! Converts one day's raw facts into four bounded sub-scores and their
//! aggregate balance.

mod engine;

pub use engine::{compute_scores, mental_score, DailyScore, ScoreEngine, ScoringConfig, SUB_SCORE_MAX};
