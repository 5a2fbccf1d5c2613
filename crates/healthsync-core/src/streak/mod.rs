mod tracker;

pub use tracker::{
    compute_streak, count_consecutive_days, StreakComputation, StreakConfig, StreakState,
    StreakTracker,
};

pub(crate) use tracker::newest_first;
