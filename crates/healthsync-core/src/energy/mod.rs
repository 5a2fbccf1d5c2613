//! Profile energy level.
//!
//! This module turns a user's recent daily balances into the smoothed
//! energy level stored on their profile.

mod aggregator;

pub use aggregator::{
    compute_energy_level, BalanceSample, EnergyAggregator, EnergyConfig, ENERGY_MAX, ENERGY_MIN,
    MAX_WINDOW_DAYS,
};
