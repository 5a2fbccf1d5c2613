//! Coin and energy rewards.

use serde::{Deserialize, Serialize};

use crate::energy::{ENERGY_MAX, ENERGY_MIN};
use crate::error::ValidationError;

/// Per-user gamification state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GamificationAccount {
    pub coins: u64,
    /// Shared with the profile energy level, always within [0, 100].
    pub energy_level: f64,
}

impl GamificationAccount {
    /// # Errors
    /// Returns an error if `energy_level` is outside [0, 100] or not finite.
    pub fn new(coins: u64, energy_level: f64) -> Result<Self, ValidationError> {
        ValidationError::check_range("energy_level", energy_level, ENERGY_MIN, ENERGY_MAX)?;
        Ok(Self {
            coins,
            energy_level,
        })
    }
}

impl Default for GamificationAccount {
    fn default() -> Self {
        Self {
            coins: 0,
            energy_level: 50.0,
        }
    }
}

/// Reward amounts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RewardConfig {
    #[serde(default = "default_coins_per_completion")]
    pub coins_per_completion: u32,
    #[serde(default = "default_energy_bonus")]
    pub energy_bonus: f64,
    #[serde(default = "default_energy_cap")]
    pub energy_cap: f64,
}

fn default_coins_per_completion() -> u32 {
    2
}
fn default_energy_bonus() -> f64 {
    3.0
}
fn default_energy_cap() -> f64 {
    100.0
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            coins_per_completion: default_coins_per_completion(),
            energy_bonus: default_energy_bonus(),
            energy_cap: default_energy_cap(),
        }
    }
}

/// Difference between two account states.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct RewardDelta {
    pub coins: u64,
    pub energy: f64,
}

impl RewardDelta {
    pub fn between(before: &GamificationAccount, after: &GamificationAccount) -> Self {
        Self {
            coins: after.coins.saturating_sub(before.coins),
            energy: after.energy_level - before.energy_level,
        }
    }
}

/// Applies fixed reward deltas to gamification accounts.
#[derive(Debug, Clone)]
pub struct RewardIssuer {
    config: RewardConfig,
}

impl Default for RewardIssuer {
    fn default() -> Self {
        Self::new()
    }
}

impl RewardIssuer {
    /// Two coins and three energy points per completion, energy capped at 100.
    pub fn new() -> Self {
        Self {
            config: RewardConfig::default(),
        }
    }

    /// # Errors
    /// Returns an error if the bonus is negative or the cap lies outside the
    /// energy scale.
    pub fn with_config(config: RewardConfig) -> Result<Self, ValidationError> {
        ValidationError::check_range("rewards.energy_bonus", config.energy_bonus, 0.0, ENERGY_MAX)?;
        ValidationError::check_range("rewards.energy_cap", config.energy_cap, ENERGY_MIN, ENERGY_MAX)?;
        Ok(Self { config })
    }

    /// Reward one habit completion.
    ///
    /// Not idempotent: every call pays again. The caller must invoke it at
    /// most once per (habit, date) completion, which the storage layer
    /// guarantees through the uniqueness of that key.
    pub fn apply_completion_reward(&self, account: &GamificationAccount) -> GamificationAccount {
        // Capped, but never below where the account already was.
        let energy_level = (account.energy_level + self.config.energy_bonus)
            .min(self.config.energy_cap)
            .max(account.energy_level)
            .clamp(ENERGY_MIN, ENERGY_MAX);
        GamificationAccount {
            coins: account
                .coins
                .saturating_add(u64::from(self.config.coins_per_completion)),
            energy_level,
        }
    }

    /// Credit the coins attached to an unlocked achievement.
    pub fn apply_achievement_reward(
        &self,
        account: &GamificationAccount,
        coins: u32,
    ) -> GamificationAccount {
        GamificationAccount {
            coins: account.coins.saturating_add(u64::from(coins)),
            energy_level: account.energy_level,
        }
    }
}

/// Reward one completion with the default amounts.
pub fn apply_completion_reward(account: &GamificationAccount) -> GamificationAccount {
    RewardIssuer::new().apply_completion_reward(account)
}
