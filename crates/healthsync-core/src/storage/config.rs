//! TOML-based application configuration.
//!
//! Holds the tunable parameters of the engines:
//! - Scoring goals (steps, sleep)
//! - Energy window and neutral default
//! - Streak lookback
//! - Completion reward amounts
//!
//! Configuration is stored at `<data_dir>/config.toml`. Every field has a
//! default, so a partial or missing file yields the stock behaviour.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::energy::{EnergyAggregator, EnergyConfig};
use crate::error::{ConfigError, Result};
use crate::reward::{RewardConfig, RewardIssuer};
use crate::scoring::{ScoreEngine, ScoringConfig};
use crate::streak::{StreakConfig, StreakTracker};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub energy: EnergyConfig,
    #[serde(default)]
    pub streak: StreakConfig,
    #[serde(default)]
    pub rewards: RewardConfig,
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(n) => {
                        if n.is_f64() {
                            let parsed = value
                                .parse::<f64>()
                                .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                            serde_json::Number::from_f64(parsed)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("'{value}' is not finite")))?
                        } else {
                            let parsed = value.parse::<u64>().map_err(|_| {
                                invalid(format!("cannot parse '{value}' as a whole number"))
                            })?;
                            serde_json::Value::Number(parsed.into())
                        }
                    }
                    serde_json::Value::Object(_) => return Err(unknown()),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults when no file exists.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    ///
    /// # Errors
    ///
    /// See [`Config::save`].
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, in memory.
    ///
    /// The updated configuration is validated before it replaces `self`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting configuration is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check that every section builds a working engine.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.score_engine()?;
        self.energy_aggregator()?;
        self.streak_tracker()?;
        self.reward_issuer()?;
        Ok(())
    }

    pub fn score_engine(&self) -> Result<ScoreEngine> {
        Ok(ScoreEngine::with_config(self.scoring.clone())?)
    }

    pub fn energy_aggregator(&self) -> Result<EnergyAggregator> {
        Ok(EnergyAggregator::with_config(&self.energy)?)
    }

    pub fn streak_tracker(&self) -> Result<StreakTracker> {
        Ok(StreakTracker::with_config(self.streak.clone())?)
    }

    pub fn reward_issuer(&self) -> Result<RewardIssuer> {
        Ok(RewardIssuer::with_config(self.rewards.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[streak]\nlookback = 14\n").unwrap();
        assert_eq!(parsed.streak.lookback, 14);
        assert_eq!(parsed.scoring.step_goal, 10_000);
        assert_eq!(parsed.energy.neutral_default, 50.0);
        assert_eq!(parsed.rewards.coins_per_completion, 2);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("scoring.step_goal").as_deref(), Some("10000"));
        assert_eq!(cfg.get("energy.window_days").as_deref(), Some("7"));
        assert_eq!(cfg.get("rewards.energy_bonus").as_deref(), Some("3.0"));
        assert!(cfg.get("scoring.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_integer_and_float_fields() {
        let mut cfg = Config::default();
        cfg.set("scoring.step_goal", "8000").unwrap();
        cfg.set("scoring.sleep_goal_hours", "7.5").unwrap();
        assert_eq!(cfg.scoring.step_goal, 8000);
        assert_eq!(cfg.scoring.sleep_goal_hours, 7.5);
    }

    #[test]
    fn set_accepts_whole_number_for_float_field() {
        let mut cfg = Config::default();
        cfg.set("energy.neutral_default", "60").unwrap();
        assert_eq!(cfg.energy.neutral_default, 60.0);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        let err = cfg.set("scoring.nonexistent", "1").unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::UnknownKey(_))));
        assert!(cfg.set("scoring", "1").is_err());
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set("streak.lookback", "seven").is_err());
        assert!(cfg.set("streak.lookback", "-1").is_err());
    }

    #[test]
    fn set_rejects_values_that_break_an_engine() {
        let mut cfg = Config::default();
        assert!(cfg.set("streak.lookback", "0").is_err());
        assert!(cfg.set("energy.neutral_default", "150").is_err());
        assert!(cfg.set("energy.window_days", "100000000").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.set("rewards.coins_per_completion", "5").unwrap();
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().rewards.coins_per_completion, 5);
    }

    #[test]
    fn load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[energy]\nwindow_days = 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
