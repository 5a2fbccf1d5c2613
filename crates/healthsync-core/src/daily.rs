//! Daily activity facts.
//!
//! One [`DailyFacts`] record exists per (user, calendar date). Records are
//! created empty on first access and then mutated through partial
//! [`DailyFactsUpdate`]s, where only the fields that are present change.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::scoring::DailyScore;

/// Self-reported mood for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Excellent,
    Good,
    Neutral,
    Bad,
    Terrible,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Excellent,
        Mood::Good,
        Mood::Neutral,
        Mood::Bad,
        Mood::Terrible,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Excellent => "excellent",
            Mood::Good => "good",
            Mood::Neutral => "neutral",
            Mood::Bad => "bad",
            Mood::Terrible => "terrible",
        }
    }

    /// Lenient parse used when reading stored rows: unknown labels map to
    /// `None`, which scores the same as an unset mood.
    pub fn parse_lenient(value: &str) -> Option<Mood> {
        value.parse().ok()
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "excellent" => Ok(Mood::Excellent),
            "good" => Ok(Mood::Good),
            "neutral" => Ok(Mood::Neutral),
            "bad" => Ok(Mood::Bad),
            "terrible" => Ok(Mood::Terrible),
            other => Err(ValidationError::InvalidValue {
                field: "mood".to_string(),
                message: format!(
                    "'{other}' is not one of excellent, good, neutral, bad, terrible"
                ),
            }),
        }
    }
}

/// Raw facts logged for one user on one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyFacts {
    pub date: NaiveDate,
    #[serde(default)]
    pub steps: u32,
    /// Water intake in millilitres. Stored, not scored.
    #[serde(default)]
    pub water_ml: u32,
    /// Hours slept; `None` when nothing was logged.
    #[serde(default)]
    pub sleep_hours: Option<f64>,
    #[serde(default)]
    pub breakfast: bool,
    #[serde(default)]
    pub lunch: bool,
    #[serde(default)]
    pub dinner: bool,
    #[serde(default)]
    pub mood: Option<Mood>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl DailyFacts {
    /// An empty record, as created lazily on first access for a date.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            steps: 0,
            water_ml: 0,
            sleep_hours: None,
            breakfast: false,
            lunch: false,
            dinner: false,
            mood: None,
            notes: None,
        }
    }

    /// Number of the three main meals marked as eaten.
    pub fn meals_eaten(&self) -> u8 {
        [self.breakfast, self.lunch, self.dinner]
            .iter()
            .filter(|eaten| **eaten)
            .count() as u8
    }

    /// Reject structurally invalid values.
    ///
    /// Counts are unsigned, so only sleep can be out of range here.
    ///
    /// # Errors
    /// Returns an error if `sleep_hours` is negative or not finite.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(hours) = self.sleep_hours {
            ValidationError::check_range("sleep_hours", hours, 0.0, f64::MAX)?;
        }
        Ok(())
    }
}

/// A day's facts together with the score derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    #[serde(flatten)]
    pub facts: DailyFacts,
    pub score: DailyScore,
}

/// Partial update of a day's facts. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyFactsUpdate {
    #[serde(default)]
    pub steps: Option<u32>,
    #[serde(default)]
    pub water_ml: Option<u32>,
    #[serde(default)]
    pub sleep_hours: Option<f64>,
    #[serde(default)]
    pub breakfast: Option<bool>,
    #[serde(default)]
    pub lunch: Option<bool>,
    #[serde(default)]
    pub dinner: Option<bool>,
    #[serde(default)]
    pub mood: Option<Mood>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl DailyFactsUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the present fields to `facts`, validating the result.
    ///
    /// `facts` is left untouched when validation fails.
    ///
    /// # Errors
    /// Returns an error if the updated facts are structurally invalid.
    pub fn apply_to(&self, facts: &mut DailyFacts) -> Result<(), ValidationError> {
        let mut next = facts.clone();
        if let Some(steps) = self.steps {
            next.steps = steps;
        }
        if let Some(water) = self.water_ml {
            next.water_ml = water;
        }
        if let Some(hours) = self.sleep_hours {
            next.sleep_hours = Some(hours);
        }
        if let Some(eaten) = self.breakfast {
            next.breakfast = eaten;
        }
        if let Some(eaten) = self.lunch {
            next.lunch = eaten;
        }
        if let Some(eaten) = self.dinner {
            next.dinner = eaten;
        }
        if let Some(mood) = self.mood {
            next.mood = Some(mood);
        }
        if let Some(ref notes) = self.notes {
            next.notes = Some(notes.clone());
        }
        next.validate()?;
        *facts = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    #[test]
    fn mood_parses_case_insensitively() {
        assert_eq!("Good".parse::<Mood>().unwrap(), Mood::Good);
        assert_eq!(" terrible ".parse::<Mood>().unwrap(), Mood::Terrible);
        assert!("ecstatic".parse::<Mood>().is_err());
        assert_eq!(Mood::parse_lenient("ecstatic"), None);
    }

    #[test]
    fn mood_roundtrips_through_display() {
        for mood in Mood::ALL {
            assert_eq!(mood.to_string().parse::<Mood>().unwrap(), mood);
        }
    }

    #[test]
    fn update_only_touches_present_fields() {
        let mut facts = DailyFacts::empty(day());
        facts.steps = 4000;
        facts.breakfast = true;

        let update = DailyFactsUpdate {
            water_ml: Some(750),
            mood: Some(Mood::Bad),
            ..Default::default()
        };
        update.apply_to(&mut facts).unwrap();

        assert_eq!(facts.steps, 4000);
        assert!(facts.breakfast);
        assert_eq!(facts.water_ml, 750);
        assert_eq!(facts.mood, Some(Mood::Bad));
    }

    #[test]
    fn update_rejects_negative_sleep_without_mutating() {
        let mut facts = DailyFacts::empty(day());
        facts.sleep_hours = Some(7.0);
        let update = DailyFactsUpdate {
            steps: Some(100),
            sleep_hours: Some(-1.0),
            ..Default::default()
        };

        let err = update.apply_to(&mut facts).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { ref field, .. } if field == "sleep_hours"));
        assert_eq!(facts.steps, 0);
        assert_eq!(facts.sleep_hours, Some(7.0));
    }

    #[test]
    fn meals_eaten_counts_flags() {
        let mut facts = DailyFacts::empty(day());
        assert_eq!(facts.meals_eaten(), 0);
        facts.lunch = true;
        facts.dinner = true;
        assert_eq!(facts.meals_eaten(), 2);
    }

    #[test]
    fn empty_update_is_empty() {
        assert!(DailyFactsUpdate::default().is_empty());
        let update = DailyFactsUpdate {
            lunch: Some(false),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
