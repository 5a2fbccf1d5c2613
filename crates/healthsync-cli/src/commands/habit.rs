use chrono::NaiveDate;
use clap::Subcommand;
use healthsync_core::NewHabit;

use super::{date_or_today, open_tracker, print_json, profile_id};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Add a habit
    Add {
        /// Profile username
        #[arg(long, short)]
        profile: String,
        /// Habit name
        name: String,
        /// Target value recorded when a completion gives none
        #[arg(long)]
        target: Option<i64>,
        /// Unit of the target value
        #[arg(long, default_value = "times")]
        unit: String,
    },
    /// List habits
    List {
        /// Profile username
        #[arg(long, short)]
        profile: String,
        /// Include archived habits
        #[arg(long)]
        all: bool,
    },
    /// Mark a habit completed for a day
    Complete {
        /// Profile username
        #[arg(long, short)]
        profile: String,
        /// Habit ID
        id: i64,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Achieved value, defaults to the habit's target
        #[arg(long)]
        value: Option<i64>,
    },
    /// Archive a habit
    Archive {
        /// Profile username
        #[arg(long, short)]
        profile: String,
        /// Habit ID
        id: i64,
    },
}

pub fn run(action: HabitAction) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = open_tracker()?;

    match action {
        HabitAction::Add {
            profile,
            name,
            target,
            unit,
        } => {
            let id = profile_id(&tracker, &profile)?;
            let habit = tracker.add_habit(
                id,
                &NewHabit {
                    name,
                    target_value: target,
                    unit,
                },
            )?;
            print_json(&habit)?;
        }
        HabitAction::List { profile, all } => {
            let id = profile_id(&tracker, &profile)?;
            print_json(&tracker.habits(id, all)?)?;
        }
        HabitAction::Complete {
            profile,
            id,
            date,
            value,
        } => {
            let profile = profile_id(&tracker, &profile)?;
            let outcome = tracker.complete_habit(profile, id, date_or_today(date), value)?;
            print_json(&outcome)?;
        }
        HabitAction::Archive { profile, id } => {
            let profile = profile_id(&tracker, &profile)?;
            let habit = tracker.archive_habit(profile, id)?;
            println!("Habit archived: {} ({})", habit.name, habit.id);
        }
    }
    Ok(())
}
