//! Daily facts commands.
//!
//! `log` applies a partial update: only the flags given change the stored
//! day, everything else is kept.

use chrono::NaiveDate;
use clap::Subcommand;
use healthsync_core::{DailyFactsUpdate, Mood};

use super::{date_or_today, open_tracker, print_json, profile_id};

#[derive(Subcommand)]
pub enum DailyAction {
    /// Log facts for a day and rescore it
    Log {
        /// Profile username
        #[arg(long, short)]
        profile: String,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        steps: Option<u32>,
        /// Water intake in millilitres
        #[arg(long)]
        water: Option<u32>,
        /// Hours slept
        #[arg(long)]
        sleep: Option<f64>,
        #[arg(long)]
        breakfast: Option<bool>,
        #[arg(long)]
        lunch: Option<bool>,
        #[arg(long)]
        dinner: Option<bool>,
        /// excellent, good, neutral, bad or terrible
        #[arg(long)]
        mood: Option<Mood>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show a day's facts and scores
    Show {
        /// Profile username
        #[arg(long, short)]
        profile: String,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

pub fn run(action: DailyAction) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = open_tracker()?;

    match action {
        DailyAction::Log {
            profile,
            date,
            steps,
            water,
            sleep,
            breakfast,
            lunch,
            dinner,
            mood,
            notes,
        } => {
            let id = profile_id(&tracker, &profile)?;
            let update = DailyFactsUpdate {
                steps,
                water_ml: water,
                sleep_hours: sleep,
                breakfast,
                lunch,
                dinner,
                mood,
                notes,
            };
            if update.is_empty() {
                return Err("nothing to log: pass at least one of --steps, --water, --sleep, \
                            --breakfast, --lunch, --dinner, --mood, --notes"
                    .into());
            }
            let outcome = tracker.record_daily(id, date_or_today(date), &update)?;
            print_json(&outcome)?;
        }
        DailyAction::Show { profile, date } => {
            let id = profile_id(&tracker, &profile)?;
            let record = tracker.daily(id, date_or_today(date))?;
            print_json(&record)?;
        }
    }
    Ok(())
}
