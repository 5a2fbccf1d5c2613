use chrono::{Duration, NaiveDate};
use clap::Subcommand;

use super::{date_or_today, open_tracker, print_json, profile_id};

#[derive(Subcommand)]
pub enum AnalyticsAction {
    /// Averages and habit statistics over a period
    Summary {
        /// Profile username
        #[arg(long, short)]
        profile: String,
        /// First day (YYYY-MM-DD), defaults to six days before the end
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        end: Option<NaiveDate>,
    },
}

pub fn run(action: AnalyticsAction) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = open_tracker()?;

    match action {
        AnalyticsAction::Summary {
            profile,
            start,
            end,
        } => {
            let id = profile_id(&tracker, &profile)?;
            let end = date_or_today(end);
            let start = start.unwrap_or(end - Duration::days(6));
            print_json(&tracker.period_summary(id, start, end)?)?;
        }
    }
    Ok(())
}
