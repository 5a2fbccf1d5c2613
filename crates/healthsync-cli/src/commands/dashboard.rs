use chrono::NaiveDate;
use clap::Args;

use super::{date_or_today, open_tracker, print_json, profile_id};

#[derive(Args)]
pub struct DashboardArgs {
    /// Profile username
    #[arg(long, short)]
    profile: String,
    /// Date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,
}

pub fn run(args: DashboardArgs) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = open_tracker()?;
    let id = profile_id(&tracker, &args.profile)?;
    print_json(&tracker.dashboard(id, date_or_today(args.date))?)?;
    Ok(())
}
