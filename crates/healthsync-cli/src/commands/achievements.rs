use clap::Subcommand;

use super::{open_tracker, print_json, profile_id};

#[derive(Subcommand)]
pub enum AchievementsAction {
    /// List the catalog with unlock times for a profile
    List {
        /// Profile username
        #[arg(long, short)]
        profile: String,
    },
}

pub fn run(action: AchievementsAction) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = open_tracker()?;

    match action {
        AchievementsAction::List { profile } => {
            let id = profile_id(&tracker, &profile)?;
            print_json(&tracker.achievement_board(id)?)?;
        }
    }
    Ok(())
}
