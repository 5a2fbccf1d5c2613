use clap::Subcommand;

use super::{open_tracker, print_json};

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Create a profile
    Create {
        /// Unique username
        username: String,
    },
    /// Show a profile with its coins and energy level
    Show {
        username: String,
    },
    /// List all profiles
    List,
}

pub fn run(action: ProfileAction) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = open_tracker()?;

    match action {
        ProfileAction::Create { username } => {
            let profile = tracker.create_profile(&username)?;
            print_json(&profile)?;
        }
        ProfileAction::Show { username } => {
            let profile = tracker.profile_by_name(&username)?;
            print_json(&profile)?;
        }
        ProfileAction::List => {
            let profiles = tracker.db().list_profiles()?;
            print_json(&profiles)?;
        }
    }
    Ok(())
}
