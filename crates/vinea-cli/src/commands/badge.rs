//! Badge catalog commands.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde::Serialize;

use vinea_core::storage::Database;
use vinea_core::{Badge, BadgeCategory};

#[derive(Subcommand)]
pub enum BadgeAction {
    /// List the full catalog with earned status
    List,
}

#[derive(Serialize)]
struct BadgeStatus {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: BadgeCategory,
    earned: bool,
    unlocked_at: Option<DateTime<Utc>>,
}

pub fn run(action: BadgeAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        BadgeAction::List => {
            let unlocked = db.unlocked_badges()?;
            let catalog: Vec<BadgeStatus> = Badge::ALL
                .iter()
                .map(|badge| {
                    let unlocked_at = unlocked
                        .iter()
                        .find(|(b, _)| b == badge)
                        .map(|(_, at)| *at);
                    BadgeStatus {
                        id: badge.id(),
                        name: badge.name(),
                        description: badge.description(),
                        category: badge.category(),
                        earned: unlocked_at.is_some(),
                        unlocked_at,
                    }
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&catalog)?);
        }
    }
    Ok(())
}
