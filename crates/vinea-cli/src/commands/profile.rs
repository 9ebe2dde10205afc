//! Level and currency profile commands.

use chrono::NaiveDate;
use clap::Subcommand;
use serde::Serialize;

use vinea_core::progression::xp_to_next;
use vinea_core::storage::Database;

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show the current profile
    Show,
}

#[derive(Serialize)]
struct Profile {
    level: u32,
    experience: u64,
    xp_to_next_level: u64,
    berries_lifetime: u64,
    pending_berries: u64,
    bunches_completed: u64,
    boxes_completed: u64,
    bottles_completed: u64,
    crates_completed: u64,
    consecutive_focus_days: u32,
    last_focus_date: Option<NaiveDate>,
    total_focus_secs: u64,
    total_tasks_completed: u64,
}

pub fn run(action: ProfileAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        ProfileAction::Show => {
            let ledger = db.load_ledger()?;
            let profile = Profile {
                level: ledger.level,
                experience: ledger.experience,
                xp_to_next_level: xp_to_next(ledger.level),
                berries_lifetime: ledger.berries_lifetime,
                pending_berries: ledger.pending_berries(),
                bunches_completed: ledger.bunches_completed,
                boxes_completed: ledger.boxes_completed,
                bottles_completed: ledger.bottles_completed,
                crates_completed: ledger.crates_completed,
                consecutive_focus_days: ledger.consecutive_focus_days,
                last_focus_date: ledger.last_focus_date,
                total_focus_secs: ledger.total_focus_secs,
                total_tasks_completed: ledger.total_tasks_completed,
            };
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
    }
    Ok(())
}
