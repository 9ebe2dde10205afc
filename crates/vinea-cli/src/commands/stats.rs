//! Session statistics commands.

use chrono::{Local, NaiveDate};
use clap::Subcommand;
use serde::Serialize;

use vinea_core::storage::Database;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's focus stats
    Today,
    /// Focus time per day over the last 7 days
    Week,
    /// Today's focus time per task
    Distribution,
}

#[derive(Serialize)]
struct TodaySummary {
    date: NaiveDate,
    berries_today: u64,
    sessions: u64,
    focus_secs: u64,
}

#[derive(Serialize)]
struct DayFocus {
    date: NaiveDate,
    focus_secs: u64,
}

#[derive(Serialize)]
struct TaskFocus {
    title: String,
    focus_secs: u64,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let today = Local::now().date_naive();

    match action {
        StatsAction::Today => {
            let ledger = db.load_ledger()?;
            let stats = db.today_stats(today)?;
            let berries_today = if ledger.last_focus_date == Some(today) {
                ledger.berries_today
            } else {
                0
            };
            let summary = TodaySummary {
                date: today,
                berries_today,
                sessions: stats.sessions,
                focus_secs: stats.focus_secs,
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        StatsAction::Week => {
            let week: Vec<DayFocus> = db
                .weekly_focus(today)?
                .into_iter()
                .map(|(date, focus_secs)| DayFocus { date, focus_secs })
                .collect();
            println!("{}", serde_json::to_string_pretty(&week)?);
        }
        StatsAction::Distribution => {
            let dist: Vec<TaskFocus> = db
                .task_distribution(today)?
                .into_iter()
                .map(|(title, focus_secs)| TaskFocus { title, focus_secs })
                .collect();
            println!("{}", serde_json::to_string_pretty(&dist)?);
        }
    }
    Ok(())
}
