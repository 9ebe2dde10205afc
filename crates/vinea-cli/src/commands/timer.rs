//! Timer control commands.
//!
//! The engine is persisted in the kv store between invocations, so
//! `start`, `pause`, and `status` all operate on the same session. The
//! host tick happens in `status`: when it reports a completed focus
//! session, the progression update is applied and committed here.

use chrono::Local;
use clap::Subcommand;
use uuid::Uuid;

use vinea_core::storage::{Config, Database};
use vinea_core::{Event, SessionKind, SessionRecord, TimerEngine};

const ENGINE_KEY: &str = "timer_engine";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a focus session
    Focus {
        /// Duration in minutes (defaults to the configured focus duration)
        #[arg(long)]
        minutes: Option<u32>,
        /// Task to attribute the session to
        #[arg(long)]
        task_id: Option<Uuid>,
    },
    /// Start a break
    Break {
        /// Duration in minutes (defaults to the configured break duration)
        #[arg(long)]
        minutes: Option<u32>,
    },
    /// Pause the running session
    Pause,
    /// Resume a paused session
    Resume,
    /// Stop the session early (forfeits the reward)
    Stop,
    /// Print current timer state; applies progression if a focus session
    /// has completed
    Status,
}

fn load_engine(db: &Database) -> TimerEngine {
    if let Ok(Some(json)) = db.kv_get(ENGINE_KEY) {
        if let Ok(engine) = serde_json::from_str::<TimerEngine>(&json) {
            return engine;
        }
    }
    TimerEngine::new()
}

fn save_engine(db: &Database, engine: &TimerEngine) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(engine)?;
    db.kv_set(ENGINE_KEY, &json)?;
    Ok(())
}

fn print_event(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(event)?);
    Ok(())
}

/// Apply a completed focus session to the ledger and persist everything
/// in one transaction. Returns the progression events to show.
fn apply_focus_completion(
    db: &mut Database,
    event: &Event,
) -> Result<Vec<Event>, Box<dyn std::error::Error>> {
    let Event::FocusCompleted {
        session_id,
        task_id,
        duration_secs,
        started_at,
        completed_at,
    } = event
    else {
        return Ok(Vec::new());
    };

    let record = SessionRecord {
        id: *session_id,
        task_id: *task_id,
        kind: SessionKind::Focus,
        duration_secs: *duration_secs,
        started_at: *started_at,
        completed_at: *completed_at,
    };

    let mut ledger = db.load_ledger()?;
    let outcome = db.commit_focus(&mut ledger, &record, Local::now().naive_local())?;
    Ok(outcome.events(*completed_at))
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open()?;
    let mut engine = load_engine(&db);

    match action {
        TimerAction::Focus { minutes, task_id } => {
            let config = Config::load()?;
            let minutes = minutes.unwrap_or(config.timer.focus_minutes);
            let event = engine.start(SessionKind::Focus, u64::from(minutes) * 60, task_id)?;
            print_event(&event)?;
        }
        TimerAction::Break { minutes } => {
            let config = Config::load()?;
            let minutes = minutes.unwrap_or(config.timer.break_minutes);
            let event = engine.start(SessionKind::Break, u64::from(minutes) * 60, None)?;
            print_event(&event)?;
        }
        TimerAction::Pause => {
            let event = engine.pause()?;
            print_event(&event)?;
        }
        TimerAction::Resume => {
            let event = engine.resume()?;
            print_event(&event)?;
        }
        TimerAction::Stop => {
            let event = engine.stop()?;
            print_event(&event)?;
        }
        TimerAction::Status => {
            if let Some(event) = engine.tick() {
                print_event(&event)?;
                if matches!(event, Event::FocusCompleted { .. }) {
                    for progression_event in apply_focus_completion(&mut db, &event)? {
                        print_event(&progression_event)?;
                    }
                }
            }
            print_event(&engine.snapshot())?;
        }
    }

    save_engine(&db, &engine)?;
    Ok(())
}
