//! Task management commands.

use clap::Subcommand;
use uuid::Uuid;

use vinea_core::storage::Database;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Create {
        /// Task title
        title: String,
    },
    /// List tasks
    List {
        /// Show only completed (true) or only open (false) tasks
        #[arg(long)]
        completed: Option<bool>,
    },
    /// Mark a task as completed
    Complete {
        /// Task ID
        id: Uuid,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: Uuid,
    },
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open()?;

    match action {
        TaskAction::Create { title } => {
            let task = db.create_task(&title)?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::List { completed } => {
            let tasks = db.list_tasks(completed)?;
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }
        TaskAction::Complete { id } => {
            db.complete_task(id)?;
            println!("ok");
        }
        TaskAction::Delete { id } => {
            db.delete_task(id)?;
            println!("ok");
        }
    }
    Ok(())
}
