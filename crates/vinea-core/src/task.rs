//! The task register.
//!
//! Tasks exist to give sessions a "what am I working on" reference and to
//! feed the completed-task count. Time distribution per task is derived
//! from the sessions table, not stored here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            completed: false,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}
