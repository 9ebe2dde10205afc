use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Focus,
    Break,
}

/// One focus-or-break interval, created by [`TimerEngine::start`].
///
/// [`TimerEngine::start`]: super::TimerEngine::start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub task_id: Option<Uuid>,
    pub kind: SessionKind,
    /// Planned duration in seconds.
    pub duration_secs: u64,
    pub started_at: DateTime<Utc>,
}

impl Session {
    /// Planned duration in milliseconds.
    ///
    /// Uses saturating arithmetic to prevent overflow with large values.
    pub fn duration_ms(&self) -> u64 {
        self.duration_secs.saturating_mul(1000)
    }
}
