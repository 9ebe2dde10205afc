use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::progression::{Badge, Stage};
use crate::timer::{SessionKind, TimerState};

/// Every state change in the system produces an Event.
/// Hosts (CLI, GUI) render these however they like; the core only emits them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        session_id: Uuid,
        kind: SessionKind,
        duration_secs: u64,
        task_id: Option<Uuid>,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// Session abandoned before completion. No reward is ever attached.
    TimerStopped {
        session_id: Uuid,
        kind: SessionKind,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// A focus session ran to completion. The sole trigger of the
    /// progression update.
    FocusCompleted {
        session_id: Uuid,
        task_id: Option<Uuid>,
        duration_secs: u64,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    /// A break ran to completion. Notification only, no ledger effect.
    BreakCompleted {
        session_id: Uuid,
        at: DateTime<Utc>,
    },
    /// An evolution stage rolled over (10 units of the stage below).
    StageCompleted {
        stage: Stage,
        at: DateTime<Utc>,
    },
    LevelUp {
        new_level: u32,
        at: DateTime<Utc>,
    },
    BadgeUnlocked {
        badge: Badge,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        kind: Option<SessionKind>,
        remaining_ms: u64,
        total_ms: u64,
        progress_pct: f64,
        at: DateTime<Utc>,
    },
}
