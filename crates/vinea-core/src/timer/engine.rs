//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine. It does not use
//! internal threads - the caller is responsible for calling `tick()`
//! periodically. Remaining time is computed from wall-clock deltas, not
//! tick counts, so irregular tick intervals cause no drift.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused | Completed | Stopped)
//! Paused -> (Running | Stopped)
//! ```
//!
//! `Completed` and `Stopped` are terminal for the session instance;
//! `start()` from either creates a fresh session.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new();
//! engine.start(SessionKind::Focus, 25 * 60, None)?;
//! // In a loop:
//! engine.tick(); // Returns Some(Event::FocusCompleted) when time runs out
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::session::{Session, SessionKind};
use crate::error::TimerError;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Completed,
    Stopped,
}

impl std::fmt::Display for TimerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TimerState::Idle => "idle",
            TimerState::Running => "running",
            TimerState::Paused => "paused",
            TimerState::Completed => "completed",
            TimerState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Core timer engine.
///
/// Operates on wall-clock deltas -- no internal thread. The caller is
/// responsible for calling `tick()` periodically. Commands that are not
/// valid in the current state fail with [`TimerError::InvalidTransition`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    state: TimerState,
    /// The session being timed. `None` only before the first `start()`.
    session: Option<Session>,
    /// Remaining time in milliseconds for the current session.
    remaining_ms: u64,
    /// Timestamp (ms since epoch) when the timer was last resumed/started.
    /// Used to compute elapsed time between ticks.
    #[serde(default)]
    last_tick_epoch_ms: Option<u64>,
}

impl TimerEngine {
    pub fn new() -> Self {
        Self {
            state: TimerState::Idle,
            session: None,
            remaining_ms: 0,
            last_tick_epoch_ms: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn total_ms(&self) -> u64 {
        self.session.as_ref().map(|s| s.duration_ms()).unwrap_or(0)
    }

    /// 0.0 .. 1.0 progress within the current session.
    pub fn progress(&self) -> f64 {
        let total = self.total_ms();
        if total == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_ms as f64 / total as f64)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            kind: self.session.as_ref().map(|s| s.kind),
            remaining_ms: self.remaining_ms,
            total_ms: self.total_ms(),
            progress_pct: self.progress() * 100.0,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Create a new session and start timing it.
    ///
    /// Valid from `Idle` and from the terminal states (`Completed`,
    /// `Stopped`) of a previous session.
    pub fn start(
        &mut self,
        kind: SessionKind,
        duration_secs: u64,
        task_id: Option<Uuid>,
    ) -> Result<Event, TimerError> {
        match self.state {
            TimerState::Idle | TimerState::Completed | TimerState::Stopped => {
                let session = Session {
                    id: Uuid::new_v4(),
                    task_id,
                    kind,
                    duration_secs,
                    started_at: Utc::now(),
                };
                self.remaining_ms = session.duration_ms();
                self.last_tick_epoch_ms = Some(now_ms());
                self.state = TimerState::Running;
                let event = Event::TimerStarted {
                    session_id: session.id,
                    kind: session.kind,
                    duration_secs: session.duration_secs,
                    task_id: session.task_id,
                    at: Utc::now(),
                };
                self.session = Some(session);
                Ok(event)
            }
            state => Err(TimerError::InvalidTransition {
                command: "start",
                state,
            }),
        }
    }

    /// Freeze the remaining time. Valid only while `Running`.
    pub fn pause(&mut self) -> Result<Event, TimerError> {
        match self.state {
            TimerState::Running => {
                // Flush elapsed time first.
                self.flush_elapsed();
                self.state = TimerState::Paused;
                self.last_tick_epoch_ms = None;
                Ok(Event::TimerPaused {
                    remaining_ms: self.remaining_ms,
                    at: Utc::now(),
                })
            }
            state => Err(TimerError::InvalidTransition {
                command: "pause",
                state,
            }),
        }
    }

    /// Continue timing. Valid only while `Paused`.
    pub fn resume(&mut self) -> Result<Event, TimerError> {
        match self.state {
            TimerState::Paused => {
                self.state = TimerState::Running;
                self.last_tick_epoch_ms = Some(now_ms());
                Ok(Event::TimerResumed {
                    remaining_ms: self.remaining_ms,
                    at: Utc::now(),
                })
            }
            state => Err(TimerError::InvalidTransition {
                command: "resume",
                state,
            }),
        }
    }

    /// Abandon the session. Valid from `Running` or `Paused`.
    ///
    /// Stopping early forfeits the reward: no currency, XP, or badge
    /// effects are ever attached to a stopped session.
    pub fn stop(&mut self) -> Result<Event, TimerError> {
        match self.state {
            TimerState::Running | TimerState::Paused => {
                if self.state == TimerState::Running {
                    self.flush_elapsed();
                }
                self.state = TimerState::Stopped;
                self.last_tick_epoch_ms = None;
                let (session_id, kind) = self
                    .session
                    .as_ref()
                    .map(|s| (s.id, s.kind))
                    .unwrap_or((Uuid::nil(), SessionKind::Focus));
                Ok(Event::TimerStopped {
                    session_id,
                    kind,
                    remaining_ms: self.remaining_ms,
                    at: Utc::now(),
                })
            }
            state => Err(TimerError::InvalidTransition {
                command: "stop",
                state,
            }),
        }
    }

    /// Call periodically while a session runs.
    ///
    /// Returns `Some(Event::FocusCompleted)` or `Some(Event::BreakCompleted)`
    /// exactly once, when the session's remaining time reaches zero. Ticks in
    /// any other state are a no-op -- tick delivery is a host scheduling
    /// concern and must never fail.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.flush_elapsed();
        if self.remaining_ms > 0 {
            return None;
        }
        self.state = TimerState::Completed;
        self.last_tick_epoch_ms = None;
        let session = self.session.as_ref()?;
        let at = Utc::now();
        Some(match session.kind {
            SessionKind::Focus => Event::FocusCompleted {
                session_id: session.id,
                task_id: session.task_id,
                duration_secs: session.duration_secs,
                started_at: session.started_at,
                completed_at: at,
            },
            SessionKind::Break => Event::BreakCompleted {
                session_id: session.id,
                at,
            },
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn flush_elapsed(&mut self) {
        if let Some(last) = self.last_tick_epoch_ms {
            let now = now_ms();
            let elapsed = now.saturating_sub(last);
            self.remaining_ms = self.remaining_ms.saturating_sub(elapsed);
            self.last_tick_epoch_ms = Some(now);
        }
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_pause_resume_stop() {
        let mut engine = TimerEngine::new();
        assert_eq!(engine.state(), TimerState::Idle);

        engine.start(SessionKind::Focus, 25 * 60, None).unwrap();
        assert_eq!(engine.state(), TimerState::Running);

        engine.pause().unwrap();
        assert_eq!(engine.state(), TimerState::Paused);

        engine.resume().unwrap();
        assert_eq!(engine.state(), TimerState::Running);

        engine.stop().unwrap();
        assert_eq!(engine.state(), TimerState::Stopped);
    }

    #[test]
    fn invalid_transitions_are_errors() {
        let mut engine = TimerEngine::new();
        assert!(matches!(
            engine.pause(),
            Err(TimerError::InvalidTransition {
                command: "pause",
                state: TimerState::Idle,
            })
        ));
        assert!(engine.resume().is_err());
        assert!(engine.stop().is_err());

        engine.start(SessionKind::Focus, 60, None).unwrap();
        assert!(engine.start(SessionKind::Focus, 60, None).is_err());
        assert!(engine.resume().is_err());

        engine.pause().unwrap();
        assert!(engine.pause().is_err());
        assert!(engine.start(SessionKind::Break, 60, None).is_err());
    }

    #[test]
    fn start_is_legal_from_terminal_states() {
        let mut engine = TimerEngine::new();
        engine.start(SessionKind::Focus, 60, None).unwrap();
        engine.stop().unwrap();
        engine.start(SessionKind::Break, 60, None).unwrap();
        assert_eq!(engine.state(), TimerState::Running);
    }

    #[test]
    fn zero_duration_focus_completes_on_first_tick() {
        let mut engine = TimerEngine::new();
        engine.start(SessionKind::Focus, 0, None).unwrap();
        let event = engine.tick().expect("completion event");
        assert!(matches!(event, Event::FocusCompleted { .. }));
        assert_eq!(engine.state(), TimerState::Completed);
        // Exactly one completion event per session.
        assert!(engine.tick().is_none());
    }

    #[test]
    fn break_completion_emits_break_event() {
        let mut engine = TimerEngine::new();
        engine.start(SessionKind::Break, 0, None).unwrap();
        let event = engine.tick().expect("completion event");
        assert!(matches!(event, Event::BreakCompleted { .. }));
    }

    #[test]
    fn tick_outside_running_is_noop() {
        let mut engine = TimerEngine::new();
        assert!(engine.tick().is_none());
        engine.start(SessionKind::Focus, 60, None).unwrap();
        engine.pause().unwrap();
        assert!(engine.tick().is_none());
        assert_eq!(engine.state(), TimerState::Paused);
    }

    #[test]
    fn snapshot_reflects_session() {
        let mut engine = TimerEngine::new();
        engine.start(SessionKind::Focus, 25 * 60, None).unwrap();
        match engine.snapshot() {
            Event::StateSnapshot {
                state,
                kind,
                total_ms,
                ..
            } => {
                assert_eq!(state, TimerState::Running);
                assert_eq!(kind, Some(SessionKind::Focus));
                assert_eq!(total_ms, 25 * 60 * 1000);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }

    #[test]
    fn engine_round_trips_through_serde() {
        let mut engine = TimerEngine::new();
        engine.start(SessionKind::Focus, 60, None).unwrap();
        engine.pause().unwrap();
        let json = serde_json::to_string(&engine).unwrap();
        let restored: TimerEngine = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.state(), TimerState::Paused);
        assert_eq!(restored.remaining_ms(), engine.remaining_ms());
    }
}
