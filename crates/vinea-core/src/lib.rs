//! # Vinea Core Library
//!
//! Core business logic for Vinea, a gamified focus timer. Completed
//! focus sessions earn grape berries; berries roll up through a fixed
//! 10x evolution chain (bunch, box, bottle, crate), convert to XP and
//! levels, and unlock a fixed catalog of achievement badges. Hosts (the
//! CLI, a desktop shell) are thin layers over this library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a wall-clock-based state machine that requires the
//!   caller to periodically invoke `tick()`; the sole producer of
//!   `FocusCompleted` events
//! - **Progression**: the ledger aggregate plus the evolution, leveling,
//!   and badge rules applied atomically per completed focus session
//! - **Storage**: SQLite-based persistence and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: core timer state machine
//! - [`Ledger`]: singleton aggregate of all progression counters
//! - [`Badge`]: the fixed achievement catalog
//! - [`Database`]: durable storage with a single-transaction focus commit

pub mod error;
pub mod events;
pub mod progression;
pub mod storage;
pub mod task;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, TimerError};
pub use events::Event;
pub use progression::{Badge, BadgeCategory, FocusOutcome, Ledger, Stage};
pub use storage::{Config, Database, SessionRecord, TodayStats};
pub use task::Task;
pub use timer::{Session, SessionKind, TimerEngine, TimerState};
