//! The progression ledger: the singleton aggregate of all durable
//! progression counters.
//!
//! The ledger exposes exactly one mutating operation for focus
//! completions, [`Ledger::apply_focus`], which applies the currency
//! increment, evolution rollup, XP/level update, streak update, and badge
//! scan as a single in-memory mutation. The storage layer persists the
//! result as one transaction, so no caller ever observes a
//! partially-updated ledger.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::badges::{self, Badge, BadgeContext};
use super::evolution::{self, Stage, UNITS_PER_STAGE};
use super::leveling::{self, XP_PER_BERRY};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    /// Berries earned today. Reset lazily when a new day's first focus
    /// session completes.
    pub berries_today: u64,
    pub berries_lifetime: u64,
    pub bunches_completed: u64,
    pub boxes_completed: u64,
    pub bottles_completed: u64,
    pub crates_completed: u64,
    /// XP surplus toward the next level.
    pub experience: u64,
    pub level: u32,
    pub consecutive_focus_days: u32,
    pub last_focus_date: Option<NaiveDate>,
    pub total_focus_secs: u64,
    pub total_tasks_completed: u64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            berries_today: 0,
            berries_lifetime: 0,
            bunches_completed: 0,
            boxes_completed: 0,
            bottles_completed: 0,
            crates_completed: 0,
            experience: 0,
            level: 1,
            consecutive_focus_days: 0,
            last_focus_date: None,
            total_focus_secs: 0,
            total_tasks_completed: 0,
        }
    }
}

/// Calendar and history context for one focus completion.
pub struct FocusContext<'a> {
    /// Planned duration of the completed session, in seconds.
    pub duration_secs: u64,
    /// Completion time on the host's local calendar. Drives the streak,
    /// the daily counter reset, and the time-of-day badges.
    pub completed_at_local: NaiveDateTime,
    /// Distinct focus days in the current calendar month, including today.
    pub focus_days_this_month: u32,
    /// Badges already unlocked, which the evaluator must skip.
    pub unlocked: &'a HashSet<Badge>,
}

/// Everything a single focus completion produced beyond the counter
/// increments themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusOutcome {
    /// Stages completed by this berry's rollup, lowest first.
    pub stages_completed: Vec<Stage>,
    /// New levels reached, in order.
    pub level_ups: Vec<u32>,
    /// Badges unlocked by this event.
    pub new_badges: Vec<Badge>,
}

impl FocusOutcome {
    /// Expand into UI-facing events, stamped with the completion time.
    pub fn events(&self, at: chrono::DateTime<chrono::Utc>) -> Vec<crate::events::Event> {
        use crate::events::Event;
        let mut events = Vec::new();
        for stage in &self.stages_completed {
            events.push(Event::StageCompleted { stage: *stage, at });
        }
        for new_level in &self.level_ups {
            events.push(Event::LevelUp {
                new_level: *new_level,
                at,
            });
        }
        for badge in &self.new_badges {
            events.push(Event::BadgeUnlocked { badge: *badge, at });
        }
        events
    }
}

impl Ledger {
    // Leftover units not yet rolled up into the next stage. Derived, so
    // the rollup-normalization invariant cannot be violated by a missed
    // counter write.

    pub fn pending_berries(&self) -> u64 {
        self.berries_lifetime - self.bunches_completed * UNITS_PER_STAGE
    }

    pub fn pending_bunches(&self) -> u64 {
        self.bunches_completed - self.boxes_completed * UNITS_PER_STAGE
    }

    pub fn pending_boxes(&self) -> u64 {
        self.boxes_completed - self.bottles_completed * UNITS_PER_STAGE
    }

    pub fn pending_bottles(&self) -> u64 {
        self.bottles_completed - self.crates_completed * UNITS_PER_STAGE
    }

    /// Apply one completed focus session to the ledger.
    ///
    /// Exactly one berry is processed per call. Steps, in order: daily
    /// counter reset (on date change), currency increments, evolution
    /// rollup, XP and level-ups, streak update, and finally the badge
    /// scan against the fully updated ledger.
    pub fn apply_focus(&mut self, ctx: &FocusContext<'_>) -> FocusOutcome {
        let today = ctx.completed_at_local.date();
        let prev_focus_date = self.last_focus_date;

        if prev_focus_date != Some(today) {
            self.berries_today = 0;
        }
        self.berries_today += 1;
        self.berries_lifetime += 1;
        self.total_focus_secs += ctx.duration_secs;

        let stages_completed = evolution::roll_up(self);
        let level_ups = leveling::gain_xp(self, XP_PER_BERRY);

        self.consecutive_focus_days = match prev_focus_date {
            Some(prev) if prev == today => self.consecutive_focus_days,
            Some(prev) if today.signed_duration_since(prev).num_days() == 1 => {
                self.consecutive_focus_days + 1
            }
            _ => 1,
        };
        self.last_focus_date = Some(today);

        let new_badges = badges::evaluate(
            &BadgeContext {
                ledger: self,
                completed_at_local: ctx.completed_at_local,
                focus_days_this_month: ctx.focus_days_this_month,
            },
            ctx.unlocked,
        );

        FocusOutcome {
            stages_completed,
            level_ups,
            new_badges,
        }
    }
}
