//! Achievement badges.
//!
//! The catalog is a closed enum with one pure predicate per variant,
//! evaluated against a ledger snapshot plus calendar context. A badge
//! unlocks at most once, ever: already-unlocked badges are skipped, so
//! re-running the evaluation with an unchanged ledger is a no-op.

use std::collections::HashSet;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use super::ledger::Ledger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCategory {
    Milestone,
    Streak,
    Daily,
    Collection,
    TimeOfDay,
    Level,
    Task,
    Time,
}

/// The fixed badge catalog. Not user-editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    FirstStep,
    FirstBunch,
    FirstBox,
    FirstWine,
    WineMaster,
    WeekStreak,
    Persistent,
    FocusKing,
    MonthlyMaster,
    Veteran,
    GrapeFarm,
    Legend,
    EarlyBird,
    NightOwl,
    LevelMaster,
    Perfectionist,
    TimeTraveler,
}

/// Everything a badge predicate may look at.
pub struct BadgeContext<'a> {
    pub ledger: &'a Ledger,
    /// Local wall-clock time of the session completion that triggered
    /// this evaluation.
    pub completed_at_local: NaiveDateTime,
    /// Distinct days with at least one completed focus session in the
    /// current calendar month, including today.
    pub focus_days_this_month: u32,
}

impl Badge {
    pub const ALL: [Badge; 17] = [
        Badge::FirstStep,
        Badge::FirstBunch,
        Badge::FirstBox,
        Badge::FirstWine,
        Badge::WineMaster,
        Badge::WeekStreak,
        Badge::Persistent,
        Badge::FocusKing,
        Badge::MonthlyMaster,
        Badge::Veteran,
        Badge::GrapeFarm,
        Badge::Legend,
        Badge::EarlyBird,
        Badge::NightOwl,
        Badge::LevelMaster,
        Badge::Perfectionist,
        Badge::TimeTraveler,
    ];

    /// Stable identifier used as the persistence key.
    pub fn id(&self) -> &'static str {
        match self {
            Badge::FirstStep => "first_step",
            Badge::FirstBunch => "first_bunch",
            Badge::FirstBox => "first_box",
            Badge::FirstWine => "first_wine",
            Badge::WineMaster => "wine_master",
            Badge::WeekStreak => "week_streak",
            Badge::Persistent => "persistent",
            Badge::FocusKing => "focus_king",
            Badge::MonthlyMaster => "monthly_master",
            Badge::Veteran => "veteran",
            Badge::GrapeFarm => "grape_farm",
            Badge::Legend => "legend",
            Badge::EarlyBird => "early_bird",
            Badge::NightOwl => "night_owl",
            Badge::LevelMaster => "level_master",
            Badge::Perfectionist => "perfectionist",
            Badge::TimeTraveler => "time_traveler",
        }
    }

    pub fn from_id(id: &str) -> Option<Badge> {
        Badge::ALL.iter().copied().find(|b| b.id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Badge::FirstStep => "First Step",
            Badge::FirstBunch => "First Bunch",
            Badge::FirstBox => "First Box",
            Badge::FirstWine => "First Wine",
            Badge::WineMaster => "Wine Master",
            Badge::WeekStreak => "Week Streak",
            Badge::Persistent => "Persistent",
            Badge::FocusKing => "Focus King",
            Badge::MonthlyMaster => "Monthly Master",
            Badge::Veteran => "Veteran",
            Badge::GrapeFarm => "Grape Farm",
            Badge::Legend => "Legend",
            Badge::EarlyBird => "Early Bird",
            Badge::NightOwl => "Night Owl",
            Badge::LevelMaster => "Level Master",
            Badge::Perfectionist => "Perfectionist",
            Badge::TimeTraveler => "Time Traveler",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Badge::FirstStep => "Earn your first grape berry",
            Badge::FirstBunch => "Complete your first bunch",
            Badge::FirstBox => "Complete your first box",
            Badge::FirstWine => "Complete your first bottle",
            Badge::WineMaster => "Complete a full crate",
            Badge::WeekStreak => "Focus 7 days in a row",
            Badge::Persistent => "Focus 50 days in a row",
            Badge::FocusKing => "Earn 10 berries in one day",
            Badge::MonthlyMaster => "Focus on 25 days of a month",
            Badge::Veteran => "Earn 100 berries",
            Badge::GrapeFarm => "Complete 10 boxes",
            Badge::Legend => "Earn 1000 berries",
            Badge::EarlyBird => "Finish a session between 6 and 9 in the morning",
            Badge::NightOwl => "Finish a session at 10pm or later",
            Badge::LevelMaster => "Reach level 10",
            Badge::Perfectionist => "Complete 100 tasks",
            Badge::TimeTraveler => "Accumulate 100 hours of focus",
        }
    }

    pub fn category(&self) -> BadgeCategory {
        match self {
            Badge::FirstStep
            | Badge::FirstBunch
            | Badge::FirstBox
            | Badge::FirstWine
            | Badge::WineMaster => BadgeCategory::Milestone,
            Badge::WeekStreak | Badge::Persistent => BadgeCategory::Streak,
            Badge::FocusKing | Badge::MonthlyMaster => BadgeCategory::Daily,
            Badge::Veteran | Badge::GrapeFarm | Badge::Legend => BadgeCategory::Collection,
            Badge::EarlyBird | Badge::NightOwl => BadgeCategory::TimeOfDay,
            Badge::LevelMaster => BadgeCategory::Level,
            Badge::Perfectionist => BadgeCategory::Task,
            Badge::TimeTraveler => BadgeCategory::Time,
        }
    }

    /// The pure unlock predicate.
    pub fn is_unlocked_by(&self, ctx: &BadgeContext<'_>) -> bool {
        let ledger = ctx.ledger;
        match self {
            Badge::FirstStep => ledger.berries_lifetime >= 1,
            Badge::FirstBunch => ledger.bunches_completed >= 1,
            Badge::FirstBox => ledger.boxes_completed >= 1,
            Badge::FirstWine => ledger.bottles_completed >= 1,
            Badge::WineMaster => ledger.crates_completed >= 1,
            Badge::WeekStreak => ledger.consecutive_focus_days >= 7,
            Badge::Persistent => ledger.consecutive_focus_days >= 50,
            Badge::FocusKing => ledger.berries_today >= 10,
            Badge::MonthlyMaster => ctx.focus_days_this_month >= 25,
            Badge::Veteran => ledger.berries_lifetime >= 100,
            Badge::GrapeFarm => ledger.boxes_completed >= 10,
            Badge::Legend => ledger.berries_lifetime >= 1000,
            Badge::EarlyBird => {
                let hour = ctx.completed_at_local.hour();
                (6..9).contains(&hour)
            }
            Badge::NightOwl => ctx.completed_at_local.hour() >= 22,
            Badge::LevelMaster => ledger.level >= 10,
            Badge::Perfectionist => ledger.total_tasks_completed >= 100,
            Badge::TimeTraveler => ledger.total_focus_secs >= 360_000,
        }
    }
}

/// Evaluate the whole catalog, skipping badges already unlocked.
///
/// Returns the newly-unlocked badges in catalog order. Order between
/// predicates is immaterial: they are pure and non-conflicting.
pub fn evaluate(ctx: &BadgeContext<'_>, unlocked: &HashSet<Badge>) -> Vec<Badge> {
    Badge::ALL
        .iter()
        .copied()
        .filter(|badge| !unlocked.contains(badge) && badge.is_unlocked_by(ctx))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 14)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn ctx(ledger: &Ledger, hour: u32) -> BadgeContext<'_> {
        BadgeContext {
            ledger,
            completed_at_local: at(hour),
            focus_days_this_month: 1,
        }
    }

    #[test]
    fn first_berry_at_seven_unlocks_early_bird_and_first_step() {
        let mut ledger = Ledger::default();
        ledger.berries_lifetime = 1;
        ledger.berries_today = 1;
        let unlocked = evaluate(&ctx(&ledger, 7), &HashSet::new());
        assert_eq!(unlocked, vec![Badge::FirstStep, Badge::EarlyBird]);
    }

    #[test]
    fn early_bird_window_is_half_open() {
        let mut ledger = Ledger::default();
        ledger.berries_lifetime = 1;
        assert!(Badge::EarlyBird.is_unlocked_by(&ctx(&ledger, 6)));
        assert!(Badge::EarlyBird.is_unlocked_by(&ctx(&ledger, 8)));
        assert!(!Badge::EarlyBird.is_unlocked_by(&ctx(&ledger, 9)));
        assert!(!Badge::NightOwl.is_unlocked_by(&ctx(&ledger, 21)));
        assert!(Badge::NightOwl.is_unlocked_by(&ctx(&ledger, 22)));
        assert!(Badge::NightOwl.is_unlocked_by(&ctx(&ledger, 23)));
    }

    #[test]
    fn unlocked_badges_are_never_returned_again() {
        let mut ledger = Ledger::default();
        ledger.berries_lifetime = 1;
        let first = evaluate(&ctx(&ledger, 12), &HashSet::new());
        assert_eq!(first, vec![Badge::FirstStep]);

        let unlocked: HashSet<Badge> = first.into_iter().collect();
        assert!(evaluate(&ctx(&ledger, 12), &unlocked).is_empty());
    }

    #[test]
    fn monthly_master_counts_distinct_days() {
        let ledger = Ledger::default();
        let mut ctx = ctx(&ledger, 12);
        ctx.focus_days_this_month = 24;
        assert!(!Badge::MonthlyMaster.is_unlocked_by(&ctx));
        ctx.focus_days_this_month = 25;
        assert!(Badge::MonthlyMaster.is_unlocked_by(&ctx));
    }

    #[test]
    fn ids_round_trip() {
        for badge in Badge::ALL {
            assert_eq!(Badge::from_id(badge.id()), Some(badge));
        }
        assert_eq!(Badge::from_id("no_such_badge"), None);
    }
}
