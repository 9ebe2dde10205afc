//! Integration tests for the progression engine: evolution rollup,
//! leveling, streaks, and badge unlocks driven through the public API.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use vinea_core::progression::{FocusContext, UNITS_PER_STAGE};
use vinea_core::{Badge, Database, Ledger, SessionKind, SessionRecord, TimerEngine};

fn local(y: i32, m: u32, d: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn apply_one(ledger: &mut Ledger, unlocked: &mut HashSet<Badge>, at: NaiveDateTime) -> Vec<Badge> {
    let outcome = ledger.apply_focus(&FocusContext {
        duration_secs: 25 * 60,
        completed_at_local: at,
        focus_days_this_month: 1,
        unlocked: &*unlocked,
    });
    unlocked.extend(outcome.new_badges.iter().copied());
    outcome.new_badges
}

#[test]
fn thousand_sessions_reach_one_bottle() {
    let mut ledger = Ledger::default();
    let mut unlocked = HashSet::new();
    for _ in 0..1000 {
        apply_one(&mut ledger, &mut unlocked, local(2024, 5, 14, 13));
    }

    assert_eq!(ledger.berries_lifetime, 1000);
    assert_eq!(ledger.bunches_completed, 100);
    assert_eq!(ledger.boxes_completed, 10);
    assert_eq!(ledger.bottles_completed, 1);
    assert_eq!(ledger.crates_completed, 0);

    assert!(unlocked.contains(&Badge::Legend));
    assert!(unlocked.contains(&Badge::FirstWine));
    assert!(!unlocked.contains(&Badge::WineMaster));
}

#[test]
fn badge_unlocks_are_monotonic_and_idempotent() {
    let mut ledger = Ledger::default();
    let mut unlocked = HashSet::new();
    let mut seen = Vec::new();
    for _ in 0..200 {
        let new = apply_one(&mut ledger, &mut unlocked, local(2024, 5, 14, 13));
        for badge in new {
            assert!(
                !seen.contains(&badge),
                "badge {badge:?} unlocked a second time"
            );
            seen.push(badge);
        }
    }
}

#[test]
fn first_berry_at_seven_unlocks_exactly_early_bird_and_first_step() {
    let mut ledger = Ledger::default();
    let mut unlocked = HashSet::new();
    let new = apply_one(&mut ledger, &mut unlocked, local(2024, 5, 14, 7));
    assert_eq!(new, vec![Badge::FirstStep, Badge::EarlyBird]);
}

#[test]
fn stopping_early_yields_nothing() {
    let mut engine = TimerEngine::new();
    engine.start(SessionKind::Focus, 25 * 60, None).unwrap();
    engine.stop().unwrap();

    // No completion event means the progression path is never entered;
    // the ledger never sees the session.
    assert!(engine.tick().is_none());
    let ledger = Ledger::default();
    assert_eq!(ledger.berries_lifetime, 0);
    assert_eq!(ledger.experience, 0);
}

#[test]
fn engine_completion_flows_into_the_database() {
    let mut db = Database::open_memory().unwrap();
    let mut ledger = db.load_ledger().unwrap();

    let mut engine = TimerEngine::new();
    engine.start(SessionKind::Focus, 0, None).unwrap();
    let event = engine.tick().expect("completion");

    let record = match event {
        vinea_core::Event::FocusCompleted {
            session_id,
            task_id,
            duration_secs,
            started_at,
            completed_at,
        } => SessionRecord {
            id: session_id,
            task_id,
            kind: SessionKind::Focus,
            duration_secs,
            started_at,
            completed_at,
        },
        other => panic!("expected FocusCompleted, got {other:?}"),
    };

    let outcome = db
        .commit_focus(&mut ledger, &record, local(2024, 5, 14, 13))
        .unwrap();
    assert_eq!(outcome.new_badges, vec![Badge::FirstStep]);
    assert_eq!(db.load_ledger().unwrap().berries_lifetime, 1);
}

#[test]
fn monthly_master_unlocks_via_session_history() {
    let mut db = Database::open_memory().unwrap();
    let mut ledger = db.load_ledger().unwrap();
    let now = Utc::now();

    let mut last_badges = Vec::new();
    for day in 1..=25 {
        let record = SessionRecord {
            id: Uuid::new_v4(),
            task_id: None,
            kind: SessionKind::Focus,
            duration_secs: 25 * 60,
            started_at: now,
            completed_at: now,
        };
        let outcome = db
            .commit_focus(&mut ledger, &record, local(2024, 5, day, 13))
            .unwrap();
        last_badges = outcome.new_badges;
    }

    assert_eq!(last_badges, vec![Badge::MonthlyMaster]);
    // Week Streak unlocked earlier in the run, on day 7.
    assert!(db.unlocked_badge_set().unwrap().contains(&Badge::WeekStreak));
    assert_eq!(ledger.consecutive_focus_days, 25);
    assert_eq!(db.focus_days_in_month(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()).unwrap(), 25);
}

proptest! {
    /// After every single event, no evolution stage holds 10 or more
    /// unconverted units.
    #[test]
    fn rollup_stays_normalized(sessions in 1usize..2500) {
        let mut ledger = Ledger::default();
        let unlocked = HashSet::new();
        for _ in 0..sessions {
            ledger.apply_focus(&FocusContext {
                duration_secs: 60,
                completed_at_local: local(2024, 5, 14, 13),
                focus_days_this_month: 1,
                unlocked: &unlocked,
            });
            prop_assert!(ledger.pending_berries() < UNITS_PER_STAGE);
            prop_assert!(ledger.pending_bunches() < UNITS_PER_STAGE);
            prop_assert!(ledger.pending_boxes() < UNITS_PER_STAGE);
            prop_assert!(ledger.pending_bottles() < UNITS_PER_STAGE);
        }
        prop_assert_eq!(ledger.berries_lifetime, sessions as u64);
        prop_assert_eq!(
            ledger.berries_lifetime,
            ledger.bunches_completed * UNITS_PER_STAGE + ledger.pending_berries()
        );
    }
}
