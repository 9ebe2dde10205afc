//! Currency evolution chain.
//!
//! Each grape berry feeds a fixed 10x rollup chain: 10 berries form a
//! bunch, 10 bunches a box, 10 boxes a bottle, 10 bottles a crate. The
//! chain is a fixed sequence of carries over the ledger's stage counters,
//! not recursive event re-emission.

use serde::{Deserialize, Serialize};

use super::ledger::Ledger;

/// Units of the previous stage that complete one unit of this stage.
pub const UNITS_PER_STAGE: u64 = 10;

/// Evolution stages of the grape currency, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Bunch,
    Box,
    Bottle,
    Crate,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Bunch => "bunch",
            Stage::Box => "box",
            Stage::Bottle => "bottle",
            Stage::Crate => "crate",
        }
    }
}

/// Carry one newly-earned berry through the chain.
///
/// Called with the ledger already holding the incremented berry total.
/// Each stage can carry at most once per berry, so a plain carry per
/// stage is exhaustive; a single berry may still cascade through several
/// stages when thresholds align. Returns the stages completed, lowest
/// first. After this returns, no stage holds 10 or more unconverted units.
pub(crate) fn roll_up(ledger: &mut Ledger) -> Vec<Stage> {
    let mut completed = Vec::new();

    if ledger.pending_berries() >= UNITS_PER_STAGE {
        ledger.bunches_completed += 1;
        completed.push(Stage::Bunch);
    }
    if ledger.pending_bunches() >= UNITS_PER_STAGE {
        ledger.boxes_completed += 1;
        completed.push(Stage::Box);
    }
    if ledger.pending_boxes() >= UNITS_PER_STAGE {
        ledger.bottles_completed += 1;
        completed.push(Stage::Bottle);
    }
    if ledger.pending_bottles() >= UNITS_PER_STAGE {
        ledger.crates_completed += 1;
        completed.push(Stage::Crate);
    }

    completed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn earn_one(ledger: &mut Ledger) -> Vec<Stage> {
        ledger.berries_lifetime += 1;
        roll_up(ledger)
    }

    #[test]
    fn tenth_berry_completes_a_bunch() {
        let mut ledger = Ledger::default();
        for _ in 0..9 {
            assert!(earn_one(&mut ledger).is_empty());
        }
        assert_eq!(earn_one(&mut ledger), vec![Stage::Bunch]);
        assert_eq!(ledger.bunches_completed, 1);
        assert_eq!(ledger.pending_berries(), 0);
    }

    #[test]
    fn hundredth_berry_cascades_bunch_and_box() {
        let mut ledger = Ledger::default();
        let mut last = Vec::new();
        for _ in 0..100 {
            last = earn_one(&mut ledger);
        }
        assert_eq!(last, vec![Stage::Bunch, Stage::Box]);
        assert_eq!(ledger.bunches_completed, 10);
        assert_eq!(ledger.boxes_completed, 1);
    }

    #[test]
    fn full_cascade_at_ten_thousand() {
        let mut ledger = Ledger::default();
        let mut last = Vec::new();
        for _ in 0..10_000 {
            last = earn_one(&mut ledger);
        }
        assert_eq!(
            last,
            vec![Stage::Bunch, Stage::Box, Stage::Bottle, Stage::Crate]
        );
        assert_eq!(ledger.crates_completed, 1);
        assert_eq!(ledger.pending_bottles(), 0);
    }

    #[test]
    fn counters_stay_normalized() {
        let mut ledger = Ledger::default();
        for _ in 0..2_345 {
            earn_one(&mut ledger);
            assert!(ledger.pending_berries() < UNITS_PER_STAGE);
            assert!(ledger.pending_bunches() < UNITS_PER_STAGE);
            assert!(ledger.pending_boxes() < UNITS_PER_STAGE);
            assert!(ledger.pending_bottles() < UNITS_PER_STAGE);
        }
        assert_eq!(ledger.bunches_completed, 234);
        assert_eq!(ledger.boxes_completed, 23);
        assert_eq!(ledger.bottles_completed, 2);
        assert_eq!(ledger.crates_completed, 0);
    }
}
