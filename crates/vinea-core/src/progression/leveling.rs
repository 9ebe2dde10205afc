//! Experience and leveling.
//!
//! Stored experience is the surplus toward the next level. The cost of
//! level L -> L+1 grows geometrically, so the carry loop below may fire
//! several times for one large gain.

use super::ledger::Ledger;

/// XP awarded per completed focus session (one berry).
pub const XP_PER_BERRY: u64 = 10;

/// XP required to advance from `level` to `level + 1`.
///
/// `ceil(100 * 1.5^(level-1))`, so 1 -> 2 costs 100, 2 -> 3 costs 150,
/// 3 -> 4 costs 225, 4 -> 5 costs 338.
pub fn xp_to_next(level: u32) -> u64 {
    (100.0 * 1.5f64.powi(level as i32 - 1)).ceil() as u64
}

/// Add `gained` XP to the ledger, carrying surpluses into level-ups.
///
/// Returns each new level reached, in order.
pub(crate) fn gain_xp(ledger: &mut Ledger, gained: u64) -> Vec<u32> {
    ledger.experience += gained;
    let mut level_ups = Vec::new();
    while ledger.experience >= xp_to_next(ledger.level) {
        ledger.experience -= xp_to_next(ledger.level);
        ledger.level += 1;
        level_ups.push(ledger.level);
    }
    level_ups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_schedule() {
        assert_eq!(xp_to_next(1), 100);
        assert_eq!(xp_to_next(2), 150);
        assert_eq!(xp_to_next(3), 225);
        assert_eq!(xp_to_next(4), 338);
    }

    #[test]
    fn single_gain_can_level_up_twice() {
        let mut ledger = Ledger::default();
        let ups = gain_xp(&mut ledger, 250);
        assert_eq!(ups, vec![2, 3]);
        assert_eq!(ledger.level, 3);
        assert_eq!(ledger.experience, 0);
    }

    #[test]
    fn surplus_carries() {
        let mut ledger = Ledger::default();
        let ups = gain_xp(&mut ledger, 120);
        assert_eq!(ups, vec![2]);
        assert_eq!(ledger.experience, 20);

        // 20 + 140 = 160 >= 150, carries 10 into level 3.
        let ups = gain_xp(&mut ledger, 140);
        assert_eq!(ups, vec![3]);
        assert_eq!(ledger.experience, 10);
    }

    #[test]
    fn small_gain_does_not_level() {
        let mut ledger = Ledger::default();
        assert!(gain_xp(&mut ledger, 99).is_empty());
        assert_eq!(ledger.level, 1);
        assert_eq!(ledger.experience, 99);
    }
}
