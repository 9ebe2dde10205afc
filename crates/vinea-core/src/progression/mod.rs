mod badges;
mod evolution;
mod ledger;
mod leveling;

pub use badges::{evaluate, Badge, BadgeCategory, BadgeContext};
pub use evolution::{Stage, UNITS_PER_STAGE};
pub use ledger::{FocusContext, FocusOutcome, Ledger};
pub use leveling::{xp_to_next, XP_PER_BERRY};
