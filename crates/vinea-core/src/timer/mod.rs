mod engine;
mod session;

pub use engine::{TimerEngine, TimerState};
pub use session::{Session, SessionKind};
