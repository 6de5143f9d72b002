mod engine;
mod phase;

pub use engine::{MicroBreak, TickOutcome, TimerEngine};
pub use phase::{Phase, UnknownPhase};
