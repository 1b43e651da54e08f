pub mod input;
pub mod phase;
pub mod physics;
pub mod state;

pub use input::{Direction, HeldKeys, IntentTracker, MoveKey};
pub use phase::{Countdown, MatchPhase};
pub use state::{MatchState, Seat};
