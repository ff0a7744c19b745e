mod game;
mod persist;
mod state;
mod timers;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use game::{AnswerOutcome, GameSession};
pub use persist::{PersistHandle, PersistStatus};
pub use state::{SessionPhase, SessionState, Termination};
pub use timers::{SessionTimers, TimerEvent};
