use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Lifecycle of a game session. Moves strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SessionPhase {
    Created,
    Running,
    Finalizing,
    Done,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionPhase::Created => "created",
            SessionPhase::Running => "running",
            SessionPhase::Finalizing => "finalizing",
            SessionPhase::Done => "done",
        })
    }
}

/// Which predicate ends a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Ends once this many rounds have been generated and answered.
    RoundCount(u32),
    /// Ends when the countdown, in whole seconds, reaches zero.
    TimeBudget(u32),
}

/// Counters mutated by answers and ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Rounds generated so far, including the one in flight.
    pub round_index: u32,
    pub hits: u32,
    pub misses: u32,
    pub points: i64,
    pub started_at: Option<DateTime<Utc>>,
    /// Remaining budget for time-budget sessions.
    pub time_left: Option<u32>,
}

impl SessionState {
    #[must_use]
    pub fn new(termination: Termination) -> Self {
        let time_left = match termination {
            Termination::RoundCount(_) => None,
            Termination::TimeBudget(secs) => Some(secs),
        };
        Self {
            round_index: 0,
            hits: 0,
            misses: 0,
            points: 0,
            started_at: None,
            time_left,
        }
    }

    /// Whether `termination` says the session is over.
    #[must_use]
    pub fn is_terminal(&self, termination: Termination) -> bool {
        match termination {
            Termination::RoundCount(total) => self.round_index >= total,
            Termination::TimeBudget(_) => self.time_left == Some(0),
        }
    }

    #[must_use]
    pub fn answered(&self) -> u32 {
        self.hits + self.misses
    }

    /// Decrement the countdown by one second. Returns the remaining budget.
    pub fn tick(&mut self) -> Option<u32> {
        if let Some(left) = self.time_left.as_mut() {
            *left = left.saturating_sub(1);
        }
        self.time_left
    }

    #[must_use]
    pub fn time_left_duration(&self) -> Option<Duration> {
        self.time_left.map(|secs| Duration::from_secs(u64::from(secs)))
    }
}
