use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// A timer that came due while the host advanced time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// The feedback pause ended; generate the next round.
    Advance,
    /// One period of the countdown elapsed.
    Tick,
}

#[derive(Debug, Clone, Copy)]
struct Repeating {
    period: Duration,
    remaining: Duration,
}

/// Frame-driven timers for one session: a one-shot round advance and an optional
/// repeating countdown tick.
///
/// Timers only move when the owner feeds elapsed time through [`next_due`].
/// Once the token is cancelled no timer ever fires again.
///
/// [`next_due`]: SessionTimers::next_due
#[derive(Debug)]
pub struct SessionTimers {
    token: CancellationToken,
    advance: Option<Duration>,
    tick: Option<Repeating>,
}

impl SessionTimers {
    #[must_use]
    pub fn new(token: CancellationToken, tick_period: Option<Duration>) -> Self {
        let tick = tick_period
            .filter(|period| !period.is_zero())
            .map(|period| Repeating {
                period,
                remaining: period,
            });
        Self {
            token,
            advance: None,
            tick,
        }
    }

    /// Arm the one-shot advance, replacing any pending one.
    pub fn schedule_advance(&mut self, delay: Duration) {
        if !self.token.is_cancelled() {
            self.advance = Some(delay);
        }
    }

    #[must_use]
    pub fn advance_pending(&self) -> bool {
        self.advance.is_some() && !self.token.is_cancelled()
    }

    pub fn cancel(&mut self) {
        self.token.cancel();
        self.advance = None;
        self.tick = None;
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Consume up to `budget` of elapsed time and return the first timer that fires.
    ///
    /// Call repeatedly until it returns `None`; `budget` is reduced by the time
    /// consumed. When an advance and a tick are due at the same instant the tick
    /// fires first.
    pub fn next_due(&mut self, budget: &mut Duration) -> Option<TimerEvent> {
        if self.token.is_cancelled() {
            self.advance = None;
            self.tick = None;
            *budget = Duration::ZERO;
            return None;
        }

        let tick_at = self.tick.map(|t| t.remaining);
        let (event, wait) = match (tick_at, self.advance) {
            (Some(tick), Some(advance)) if advance < tick => (TimerEvent::Advance, advance),
            (Some(tick), _) => (TimerEvent::Tick, tick),
            (None, Some(advance)) => (TimerEvent::Advance, advance),
            (None, None) => {
                *budget = Duration::ZERO;
                return None;
            }
        };

        if wait > *budget {
            self.elapse(*budget);
            *budget = Duration::ZERO;
            return None;
        }

        self.elapse(wait);
        *budget -= wait;
        match event {
            TimerEvent::Advance => self.advance = None,
            TimerEvent::Tick => {
                if let Some(tick) = self.tick.as_mut() {
                    tick.remaining = tick.period;
                }
            }
        }
        Some(event)
    }

    fn elapse(&mut self, dt: Duration) {
        if let Some(advance) = self.advance.as_mut() {
            *advance = advance.saturating_sub(dt);
        }
        if let Some(tick) = self.tick.as_mut() {
            tick.remaining = tick.remaining.saturating_sub(dt);
        }
    }
}
