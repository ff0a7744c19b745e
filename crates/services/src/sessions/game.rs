use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio_util::sync::CancellationToken;

use arcade_core::Clock;
use arcade_core::model::{
    AttemptMeta, AttemptResult, AttemptSubmission, ChallengeContext, ChallengeDraft,
    ContextMissing, GameKind, Round,
};

use super::persist::{PersistHandle, PersistStatus};
use super::state::{SessionPhase, SessionState, Termination};
use super::timers::{SessionTimers, TimerEvent};
use crate::error::SessionError;
use crate::recorder::AttemptRecorder;
use crate::resolver::{ChallengeResolver, GameBlueprint};

const TICK_PERIOD: Duration = Duration::from_secs(1);

type CompletionCallback = Box<dyn FnOnce(&AttemptResult) + Send>;

/// Feedback for one answered round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub expected: i64,
    /// Change in the running point total caused by this answer.
    pub delta: i64,
    pub points: i64,
}

/// One run of a mini-game from `create` to `Done`.
///
/// Drive it with [`create`](Self::create), [`answer`](Self::answer) and
/// [`update`](Self::update). Finalization records the attempt in the background
/// and never waits on it.
pub struct GameSession {
    blueprint: GameBlueprint,
    clock: Clock,
    rng: StdRng,
    seeded: bool,
    context: Option<Arc<ChallengeContext>>,
    warnings: Vec<ContextMissing>,
    recorder: Option<Arc<dyn AttemptRecorder>>,
    on_complete: Option<CompletionCallback>,
    phase: SessionPhase,
    state: SessionState,
    current: Option<Round>,
    awaiting_answer: bool,
    last_answer: Option<AnswerOutcome>,
    timers: Option<SessionTimers>,
    result: Option<AttemptResult>,
    persist: PersistHandle,
}

impl GameSession {
    #[must_use]
    pub fn new(kind: GameKind, clock: Clock) -> Self {
        Self::from_blueprint(GameBlueprint::for_kind(kind), clock)
    }

    #[must_use]
    pub fn from_blueprint(blueprint: GameBlueprint, clock: Clock) -> Self {
        let (rng, seeded) = match blueprint.seed {
            Some(seed) => (StdRng::seed_from_u64(seed), true),
            None => (StdRng::from_os_rng(), false),
        };
        Self {
            blueprint,
            clock,
            rng,
            seeded,
            context: None,
            warnings: Vec::new(),
            recorder: None,
            on_complete: None,
            phase: SessionPhase::Created,
            state: SessionState::new(blueprint.termination),
            current: None,
            awaiting_answer: false,
            last_answer: None,
            timers: None,
            result: None,
            persist: PersistHandle::skipped(),
        }
    }

    /// Fix the random source. A seed in the challenge config takes precedence.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self.seeded = true;
        self
    }

    #[must_use]
    pub fn with_recorder(mut self, recorder: Arc<dyn AttemptRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Called synchronously with the result once the session finalizes.
    #[must_use]
    pub fn on_complete(mut self, callback: impl FnOnce(&AttemptResult) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    //
    // ─── LIFECYCLE ─────────────────────────────────────────────────────────────
    //

    /// Supply the challenge context. Allowed exactly once, before `create`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyInitialized` on a second call or after `create`.
    pub fn init(&mut self, context: Arc<ChallengeContext>) -> Result<(), SessionError> {
        if self.context.is_some() || self.phase != SessionPhase::Created {
            return Err(SessionError::AlreadyInitialized);
        }

        let (config, ignored) = ChallengeResolver::new().read_config(&context);
        self.warnings.extend(ignored);
        self.blueprint = self.blueprint.with_config(config);
        if let Some(seed) = config.seed {
            self.rng = StdRng::seed_from_u64(seed);
            self.seeded = true;
        }
        self.state = SessionState::new(self.blueprint.termination);
        self.context = Some(context);
        Ok(())
    }

    /// Start the session and show the first round.
    ///
    /// A session that never received a context runs with default values.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyCreated` if called twice, or a round error if
    /// the first round cannot be generated.
    pub fn create(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Created {
            return Err(SessionError::AlreadyCreated);
        }

        if self.context.is_none() {
            let (context, missing) = ChallengeContext::resolve(ChallengeDraft::default());
            log::warn!(
                "{} session started without a challenge context, using {}",
                self.blueprint.kind,
                context.challenge_id()
            );
            self.warnings.extend(missing);
            self.context = Some(Arc::new(context));
        }

        let tick = match self.blueprint.termination {
            Termination::TimeBudget(_) => Some(TICK_PERIOD),
            Termination::RoundCount(_) => None,
        };
        self.timers = Some(SessionTimers::new(CancellationToken::new(), tick));
        self.state.started_at = Some(self.clock.now());
        self.phase = SessionPhase::Running;
        log::info!(
            "{} session running for {} (seeded: {})",
            self.blueprint.kind,
            self.challenge_label(),
            self.seeded
        );

        self.next_round()
    }

    /// Generate the next round, or finalize if the session is already over.
    ///
    /// Calling it after the termination predicate holds never generates a round.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotRunning` before `create`, or a round error from
    /// the generator.
    pub fn next_round(&mut self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Created => return Err(SessionError::NotRunning),
            SessionPhase::Finalizing | SessionPhase::Done => return Ok(()),
            SessionPhase::Running => {}
        }

        if self.state.is_terminal(self.blueprint.termination) {
            self.finalize(true);
            return Ok(());
        }

        let round = self
            .blueprint
            .generator
            .generate(self.state.round_index, &mut self.rng)?;
        self.current = Some(round);
        self.state.round_index += 1;
        self.awaiting_answer = true;
        Ok(())
    }

    /// Answer the round in flight.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotRunning` outside `Running`, and
    /// `SessionError::NotAwaitingAnswer` while feedback for the previous answer is
    /// still showing.
    pub fn answer(&mut self, value: i64) -> Result<AnswerOutcome, SessionError> {
        if self.phase != SessionPhase::Running {
            return Err(SessionError::NotRunning);
        }
        let expected = match self.current.as_ref() {
            Some(round) if self.awaiting_answer => round.correct(),
            _ => return Err(SessionError::NotAwaitingAnswer),
        };

        let correct = value == expected;
        if correct {
            self.state.hits += 1;
        } else {
            self.state.misses += 1;
        }
        let before = self.state.points;
        self.state.points = self.blueprint.scoring.apply(before, correct);
        self.awaiting_answer = false;

        let outcome = AnswerOutcome {
            correct,
            expected,
            delta: self.state.points - before,
            points: self.state.points,
        };
        self.last_answer = Some(outcome);

        if self.blueprint.feedback_delay.is_zero() {
            self.next_round()?;
        } else if let Some(timers) = self.timers.as_mut() {
            timers.schedule_advance(self.blueprint.feedback_delay);
        }
        Ok(outcome)
    }

    /// Advance session time by `dt`, firing any timers that come due.
    ///
    /// # Errors
    ///
    /// Returns a round error if a pending advance fails to generate.
    pub fn update(&mut self, dt: Duration) -> Result<(), SessionError> {
        let mut budget = dt;
        while self.phase == SessionPhase::Running {
            let event = match self.timers.as_mut() {
                Some(timers) => timers.next_due(&mut budget),
                None => None,
            };
            match event {
                Some(TimerEvent::Tick) => self.tick(),
                Some(TimerEvent::Advance) => self.next_round()?,
                None => break,
            }
        }
        Ok(())
    }

    /// One countdown step. Reaching zero finalizes at once, dropping the round
    /// in flight without credit or penalty.
    pub fn tick(&mut self) {
        if self.phase != SessionPhase::Running {
            return;
        }
        self.state.tick();
        if self.state.is_terminal(self.blueprint.termination) {
            if self.awaiting_answer {
                log::debug!("time ran out with round {} unanswered", self.state.round_index);
            }
            self.finalize(true);
        }
    }

    /// End early. The attempt is still recorded, marked incomplete.
    pub fn quit(&mut self) {
        if self.phase == SessionPhase::Running {
            self.finalize(false);
        }
    }

    /// Dispose of the session: cancel timers and drop the round in flight.
    ///
    /// A session torn down before it finished records nothing.
    pub fn teardown(&mut self) {
        if let Some(timers) = self.timers.as_mut() {
            timers.cancel();
        }
        self.current = None;
        self.awaiting_answer = false;
        if self.phase < SessionPhase::Finalizing {
            log::info!(
                "{} session for {} torn down in phase {}",
                self.blueprint.kind,
                self.challenge_label(),
                self.phase
            );
            self.phase = SessionPhase::Done;
        }
    }

    fn finalize(&mut self, completed: bool) {
        if self.phase >= SessionPhase::Finalizing {
            return;
        }
        self.phase = SessionPhase::Finalizing;
        if let Some(timers) = self.timers.as_mut() {
            timers.cancel();
        }
        self.current = None;
        self.awaiting_answer = false;

        let result = self.compute_result(completed);
        log::info!(
            "{} session for {} finished: score {} after {}s (completed: {completed})",
            self.blueprint.kind,
            self.challenge_label(),
            result.score(),
            result.time_taken_seconds()
        );

        if let Some(callback) = self.on_complete.take() {
            callback(&result);
        }

        self.persist = match (self.recorder.as_ref(), self.context.as_ref()) {
            (Some(recorder), Some(context)) => {
                let submission = AttemptSubmission::new(context, &result);
                let credit = self
                    .blueprint
                    .scoring
                    .ledger_credit(result.score(), self.state.points);
                PersistHandle::spawn(Arc::clone(recorder), submission, credit)
            }
            _ => PersistHandle::skipped(),
        };

        self.result = Some(result);
        self.phase = SessionPhase::Done;
    }

    fn compute_result(&self, completed: bool) -> AttemptResult {
        let total = match self.blueprint.termination {
            Termination::RoundCount(total) => total,
            Termination::TimeBudget(_) => self.state.answered(),
        };
        let score = self
            .blueprint
            .scoring
            .final_score(self.state.hits, total, self.state.points);
        let started_at = self.state.started_at.unwrap_or_else(|| self.clock.now());
        // One large frame can fire the whole countdown at once; the budget is the
        // most time a timed game can have taken.
        let elapsed = self.clock.seconds_since(started_at);
        let time_taken = match self.blueprint.termination {
            Termination::TimeBudget(limit) => elapsed.min(limit),
            Termination::RoundCount(_) => elapsed,
        };
        let meta = AttemptMeta {
            game: self.blueprint.kind,
            hits: self.state.hits,
            misses: self.state.misses,
            rounds_played: self.state.round_index,
            points: self.state.points,
        };

        AttemptResult::saturating(score, completed, time_taken)
            .with_meta(meta)
    }

    fn challenge_label(&self) -> String {
        self.context
            .as_ref()
            .map_or_else(|| "<no context>".to_owned(), |c| c.challenge_id().to_string())
    }

    //
    // ─── ACCESSORS ─────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn blueprint(&self) -> &GameBlueprint {
        &self.blueprint
    }

    #[must_use]
    pub fn kind(&self) -> GameKind {
        self.blueprint.kind
    }

    #[must_use]
    pub fn context(&self) -> Option<&Arc<ChallengeContext>> {
        self.context.as_ref()
    }

    /// Context fields and config values that were replaced by defaults.
    #[must_use]
    pub fn warnings(&self) -> &[ContextMissing] {
        &self.warnings
    }

    #[must_use]
    pub fn current_round(&self) -> Option<&Round> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn awaiting_answer(&self) -> bool {
        self.awaiting_answer
    }

    #[must_use]
    pub fn last_answer(&self) -> Option<AnswerOutcome> {
        self.last_answer
    }

    #[must_use]
    pub fn result(&self) -> Option<&AttemptResult> {
        self.result.as_ref()
    }

    /// Cancelled when the session's timers are cancelled.
    #[must_use]
    pub fn cancellation_token(&self) -> Option<CancellationToken> {
        self.timers.as_ref().map(|t| t.token().clone())
    }

    pub fn persist_status(&mut self) -> PersistStatus {
        self.persist.poll().clone()
    }

    /// Wait until background recording settles.
    pub async fn wait_persisted(&mut self) -> PersistStatus {
        self.persist.wait().await
    }
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("kind", &self.blueprint.kind)
            .field("phase", &self.phase)
            .field("state", &self.state)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcade_core::model::{ChallengeId, Subject};
    use arcade_core::time::fixed_clock;

    fn context() -> Arc<ChallengeContext> {
        Arc::new(ChallengeContext::new(
            ChallengeId::new("daily-1"),
            2,
            Subject::Mathematics,
        ))
    }

    fn running(kind: GameKind) -> GameSession {
        let mut session = GameSession::new(kind, fixed_clock()).with_seed(7);
        session.init(context()).unwrap();
        session.create().unwrap();
        session
    }

    fn answer_correctly(session: &mut GameSession) -> AnswerOutcome {
        let correct = session.current_round().unwrap().correct();
        session.answer(correct).unwrap()
    }

    #[test]
    fn create_generates_first_round() {
        let session = running(GameKind::QuickMath);
        assert_eq!(session.phase(), SessionPhase::Running);
        assert_eq!(session.state().round_index, 1);
        assert!(session.awaiting_answer());
    }

    #[test]
    fn init_is_accepted_once() {
        let mut session = GameSession::new(GameKind::QuickMath, fixed_clock());
        session.init(context()).unwrap();
        assert_eq!(session.init(context()), Err(SessionError::AlreadyInitialized));
    }

    #[test]
    fn create_twice_is_rejected() {
        let mut session = running(GameKind::QuickMath);
        assert_eq!(session.create(), Err(SessionError::AlreadyCreated));
    }

    #[test]
    fn answers_during_feedback_are_rejected() {
        let mut session = running(GameKind::QuickMath);
        answer_correctly(&mut session);
        assert_eq!(session.answer(0), Err(SessionError::NotAwaitingAnswer));

        session.update(Duration::from_millis(800)).unwrap();
        assert_eq!(session.state().round_index, 2);
        assert!(session.awaiting_answer());
    }

    #[test]
    fn wrong_answers_count_as_misses_without_points() {
        let mut session = running(GameKind::QuickMath);
        let wrong = session.current_round().unwrap().correct() + 1;
        let outcome = session.answer(wrong).unwrap();

        assert!(!outcome.correct);
        assert_eq!(outcome.delta, 0);
        assert_eq!(session.state().misses, 1);
        assert_eq!(session.state().hits, 0);
    }

    #[test]
    fn running_score_is_floored() {
        let mut session = running(GameKind::ElementRush);
        let wrong = session.current_round().unwrap().correct() + 1;
        let outcome = session.answer(wrong).unwrap();
        assert_eq!(outcome.points, 0);

        session.update(Duration::from_millis(800)).unwrap();
        let outcome = answer_correctly(&mut session);
        assert_eq!((outcome.delta, outcome.points), (10, 10));
    }

    #[test]
    fn session_without_context_uses_defaults() {
        let mut session = GameSession::new(GameKind::Placeholder, fixed_clock());
        session.create().unwrap();

        let ctx = session.context().unwrap();
        assert_eq!(ctx.challenge_id(), &ChallengeId::practice());
        assert_eq!(session.warnings().len(), 3);
    }

    #[test]
    fn quit_finalizes_incomplete() {
        let mut session = running(GameKind::SequenceSolver);
        answer_correctly(&mut session);
        session.quit();

        let result = session.result().unwrap();
        assert_eq!(session.phase(), SessionPhase::Done);
        assert!(!result.completed());
        assert_eq!(result.score(), 10);
        assert_eq!(session.persist_status(), PersistStatus::Skipped);
    }

    #[test]
    fn teardown_cancels_pending_advance() {
        let mut session = running(GameKind::QuickMath);
        answer_correctly(&mut session);
        let token = session.cancellation_token().unwrap();

        session.teardown();
        session.update(Duration::from_secs(5)).unwrap();

        assert!(token.is_cancelled());
        assert_eq!(session.phase(), SessionPhase::Done);
        assert_eq!(session.state().round_index, 1);
        assert!(session.result().is_none());
    }

    #[test]
    fn init_applies_config_and_keeps_ignored_values() {
        let mut session = GameSession::new(GameKind::ElementRush, fixed_clock());
        let ctx = ChallengeContext::new(ChallengeId::new("daily-2"), 4, Subject::Science)
            .with_config(serde_json::json!({ "time_limit_secs": 15, "rounds": 0 }));
        session.init(Arc::new(ctx)).unwrap();

        assert_eq!(session.blueprint().termination, Termination::TimeBudget(15));
        assert_eq!(session.state().time_left, Some(15));
        assert_eq!(session.warnings().len(), 1);
    }

    #[test]
    fn countdown_in_one_large_frame_reports_the_budget() {
        let mut clock = Clock::manual(arcade_core::time::fixed_now());
        let mut session = GameSession::new(GameKind::ElementRush, clock.clone()).with_seed(2);
        session.init(context()).unwrap();
        session.create().unwrap();

        clock.advance(chrono::Duration::seconds(600));
        session.update(Duration::from_secs(600)).unwrap();

        assert_eq!(session.phase(), SessionPhase::Done);
        let result = session.result().unwrap();
        assert!(result.completed());
        assert_eq!(result.time_taken_seconds(), 60);
    }

    #[test]
    fn quitting_a_timed_game_reports_elapsed_time() {
        let mut clock = Clock::manual(arcade_core::time::fixed_now());
        let mut session = GameSession::new(GameKind::ElementRush, clock.clone()).with_seed(2);
        session.init(context()).unwrap();
        session.create().unwrap();

        clock.advance(chrono::Duration::seconds(12));
        session.update(Duration::from_secs(12)).unwrap();
        session.quit();

        assert_eq!(session.result().unwrap().time_taken_seconds(), 12);
    }

    #[test]
    fn completion_callback_sees_final_score() {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut session = GameSession::new(GameKind::Placeholder, fixed_clock())
            .on_complete(move |result| {
                let _ = tx.send(result.score());
            });
        session.init(context()).unwrap();
        session.create().unwrap();
        session.answer(1).unwrap();

        assert_eq!(session.phase(), SessionPhase::Done);
        assert_eq!(rx.try_recv().unwrap(), 100);
    }
}
