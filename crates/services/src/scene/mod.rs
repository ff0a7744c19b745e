//! Mountable scenes and the host that owns them.

mod factory;
mod host;
mod target;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use arcade_core::model::{ChallengeContext, GameKind};

use crate::error::SessionError;
use crate::sessions::{AnswerOutcome, GameSession, PersistStatus, SessionPhase, Termination};

pub use factory::{SceneFactory, SessionFactory};
pub use host::{MountOutcome, SceneHost};
pub use target::{Dimensions, HeadlessTarget, RenderTarget, Surface};

/// What a host needs to draw one frame of a scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneSnapshot {
    pub kind: GameKind,
    pub phase: SessionPhase,
    pub surface: Option<Surface>,
    pub prompt: Option<String>,
    /// Empty for typed-answer rounds.
    pub options: Vec<i64>,
    pub awaiting_answer: bool,
    pub round_index: u32,
    pub total_rounds: Option<u32>,
    pub hits: u32,
    pub misses: u32,
    pub points: i64,
    pub time_left: Option<u32>,
    pub last_answer: Option<AnswerOutcome>,
    pub score: Option<u8>,
}

/// A mountable game instance.
#[async_trait]
pub trait Scene: Send {
    /// Receive the challenge context. Called exactly once, before `create`.
    fn init(&mut self, context: Arc<ChallengeContext>) -> Result<(), SessionError>;

    /// Start on the allocated surface.
    fn create(&mut self, surface: Surface) -> Result<(), SessionError>;

    fn update(&mut self, dt: Duration) -> Result<(), SessionError>;

    fn answer(&mut self, value: i64) -> Result<AnswerOutcome, SessionError>;

    /// End early; the attempt is recorded as incomplete.
    fn quit(&mut self);

    fn snapshot(&self) -> SceneSnapshot;

    fn persist_status(&mut self) -> PersistStatus;

    async fn wait_persisted(&mut self) -> PersistStatus;

    /// Release timers and state. Must leave nothing that can fire later.
    fn teardown(&mut self);
}

/// A `GameSession` bound to the surface it draws on.
#[derive(Debug)]
pub struct SessionScene {
    session: GameSession,
    surface: Option<Surface>,
}

impl SessionScene {
    #[must_use]
    pub fn new(session: GameSession) -> Self {
        Self {
            session,
            surface: None,
        }
    }

    #[must_use]
    pub fn session(&self) -> &GameSession {
        &self.session
    }
}

#[async_trait]
impl Scene for SessionScene {
    fn init(&mut self, context: Arc<ChallengeContext>) -> Result<(), SessionError> {
        self.session.init(context)
    }

    fn create(&mut self, surface: Surface) -> Result<(), SessionError> {
        self.surface = Some(surface);
        self.session.create()
    }

    fn update(&mut self, dt: Duration) -> Result<(), SessionError> {
        self.session.update(dt)
    }

    fn answer(&mut self, value: i64) -> Result<AnswerOutcome, SessionError> {
        self.session.answer(value)
    }

    fn quit(&mut self) {
        self.session.quit();
    }

    fn snapshot(&self) -> SceneSnapshot {
        let session = &self.session;
        let state = session.state();
        let round = session.current_round();
        let total_rounds = match session.blueprint().termination {
            Termination::RoundCount(total) => Some(total),
            Termination::TimeBudget(_) => None,
        };

        SceneSnapshot {
            kind: session.kind(),
            phase: session.phase(),
            surface: self.surface,
            prompt: round.map(|r| r.prompt().to_string()),
            options: round.map(|r| r.options().to_vec()).unwrap_or_default(),
            awaiting_answer: session.awaiting_answer(),
            round_index: state.round_index,
            total_rounds,
            hits: state.hits,
            misses: state.misses,
            points: state.points,
            time_left: state.time_left,
            last_answer: session.last_answer(),
            score: session.result().map(|r| r.score()),
        }
    }

    fn persist_status(&mut self) -> PersistStatus {
        self.session.persist_status()
    }

    async fn wait_persisted(&mut self) -> PersistStatus {
        self.session.wait_persisted().await
    }

    fn teardown(&mut self) {
        self.session.teardown();
        self.surface = None;
    }
}
