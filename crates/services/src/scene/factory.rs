use std::sync::Arc;

use arcade_core::Clock;
use arcade_core::model::{AttemptResult, GameKind};

use super::{Scene, SessionScene};
use crate::recorder::AttemptRecorder;
use crate::resolver::GameBlueprint;
use crate::sessions::GameSession;

/// Builds a fresh scene for a game kind.
pub trait SceneFactory: Send + Sync {
    fn build(&self, kind: GameKind) -> Box<dyn Scene>;
}

type CompletionHook = Arc<dyn Fn(GameKind, &AttemptResult) + Send + Sync>;

/// Factory producing `GameSession`-backed scenes that share one recorder and clock.
#[derive(Clone)]
pub struct SessionFactory {
    clock: Clock,
    recorder: Option<Arc<dyn AttemptRecorder>>,
    seed: Option<u64>,
    on_complete: Option<CompletionHook>,
}

impl SessionFactory {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            recorder: None,
            seed: None,
            on_complete: None,
        }
    }

    #[must_use]
    pub fn with_recorder(mut self, recorder: Arc<dyn AttemptRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn on_complete(
        mut self,
        hook: impl Fn(GameKind, &AttemptResult) + Send + Sync + 'static,
    ) -> Self {
        self.on_complete = Some(Arc::new(hook));
        self
    }

    /// The session this factory would mount, before it is boxed.
    #[must_use]
    pub fn session(&self, kind: GameKind) -> GameSession {
        let mut session = GameSession::from_blueprint(GameBlueprint::for_kind(kind), self.clock.clone());
        if let Some(seed) = self.seed {
            session = session.with_seed(seed);
        }
        if let Some(recorder) = &self.recorder {
            session = session.with_recorder(Arc::clone(recorder));
        }
        if let Some(hook) = &self.on_complete {
            let hook = Arc::clone(hook);
            session = session.on_complete(move |result| hook(kind, result));
        }
        session
    }
}

impl SceneFactory for SessionFactory {
    fn build(&self, kind: GameKind) -> Box<dyn Scene> {
        Box::new(SessionScene::new(self.session(kind)))
    }
}
