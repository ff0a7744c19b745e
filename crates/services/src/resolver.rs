//! Maps a challenge's declared game to the rules its session runs with.

use std::time::Duration;

use arcade_core::generator::Generator;
use arcade_core::model::{ChallengeContext, ContextMissing, GameKind};
use arcade_core::scoring::ScoringPolicy;

use crate::config::GameConfig;
use crate::sessions::Termination;

/// Pause between an answer and the next round when the config does not override it.
pub const DEFAULT_FEEDBACK_DELAY: Duration = Duration::from_millis(800);

/// Everything a `GameSession` needs to know about the game it is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameBlueprint {
    pub kind: GameKind,
    pub generator: Generator,
    pub scoring: ScoringPolicy,
    pub termination: Termination,
    pub feedback_delay: Duration,
    pub seed: Option<u64>,
}

impl GameBlueprint {
    /// Default rules for `kind`.
    #[must_use]
    pub fn for_kind(kind: GameKind) -> Self {
        let (generator, scoring, termination) = match kind {
            GameKind::QuickMath => (
                Generator::Arithmetic,
                ScoringPolicy::HitCounter,
                Termination::RoundCount(5),
            ),
            GameKind::SequenceSolver => (
                Generator::Sequence,
                ScoringPolicy::HitCounter,
                Termination::RoundCount(10),
            ),
            GameKind::ElementRush => (
                Generator::ElementLookup,
                ScoringPolicy::ARCADE,
                Termination::TimeBudget(60),
            ),
            GameKind::Placeholder => (
                Generator::Confirm,
                ScoringPolicy::HitCounter,
                Termination::RoundCount(1),
            ),
        };
        let feedback_delay = if kind == GameKind::Placeholder {
            Duration::ZERO
        } else {
            DEFAULT_FEEDBACK_DELAY
        };

        Self {
            kind,
            generator,
            scoring,
            termination,
            feedback_delay,
            seed: None,
        }
    }

    /// Apply per-challenge overrides. A round override only affects round-count games,
    /// a time override only time-budget games.
    #[must_use]
    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.termination = match (self.termination, config.rounds, config.time_limit_secs) {
            (Termination::RoundCount(_), Some(rounds), _) => Termination::RoundCount(rounds),
            (Termination::TimeBudget(_), _, Some(secs)) => Termination::TimeBudget(secs),
            (unchanged, _, _) => unchanged,
        };
        if let Some(ms) = config.feedback_delay_ms {
            self.feedback_delay = Duration::from_millis(ms);
        }
        self.seed = config.seed.or(self.seed);
        self
    }
}

/// Dispatch from declared game identifiers to blueprints.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChallengeResolver;

impl ChallengeResolver {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Resolve an identifier; unknown identifiers run the placeholder game.
    #[must_use]
    pub fn kind_for(&self, identifier: &str) -> GameKind {
        GameKind::from_identifier(identifier).unwrap_or_else(|| {
            log::warn!("unknown game identifier `{identifier}`, using placeholder session");
            GameKind::Placeholder
        })
    }

    /// Read the context's config overrides.
    ///
    /// Ignored config values are logged and returned alongside.
    #[must_use]
    pub fn read_config(&self, context: &ChallengeContext) -> (GameConfig, Vec<ContextMissing>) {
        let (config, ignored) = GameConfig::from_context(context);
        for problem in &ignored {
            log::warn!("challenge {}: {problem}", context.challenge_id());
        }
        (config, ignored)
    }
}
