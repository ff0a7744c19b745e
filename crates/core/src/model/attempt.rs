use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::challenge::{ChallengeContext, Subject};
use crate::model::game::GameKind;
use crate::model::ids::{AttemptId, ChallengeId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("score must be within 0..=100, got {0}")]
    ScoreOutOfRange(u32),
}

/// Extra per-game detail stored alongside an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptMeta {
    pub game: GameKind,
    pub hits: u32,
    pub misses: u32,
    pub rounds_played: u32,
    /// Raw running score for point-based games; equals `hits` for percentage games.
    pub points: i64,
}

/// Outcome of one finished session, derived once at finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptResult {
    score: u8,
    completed: bool,
    time_taken_seconds: u32,
    meta: Option<AttemptMeta>,
}

impl AttemptResult {
    pub const MAX_SCORE: u8 = 100;

    /// # Errors
    ///
    /// Returns `AttemptError::ScoreOutOfRange` if `score` exceeds 100.
    pub fn new(score: u32, completed: bool, time_taken_seconds: u32) -> Result<Self, AttemptError> {
        let score = u8::try_from(score)
            .ok()
            .filter(|s| *s <= Self::MAX_SCORE)
            .ok_or(AttemptError::ScoreOutOfRange(score))?;
        Ok(Self {
            score,
            completed,
            time_taken_seconds,
            meta: None,
        })
    }

    /// Like [`AttemptResult::new`], saturating the score at `MAX_SCORE`.
    #[must_use]
    pub fn saturating(score: u8, completed: bool, time_taken_seconds: u32) -> Self {
        Self {
            score: score.min(Self::MAX_SCORE),
            completed,
            time_taken_seconds,
            meta: None,
        }
    }

    #[must_use]
    pub fn with_meta(mut self, meta: AttemptMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    #[must_use]
    pub fn score(&self) -> u8 {
        self.score
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn time_taken_seconds(&self) -> u32 {
        self.time_taken_seconds
    }

    #[must_use]
    pub fn meta(&self) -> Option<&AttemptMeta> {
        self.meta.as_ref()
    }
}

/// Payload handed to the attempt recorder: the challenge context plus the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptSubmission {
    pub challenge_id: ChallengeId,
    pub grade: u8,
    pub subject: Subject,
    pub score: u8,
    pub completed: bool,
    pub time_taken_seconds: u32,
    pub meta: Option<AttemptMeta>,
}

impl AttemptSubmission {
    #[must_use]
    pub fn new(context: &ChallengeContext, result: &AttemptResult) -> Self {
        Self {
            challenge_id: context.challenge_id().clone(),
            grade: context.grade(),
            subject: context.subject(),
            score: result.score(),
            completed: result.completed(),
            time_taken_seconds: result.time_taken_seconds(),
            meta: result.meta().cloned(),
        }
    }
}

/// A submission as persisted by the recorder backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    pub id: AttemptId,
    pub user_id: UserId,
    pub submitted_at: DateTime<Utc>,
    pub submission: AttemptSubmission,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_above_hundred_is_rejected() {
        let err = AttemptResult::new(101, true, 5).unwrap_err();
        assert_eq!(err, AttemptError::ScoreOutOfRange(101));
    }

    #[test]
    fn submission_copies_context_and_result() {
        let ctx = ChallengeContext::new(ChallengeId::new("d-1"), 3, Subject::Science);
        let meta = AttemptMeta {
            game: GameKind::ElementRush,
            hits: 4,
            misses: 1,
            rounds_played: 6,
            points: 35,
        };
        let result = AttemptResult::new(35, true, 60).unwrap().with_meta(meta.clone());

        let submission = AttemptSubmission::new(&ctx, &result);

        assert_eq!(submission.challenge_id.as_str(), "d-1");
        assert_eq!(submission.grade, 3);
        assert_eq!(submission.subject, Subject::Science);
        assert_eq!(submission.score, 35);
        assert_eq!(submission.time_taken_seconds, 60);
        assert_eq!(submission.meta, Some(meta));
    }
}
