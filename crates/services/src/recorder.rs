use std::sync::Arc;

use async_trait::async_trait;

use arcade_core::Clock;
use arcade_core::model::{AttemptRecord, AttemptSubmission, UserId};
use storage::repository::{AttemptRepository, PointsLedger, Storage};

use crate::error::RecorderError;

/// Destination for finished attempts and earned points.
#[async_trait]
pub trait AttemptRecorder: Send + Sync {
    /// Persist one finished attempt.
    ///
    /// # Errors
    ///
    /// Returns `RecorderError::Unauthenticated` when no player is signed in, or a
    /// storage error if persistence fails.
    async fn submit_attempt(
        &self,
        submission: AttemptSubmission,
    ) -> Result<AttemptRecord, RecorderError>;

    /// Add `delta` to the player's running total and return the new total.
    ///
    /// # Errors
    ///
    /// Returns `RecorderError::Unauthenticated` when no player is signed in, or a
    /// storage error if the update fails.
    async fn add_points(&self, delta: i64) -> Result<i64, RecorderError>;
}

/// Recorder backed by the storage ports, bound to the signed-in player (if any).
#[derive(Clone)]
pub struct StorageRecorder {
    user: Option<UserId>,
    clock: Clock,
    attempts: Arc<dyn AttemptRepository>,
    points: Arc<dyn PointsLedger>,
}

impl StorageRecorder {
    /// An anonymous recorder; every call fails until a user is bound.
    #[must_use]
    pub fn new(storage: &Storage, clock: Clock) -> Self {
        Self {
            user: None,
            clock,
            attempts: Arc::clone(&storage.attempts),
            points: Arc::clone(&storage.points),
        }
    }

    #[must_use]
    pub fn for_user(mut self, user: Option<UserId>) -> Self {
        self.user = user;
        self
    }

    #[must_use]
    pub fn user(&self) -> Option<UserId> {
        self.user
    }

    fn require_user(&self) -> Result<UserId, RecorderError> {
        self.user.ok_or(RecorderError::Unauthenticated)
    }
}

#[async_trait]
impl AttemptRecorder for StorageRecorder {
    async fn submit_attempt(
        &self,
        submission: AttemptSubmission,
    ) -> Result<AttemptRecord, RecorderError> {
        let user = self.require_user()?;
        let record = self
            .attempts
            .append_attempt(user, &submission, self.clock.now())
            .await?;
        log::info!(
            "recorded attempt {} for user {user} on {} (score {})",
            record.id,
            record.submission.challenge_id,
            record.submission.score
        );
        Ok(record)
    }

    async fn add_points(&self, delta: i64) -> Result<i64, RecorderError> {
        let user = self.require_user()?;
        Ok(self
            .points
            .add_points(user, delta, self.clock.now())
            .await?)
    }
}
