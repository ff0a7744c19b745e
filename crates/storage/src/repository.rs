use arcade_core::model::{
    AttemptId, AttemptRecord, AttemptSubmission, ChallengeId, DailyChallenge, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A user's position on the points leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsStanding {
    pub user_id: UserId,
    pub total: i64,
}

/// Append-only log of finished attempts.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Persist a submission for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    async fn append_attempt(
        &self,
        user_id: UserId,
        submission: &AttemptSubmission,
        submitted_at: DateTime<Utc>,
    ) -> Result<AttemptRecord, StorageError>;

    /// Fetch an attempt by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_attempt(&self, id: AttemptId) -> Result<AttemptRecord, StorageError>;

    /// Most recent attempts of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn list_attempts(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<AttemptRecord>, StorageError>;

    /// Best score a user has reached on a challenge, if any attempt exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn best_score(
        &self,
        user_id: UserId,
        challenge_id: &ChallengeId,
    ) -> Result<Option<u8>, StorageError>;
}

/// Per-user running points total.
#[async_trait]
pub trait PointsLedger: Send + Sync {
    /// Add `delta` to the user's total in a single atomic step, creating the entry
    /// on first use and stamping it with `at`. Returns the new total.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the update fails.
    async fn add_points(
        &self,
        user_id: UserId,
        delta: i64,
        at: DateTime<Utc>,
    ) -> Result<i64, StorageError>;

    /// Current total; zero for users without an entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn total_points(&self, user_id: UserId) -> Result<i64, StorageError>;

    /// Highest totals first; ties broken by user id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn leaderboard(&self, limit: u32) -> Result<Vec<PointsStanding>, StorageError>;
}

/// Lookup of which challenge is published on a day for a grade.
#[async_trait]
pub trait ChallengeSchedule: Send + Sync {
    /// Insert or replace a challenge by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if another challenge already occupies the same
    /// date and grade.
    async fn upsert_challenge(&self, challenge: &DailyChallenge) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn challenge_for(
        &self,
        date: NaiveDate,
        grade: u8,
    ) -> Result<Option<DailyChallenge>, StorageError>;
}

#[derive(Default)]
struct AttemptLog {
    next_id: i64,
    records: Vec<AttemptRecord>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    attempts: Arc<Mutex<AttemptLog>>,
    points: Arc<Mutex<HashMap<UserId, i64>>>,
    schedule: Arc<Mutex<HashMap<ChallengeId, DailyChallenge>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: ToString>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn append_attempt(
        &self,
        user_id: UserId,
        submission: &AttemptSubmission,
        submitted_at: DateTime<Utc>,
    ) -> Result<AttemptRecord, StorageError> {
        let mut guard = self.attempts.lock().map_err(poisoned)?;
        guard.next_id += 1;
        let record = AttemptRecord {
            id: AttemptId::new(guard.next_id),
            user_id,
            submitted_at,
            submission: submission.clone(),
        };
        guard.records.push(record.clone());
        Ok(record)
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<AttemptRecord, StorageError> {
        let guard = self.attempts.lock().map_err(poisoned)?;
        guard
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_attempts(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<AttemptRecord>, StorageError> {
        let guard = self.attempts.lock().map_err(poisoned)?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let mut found: Vec<_> = guard
            .records
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then(b.id.value().cmp(&a.id.value()))
        });
        found.truncate(limit);
        Ok(found)
    }

    async fn best_score(
        &self,
        user_id: UserId,
        challenge_id: &ChallengeId,
    ) -> Result<Option<u8>, StorageError> {
        let guard = self.attempts.lock().map_err(poisoned)?;
        Ok(guard
            .records
            .iter()
            .filter(|r| r.user_id == user_id && &r.submission.challenge_id == challenge_id)
            .map(|r| r.submission.score)
            .max())
    }
}

#[async_trait]
impl PointsLedger for InMemoryRepository {
    async fn add_points(
        &self,
        user_id: UserId,
        delta: i64,
        _at: DateTime<Utc>,
    ) -> Result<i64, StorageError> {
        let mut guard = self.points.lock().map_err(poisoned)?;
        let total = guard.entry(user_id).or_insert(0);
        *total = total.saturating_add(delta);
        Ok(*total)
    }

    async fn total_points(&self, user_id: UserId) -> Result<i64, StorageError> {
        let guard = self.points.lock().map_err(poisoned)?;
        Ok(guard.get(&user_id).copied().unwrap_or(0))
    }

    async fn leaderboard(&self, limit: u32) -> Result<Vec<PointsStanding>, StorageError> {
        let guard = self.points.lock().map_err(poisoned)?;
        let mut standings: Vec<_> = guard
            .iter()
            .map(|(user_id, total)| PointsStanding {
                user_id: *user_id,
                total: *total,
            })
            .collect();
        standings.sort_by(|a, b| b.total.cmp(&a.total).then(a.user_id.cmp(&b.user_id)));
        standings.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(standings)
    }
}

#[async_trait]
impl ChallengeSchedule for InMemoryRepository {
    async fn upsert_challenge(&self, challenge: &DailyChallenge) -> Result<(), StorageError> {
        let mut guard = self.schedule.lock().map_err(poisoned)?;
        let taken = guard.values().any(|c| {
            c.date == challenge.date
                && c.grade == challenge.grade
                && c.challenge_id != challenge.challenge_id
        });
        if taken {
            return Err(StorageError::Conflict);
        }
        guard.insert(challenge.challenge_id.clone(), challenge.clone());
        Ok(())
    }

    async fn challenge_for(
        &self,
        date: NaiveDate,
        grade: u8,
    ) -> Result<Option<DailyChallenge>, StorageError> {
        let guard = self.schedule.lock().map_err(poisoned)?;
        Ok(guard
            .values()
            .find(|c| c.date == date && c.grade == grade)
            .cloned())
    }
}

/// Aggregates the persistence ports behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub attempts: Arc<dyn AttemptRepository>,
    pub points: Arc<dyn PointsLedger>,
    pub schedule: Arc<dyn ChallengeSchedule>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            attempts: Arc::new(repo.clone()),
            points: Arc::new(repo.clone()),
            schedule: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcade_core::model::{GameKind, Subject};
    use arcade_core::time::fixed_now;
    use chrono::Duration;

    fn submission(challenge: &str, score: u8) -> AttemptSubmission {
        AttemptSubmission {
            challenge_id: ChallengeId::new(challenge),
            grade: 3,
            subject: Subject::Mathematics,
            score,
            completed: true,
            time_taken_seconds: 30,
            meta: None,
        }
    }

    fn challenge(id: &str, day: u32, grade: u8) -> DailyChallenge {
        DailyChallenge {
            challenge_id: ChallengeId::new(id),
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            game: GameKind::QuickMath,
            grade,
            subject: Subject::Mathematics,
            config: None,
        }
    }

    #[tokio::test]
    async fn attempts_are_listed_newest_first() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(1);
        let now = fixed_now();
        repo.append_attempt(user, &submission("a", 40), now)
            .await
            .unwrap();
        repo.append_attempt(user, &submission("a", 90), now + Duration::minutes(1))
            .await
            .unwrap();
        repo.append_attempt(UserId::new(2), &submission("a", 100), now)
            .await
            .unwrap();

        let listed = repo.list_attempts(user, 10).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].submission.score, 90);

        let best = repo.best_score(user, &ChallengeId::new("a")).await.unwrap();
        assert_eq!(best, Some(90));
        let none = repo.best_score(user, &ChallengeId::new("b")).await.unwrap();
        assert_eq!(none, None);
    }

    #[tokio::test]
    async fn concurrent_point_updates_are_not_lost() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(9);

        let (a, b) = tokio::join!(
            repo.add_points(user, 10, fixed_now()),
            repo.add_points(user, 10, fixed_now())
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(repo.total_points(user).await.unwrap(), 20);
    }

    #[tokio::test]
    async fn leaderboard_orders_by_total() {
        let repo = InMemoryRepository::new();
        repo.add_points(UserId::new(1), 30, fixed_now()).await.unwrap();
        repo.add_points(UserId::new(2), 50, fixed_now()).await.unwrap();
        repo.add_points(UserId::new(3), 30, fixed_now()).await.unwrap();

        let board = repo.leaderboard(2).await.unwrap();
        assert_eq!(
            board,
            vec![
                PointsStanding {
                    user_id: UserId::new(2),
                    total: 50
                },
                PointsStanding {
                    user_id: UserId::new(1),
                    total: 30
                },
            ]
        );
    }

    #[tokio::test]
    async fn schedule_rejects_second_challenge_for_same_slot() {
        let repo = InMemoryRepository::new();
        repo.upsert_challenge(&challenge("c1", 1, 3)).await.unwrap();
        repo.upsert_challenge(&challenge("c1", 1, 3)).await.unwrap();

        let err = repo
            .upsert_challenge(&challenge("c2", 1, 3))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));

        let found = repo
            .challenge_for(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 3)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.challenge_id.as_str(), "c1");
        assert!(repo
            .challenge_for(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 4)
            .await
            .unwrap()
            .is_none());
    }
}
