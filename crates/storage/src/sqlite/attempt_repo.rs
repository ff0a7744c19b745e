use arcade_core::model::{AttemptId, AttemptRecord, AttemptSubmission, ChallengeId, UserId};
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, map_attempt_row, meta_to_json, ser, user_id_to_i64};
use crate::repository::{AttemptRepository, StorageError};

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn append_attempt(
        &self,
        user_id: UserId,
        submission: &AttemptSubmission,
        submitted_at: DateTime<Utc>,
    ) -> Result<AttemptRecord, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO attempts (
                    user_id, challenge_id, grade, subject, score,
                    completed, time_taken_seconds, meta, submitted_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(user_id_to_i64(user_id)?)
        .bind(submission.challenge_id.as_str())
        .bind(i64::from(submission.grade))
        .bind(submission.subject.as_str())
        .bind(i64::from(submission.score))
        .bind(submission.completed)
        .bind(i64::from(submission.time_taken_seconds))
        .bind(meta_to_json(submission.meta.as_ref())?)
        .bind(submitted_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(AttemptRecord {
            id: AttemptId::new(res.last_insert_rowid()),
            user_id,
            submitted_at,
            submission: submission.clone(),
        })
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<AttemptRecord, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    id, user_id, challenge_id, grade, subject, score,
                    completed, time_taken_seconds, meta, submitted_at
                FROM attempts
                WHERE id = ?1
            ",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_attempt_row(&row)
    }

    async fn list_attempts(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<AttemptRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, user_id, challenge_id, grade, subject, score,
                    completed, time_taken_seconds, meta, submitted_at
                FROM attempts
                WHERE user_id = ?1
                ORDER BY submitted_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(user_id_to_i64(user_id)?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_attempt_row).collect()
    }

    async fn best_score(
        &self,
        user_id: UserId,
        challenge_id: &ChallengeId,
    ) -> Result<Option<u8>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT MAX(score) AS best
                FROM attempts
                WHERE user_id = ?1 AND challenge_id = ?2
            ",
        )
        .bind(user_id_to_i64(user_id)?)
        .bind(challenge_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        let best: Option<i64> = row.try_get("best").map_err(ser)?;
        best.map(|b| {
            u8::try_from(b).map_err(|_| StorageError::Serialization(format!("invalid score: {b}")))
        })
        .transpose()
    }
}
