use arcade_core::model::DailyChallenge;
use chrono::NaiveDate;

use super::SqliteRepository;
use super::mapping::{conn, map_challenge_row, ser};
use crate::repository::{ChallengeSchedule, StorageError};

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait::async_trait]
impl ChallengeSchedule for SqliteRepository {
    async fn upsert_challenge(&self, challenge: &DailyChallenge) -> Result<(), StorageError> {
        let config = challenge
            .config
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(ser)?;

        sqlx::query(
            r"
                INSERT INTO daily_challenges (challenge_id, date, game, grade, subject, config)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(challenge_id) DO UPDATE SET
                    date = excluded.date,
                    game = excluded.game,
                    grade = excluded.grade,
                    subject = excluded.subject,
                    config = excluded.config
            ",
        )
        .bind(challenge.challenge_id.as_str())
        .bind(challenge.date)
        .bind(challenge.game.identifier())
        .bind(i64::from(challenge.grade))
        .bind(challenge.subject.as_str())
        .bind(config)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::Conflict
            } else {
                conn(e)
            }
        })?;

        Ok(())
    }

    async fn challenge_for(
        &self,
        date: NaiveDate,
        grade: u8,
    ) -> Result<Option<DailyChallenge>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT challenge_id, date, game, grade, subject, config
                FROM daily_challenges
                WHERE date = ?1 AND grade = ?2
            ",
        )
        .bind(date)
        .bind(i64::from(grade))
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_challenge_row).transpose()
    }
}
