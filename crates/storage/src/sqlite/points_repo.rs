use arcade_core::model::UserId;
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser, user_id_from_i64, user_id_to_i64};
use crate::repository::{PointsLedger, PointsStanding, StorageError};

#[async_trait::async_trait]
impl PointsLedger for SqliteRepository {
    async fn add_points(
        &self,
        user_id: UserId,
        delta: i64,
        at: DateTime<Utc>,
    ) -> Result<i64, StorageError> {
        // Single upsert statement: the increment happens inside SQLite, never as
        // a read in Rust followed by a write.
        let row = sqlx::query(
            r"
                INSERT INTO user_points (user_id, total, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(user_id) DO UPDATE SET
                    total = total + excluded.total,
                    updated_at = excluded.updated_at
                RETURNING total
            ",
        )
        .bind(user_id_to_i64(user_id)?)
        .bind(delta)
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        row.try_get("total").map_err(ser)
    }

    async fn total_points(&self, user_id: UserId) -> Result<i64, StorageError> {
        let total: Option<i64> =
            sqlx::query_scalar("SELECT total FROM user_points WHERE user_id = ?1")
                .bind(user_id_to_i64(user_id)?)
                .fetch_optional(&self.pool)
                .await
                .map_err(conn)?;
        Ok(total.unwrap_or(0))
    }

    async fn leaderboard(&self, limit: u32) -> Result<Vec<PointsStanding>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT user_id, total
                FROM user_points
                ORDER BY total DESC, user_id ASC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(PointsStanding {
                user_id: user_id_from_i64(row.try_get("user_id").map_err(ser)?)?,
                total: row.try_get("total").map_err(ser)?,
            });
        }
        Ok(out)
    }
}
