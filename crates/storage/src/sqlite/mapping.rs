use arcade_core::model::{
    AttemptId, AttemptMeta, AttemptRecord, AttemptSubmission, ChallengeId, DailyChallenge,
    GameKind, Subject, UserId,
};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn user_id_to_i64(user_id: UserId) -> Result<i64, StorageError> {
    i64::try_from(user_id.value())
        .map_err(|_| StorageError::Serialization("user_id overflow".into()))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    u64::try_from(v)
        .map(UserId::new)
        .map_err(|_| StorageError::Serialization("user_id sign overflow".into()))
}

fn u8_from_i64(field: &'static str, v: i64) -> Result<u8, StorageError> {
    u8::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn parse_subject(s: &str) -> Result<Subject, StorageError> {
    Subject::parse(s).map_err(ser)
}

pub(crate) fn parse_game(s: &str) -> Result<GameKind, StorageError> {
    GameKind::from_identifier(s)
        .ok_or_else(|| StorageError::Serialization(format!("invalid game: {s}")))
}

pub(crate) fn meta_to_json(meta: Option<&AttemptMeta>) -> Result<Option<String>, StorageError> {
    meta.map(serde_json::to_string).transpose().map_err(ser)
}

pub(crate) fn map_attempt_row(row: &sqlx::sqlite::SqliteRow) -> Result<AttemptRecord, StorageError> {
    let meta: Option<String> = row.try_get("meta").map_err(ser)?;
    let meta = meta
        .as_deref()
        .map(serde_json::from_str::<AttemptMeta>)
        .transpose()
        .map_err(ser)?;
    let subject: String = row.try_get("subject").map_err(ser)?;
    let time_taken: i64 = row.try_get("time_taken_seconds").map_err(ser)?;

    Ok(AttemptRecord {
        id: AttemptId::new(row.try_get("id").map_err(ser)?),
        user_id: user_id_from_i64(row.try_get("user_id").map_err(ser)?)?,
        submitted_at: row.try_get("submitted_at").map_err(ser)?,
        submission: AttemptSubmission {
            challenge_id: ChallengeId::new(row.try_get::<String, _>("challenge_id").map_err(ser)?),
            grade: u8_from_i64("grade", row.try_get("grade").map_err(ser)?)?,
            subject: parse_subject(&subject)?,
            score: u8_from_i64("score", row.try_get("score").map_err(ser)?)?,
            completed: row.try_get("completed").map_err(ser)?,
            time_taken_seconds: u32::try_from(time_taken).map_err(|_| {
                StorageError::Serialization(format!("invalid time_taken_seconds: {time_taken}"))
            })?,
            meta,
        },
    })
}

pub(crate) fn map_challenge_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<DailyChallenge, StorageError> {
    let game: String = row.try_get("game").map_err(ser)?;
    let subject: String = row.try_get("subject").map_err(ser)?;
    let config: Option<String> = row.try_get("config").map_err(ser)?;

    Ok(DailyChallenge {
        challenge_id: ChallengeId::new(row.try_get::<String, _>("challenge_id").map_err(ser)?),
        date: row.try_get("date").map_err(ser)?,
        game: parse_game(&game)?,
        grade: u8_from_i64("grade", row.try_get("grade").map_err(ser)?)?,
        subject: parse_subject(&subject)?,
        config: config
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(ser)?,
    })
}
