use arcade_core::model::{
    AttemptMeta, AttemptSubmission, ChallengeId, DailyChallenge, GameKind, Subject, UserId,
};
use arcade_core::time::fixed_now;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::json;
use storage::repository::{AttemptRepository, ChallengeSchedule, PointsLedger, StorageError};
use storage::sqlite::SqliteRepository;

async fn memory_repo(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn submission(score: u8, meta: Option<AttemptMeta>) -> AttemptSubmission {
    AttemptSubmission {
        challenge_id: ChallengeId::new("daily-2024-03-01-g3"),
        grade: 3,
        subject: Subject::Science,
        score,
        completed: true,
        time_taken_seconds: 42,
        meta,
    }
}

#[tokio::test]
async fn sqlite_roundtrips_attempts_with_meta() {
    let repo = memory_repo("memdb_attempts").await;
    let user = UserId::new(5);
    let meta = AttemptMeta {
        game: GameKind::ElementRush,
        hits: 7,
        misses: 2,
        rounds_played: 10,
        points: 60,
    };

    let first = repo
        .append_attempt(user, &submission(60, Some(meta.clone())), fixed_now())
        .await
        .unwrap();
    repo.append_attempt(user, &submission(80, None), fixed_now() + Duration::minutes(3))
        .await
        .unwrap();

    let fetched = repo.get_attempt(first.id).await.unwrap();
    assert_eq!(fetched, first);
    assert_eq!(fetched.submission.meta, Some(meta));

    let listed = repo.list_attempts(user, 10).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].submission.score, 80);

    let best = repo
        .best_score(user, &ChallengeId::new("daily-2024-03-01-g3"))
        .await
        .unwrap();
    assert_eq!(best, Some(80));

    let missing = repo.best_score(UserId::new(6), &ChallengeId::new("x")).await.unwrap();
    assert_eq!(missing, None);
}

#[tokio::test]
async fn sqlite_missing_attempt_is_not_found() {
    let repo = memory_repo("memdb_missing_attempt").await;
    let err = repo
        .get_attempt(arcade_core::model::AttemptId::new(404))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_points_accumulate_and_rank() {
    let repo = memory_repo("memdb_points").await;

    assert_eq!(repo.total_points(UserId::new(1)).await.unwrap(), 0);
    assert_eq!(repo.add_points(UserId::new(1), 15, fixed_now()).await.unwrap(), 15);
    assert_eq!(repo.add_points(UserId::new(1), 10, fixed_now()).await.unwrap(), 25);
    repo.add_points(UserId::new(2), 40, fixed_now()).await.unwrap();

    let board = repo.leaderboard(10).await.unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].user_id, UserId::new(2));
    assert_eq!(board[1].total, 25);
}

#[tokio::test]
async fn sqlite_points_are_stamped_with_the_given_time() {
    let repo = memory_repo("memdb_points_stamp").await;
    let user = UserId::new(5);
    let later = fixed_now() + Duration::hours(3);

    repo.add_points(user, 10, fixed_now()).await.unwrap();
    repo.add_points(user, 5, later).await.unwrap();

    let updated_at: DateTime<Utc> =
        sqlx::query_scalar("SELECT updated_at FROM user_points WHERE user_id = ?1")
            .bind(5_i64)
            .fetch_one(repo.pool())
            .await
            .unwrap();
    assert_eq!(updated_at, later);
}

#[tokio::test]
async fn sqlite_concurrent_increments_for_new_user_are_not_lost() {
    let path = std::env::temp_dir().join(format!(
        "arcade_points_race_{}.sqlite3",
        std::process::id()
    ));
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    let user = UserId::new(77);

    let (a, b) = tokio::join!(
        repo.add_points(user, 10, fixed_now()),
        repo.add_points(user, 10, fixed_now())
    );
    let mut totals = [a.unwrap(), b.unwrap()];
    totals.sort_unstable();

    assert_eq!(totals, [10, 20]);
    assert_eq!(repo.total_points(user).await.unwrap(), 20);

    repo.pool().close().await;
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn sqlite_schedule_lookup_by_date_and_grade() {
    let repo = memory_repo("memdb_schedule").await;
    let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let challenge = DailyChallenge {
        challenge_id: ChallengeId::new("c-1"),
        date,
        game: GameKind::SequenceSolver,
        grade: 4,
        subject: Subject::Mathematics,
        config: Some(json!({ "rounds": 6 })),
    };

    repo.upsert_challenge(&challenge).await.unwrap();
    let found = repo.challenge_for(date, 4).await.unwrap();
    assert_eq!(found, Some(challenge.clone()));
    assert_eq!(repo.challenge_for(date, 5).await.unwrap(), None);

    let clash = DailyChallenge {
        challenge_id: ChallengeId::new("c-2"),
        ..challenge
    };
    let err = repo.upsert_challenge(&clash).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
}
