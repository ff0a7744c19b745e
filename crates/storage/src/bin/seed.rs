use std::fmt;

use arcade_core::model::{ChallengeId, DailyChallenge, GameKind, Subject};
use chrono::{Days, NaiveDate, Utc};
use serde_json::json;
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    start: Option<NaiveDate>,
    days: u32,
    grades: Vec<u8>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidStart { raw: String },
    InvalidDays { raw: String },
    InvalidGrade { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidStart { raw } => {
                write!(f, "invalid --start value (expected YYYY-MM-DD): {raw}")
            }
            ArgsError::InvalidDays { raw } => write!(f, "invalid --days value: {raw}"),
            ArgsError::InvalidGrade { raw } => write!(f, "invalid --grade value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_grade(raw: String) -> Result<u8, ArgsError> {
    raw.parse::<u8>()
        .ok()
        .filter(|g| (1..=12).contains(g))
        .ok_or(ArgsError::InvalidGrade { raw })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("ARCADE_DB_URL").unwrap_or_else(|_| "sqlite:arcade.sqlite3".into());
        let mut days = std::env::var("ARCADE_SEED_DAYS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(7);
        let mut start = None;
        let mut grades = Vec::new();

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--start" => {
                    let value = require_value(&mut args, "--start")?;
                    let parsed = NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                        .map_err(|_| ArgsError::InvalidStart { raw: value.clone() })?;
                    start = Some(parsed);
                }
                "--days" => {
                    let value = require_value(&mut args, "--days")?;
                    days = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidDays { raw: value.clone() })?;
                }
                "--grade" => {
                    let value = require_value(&mut args, "--grade")?;
                    grades.push(parse_grade(value)?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if grades.is_empty() {
            grades = (1..=6).collect();
        }

        Ok(Self {
            db_url,
            start,
            days,
            grades,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:arcade.sqlite3)");
    eprintln!("  --start <YYYY-MM-DD>      First scheduled day (default: today, UTC)");
    eprintln!("  --days <n>                Number of days to schedule (default: 7)");
    eprintln!("  --grade <n>               Grade to schedule; repeatable (default: 1-6)");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  ARCADE_DB_URL, ARCADE_SEED_DAYS");
}

/// Rotation of games and the subject each is filed under.
fn rotation(day: u32) -> (GameKind, Subject) {
    match day % 3 {
        0 => (GameKind::QuickMath, Subject::Mathematics),
        1 => (GameKind::SequenceSolver, Subject::Mathematics),
        _ => (GameKind::ElementRush, Subject::Science),
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let start = args.start.unwrap_or_else(|| Utc::now().date_naive());

    let mut scheduled = 0_u32;
    for day in 0..args.days {
        let Some(date) = start.checked_add_days(Days::new(u64::from(day))) else {
            break;
        };
        let (game, subject) = rotation(day);
        for &grade in &args.grades {
            let config = match game {
                GameKind::QuickMath => json!({ "rounds": 5 + u32::from(grade / 3) }),
                GameKind::ElementRush => json!({ "time_limit_secs": 60 }),
                _ => json!({}),
            };
            let challenge = DailyChallenge {
                challenge_id: ChallengeId::new(format!("daily-{date}-g{grade}")),
                date,
                game,
                grade,
                subject,
                config: Some(config),
            };
            storage.schedule.upsert_challenge(&challenge).await?;
            scheduled += 1;
        }
    }

    println!(
        "Scheduled {scheduled} daily challenges starting {start} into {}",
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
