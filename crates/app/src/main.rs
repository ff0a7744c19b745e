use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arcade_core::model::{ChallengeContext, ChallengeDraft, ChallengeId, GameKind, Subject, UserId};
use chrono::NaiveDate;
use services::{
    ChallengeResolver, Clock, Dimensions, HeadlessTarget, MountOutcome, PersistStatus,
    SceneHost, SceneSnapshot, SessionError, SessionFactory, SessionPhase, StorageRecorder,
};
use storage::repository::Storage;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

const TERMINAL_SIZE: Dimensions = Dimensions::new(80, 24);
const FRAME: Duration = Duration::from_millis(100);

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidUserId { raw: String },
    InvalidGrade { raw: String },
    InvalidDate { raw: String },
    InvalidNumber { flag: &'static str, raw: String },
    MissingUser,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user value: {raw}"),
            ArgsError::InvalidGrade { raw } => write!(f, "invalid --grade value (1-12): {raw}"),
            ArgsError::InvalidDate { raw } => {
                write!(f, "invalid --date value (expected YYYY-MM-DD): {raw}")
            }
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::MissingUser => write!(f, "stats needs --user or ARCADE_USER_ID"),
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Stats,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "stats" => Some(Self::Stats),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user: Option<UserId>,
    game: Option<String>,
    grade: u8,
    date: Option<NaiveDate>,
    seed: Option<u64>,
    limit: u32,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: std::env::var("ARCADE_DB_URL")
                .unwrap_or_else(|_| "sqlite:arcade.sqlite3".into()),
            user: std::env::var("ARCADE_USER_ID")
                .ok()
                .and_then(|value| value.parse::<UserId>().ok()),
            game: None,
            grade: 1,
            date: None,
            seed: None,
            limit: 10,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = value;
                }
                "--user" => {
                    let value = require_value(args, "--user")?;
                    let user = value
                        .parse::<UserId>()
                        .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?;
                    parsed.user = Some(user);
                }
                "--game" => parsed.game = Some(require_value(args, "--game")?),
                "--grade" => {
                    let value = require_value(args, "--grade")?;
                    parsed.grade = value
                        .parse::<u8>()
                        .ok()
                        .filter(|g| (ChallengeContext::MIN_GRADE..=ChallengeContext::MAX_GRADE).contains(g))
                        .ok_or(ArgsError::InvalidGrade { raw: value })?;
                }
                "--date" => {
                    let value = require_value(args, "--date")?;
                    let date = NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                        .map_err(|_| ArgsError::InvalidDate { raw: value.clone() })?;
                    parsed.date = Some(date);
                }
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    let seed = value.parse::<u64>().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--seed",
                        raw: value.clone(),
                    })?;
                    parsed.seed = Some(seed);
                }
                "--limit" => {
                    let value = require_value(args, "--limit")?;
                    parsed.limit = value.parse::<u32>().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--limit",
                        raw: value.clone(),
                    })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- play  [--db <url>] [--user <id>] [--grade <n>] [--date <YYYY-MM-DD>]");
    eprintln!("                            [--game <identifier>] [--seed <n>]");
    eprintln!("  cargo run -p app -- stats [--db <url>] --user <id> [--limit <n>]");
    eprintln!();
    eprintln!("play is the default. Without --game it plays the challenge scheduled for");
    eprintln!("the date (default: today, UTC) and grade (default: 1).");
    eprintln!("Games: quick-math, sequence-solver, element-rush");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ARCADE_DB_URL (default sqlite:arcade.sqlite3), ARCADE_USER_ID, RUST_LOG");
}

/// Pick the game and context to play: an explicit `--game`, else the day's schedule,
/// else a practice round of quick math.
async fn choose_challenge(
    storage: &Storage,
    args: &Args,
    clock: &Clock,
) -> Result<(GameKind, ChallengeContext), Box<dyn std::error::Error>> {
    let resolver = ChallengeResolver::new();

    if let Some(identifier) = args.game.as_deref() {
        let kind = resolver.kind_for(identifier);
        let subject = match kind {
            GameKind::ElementRush => Subject::Science,
            _ => Subject::Mathematics,
        };
        let draft = ChallengeDraft {
            challenge_id: Some(format!("practice-{}", kind.identifier())),
            grade: Some(i64::from(args.grade)),
            subject: Some(subject.as_str().to_owned()),
            config: None,
        };
        let (context, missing) = ChallengeContext::resolve(draft);
        for field in missing {
            log::warn!("practice context: {field}");
        }
        return Ok((kind, context));
    }

    let date = args.date.unwrap_or_else(|| clock.now().date_naive());
    match storage.schedule.challenge_for(date, args.grade).await? {
        Some(challenge) => Ok((challenge.game, challenge.context())),
        None => {
            log::warn!("no challenge scheduled for grade {} on {date}", args.grade);
            println!("Nothing scheduled for {date}; playing a practice round.");
            let context = ChallengeContext::new(
                ChallengeId::practice(),
                args.grade,
                Subject::Mathematics,
            );
            Ok((GameKind::QuickMath, context))
        }
    }
}

fn render(snapshot: &SceneSnapshot) {
    let progress = match (snapshot.total_rounds, snapshot.time_left) {
        (Some(total), _) => format!("round {}/{total}", snapshot.round_index),
        (None, Some(left)) => format!("{left}s left"),
        (None, None) => format!("round {}", snapshot.round_index),
    };
    println!();
    println!("[{}] {progress} | points {}", snapshot.kind.title(), snapshot.points);
    if let Some(prompt) = &snapshot.prompt {
        println!("{prompt}");
    }
    if !snapshot.options.is_empty() {
        let options: Vec<String> = snapshot.options.iter().map(i64::to_string).collect();
        println!("options: {}", options.join("  "));
    }
    print!("> ");
    // Best effort; the prompt is cosmetic.
    let _ = std::io::Write::flush(&mut std::io::stdout());
}

fn describe(status: &PersistStatus) -> String {
    match status {
        PersistStatus::Skipped => "not saved".into(),
        PersistStatus::Pending => "saving...".into(),
        PersistStatus::Saved {
            attempt_id,
            total_points,
        } => format!("saved as attempt {attempt_id}; you now have {total_points} points"),
        PersistStatus::Failed { message } => format!("not saved: {message}"),
    }
}

async fn play(storage: Storage, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let clock = Clock::system();
    let (kind, context) = choose_challenge(&storage, args, &clock).await?;

    if args.user.is_none() {
        println!("Playing anonymously; pass --user to save your result.");
    }
    let recorder = StorageRecorder::new(&storage, clock.clone()).for_user(args.user);
    let factory = SessionFactory::new(clock)
        .with_recorder(Arc::new(recorder))
        .with_seed(args.seed);
    let mut host = SceneHost::new(HeadlessTarget::new(), Arc::new(factory));

    println!("{} - {} (grade {})", kind.title(), context.challenge_id(), context.grade());
    if host.mount(kind, TERMINAL_SIZE, Arc::new(context))? == MountOutcome::Skipped {
        println!("Nothing to show.");
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut frames = tokio::time::interval(FRAME);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last = Instant::now();
    let mut shown_round = None;

    loop {
        let now = Instant::now();
        host.update(now - last)?;
        last = now;

        let Some(snapshot) = host.snapshot() else {
            break;
        };
        if snapshot.phase == SessionPhase::Done {
            if snapshot.time_left == Some(0) {
                println!();
                println!("Time's up!");
            }
            break;
        }
        if snapshot.awaiting_answer && shown_round != Some(snapshot.round_index) {
            render(&snapshot);
            shown_round = Some(snapshot.round_index);
        }

        // The countdown keeps running while stdin is idle.
        tokio::select! {
            _ = frames.tick() => {}
            line = lines.next_line() => {
                let Some(line) = line? else {
                    host.quit();
                    break;
                };
                let now = Instant::now();
                host.update(now - last)?;
                last = now;

                let input = line.trim();
                if input.eq_ignore_ascii_case("q") {
                    host.quit();
                    break;
                }
                let Ok(value) = input.parse::<i64>() else {
                    println!("Type a number, or q to quit.");
                    shown_round = None;
                    continue;
                };

                match host.answer(value) {
                    Ok(outcome) if outcome.correct => println!("Correct! ({:+})", outcome.delta),
                    Ok(outcome) => {
                        println!("Not quite, it was {} ({:+})", outcome.expected, outcome.delta);
                    }
                    Err(SessionError::NotRunning) => {}
                    Err(SessionError::NotAwaitingAnswer) => println!("Hold on, next round coming."),
                    Err(err) => println!("{err}"),
                }
            }
        }
    }

    if let Some(snapshot) = host.snapshot() {
        println!();
        println!(
            "Finished: score {} ({} right, {} wrong)",
            snapshot.score.unwrap_or(0),
            snapshot.hits,
            snapshot.misses
        );
    }
    if let Some(status) = host.wait_persisted().await {
        println!("Result {}.", describe(&status));
    }
    host.unmount();
    Ok(())
}

async fn stats(storage: Storage, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let user = args.user.ok_or(ArgsError::MissingUser)?;

    let total = storage.points.total_points(user).await?;
    println!("User {user}: {total} points");

    let attempts = storage.attempts.list_attempts(user, args.limit).await?;
    if attempts.is_empty() {
        println!("No attempts yet.");
    }
    for record in attempts {
        let submission = &record.submission;
        let game = submission
            .meta
            .as_ref()
            .map_or("?", |meta| meta.game.identifier());
        println!(
            "  {} {:<16} {:<22} score {:>3} in {:>3}s{}",
            record.submitted_at.format("%Y-%m-%d %H:%M"),
            game,
            submission.challenge_id.as_str(),
            submission.score,
            submission.time_taken_seconds,
            if submission.completed { "" } else { " (quit)" }
        );
    }

    println!("Leaderboard:");
    for (rank, standing) in storage.points.leaderboard(args.limit).await?.iter().enumerate() {
        println!("  {:>2}. user {} - {}", rank + 1, standing.user_id, standing.total);
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if argv.first().is_some_and(|first| !first.starts_with("--")) {
        argv.remove(0);
    }

    let args = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    match cmd {
        Command::Play => play(storage, &args).await,
        Command::Stats => stats(storage, &args).await,
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
