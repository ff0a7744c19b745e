use std::sync::{Arc, Mutex};
use std::time::Duration;

use arcade_core::model::{ChallengeContext, ChallengeId, GameKind, Subject};
use arcade_core::time::fixed_clock;
use async_trait::async_trait;
use services::{
    AnswerOutcome, Dimensions, HeadlessTarget, MountOutcome, PersistStatus, Scene, SceneFactory,
    SceneHost, SceneSnapshot, SessionError, SessionFactory, SessionPhase, Surface,
};

type Journal = Arc<Mutex<Vec<String>>>;

/// Scene that only writes its lifecycle calls into a shared journal.
struct JournalScene {
    id: usize,
    journal: Journal,
    live_count: Arc<Mutex<usize>>,
}

impl JournalScene {
    fn log(&self, event: &str) {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{event}:{}", self.id));
    }
}

#[async_trait]
impl Scene for JournalScene {
    fn init(&mut self, _context: Arc<ChallengeContext>) -> Result<(), SessionError> {
        self.log("init");
        Ok(())
    }

    fn create(&mut self, _surface: Surface) -> Result<(), SessionError> {
        let mut live = self.live_count.lock().unwrap();
        *live += 1;
        assert_eq!(*live, 1, "two scenes live at once");
        drop(live);
        self.log("create");
        Ok(())
    }

    fn update(&mut self, _dt: Duration) -> Result<(), SessionError> {
        Ok(())
    }

    fn answer(&mut self, _value: i64) -> Result<AnswerOutcome, SessionError> {
        Err(SessionError::NotAwaitingAnswer)
    }

    fn quit(&mut self) {}

    fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            kind: GameKind::Placeholder,
            phase: SessionPhase::Running,
            surface: None,
            prompt: None,
            options: Vec::new(),
            awaiting_answer: false,
            round_index: 0,
            total_rounds: None,
            hits: 0,
            misses: 0,
            points: 0,
            time_left: None,
            last_answer: None,
            score: None,
        }
    }

    fn persist_status(&mut self) -> PersistStatus {
        PersistStatus::Skipped
    }

    async fn wait_persisted(&mut self) -> PersistStatus {
        PersistStatus::Skipped
    }

    fn teardown(&mut self) {
        *self.live_count.lock().unwrap() -= 1;
        self.log("teardown");
    }
}

#[derive(Default)]
struct JournalFactory {
    journal: Journal,
    built: Mutex<usize>,
    live_count: Arc<Mutex<usize>>,
}

impl SceneFactory for JournalFactory {
    fn build(&self, _kind: GameKind) -> Box<dyn Scene> {
        let mut built = self.built.lock().unwrap();
        *built += 1;
        Box::new(JournalScene {
            id: *built,
            journal: Arc::clone(&self.journal),
            live_count: Arc::clone(&self.live_count),
        })
    }
}

fn context(id: &str) -> Arc<ChallengeContext> {
    Arc::new(ChallengeContext::new(
        ChallengeId::new(id),
        3,
        Subject::Science,
    ))
}

const SIZE: Dimensions = Dimensions::new(800, 600);

#[test]
fn remount_tears_down_before_creating() {
    let factory = Arc::new(JournalFactory::default());
    let journal = Arc::clone(&factory.journal);
    let mut host = SceneHost::new(HeadlessTarget::new(), factory);

    let first = context("a");
    assert_eq!(
        host.mount(GameKind::QuickMath, SIZE, Arc::clone(&first)).unwrap(),
        MountOutcome::Mounted
    );
    assert_eq!(
        host.mount(GameKind::QuickMath, SIZE, Arc::clone(&first)).unwrap(),
        MountOutcome::Unchanged
    );

    // Equal contents, different instance: identity changed.
    host.mount(GameKind::QuickMath, SIZE, context("a")).unwrap();
    host.mount(GameKind::QuickMath, Dimensions::new(400, 300), context("a"))
        .unwrap();

    assert_eq!(
        *journal.lock().unwrap(),
        vec![
            "init:1", "create:1", "teardown:1", "init:2", "create:2", "teardown:2", "init:3",
            "create:3",
        ]
    );
    assert_eq!(host.target().live_surfaces(), 1);
}

#[test]
fn dropping_the_host_tears_down_the_live_scene() {
    let factory = Arc::new(JournalFactory::default());
    let journal = Arc::clone(&factory.journal);
    {
        let mut host = SceneHost::new(HeadlessTarget::new(), factory);
        host.mount(GameKind::ElementRush, SIZE, context("b")).unwrap();
    }
    assert_eq!(
        journal.lock().unwrap().last().map(String::as_str),
        Some("teardown:1")
    );
}

#[test]
fn unavailable_target_is_a_silent_no_op() {
    let factory = Arc::new(JournalFactory::default());
    let journal = Arc::clone(&factory.journal);
    let mut host = SceneHost::new(HeadlessTarget::unavailable(), factory);

    let outcome = host.mount(GameKind::QuickMath, SIZE, context("c")).unwrap();

    assert_eq!(outcome, MountOutcome::Skipped);
    assert!(!host.is_mounted());
    assert!(journal.lock().unwrap().is_empty());
    host.update(Duration::from_secs(1)).unwrap();
    assert!(host.snapshot().is_none());
}

#[test]
fn unmount_mid_feedback_releases_the_surface() {
    let factory = Arc::new(SessionFactory::new(fixed_clock()).with_seed(Some(5)));
    let mut host = SceneHost::new(HeadlessTarget::new(), factory);
    host.mount(GameKind::QuickMath, SIZE, context("d")).unwrap();

    let snapshot = host.snapshot().unwrap();
    assert_eq!(snapshot.round_index, 1);
    assert!(snapshot.options.is_empty());

    host.answer(-1).unwrap();
    host.unmount();
    host.update(Duration::from_secs(2)).unwrap();

    assert!(!host.is_mounted());
    assert_eq!(host.target().live_surfaces(), 0);
}

#[tokio::test]
async fn unknown_game_runs_placeholder_to_completion() {
    let scores = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&scores);
    let factory = Arc::new(
        SessionFactory::new(fixed_clock())
            .on_complete(move |kind, result| sink.lock().unwrap().push((kind, result.score()))),
    );
    let mut host = SceneHost::new(HeadlessTarget::new(), factory);
    let kind = services::ChallengeResolver::new().kind_for("word-hunt");

    host.mount(kind, SIZE, context("e")).unwrap();
    let snapshot = host.snapshot().unwrap();
    assert_eq!(snapshot.total_rounds, Some(1));

    host.answer(1).unwrap();
    let snapshot = host.snapshot().unwrap();
    assert_eq!(snapshot.phase, SessionPhase::Done);
    assert_eq!(snapshot.score, Some(100));
    assert_eq!(host.wait_persisted().await, Some(PersistStatus::Skipped));
    assert_eq!(*scores.lock().unwrap(), vec![(GameKind::Placeholder, 100)]);
}

#[test]
fn idle_player_runs_out_of_time_on_frames_alone() {
    let factory = Arc::new(SessionFactory::new(fixed_clock()).with_seed(Some(8)));
    let mut host = SceneHost::new(HeadlessTarget::new(), factory);
    host.mount(GameKind::ElementRush, SIZE, context("f")).unwrap();

    for _ in 0..599 {
        host.update(Duration::from_millis(100)).unwrap();
    }
    let snapshot = host.snapshot().unwrap();
    assert_eq!(snapshot.phase, SessionPhase::Running);
    assert_eq!(snapshot.time_left, Some(1));

    host.update(Duration::from_millis(100)).unwrap();
    let snapshot = host.snapshot().unwrap();
    assert_eq!(snapshot.phase, SessionPhase::Done);
    assert_eq!(snapshot.time_left, Some(0));
    assert_eq!((snapshot.hits, snapshot.misses), (0, 0));
    assert_eq!(snapshot.score, Some(0));
}
