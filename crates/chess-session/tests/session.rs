use chess_analysis::{AnalysisResult, EngineError, PositionAnalyzer};
use chess_core::Color;
use chess_rules::{GameResult, RulesError, WinReason};
use chess_session::{Session, SessionConfig, SessionError, SessionEvent, SharedEngine};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(5);

/// Answers from a fixed table keyed by the number of moves played.
#[derive(Default)]
struct Scripted {
    moves: Vec<&'static str>,
    /// Replies keyed by the last move played; checked before `moves`.
    answers: Vec<(&'static str, &'static str)>,
    /// Centipawns from the side to move, per ply.
    scores: Vec<i32>,
    delay: Duration,
    fail: bool,
    requests: Mutex<Vec<Vec<String>>>,
    closed: AtomicBool,
    new_games: AtomicUsize,
}

impl PositionAnalyzer for Scripted {
    fn analyze(
        &self,
        moves: &[String],
        _think_time: Duration,
    ) -> Result<AnalysisResult, EngineError> {
        thread::sleep(self.delay);
        self.requests.lock().unwrap().push(moves.to_vec());
        if self.fail {
            return Err(EngineError::Communication("engine went away".to_string()));
        }
        let ply = moves.len();
        let answer = moves.last().and_then(|last| {
            self.answers
                .iter()
                .find(|(after, _)| *after == last.as_str())
                .map(|(_, reply)| reply.to_string())
        });
        Ok(AnalysisResult {
            best_move: answer.or_else(|| self.moves.get(ply).map(|m| m.to_string())),
            centipawns: Some(self.scores.get(ply).copied().unwrap_or(0)),
            mate: None,
            pv: self.moves.get(ply).map(|m| vec![m.to_string()]).unwrap_or_default(),
        })
    }

    fn new_game(&self) -> Result<(), EngineError> {
        self.new_games.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

fn config(engine_color: &str, clock_minutes: u64) -> SessionConfig {
    SessionConfig {
        engine_color: engine_color.to_string(),
        clock_minutes,
        think_time_ms: 10,
        analysis_think_time_ms: 10,
        ..SessionConfig::default()
    }
}

fn session_with(config: SessionConfig, engine: &Arc<Scripted>) -> Session {
    let shared: SharedEngine = engine.clone();
    Session::with_engine(config, Some(shared)).unwrap()
}

fn moves_applied(events: &[SessionEvent]) -> Vec<(String, bool)> {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::MoveApplied { san, by_engine, .. } => Some((san.clone(), *by_engine)),
            _ => None,
        })
        .collect()
}

fn engine_unavailable(events: &[SessionEvent]) -> bool {
    events
        .iter()
        .any(|e| matches!(e, SessionEvent::EngineUnavailable { .. }))
}

#[test]
fn engine_answers_the_human_move() {
    let engine = Arc::new(Scripted {
        moves: vec!["e2e4", "e7e5", "g1f3"],
        ..Scripted::default()
    });
    let mut session = session_with(config("black", 0), &engine);

    session.play_uci("e2e4").unwrap();
    assert!(session.is_engine_thinking());
    assert!(session.wait_for_engine(WAIT));

    assert_eq!(session.game().ply_count(), 2);
    assert!(!session.is_engine_thinking());
    assert_eq!(
        moves_applied(&session.drain_events()),
        vec![("e4".to_string(), false), ("e5".to_string(), true)]
    );
    assert_eq!(engine.requests.lock().unwrap()[0], vec!["e2e4".to_string()]);
}

#[test]
fn engine_with_white_moves_first() {
    let engine = Arc::new(Scripted {
        moves: vec!["d2d4"],
        ..Scripted::default()
    });
    let mut session = session_with(config("white", 0), &engine);

    assert!(session.is_engine_thinking());
    assert!(session.wait_for_engine(WAIT));
    assert_eq!(session.game().record().uci_moves(), ["d2d4".to_string()]);
    assert_eq!(session.human_side(), Some(Color::Black));
}

#[test]
fn human_cannot_move_for_the_engine() {
    let engine = Arc::new(Scripted {
        moves: vec!["e2e4"],
        delay: Duration::from_millis(200),
        ..Scripted::default()
    });
    let mut session = session_with(config("white", 0), &engine);

    let err = session.play_uci("d2d4").unwrap_err();
    assert!(matches!(err, SessionError::EngineTurn));
    assert_eq!(session.game().ply_count(), 0);
}

#[test]
fn stale_reply_is_discarded_after_new_game() {
    let engine = Arc::new(Scripted {
        moves: vec!["e2e4", "e7e5"],
        delay: Duration::from_millis(200),
        ..Scripted::default()
    });
    let mut session = session_with(config("black", 0), &engine);

    session.play_uci("e2e4").unwrap();
    session.new_game().unwrap();
    assert!(!session.is_engine_thinking());

    assert!(session.wait_for_engine(WAIT));
    assert_eq!(session.game().ply_count(), 0);
    let events = session.drain_events();
    assert_eq!(moves_applied(&events), vec![("e4".to_string(), false)]);
    assert!(!engine_unavailable(&events));
}

#[test]
fn reply_from_a_previous_game_is_not_played() {
    let engine = Arc::new(Scripted {
        answers: vec![("e2e4", "e7e5"), ("d2d4", "d7d5")],
        delay: Duration::from_millis(300),
        ..Scripted::default()
    });
    let mut session = session_with(config("black", 0), &engine);

    session.play_uci("e2e4").unwrap();
    session.new_game().unwrap();
    session.play_uci("d2d4").unwrap();

    while session.game().ply_count() < 2 && session.wait_for_engine(WAIT) {}

    assert_eq!(
        session.game().record().uci_moves(),
        ["d2d4".to_string(), "d7d5".to_string()]
    );
    assert!(!session.is_engine_thinking());
}

#[test]
fn new_game_does_not_wait_for_the_engine() {
    let engine = Arc::new(Scripted {
        moves: vec!["e2e4", "e7e5"],
        delay: Duration::from_millis(600),
        ..Scripted::default()
    });
    let mut session = session_with(config("black", 0), &engine);
    session.play_uci("e2e4").unwrap();

    let started = Instant::now();
    session.new_game().unwrap();
    assert!(started.elapsed() < Duration::from_millis(300));
    assert_eq!(session.game().ply_count(), 0);

    session.shutdown();
    assert_eq!(engine.new_games.load(Ordering::SeqCst), 1);
}

#[test]
fn illegal_engine_move_is_rejected() {
    let engine = Arc::new(Scripted {
        // Black to move after d4; e2e4 moves a white pawn.
        moves: vec!["d2d4", "e2e4"],
        ..Scripted::default()
    });
    let mut session = session_with(config("black", 0), &engine);

    session.play_uci("d2d4").unwrap();
    assert!(session.wait_for_engine(WAIT));

    assert_eq!(session.game().ply_count(), 1);
    assert!(engine_unavailable(&session.drain_events()));
}

#[test]
fn engine_failure_is_reported() {
    let engine = Arc::new(Scripted {
        fail: true,
        ..Scripted::default()
    });
    let mut session = session_with(config("black", 0), &engine);

    session.play_uci("e2e4").unwrap();
    assert!(session.wait_for_engine(WAIT));

    assert_eq!(session.game().ply_count(), 1);
    let events = session.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        SessionEvent::EngineUnavailable { reason } if reason.contains("engine went away")
    )));
}

#[test]
fn missing_engine_binary_disables_engine_features() {
    let config = SessionConfig {
        engine_path: Some("/definitely/not/an/engine".into()),
        ..config("black", 0)
    };
    let mut session = Session::launch(config).unwrap();

    assert!(!session.has_engine());
    assert!(engine_unavailable(&session.drain_events()));
    session.play_uci("e2e4").unwrap();
    session.play_uci("e7e5").unwrap();
    assert_eq!(session.game().ply_count(), 2);
    assert!(matches!(
        session.start_analysis(),
        Err(SessionError::NoEngine)
    ));
}

#[test]
fn resignation_ends_the_game() {
    let mut session = Session::with_engine(config("none", 0), None).unwrap();
    session.play_uci("e2e4").unwrap();

    let result = session.resign(Color::White).unwrap();
    assert_eq!(result, GameResult::win(Color::Black, WinReason::Resignation));
    assert!(session.drain_events().iter().any(|e| matches!(
        e,
        SessionEvent::GameOver { tag: "0-1", .. }
    )));

    let err = session.play_uci("e7e5").unwrap_err();
    assert!(matches!(err, SessionError::Rules(RulesError::GameOver)));
}

#[test]
fn flag_fall_ends_the_game() {
    let mut session = Session::with_engine(config("none", 1), None).unwrap();
    session.play_uci("e2e4").unwrap();

    session.advance_clock(Duration::from_secs(30));
    assert!(!session.game().is_over());
    session.advance_clock(Duration::from_secs(31));

    assert_eq!(
        session.game().result(),
        Some(GameResult::win(Color::White, WinReason::Timeout))
    );
    assert!(session.drain_events().iter().any(|e| matches!(
        e,
        SessionEvent::GameOver { tag: "1-0", .. }
    )));
}

#[test]
fn custom_position_turns_engine_play_off() {
    let engine = Arc::new(Scripted {
        moves: vec!["e7e5"],
        ..Scripted::default()
    });
    let mut session = session_with(config("black", 0), &engine);
    session.drain_events();

    session
        .load_fen("4k3/8/8/8/8/8/4P3/4K3 b - - 0 1")
        .unwrap();
    assert!(!session.is_engine_thinking());
    assert!(engine_unavailable(&session.drain_events()));
    assert!(matches!(
        session.start_analysis(),
        Err(SessionError::CustomStart)
    ));

    let before = session.game().clone();
    assert!(session.load_fen("not a fen").is_err());
    assert_eq!(session.game(), &before);
}

#[test]
fn analysis_opens_a_review_and_restores_the_game() {
    let engine = Arc::new(Scripted {
        moves: vec!["e2e4", "e7e5", "g1f3", "b8c6"],
        // Black's f6 lets White's evaluation jump.
        scores: vec![20, -25, 480, 0],
        ..Scripted::default()
    });
    let mut session = session_with(config("none", 5), &engine);
    session.play_uci("e2e4").unwrap();
    session.play_uci("f7f6").unwrap();
    session.advance_clock(Duration::from_secs(7));
    session.drain_events();

    let live_game = session.game().clone();
    let live_clock = *session.clock();

    session.start_analysis().unwrap();
    assert!(matches!(
        session.start_analysis(),
        Err(SessionError::AnalysisRunning)
    ));
    session.wait_for_analysis();
    assert!(session.is_reviewing());

    let events = session.drain_events();
    assert!(matches!(events.first(), Some(SessionEvent::AnalysisStarted { plies: 2 })));
    let progress = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::AnalysisProgress { .. }))
        .count();
    assert_eq!(progress, 2);
    assert!(matches!(events.last(), Some(SessionEvent::AnalysisFinished { .. })));

    let review = session.review_mut().unwrap();
    assert_eq!(review.len(), 2);
    assert_eq!(review.goto(2), 2);
    let entry = review.entry().unwrap();
    assert_eq!(entry.played_move, "f7f6");
    assert_eq!(review.best_move_hint(), Some("e7e5"));
    assert_eq!(review.position().ply_count(), 2);
    assert_eq!(review.back(), 1);

    assert!(matches!(
        session.play_uci("g1f3"),
        Err(SessionError::InReview)
    ));
    session.advance_clock(Duration::from_secs(100));

    session.exit_review().unwrap();
    assert!(!session.is_reviewing());
    assert_eq!(session.game(), &live_game);
    assert_eq!(session.clock(), &live_clock);
    assert!(matches!(
        session.exit_review(),
        Err(SessionError::NotInReview)
    ));
    session.play_uci("g1f3").unwrap();
}

#[test]
fn shutdown_closes_the_engine_once_workers_stop() {
    let engine = Arc::new(Scripted {
        moves: vec!["e2e4", "e7e5"],
        ..Scripted::default()
    });
    let mut session = session_with(config("black", 0), &engine);
    session.play_uci("e2e4").unwrap();

    session.shutdown();
    assert!(engine.closed.load(Ordering::SeqCst));
    assert!(!session.has_engine());
    assert!(!session.is_engine_thinking());
    assert!(!session.wait_for_engine(Duration::from_millis(10)));

    session.shutdown();
}
