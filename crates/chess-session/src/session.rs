//! The session controller: one live game, its engine opponent, clocks,
//! post-game analysis and review mode.

use crate::clock::GameClock;
use crate::config::{ConfigError, SessionConfig};
use crate::events::SessionEvent;
use crate::review::Review;
use crate::worker::{EngineReply, EngineRequest, EngineWorker, SharedEngine};
use chess_analysis::{AnalyzerError, EngineBridge, EngineError, GameAnalysis, GameAnalyzer};
use chess_core::{Color, Square};
use chess_rules::{BoardState, Game, GameResult, PlayedMove, RulesError};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Rules(#[from] RulesError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("moves cannot be played while reviewing a game")]
    InReview,
    #[error("not reviewing a game")]
    NotInReview,
    #[error("no engine available")]
    NoEngine,
    #[error("an analysis is already running")]
    AnalysisRunning,
    #[error("it is the engine's turn")]
    EngineTurn,
    #[error("only games from the standard starting position can be sent to the engine")]
    CustomStart,
}

/// Live state put aside while reviewing.
#[derive(Debug, Clone)]
struct Checkpoint {
    game: Game,
    clock: GameClock,
    auto_play: bool,
}

enum Mode {
    Live,
    Review {
        checkpoint: Box<Checkpoint>,
        review: Box<Review>,
    },
}

struct AnalysisJob {
    moves: Vec<String>,
    resume_auto_play: bool,
    outcome: Receiver<Result<GameAnalysis, AnalyzerError>>,
    handle: JoinHandle<()>,
}

pub struct Session {
    config: SessionConfig,
    engine_side: Option<Color>,
    engine: Option<SharedEngine>,
    worker: Option<EngineWorker>,
    /// Automatic engine moves enabled.
    auto_play: bool,
    /// Bumped whenever the live game is replaced or put aside; replies from
    /// an older generation are never applied.
    generation: u64,
    /// Generation and ply of the outstanding engine request.
    pending: Option<(u64, usize)>,
    game: Game,
    clock: GameClock,
    last_tick: Instant,
    mode: Mode,
    analysis: Option<AnalysisJob>,
    events_tx: Sender<SessionEvent>,
    events_rx: Receiver<SessionEvent>,
}

impl Session {
    /// Start a session from `config`, launching the engine if one is configured.
    ///
    /// An engine that fails to start only disables engine play and analysis;
    /// the failure is published as [`SessionEvent::EngineUnavailable`].
    pub fn launch(config: SessionConfig) -> Result<Self, SessionError> {
        let mut startup_failure = None;
        let engine = match config.engine_path.as_deref() {
            Some(path) => match EngineBridge::launch(path) {
                Ok(bridge) => {
                    configure_strength(&bridge, &config);
                    Some(Arc::new(bridge) as SharedEngine)
                }
                Err(e) => {
                    warn!(error = %e, "engine unavailable, continuing without it");
                    startup_failure = Some(e.to_string());
                    None
                }
            },
            None => None,
        };

        let session = Self::with_engine(config, engine)?;
        if let Some(reason) = startup_failure {
            session.emit(SessionEvent::EngineUnavailable { reason });
        }
        Ok(session)
    }

    /// Start a session around an already running engine, or none.
    pub fn with_engine(
        config: SessionConfig,
        engine: Option<SharedEngine>,
    ) -> Result<Self, SessionError> {
        let engine_side = config.engine_side()?;
        let worker = match engine.as_ref().map(|e| EngineWorker::spawn(Arc::clone(e))) {
            Some(Ok(worker)) => Some(worker),
            Some(Err(e)) => {
                warn!(error = %e, "could not start engine worker");
                None
            }
            None => None,
        };
        let (events_tx, events_rx) = mpsc::channel();

        let mut session = Self {
            clock: GameClock::from_limit(config.clock()),
            auto_play: worker.is_some() && engine_side.is_some(),
            config,
            engine_side,
            engine,
            worker,
            generation: 0,
            pending: None,
            game: Game::new(),
            last_tick: Instant::now(),
            mode: Mode::Live,
            analysis: None,
            events_tx,
            events_rx,
        };
        session.request_engine_move();
        Ok(session)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The live game. While reviewing, this is the game put aside.
    pub fn game(&self) -> &Game {
        match &self.mode {
            Mode::Live => &self.game,
            Mode::Review { checkpoint, .. } => &checkpoint.game,
        }
    }

    pub fn clock(&self) -> &GameClock {
        match &self.mode {
            Mode::Live => &self.clock,
            Mode::Review { checkpoint, .. } => &checkpoint.clock,
        }
    }

    pub fn engine_side(&self) -> Option<Color> {
        self.engine_side
    }

    /// The side the person at the keyboard plays when the engine has the other.
    pub fn human_side(&self) -> Option<Color> {
        self.engine_side.map(Color::opposite)
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    pub fn is_engine_thinking(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_analysis_running(&self) -> bool {
        self.analysis.is_some()
    }

    pub fn review(&self) -> Option<&Review> {
        match &self.mode {
            Mode::Review { review, .. } => Some(&**review),
            Mode::Live => None,
        }
    }

    pub fn review_mut(&mut self) -> Option<&mut Review> {
        match &mut self.mode {
            Mode::Review { review, .. } => Some(&mut **review),
            Mode::Live => None,
        }
    }

    pub fn is_reviewing(&self) -> bool {
        matches!(self.mode, Mode::Review { .. })
    }

    /// Channel the presentation layer drains.
    pub fn events(&self) -> &Receiver<SessionEvent> {
        &self.events_rx
    }

    pub fn drain_events(&self) -> Vec<SessionEvent> {
        self.events_rx.try_iter().collect()
    }

    fn emit(&self, event: SessionEvent) {
        // The receiver lives in `self`, so the send cannot fail.
        let _ = self.events_tx.send(event);
    }

    fn ensure_live(&self) -> Result<(), SessionError> {
        if self.is_reviewing() {
            return Err(SessionError::InReview);
        }
        Ok(())
    }

    /// Play a move for the side to move.
    pub fn play(&mut self, from: Square, to: Square) -> Result<PlayedMove, SessionError> {
        self.human_move(|game| game.play(from, to))
    }

    /// Play a move given in coordinate form.
    pub fn play_uci(&mut self, text: &str) -> Result<PlayedMove, SessionError> {
        self.human_move(|game| game.play_uci(text))
    }

    fn human_move(
        &mut self,
        play: impl FnOnce(&mut Game) -> Result<PlayedMove, RulesError>,
    ) -> Result<PlayedMove, SessionError> {
        self.ensure_live()?;
        self.tick();
        let engine_to_move = self.engine_side == Some(self.game.side_to_move());
        if self.auto_play && engine_to_move && !self.game.is_over() {
            return Err(SessionError::EngineTurn);
        }
        let played = play(&mut self.game)?;
        self.after_move(&played, false);
        Ok(played)
    }

    fn after_move(&mut self, played: &PlayedMove, by_engine: bool) {
        self.emit(SessionEvent::MoveApplied {
            uci: played.uci.clone(),
            san: played.san.clone(),
            display: played.display.clone(),
            by_engine,
            captured_by_white: self.game.captured_by(Color::White).to_vec(),
            captured_by_black: self.game.captured_by(Color::Black).to_vec(),
            material: self.game.material_balance(),
        });
        match played.result {
            Some(result) => self.game_over(result),
            None => self.request_engine_move(),
        }
    }

    fn game_over(&mut self, result: GameResult) {
        info!(result = result.tag(), "game over");
        self.pending = None;
        self.emit(SessionEvent::game_over(result));
    }

    fn request_engine_move(&mut self) {
        if !self.auto_play
            || self.pending.is_some()
            || self.is_reviewing()
            || self.game.is_over()
            || self.engine_side != Some(self.game.side_to_move())
        {
            return;
        }
        let Some(worker) = self.worker.as_ref() else {
            return;
        };
        let ply = self.game.ply_count();
        let request = EngineRequest {
            generation: self.generation,
            ply,
            moves: self.game.record().uci_moves().to_vec(),
            think_time: self.config.think_time(),
        };
        if worker.submit(request) {
            self.pending = Some((self.generation, ply));
        }
    }

    /// Apply whatever the background workers have finished, and run the clock.
    pub fn poll(&mut self) {
        self.tick();
        while let Some(reply) = self.worker.as_ref().and_then(EngineWorker::try_recv) {
            self.handle_reply(reply);
        }
        self.collect_analysis();
    }

    /// Block up to `timeout` for the engine's reply and apply it.
    /// Returns false if nothing arrived.
    pub fn wait_for_engine(&mut self, timeout: Duration) -> bool {
        let reply = match self.worker.as_ref() {
            Some(worker) => worker.recv_timeout(timeout),
            None => None,
        };
        match reply {
            Some(reply) => {
                self.tick();
                self.handle_reply(reply);
                true
            }
            None => false,
        }
    }

    fn reply_is_current(&self, reply: &EngineReply) -> bool {
        self.auto_play
            && reply.generation == self.generation
            && !self.is_reviewing()
            && !self.game.is_over()
            && self.game.ply_count() == reply.ply
            && reply.moves == self.game.record().uci_moves()
            && self.engine_side == Some(self.game.side_to_move())
    }

    fn handle_reply(&mut self, reply: EngineReply) {
        if self.pending == Some((reply.generation, reply.ply)) {
            self.pending = None;
        }
        if !self.reply_is_current(&reply) {
            warn!(
                ply = reply.ply,
                generation = reply.generation,
                "discarding stale engine reply"
            );
            return;
        }

        let best = match reply.result {
            Ok(result) => result.best_move,
            Err(e) => {
                warn!(error = %e, "engine request failed");
                self.emit(SessionEvent::EngineUnavailable {
                    reason: e.to_string(),
                });
                return;
            }
        };
        let Some(best) = best else {
            self.emit(SessionEvent::EngineUnavailable {
                reason: "engine returned no move".to_string(),
            });
            return;
        };

        match self.game.play_uci(&best) {
            Ok(played) => self.after_move(&played, true),
            Err(e) => {
                warn!(mv = %best, error = %e, "engine move rejected");
                self.emit(SessionEvent::EngineUnavailable {
                    reason: format!("engine move {} rejected: {}", best, e),
                });
            }
        }
    }

    /// Charge the time since the last tick to the side to move.
    pub fn tick(&mut self) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
        self.advance_clock(elapsed);
    }

    /// Charge `elapsed` to the side to move; a fallen flag ends the game.
    pub fn advance_clock(&mut self, elapsed: Duration) {
        if self.is_reviewing() || self.game.is_over() {
            return;
        }
        let side = self.game.side_to_move();
        if self.clock.consume(side, elapsed) {
            if let Ok(result) = self.game.flag_fall(side) {
                self.game_over(result);
            }
        }
    }

    /// `color` resigns the live game.
    pub fn resign(&mut self, color: Color) -> Result<GameResult, SessionError> {
        self.ensure_live()?;
        let result = self.game.resign(color)?;
        self.game_over(result);
        Ok(result)
    }

    /// Start over from the standard position.
    pub fn new_game(&mut self) -> Result<(), SessionError> {
        self.ensure_live()?;
        self.reset_to(Game::new());
        Ok(())
    }

    /// Replace the live game with the position in `fen`. A bad FEN leaves
    /// the current game untouched.
    ///
    /// The engine only plays games that start from the standard position.
    pub fn load_fen(&mut self, fen: &str) -> Result<(), SessionError> {
        self.ensure_live()?;
        let game = Game::from_fen(fen)?;
        self.reset_to(game);
        Ok(())
    }

    fn reset_to(&mut self, game: Game) {
        let standard = *game.start_position() == BoardState::startpos();
        self.game = game;
        self.generation += 1;
        self.pending = None;
        self.clock.reset();
        self.last_tick = Instant::now();
        self.auto_play = standard && self.worker.is_some() && self.engine_side.is_some();

        if let Some(engine) = self.engine.as_ref() {
            match self.worker.as_ref() {
                Some(worker) => {
                    worker.new_game();
                }
                None => {
                    if let Err(e) = engine.new_game() {
                        warn!(error = %e, "engine did not accept a new game");
                    }
                }
            }
            if !standard && self.engine_side.is_some() {
                self.emit(SessionEvent::EngineUnavailable {
                    reason: "engine play needs the standard starting position".to_string(),
                });
            }
        }
        if let Some(result) = self.game.result() {
            self.emit(SessionEvent::game_over(result));
        }
        self.request_engine_move();
    }

    /// Analyze the live game on a background thread. Automatic engine moves
    /// pause until the review that follows is closed.
    pub fn start_analysis(&mut self) -> Result<(), SessionError> {
        self.ensure_live()?;
        if self.analysis.is_some() {
            return Err(SessionError::AnalysisRunning);
        }
        let engine = self.engine.clone().ok_or(SessionError::NoEngine)?;
        if *self.game.start_position() != BoardState::startpos() {
            return Err(SessionError::CustomStart);
        }

        let moves = self.game.record().uci_moves().to_vec();
        let analyzer = GameAnalyzer::new(engine, self.config.analysis_think_time())
            .with_thresholds(self.config.thresholds);
        let (outcome_tx, outcome_rx) = mpsc::channel();
        let events = self.events_tx.clone();
        let job_moves = moves.clone();

        // Announce before the worker can publish progress.
        self.emit(SessionEvent::AnalysisStarted { plies: moves.len() });
        let spawned = thread::Builder::new()
            .name("analysis-worker".to_string())
            .spawn(move || {
                let outcome = analyzer.analyze_game_with(&job_moves, |entry, summary| {
                    let _ = events.send(SessionEvent::AnalysisProgress {
                        entry: entry.clone(),
                        summary: summary.clone(),
                    });
                });
                let _ = outcome_tx.send(outcome);
            });
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.emit(SessionEvent::AnalysisFailed {
                    reason: e.to_string(),
                });
                return Err(EngineError::Communication(e.to_string()).into());
            }
        };

        info!(plies = moves.len(), "analysis started");
        let resume_auto_play = self.auto_play;
        self.auto_play = false;
        self.pending = None;
        self.analysis = Some(AnalysisJob {
            moves,
            resume_auto_play,
            outcome: outcome_rx,
            handle,
        });
        Ok(())
    }

    /// Block until a running analysis finishes and its review opens.
    pub fn wait_for_analysis(&mut self) {
        let outcome = match self.analysis.as_ref() {
            Some(job) => job.outcome.recv().ok(),
            None => return,
        };
        self.finish_analysis(outcome);
    }

    fn collect_analysis(&mut self) {
        let outcome = match self.analysis.as_ref().map(|job| job.outcome.try_recv()) {
            Some(Ok(outcome)) => Some(outcome),
            Some(Err(TryRecvError::Disconnected)) => None,
            Some(Err(TryRecvError::Empty)) | None => return,
        };
        self.finish_analysis(outcome);
    }

    fn finish_analysis(&mut self, outcome: Option<Result<GameAnalysis, AnalyzerError>>) {
        let Some(job) = self.analysis.take() else {
            return;
        };
        let _ = job.handle.join();
        self.auto_play = job.resume_auto_play;

        let analysis = match outcome {
            Some(Ok(analysis)) => analysis,
            Some(Err(e)) => return self.analysis_failed(e.to_string()),
            None => return self.analysis_failed("analysis worker stopped".to_string()),
        };
        let summary = analysis.summary.clone();
        match self.enter_review(&job.moves, analysis) {
            Ok(()) => self.emit(SessionEvent::AnalysisFinished { summary }),
            Err(e) => self.analysis_failed(e.to_string()),
        }
    }

    fn analysis_failed(&mut self, reason: String) {
        warn!(%reason, "analysis failed");
        self.emit(SessionEvent::AnalysisFailed { reason });
        self.request_engine_move();
    }

    /// Put the live game aside and open `analysis` of `moves` for stepping.
    pub fn enter_review(
        &mut self,
        moves: &[String],
        analysis: GameAnalysis,
    ) -> Result<(), SessionError> {
        self.ensure_live()?;
        let review = Review::new(moves, analysis)?;
        let checkpoint = Checkpoint {
            game: self.game.clone(),
            clock: self.clock,
            auto_play: self.auto_play,
        };
        self.auto_play = false;
        self.generation += 1;
        self.pending = None;
        self.mode = Mode::Review {
            checkpoint: Box::new(checkpoint),
            review: Box::new(review),
        };
        info!(plies = moves.len(), "review opened");
        Ok(())
    }

    /// Close the review and put the live game back exactly as it was.
    pub fn exit_review(&mut self) -> Result<(), SessionError> {
        let mode = std::mem::replace(&mut self.mode, Mode::Live);
        let checkpoint = match mode {
            Mode::Review { checkpoint, .. } => checkpoint,
            Mode::Live => return Err(SessionError::NotInReview),
        };
        let Checkpoint {
            game,
            clock,
            auto_play,
        } = *checkpoint;
        self.game = game;
        self.clock = clock;
        self.auto_play = auto_play;
        self.generation += 1;
        self.last_tick = Instant::now();
        info!("review closed");
        self.request_engine_move();
        Ok(())
    }

    /// Stop automatic engine requests, stop the workers, then close the engine.
    pub fn shutdown(&mut self) {
        self.auto_play = false;
        self.pending = None;
        if let Some(mut worker) = self.worker.take() {
            worker.stop();
        }
        if let Some(engine) = self.engine.take() {
            engine.close();
        }
        if let Some(job) = self.analysis.take() {
            let _ = job.handle.join();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn configure_strength(bridge: &EngineBridge, config: &SessionConfig) {
    // Failures are logged by the bridge; play continues with engine defaults.
    let _ = bridge.set_skill_level(config.skill_level());
    if let Some(elo) = config.target_elo() {
        let _ = bridge.set_limit_strength(true);
        let _ = bridge.set_target_elo(elo);
    }
}
