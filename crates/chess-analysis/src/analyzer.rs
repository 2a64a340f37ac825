//! Game analysis with move quality classification.
//!
//! [`GameAnalyzer`] replays a recorded game through a [`PositionAnalyzer`],
//! one ply at a time, and classifies every move by how much the evaluation
//! moved against the player who made it.

use crate::engine::{EngineBridge, EngineError, PositionAnalyzer};
use crate::evaluation::AnalysisResult;
use crate::quality::{QualityTag, Severity, Thresholds};
use chess_core::Color;
use chess_rules::Game;
use serde::{Serialize, Serializer};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Errors that can occur during game analysis.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Error from the analysis engine.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
    /// The move list does not replay legally from the start position.
    #[error("Invalid game data: {0}")]
    InvalidGame(String),
}

fn color_name<S: Serializer>(color: &Color, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(color)
}

/// Verdict on one ply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisEntry {
    /// 0-based; even plies are White's.
    pub ply: usize,
    #[serde(serialize_with = "color_name")]
    pub mover: Color,
    pub played_move: String,
    /// SAN of the played move, check suffix included.
    pub san: String,
    /// What the engine preferred in the position before the move.
    pub best_move: Option<String>,
    pub pv: Vec<String>,
    /// Evaluations in pawns, from White's point of view.
    pub eval_before: f64,
    pub eval_after: f64,
    /// Positive when the move made things worse for the mover.
    pub loss: f64,
    pub severity: Severity,
    pub quality: QualityTag,
}

/// Aggregates over a list of entries. Losses are clamped at 0 before they
/// are summed, so improvements never offset mistakes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_moves: usize,
    pub avg_loss: f64,
    pub min_loss: f64,
    pub max_loss: f64,
    pub inaccuracies: usize,
    pub mistakes: usize,
    pub blunders: usize,
    /// Moves tagged Brilliant, Great, Best or Excellent.
    pub top_tier: usize,
    pub accuracy: f64,
    pub white_accuracy: f64,
    pub black_accuracy: f64,
}

impl Summary {
    pub fn from_entries(entries: &[AnalysisEntry], thresholds: &Thresholds) -> Self {
        let clamped: Vec<f64> = entries.iter().map(|e| e.loss.max(0.0)).collect();
        let total: f64 = clamped.iter().sum();
        let count_severity = |wanted: Severity| entries.iter().filter(|e| e.severity == wanted).count();

        let side = |color: Color| {
            let (sum, n) = entries
                .iter()
                .filter(|e| e.mover == color)
                .fold((0.0, 0), |(sum, n), e| (sum + e.loss.max(0.0), n + 1));
            thresholds.accuracy(sum, n)
        };

        Summary {
            total_moves: entries.len(),
            avg_loss: if entries.is_empty() {
                0.0
            } else {
                total / entries.len() as f64
            },
            min_loss: clamped.iter().copied().reduce(f64::min).unwrap_or(0.0),
            max_loss: clamped.iter().copied().reduce(f64::max).unwrap_or(0.0),
            inaccuracies: count_severity(Severity::Inaccuracy),
            mistakes: count_severity(Severity::Mistake),
            blunders: count_severity(Severity::Blunder),
            top_tier: entries.iter().filter(|e| e.quality.is_top_tier()).count(),
            accuracy: thresholds.accuracy(total, entries.len()),
            white_accuracy: side(Color::White),
            black_accuracy: side(Color::Black),
        }
    }
}

/// Complete analysis of a chess game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameAnalysis {
    pub entries: Vec<AnalysisEntry>,
    pub summary: Summary,
}

impl GameAnalysis {
    fn empty(thresholds: &Thresholds) -> Self {
        Self {
            entries: Vec::new(),
            summary: Summary::from_entries(&[], thresholds),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Replays games through an engine and classifies every move.
///
/// Without an engine every analysis is empty.
pub struct GameAnalyzer<E> {
    engine: Option<E>,
    think_time: Duration,
    thresholds: Thresholds,
}

impl GameAnalyzer<EngineBridge> {
    /// Launch the engine at `engine_path`, or build an engine-less analyzer
    /// when no path is configured.
    pub fn launch(engine_path: Option<&Path>, think_time: Duration) -> Result<Self, AnalyzerError> {
        let engine = engine_path.map(|p| EngineBridge::launch(p)).transpose()?;
        Ok(Self {
            engine,
            think_time,
            thresholds: Thresholds::default(),
        })
    }
}

impl<E: PositionAnalyzer> GameAnalyzer<E> {
    pub fn new(engine: E, think_time: Duration) -> Self {
        Self {
            engine: Some(engine),
            think_time,
            thresholds: Thresholds::default(),
        }
    }

    pub fn without_engine(think_time: Duration) -> Self {
        Self {
            engine: None,
            think_time,
            thresholds: Thresholds::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    /// Analyzes a complete game given as coordinate moves from the start position.
    pub fn analyze_game(&self, moves: &[String]) -> Result<GameAnalysis, AnalyzerError> {
        self.analyze_game_with(moves, |_, _| {})
    }

    /// Like [`analyze_game`](Self::analyze_game), reporting each entry and the
    /// running summary as soon as it is known.
    ///
    /// Plies are analyzed strictly in order; each position is sent to the
    /// engine once. Any engine failure aborts the whole run.
    pub fn analyze_game_with(
        &self,
        moves: &[String],
        mut progress: impl FnMut(&AnalysisEntry, &Summary),
    ) -> Result<GameAnalysis, AnalyzerError> {
        let Some(engine) = self.engine.as_ref() else {
            return Ok(GameAnalysis::empty(&self.thresholds));
        };

        let game = Game::replay(moves).map_err(|e| AnalyzerError::InvalidGame(e.to_string()))?;
        let san = game.record().san_moves();

        info!(plies = moves.len(), "game analysis started");
        engine.new_game()?;

        let mut entries = Vec::with_capacity(moves.len());
        let mut before = engine.analyze(&[], self.think_time)?;

        for (ply, played) in moves.iter().enumerate() {
            let after = engine.analyze(&moves[..=ply], self.think_time)?;
            let entry = self.classify(ply, played, &san[ply], &before, &after);

            entries.push(entry);
            let summary = Summary::from_entries(&entries, &self.thresholds);
            if let Some(entry) = entries.last() {
                progress(entry, &summary);
            }
            before = after;
        }

        let summary = Summary::from_entries(&entries, &self.thresholds);
        info!(
            plies = entries.len(),
            white_accuracy = summary.white_accuracy,
            black_accuracy = summary.black_accuracy,
            "game analysis finished"
        );
        Ok(GameAnalysis { entries, summary })
    }

    fn classify(
        &self,
        ply: usize,
        played: &str,
        san: &str,
        before: &AnalysisResult,
        after: &AnalysisResult,
    ) -> AnalysisEntry {
        let mover = Color::of_ply(ply);
        let eval_before = before.white_pawns(ply);
        let eval_after = after.white_pawns(ply + 1);
        let loss = -((eval_after - eval_before) * mover.sign());

        let severity = self.thresholds.severity(loss, before.mate);
        let played_best = before.best_move.as_deref() == Some(played);
        let quality = self.thresholds.quality(severity, played_best, loss);

        AnalysisEntry {
            ply,
            mover,
            played_move: played.to_string(),
            san: san.to_string(),
            best_move: before.best_move.clone(),
            pv: before.pv.clone(),
            eval_before,
            eval_after,
            loss,
            severity,
            quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Answers from a table keyed by the number of moves played.
    #[derive(Default)]
    struct Scripted {
        answers: HashMap<usize, AnalysisResult>,
        requests: RefCell<Vec<Vec<String>>>,
        fail_at: Option<usize>,
    }

    impl Scripted {
        fn answer(mut self, plies: usize, best: &str, cp: Option<i32>, mate: Option<i32>) -> Self {
            self.answers.insert(
                plies,
                AnalysisResult {
                    best_move: Some(best.to_string()),
                    centipawns: cp,
                    mate,
                    pv: vec![best.to_string()],
                },
            );
            self
        }
    }

    impl PositionAnalyzer for Scripted {
        fn analyze(
            &self,
            moves: &[String],
            _think_time: Duration,
        ) -> Result<AnalysisResult, EngineError> {
            self.requests.borrow_mut().push(moves.to_vec());
            if self.fail_at == Some(moves.len()) {
                return Err(EngineError::Communication("stream closed".to_string()));
            }
            Ok(self.answers.get(&moves.len()).cloned().unwrap_or_default())
        }
    }

    fn moves(list: &[&str]) -> Vec<String> {
        list.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn drop_of_seven_point_two_is_a_blunder() {
        // After 1. f3 it is Black to move and Black is up 7.2 pawns.
        let engine = Scripted::default()
            .answer(0, "e2e4", Some(0), None)
            .answer(1, "e7e5", Some(720), None);
        let analyzer = GameAnalyzer::new(engine, Duration::from_millis(10));
        let analysis = analyzer.analyze_game(&moves(&["f2f3"])).unwrap();

        let entry = &analysis.entries[0];
        assert_eq!(entry.mover, Color::White);
        assert_eq!(entry.san, "f3");
        assert!((entry.loss - 7.2).abs() < 1e-9);
        assert_eq!(entry.severity, Severity::Blunder);
        assert_eq!(entry.quality, QualityTag::Blunder);
        assert_eq!(entry.best_move.as_deref(), Some("e2e4"));
        assert_eq!(analysis.summary.blunders, 1);
    }

    #[test]
    fn black_loss_uses_black_perspective() {
        // 1. e4 e5?: after e5 White (to move) is up 2.5.
        let engine = Scripted::default()
            .answer(0, "e2e4", Some(20), None)
            .answer(1, "c7c5", Some(30), None)
            .answer(2, "g1f3", Some(250), None);
        let analyzer = GameAnalyzer::new(engine, Duration::from_millis(10));
        let analysis = analyzer.analyze_game(&moves(&["e2e4", "e7e5"])).unwrap();

        let white = &analysis.entries[0];
        assert_eq!(white.quality, QualityTag::Best);
        assert!((white.eval_after - -0.3).abs() < 1e-9);

        let black = &analysis.entries[1];
        assert_eq!(black.mover, Color::Black);
        assert!((black.eval_before - -0.3).abs() < 1e-9);
        assert!((black.eval_after - 2.5).abs() < 1e-9);
        assert!((black.loss - 2.8).abs() < 1e-9);
        assert_eq!(black.severity, Severity::Inaccuracy);
        assert_eq!(black.quality, QualityTag::Mistake);
    }

    #[test]
    fn before_evaluation_is_reused() {
        let engine = Scripted::default();
        let analyzer = GameAnalyzer::new(engine, Duration::from_millis(10));
        analyzer
            .analyze_game(&moves(&["e2e4", "e7e5", "g1f3"]))
            .unwrap();

        let engine = analyzer.engine.as_ref().unwrap();
        let requests = engine.requests.borrow();
        assert_eq!(requests.len(), 4);
        assert!(requests[0].is_empty());
        assert_eq!(requests[3], moves(&["e2e4", "e7e5", "g1f3"]));
    }

    #[test]
    fn mate_before_the_move_overrides_classification() {
        let engine = Scripted::default()
            .answer(0, "e2e4", None, Some(5))
            .answer(1, "e7e5", Some(900), None);
        let analyzer = GameAnalyzer::new(engine, Duration::from_millis(10));
        let analysis = analyzer.analyze_game(&moves(&["e2e4"])).unwrap();

        let entry = &analysis.entries[0];
        assert_eq!(entry.severity, Severity::Mate(5));
        assert_eq!(entry.quality, QualityTag::Mate);
        assert_eq!(entry.eval_before, 0.0);
        assert_eq!(analysis.summary.blunders, 0);
    }

    #[test]
    fn side_without_moves_scores_full_accuracy() {
        let engine = Scripted::default()
            .answer(0, "d2d4", Some(0), None)
            .answer(1, "d7d5", Some(250), None);
        let analyzer = GameAnalyzer::new(engine, Duration::from_millis(10));
        let analysis = analyzer.analyze_game(&moves(&["e2e4"])).unwrap();

        assert_eq!(analysis.summary.black_accuracy, 100.0);
        assert!((analysis.summary.white_accuracy - 50.0).abs() < 1e-9);
        assert!((analysis.summary.avg_loss - 2.5).abs() < 1e-9);
    }

    #[test]
    fn improvements_are_clamped_in_summary() {
        let engine = Scripted::default()
            .answer(0, "d2d4", Some(0), None)
            .answer(1, "d7d5", Some(-300), None);
        let analyzer = GameAnalyzer::new(engine, Duration::from_millis(10));
        let analysis = analyzer.analyze_game(&moves(&["e2e4"])).unwrap();

        assert!((analysis.entries[0].loss - -3.0).abs() < 1e-9);
        assert_eq!(analysis.entries[0].quality, QualityTag::Excellent);
        assert_eq!(analysis.summary.avg_loss, 0.0);
        assert_eq!(analysis.summary.max_loss, 0.0);
        assert_eq!(analysis.summary.white_accuracy, 100.0);
        assert_eq!(analysis.summary.top_tier, 1);
    }

    #[test]
    fn progress_reports_every_ply() {
        let analyzer = GameAnalyzer::new(Scripted::default(), Duration::from_millis(10));
        let mut seen = Vec::new();
        analyzer
            .analyze_game_with(&moves(&["e2e4", "e7e5"]), |entry, summary| {
                seen.push((entry.ply, summary.total_moves));
            })
            .unwrap();
        assert_eq!(seen, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn engine_failure_aborts_the_run() {
        let engine = Scripted {
            fail_at: Some(2),
            ..Scripted::default()
        };
        let analyzer = GameAnalyzer::new(engine, Duration::from_millis(10));
        let result = analyzer.analyze_game(&moves(&["e2e4", "e7e5", "g1f3"]));
        assert!(matches!(
            result,
            Err(AnalyzerError::Engine(EngineError::Communication(_)))
        ));
    }

    #[test]
    fn illegal_game_is_rejected() {
        let analyzer = GameAnalyzer::new(Scripted::default(), Duration::from_millis(10));
        let result = analyzer.analyze_game(&moves(&["e2e4", "e2e4"]));
        assert!(matches!(result, Err(AnalyzerError::InvalidGame(_))));
    }

    #[test]
    fn no_engine_gives_empty_analysis() {
        let analyzer = GameAnalyzer::<Scripted>::without_engine(Duration::from_millis(10));
        let analysis = analyzer.analyze_game(&moves(&["e2e4"])).unwrap();
        assert!(analysis.is_empty());
        assert_eq!(analysis.summary.white_accuracy, 100.0);

        let analyzer = GameAnalyzer::launch(None, Duration::from_millis(10)).unwrap();
        assert!(!analyzer.has_engine());
    }

    #[test]
    fn analyzer_error_display() {
        let engine_err = AnalyzerError::Engine(EngineError::NotFound("stockfish".to_string()));
        let display = format!("{}", engine_err);
        assert!(display.contains("Engine error"));
        assert!(display.contains("stockfish"));

        let invalid_err = AnalyzerError::InvalidGame("no moves provided".to_string());
        assert!(invalid_err.to_string().contains("Invalid game data"));
    }
}
