//! Notifications published by a session.
//!
//! The session never calls into a presentation layer; it pushes these onto a
//! channel that the caller drains.

use chess_analysis::{AnalysisEntry, Summary};
use chess_core::Piece;
use chess_rules::GameResult;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A move was committed to the live game.
    MoveApplied {
        uci: String,
        san: String,
        /// Numbered SAN, e.g. `3... Nf6`.
        display: String,
        by_engine: bool,
        captured_by_white: Vec<Piece>,
        captured_by_black: Vec<Piece>,
        /// `White +d`, `Black +d` or `Material even`.
        material: String,
    },
    GameOver {
        result: GameResult,
        /// PGN result tag.
        tag: &'static str,
        message: String,
    },
    /// The engine could not produce a move; play continues without one.
    EngineUnavailable { reason: String },
    AnalysisStarted { plies: usize },
    AnalysisProgress { entry: AnalysisEntry, summary: Summary },
    AnalysisFinished { summary: Summary },
    AnalysisFailed { reason: String },
}

impl SessionEvent {
    pub(crate) fn game_over(result: GameResult) -> Self {
        SessionEvent::GameOver {
            result,
            tag: result.tag(),
            message: result.message(),
        }
    }
}

/// Capture list as space-separated FEN letters, or `-` when empty.
pub fn format_captures(pieces: &[Piece]) -> String {
    if pieces.is_empty() {
        return "-".to_string();
    }
    pieces
        .iter()
        .map(|p| p.fen_char().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
