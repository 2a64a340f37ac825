//! Stepping through an analyzed game.

use chess_analysis::{AnalysisEntry, GameAnalysis, Summary};
use chess_rules::{Game, RulesError};

/// Every position of an analyzed game, plus a cursor.
///
/// The cursor counts moves applied: 0 is the start position and
/// `len()` the final one.
#[derive(Debug, Clone)]
pub struct Review {
    positions: Vec<Game>,
    analysis: GameAnalysis,
    cursor: usize,
}

impl Review {
    /// Replays `moves` from the start position, keeping a copy of the game
    /// after each one.
    pub fn new(moves: &[String], analysis: GameAnalysis) -> Result<Self, RulesError> {
        let mut game = Game::new();
        let mut positions = Vec::with_capacity(moves.len() + 1);
        positions.push(game.clone());
        for mv in moves {
            game.play_uci(mv)?;
            positions.push(game.clone());
        }
        Ok(Self {
            positions,
            analysis,
            cursor: 0,
        })
    }

    /// Number of moves in the reviewed game.
    pub fn len(&self) -> usize {
        self.positions.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor, clamped to the game. Returns the new cursor.
    pub fn goto(&mut self, moves_applied: usize) -> usize {
        self.cursor = moves_applied.min(self.len());
        self.cursor
    }

    pub fn forward(&mut self) -> usize {
        self.goto(self.cursor + 1)
    }

    pub fn back(&mut self) -> usize {
        self.goto(self.cursor.saturating_sub(1))
    }

    /// The game as it stood at the cursor.
    pub fn position(&self) -> &Game {
        &self.positions[self.cursor]
    }

    /// Verdict on the move that led to the cursor position.
    pub fn entry(&self) -> Option<&AnalysisEntry> {
        self.cursor
            .checked_sub(1)
            .and_then(|ply| self.analysis.entries.get(ply))
    }

    /// The engine's preferred move, when it differs from what was played or
    /// a mate was on the board.
    pub fn best_move_hint(&self) -> Option<&str> {
        let entry = self.entry()?;
        let best = entry.best_move.as_deref()?;
        (entry.severity.is_mate() || best != entry.played_move).then_some(best)
    }

    pub fn summary(&self) -> &Summary {
        &self.analysis.summary
    }

    pub fn analysis(&self) -> &GameAnalysis {
        &self.analysis
    }
}
