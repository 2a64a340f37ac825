//! Engine evaluation of a single position.

use serde::Serialize;
use uci::{EngineInfo, Score};

/// What the engine reported for one position.
///
/// Scores are from the point of view of the side to move, as UCI sends them.
/// At most one of `centipawns` and `mate` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    /// `None` when the engine had no move to offer (mate or stalemate on the board).
    pub best_move: Option<String>,
    pub centipawns: Option<i32>,
    /// Mate distance in moves; negative when the side to move gets mated.
    pub mate: Option<i32>,
    pub pv: Vec<String>,
}

impl AnalysisResult {
    /// Fold one progress line in. Later lines win; a score of one kind
    /// replaces a score of the other.
    pub fn record(&mut self, info: &EngineInfo) {
        match info.score {
            Some(Score::Cp(cp)) => {
                self.centipawns = Some(cp);
                self.mate = None;
            }
            Some(Score::Mate(n)) => {
                self.mate = Some(n);
                self.centipawns = None;
            }
            None => {}
        }
        if !info.pv.is_empty() {
            self.pv = info.pv.clone();
        }
    }

    /// Centipawn score in pawns. A mate-only result counts as 0.
    pub fn pawns(&self) -> f64 {
        self.centipawns.map_or(0.0, |cp| f64::from(cp) / 100.0)
    }

    /// [`pawns`](Self::pawns) seen from White, for a position after `plies` half-moves.
    pub fn white_pawns(&self, plies: usize) -> f64 {
        if plies % 2 == 0 {
            self.pawns()
        } else {
            -self.pawns()
        }
    }
}
