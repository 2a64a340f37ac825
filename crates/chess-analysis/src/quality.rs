//! Move severity and quality classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse verdict on a move, by loss in pawns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Good,
    Inaccuracy,
    Mistake,
    Blunder,
    /// The position before the move already had a forced mate on the board.
    Mate(i32),
}

impl Severity {
    pub fn is_mate(self) -> bool {
        matches!(self, Severity::Mate(_))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Good => f.write_str("Good"),
            Severity::Inaccuracy => f.write_str("Inaccuracy"),
            Severity::Mistake => f.write_str("Mistake"),
            Severity::Blunder => f.write_str("Blunder"),
            Severity::Mate(n) => write!(f, "Mate in {}", n),
        }
    }
}

/// Finer-grained label shown next to each move in a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QualityTag {
    Mate,
    Brilliant,
    Great,
    Best,
    Excellent,
    Good,
    Inaccuracy,
    Mistake,
    SevereMistake,
    Blunder,
}

impl QualityTag {
    /// Brilliant, Great, Best and Excellent.
    pub fn is_top_tier(self) -> bool {
        matches!(
            self,
            QualityTag::Brilliant | QualityTag::Great | QualityTag::Best | QualityTag::Excellent
        )
    }
}

impl fmt::Display for QualityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QualityTag::Mate => "Mate",
            QualityTag::Brilliant => "Brilliant",
            QualityTag::Great => "Great",
            QualityTag::Best => "Best",
            QualityTag::Excellent => "Excellent",
            QualityTag::Good => "Good",
            QualityTag::Inaccuracy => "Inaccuracy",
            QualityTag::Mistake => "Mistake",
            QualityTag::SevereMistake => "Severe Mistake",
            QualityTag::Blunder => "Blunder",
        };
        f.write_str(s)
    }
}

/// Classification cut-offs, all in pawns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Severity: loss at or above this is an inaccuracy.
    pub inaccuracy: f64,
    pub mistake: f64,
    pub blunder: f64,
    /// Quality: gain when playing the engine's move.
    pub brilliant_gain: f64,
    pub great_gain: f64,
    /// Quality: loss strictly below these.
    pub excellent: f64,
    pub good: f64,
    pub inaccuracy_tag: f64,
    pub mistake_tag: f64,
    pub severe: f64,
    /// Average loss per move that maps to 0% accuracy.
    pub accuracy_pawns: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            inaccuracy: 2.0,
            mistake: 4.0,
            blunder: 7.0,
            brilliant_gain: 1.5,
            great_gain: 0.5,
            excellent: 0.15,
            good: 0.5,
            inaccuracy_tag: 1.5,
            mistake_tag: 4.0,
            severe: 7.0,
            accuracy_pawns: 5.0,
        }
    }
}

impl Thresholds {
    /// Severity for a move that lost `loss` pawns. A mate score before the
    /// move overrides the loss.
    pub fn severity(&self, loss: f64, mate_before: Option<i32>) -> Severity {
        if let Some(n) = mate_before {
            return Severity::Mate(n);
        }
        let loss = loss.max(0.0);
        if loss >= self.blunder {
            Severity::Blunder
        } else if loss >= self.mistake {
            Severity::Mistake
        } else if loss >= self.inaccuracy {
            Severity::Inaccuracy
        } else {
            Severity::Good
        }
    }

    /// Quality tag for a move. `played_best` is whether it matched the
    /// engine's choice for the position before it.
    pub fn quality(&self, severity: Severity, played_best: bool, loss: f64) -> QualityTag {
        if severity.is_mate() {
            return QualityTag::Mate;
        }
        let gain = (-loss).max(0.0);
        let loss = loss.max(0.0);

        if played_best {
            return if gain >= self.brilliant_gain {
                QualityTag::Brilliant
            } else if gain >= self.great_gain {
                QualityTag::Great
            } else {
                QualityTag::Best
            };
        }

        if loss < self.excellent {
            QualityTag::Excellent
        } else if loss < self.good {
            QualityTag::Good
        } else if loss < self.inaccuracy_tag {
            QualityTag::Inaccuracy
        } else if loss < self.mistake_tag {
            QualityTag::Mistake
        } else if loss < self.severe {
            QualityTag::SevereMistake
        } else {
            QualityTag::Blunder
        }
    }

    /// Accuracy percentage for `moves` moves with `total_loss` clamped pawns lost.
    /// No moves means 100.
    pub fn accuracy(&self, total_loss: f64, moves: usize) -> f64 {
        if moves == 0 {
            return 100.0;
        }
        let denom = moves as f64 * self.accuracy_pawns;
        (100.0 - (total_loss / denom) * 100.0).max(0.0)
    }
}
