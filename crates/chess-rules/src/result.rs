//! Terminal game states.

use chess_core::Color;
use std::fmt;

/// How a decisive game was won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WinReason {
    Checkmate,
    /// The loser's clock ran out.
    Timeout,
    Resignation,
}

/// Why a game was drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawReason {
    /// No legal move and the side to move is not in check.
    Stalemate,
    /// Neither side has enough material left to mate.
    InsufficientMaterial,
}

/// Result of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameResult {
    Win { winner: Color, reason: WinReason },
    Draw(DrawReason),
}

impl GameResult {
    pub const fn win(winner: Color, reason: WinReason) -> Self {
        GameResult::Win { winner, reason }
    }

    pub const fn winner(self) -> Option<Color> {
        match self {
            GameResult::Win { winner, .. } => Some(winner),
            GameResult::Draw(_) => None,
        }
    }

    /// PGN result tag: `1-0`, `0-1` or `1/2-1/2`.
    pub const fn tag(self) -> &'static str {
        match self {
            GameResult::Win {
                winner: Color::White,
                ..
            } => "1-0",
            GameResult::Win {
                winner: Color::Black,
                ..
            } => "0-1",
            GameResult::Draw(_) => "1/2-1/2",
        }
    }

    /// Human-readable announcement.
    pub fn message(self) -> String {
        match self {
            GameResult::Win {
                winner,
                reason: WinReason::Checkmate,
            } => format!("{winner} wins!"),
            GameResult::Win {
                winner,
                reason: WinReason::Timeout,
            } => format!("{winner} wins on time"),
            GameResult::Win {
                winner,
                reason: WinReason::Resignation,
            } => format!("{} resigns. {winner} wins!", winner.opposite()),
            GameResult::Draw(DrawReason::Stalemate) => "Stalemate!".to_string(),
            GameResult::Draw(DrawReason::InsufficientMaterial) => {
                "Draw: Insufficient material!".to_string()
            }
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags() {
        assert_eq!(GameResult::win(Color::White, WinReason::Checkmate).tag(), "1-0");
        assert_eq!(GameResult::win(Color::Black, WinReason::Timeout).tag(), "0-1");
        assert_eq!(GameResult::Draw(DrawReason::Stalemate).tag(), "1/2-1/2");
    }

    #[test]
    fn messages() {
        assert_eq!(
            GameResult::win(Color::White, WinReason::Checkmate).message(),
            "White wins!"
        );
        assert_eq!(
            GameResult::win(Color::Black, WinReason::Timeout).message(),
            "Black wins on time"
        );
        assert_eq!(
            GameResult::win(Color::White, WinReason::Resignation).message(),
            "Black resigns. White wins!"
        );
        assert_eq!(
            GameResult::Draw(DrawReason::InsufficientMaterial).message(),
            "Draw: Insufficient material!"
        );
    }
}
