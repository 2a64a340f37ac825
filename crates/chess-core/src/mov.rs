//! Move representation.

use crate::{Piece, Square};
use std::fmt;

/// Special-move markers carried by a [`Move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MoveFlags {
    /// King moves two files and the rook jumps over it.
    pub castle: bool,
    /// Pawn reaches the last rank and becomes a queen.
    pub promotion: bool,
    /// Pawn captures the pawn that just double-stepped past it.
    pub en_passant: bool,
}

/// A candidate or committed move.
///
/// Built speculatively from a board and two squares, then either discarded
/// (illegal) or committed and recorded. `piece` is the mover as it stood
/// before the move; `captured` is the piece instance that leaves the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub piece: Piece,
    pub from: Square,
    pub to: Square,
    pub captured: Option<Piece>,
    pub flags: MoveFlags,
}

impl Move {
    /// Creates a quiet move with no special flags.
    pub const fn new(piece: Piece, from: Square, to: Square) -> Self {
        Self {
            piece,
            from,
            to,
            captured: None,
            flags: MoveFlags {
                castle: false,
                promotion: false,
                en_passant: false,
            },
        }
    }

    #[inline]
    pub const fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    /// Square whose occupant is removed by this move. Differs from `to`
    /// only for en passant, where the victim sits beside the origin.
    #[inline]
    pub fn capture_square(&self) -> Square {
        if self.flags.en_passant {
            Square::new(self.to.file(), self.from.rank()).unwrap_or(self.to)
        } else {
            self.to
        }
    }

    /// Signed file distance travelled.
    #[inline]
    pub fn file_delta(&self) -> i8 {
        self.to.file() as i8 - self.from.file() as i8
    }

    /// Signed rank distance travelled.
    #[inline]
    pub fn rank_delta(&self) -> i8 {
        self.to.rank() as i8 - self.from.rank() as i8
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if self.flags.promotion {
            write!(f, "q")?;
        }
        Ok(())
    }
}
