//! Chess rules: board state, move legality, check detection and notation.
//!
//! This crate provides:
//! - [`BoardState`] - mailbox position with first-move flags
//! - [`movement_rule`] - the per-kind movement pattern table
//! - [`is_king_attacked`] - ray/offset attack scanner with hypothetical moves
//! - [`is_legal`], [`apply_move`], [`status`] - validation and application
//! - [`build_san`] - algebraic notation
//! - [`Game`] - a game with its [`GameRecord`], captures and result
//!
//! All operations are synchronous and only touch the board they are given.
//!
//! # Example
//!
//! ```
//! use chess_rules::Game;
//!
//! let mut game = Game::new();
//! let played = game.play_uci("e2e4").unwrap();
//! assert_eq!(played.san, "e4");
//! game.play_uci("e7e5").unwrap();
//! assert_eq!(game.record().movetext(), "1. e4 e5");
//! ```

mod board;
pub mod check;
mod game;
pub mod movement;
mod result;
pub mod san;
pub mod validator;

use chess_core::FenError;
use thiserror::Error;

pub use board::BoardState;
pub use check::{is_king_attacked, is_square_attacked, occupant};
pub use game::{numbered, Game, GameRecord, PlayedMove};
pub use movement::{movement_rule, path_is_clear, MovementRule};
pub use result::{DrawReason, GameResult, WinReason};
pub use san::{build_san, check_suffix};
pub use validator::{
    apply_move, has_any_legal_move, is_insufficient_material, is_legal, legal_moves, status,
    MoveRecord,
};

/// Errors reported by rules operations. None of them leave partial state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RulesError {
    /// Malformed FEN.
    #[error("invalid position: {0}")]
    InvalidPosition(#[from] FenError),
    /// The move is not legal in the current position.
    #[error("illegal move: {0}")]
    IllegalMove(String),
    /// The move text is not coordinate notation.
    #[error("unparseable move: {0}")]
    Unparseable(String),
    /// The game has already ended.
    #[error("game has already ended")]
    GameOver,
}
