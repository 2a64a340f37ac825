//! Core types for chess.
//!
//! This crate provides the value types shared by the rules engine, the
//! engine bridge and the analysis pipeline:
//! - [`Color`], [`PieceKind`] and [`Piece`] for piece representation
//! - [`Square`] for board coordinates
//! - [`Move`] and [`MoveFlags`] for candidate and committed moves
//! - [`CastlingRights`] and [`Wing`]
//! - FEN parsing and serialization ([`FenRecord`])
//! - coordinate move text ([`encode_uci`], [`decode_uci`])

mod castling;
mod color;
mod fen;
mod mov;
mod notation;
mod piece;
mod square;

pub use castling::{CastlingRights, Wing};
pub use color::Color;
pub use fen::{FenError, FenRecord};
pub use mov::{Move, MoveFlags};
pub use notation::{decode_uci, encode_uci, square_name};
pub use piece::{Piece, PieceKind};
pub use square::Square;
