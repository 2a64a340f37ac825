//! Coordinate (UCI) move text.
//!
//! This is also the wire format exchanged with engine processes. Promotions
//! always go to a queen, so the only promotion suffix ever written is `q`.

use crate::{Move, Square};

/// Algebraic name of a square, e.g. `e4`.
pub fn square_name(square: Square) -> String {
    square.to_algebraic()
}

/// `from ++ to`, plus a trailing `q` for promotions.
pub fn encode_uci(mv: &Move) -> String {
    let mut text = String::with_capacity(5);
    text.push_str(&mv.from.to_algebraic());
    text.push_str(&mv.to.to_algebraic());
    if mv.flags.promotion {
        text.push('q');
    }
    text
}

/// Reads the origin and destination out of coordinate move text.
///
/// Returns `None` when the text is shorter than four characters or either
/// square is off the board. A fifth (promotion) character is ignored.
pub fn decode_uci(text: &str) -> Option<(Square, Square)> {
    let text = text.trim();
    let from = Square::from_algebraic(text.get(0..2)?)?;
    let to = Square::from_algebraic(text.get(2..4)?)?;
    Some((from, to))
}
