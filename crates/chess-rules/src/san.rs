//! Standard Algebraic Notation (SAN) generation.
//!
//! Examples: "e4", "Nf3", "Bxc6", "O-O", "e8=Q", "Nbd2", "R1e1".
//! Check and mate suffixes depend on the position after the move and are
//! added separately with [`check_suffix`].

use crate::check::is_king_attacked;
use crate::validator::{has_any_legal_move, is_legal};
use crate::BoardState;
use chess_core::{Move, Square};

/// Renders a move in SAN, without any check suffix.
///
/// `before` is the board the move is played on.
pub fn build_san(mv: &Move, before: &BoardState) -> String {
    if mv.flags.castle {
        return if mv.file_delta() > 0 { "O-O" } else { "O-O-O" }.to_string();
    }

    let mut san = String::new();
    match mv.piece.kind.san_letter() {
        Some(letter) => {
            san.push(letter);
            san.push_str(&disambiguation(mv, before));
        }
        None if mv.is_capture() => san.push(mv.from.file_char()),
        None => {}
    }
    if mv.is_capture() {
        san.push('x');
    }
    san.push_str(&mv.to.to_algebraic());
    if mv.flags.promotion {
        san.push_str("=Q");
    }
    san
}

/// `+` if the side to move on `after` is in check, `#` if that is mate,
/// empty otherwise.
pub fn check_suffix(after: &BoardState) -> &'static str {
    let defender = after.side_to_move();
    if !is_king_attacked(after, defender, None) {
        ""
    } else if has_any_legal_move(after, defender) {
        "+"
    } else {
        "#"
    }
}

/// Origin file, rank, or both, when another piece of the same kind and
/// color could also legally reach the destination.
fn disambiguation(mv: &Move, before: &BoardState) -> String {
    let rivals: Vec<Square> = before
        .pieces(mv.piece.color)
        .filter(|&(sq, p)| p.kind == mv.piece.kind && sq != mv.from)
        .filter(|&(sq, _)| {
            before
                .candidate(sq, mv.to)
                .is_some_and(|rival| is_legal(before, &rival))
        })
        .map(|(sq, _)| sq)
        .collect();

    if rivals.is_empty() {
        return String::new();
    }
    let shares_file = rivals.iter().any(|sq| sq.file() == mv.from.file());
    let shares_rank = rivals.iter().any(|sq| sq.rank() == mv.from.rank());

    match (shares_file, shares_rank) {
        (true, true) => mv.from.to_algebraic(),
        (true, false) => mv.from.rank_char().to_string(),
        _ => mv.from.file_char().to_string(),
    }
}
