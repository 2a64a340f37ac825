//! Attack detection.
//!
//! Scans outward from a target square instead of generating the opponent's
//! moves. An optional hypothetical move is layered over the board through
//! [`occupant`], so "would this move leave my king attacked" never mutates
//! anything.

use crate::BoardState;
use chess_core::{Color, Move, Piece, PieceKind, Square};

const ORTHOGONAL: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAGONAL: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
pub(crate) const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];
pub(crate) const KING_OFFSETS: [(i8, i8); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// What stands on `sq` once `hypothetical` has been played.
///
/// The destination holds the mover, the origin is empty, and so is the
/// square of a captured piece (which differs from the destination for en
/// passant). Every other square reads from the real board.
pub fn occupant(board: &BoardState, sq: Square, hypothetical: Option<&Move>) -> Option<Piece> {
    if let Some(mv) = hypothetical {
        if sq == mv.to {
            return Some(mv.piece);
        }
        if sq == mv.from || (mv.captured.is_some() && sq == mv.capture_square()) {
            return None;
        }
    }
    board.piece_at(sq)
}

/// Whether the king of `king_color` is attacked, optionally after a
/// hypothetical move.
pub fn is_king_attacked(board: &BoardState, king_color: Color, hypothetical: Option<&Move>) -> bool {
    let king_square = match hypothetical {
        Some(mv) if mv.piece.kind == PieceKind::King && mv.piece.color == king_color => {
            Some(mv.to)
        }
        _ => board.king_square(king_color),
    };
    match king_square {
        Some(sq) => is_square_attacked(board, sq, king_color, hypothetical),
        None => false,
    }
}

/// Whether any piece of `defender`'s opponent attacks `target`.
///
/// Pawn attacks are looked for on the two squares diagonally forward from
/// the defender's point of view, which is where an enemy pawn striking
/// `target` has to stand.
pub fn is_square_attacked(
    board: &BoardState,
    target: Square,
    defender: Color,
    hypothetical: Option<&Move>,
) -> bool {
    let at = |sq: Square| occupant(board, sq, hypothetical);
    let is_enemy = |sq: Option<Square>, kinds: &[PieceKind]| {
        sq.and_then(at)
            .is_some_and(|p| p.color != defender && kinds.contains(&p.kind))
    };

    let ray_hits = |directions: &[(i8, i8)], kinds: &[PieceKind]| {
        directions.iter().any(|&(df, dr)| {
            let mut cursor = target.offset(df, dr);
            while let Some(sq) = cursor {
                if let Some(piece) = at(sq) {
                    return piece.color != defender && kinds.contains(&piece.kind);
                }
                cursor = sq.offset(df, dr);
            }
            false
        })
    };

    ray_hits(&ORTHOGONAL, &[PieceKind::Rook, PieceKind::Queen])
        || ray_hits(&DIAGONAL, &[PieceKind::Bishop, PieceKind::Queen])
        || KNIGHT_OFFSETS
            .iter()
            .any(|&(df, dr)| is_enemy(target.offset(df, dr), &[PieceKind::Knight]))
        || KING_OFFSETS
            .iter()
            .any(|&(df, dr)| is_enemy(target.offset(df, dr), &[PieceKind::King]))
        || [-1, 1]
            .iter()
            .any(|&df| is_enemy(target.offset(df, defender.forward()), &[PieceKind::Pawn]))
}
