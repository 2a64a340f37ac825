//! Per-kind movement patterns.
//!
//! Each kind maps to a plain function deciding whether the from/to geometry
//! is one the piece can make on this board. Blocking between sliders and
//! king safety are checked by the validator, not here.

use crate::check::{is_king_attacked, KING_OFFSETS, KNIGHT_OFFSETS};
use crate::BoardState;
use chess_core::{Move, PieceKind, Square, Wing};

/// Decides whether a candidate move fits the mover's movement pattern.
pub type MovementRule = fn(&BoardState, &Move) -> bool;

/// The movement rule for a piece kind.
pub fn movement_rule(kind: PieceKind) -> MovementRule {
    match kind {
        PieceKind::Pawn => pawn_pattern,
        PieceKind::Knight => knight_pattern,
        PieceKind::Bishop => bishop_pattern,
        PieceKind::Rook => rook_pattern,
        PieceKind::Queen => queen_pattern,
        PieceKind::King => king_pattern,
    }
}

fn pawn_pattern(board: &BoardState, mv: &Move) -> bool {
    let color = mv.piece.color;
    let forward = color.forward();
    let (df, dr) = (mv.file_delta(), mv.rank_delta());

    if df == 0 {
        if mv.captured.is_some() {
            return false;
        }
        if dr == forward {
            return true;
        }
        dr == 2 * forward
            && mv.from.rank() == color.pawn_rank()
            && mv
                .from
                .offset(0, forward)
                .is_some_and(|mid| board.piece_at(mid).is_none())
    } else if df.abs() == 1 && dr == forward {
        let enemy_on_target = board.piece_at(mv.to).is_some_and(|p| p.color != color);
        let en_passant = mv.flags.en_passant
            && board.en_passant() == Some(mv.to)
            && mv.captured.is_some_and(|p| p.kind == PieceKind::Pawn && p.color != color);
        enemy_on_target || en_passant
    } else {
        false
    }
}

fn knight_pattern(_board: &BoardState, mv: &Move) -> bool {
    KNIGHT_OFFSETS.contains(&(mv.file_delta(), mv.rank_delta()))
}

fn bishop_pattern(_board: &BoardState, mv: &Move) -> bool {
    let (df, dr) = (mv.file_delta(), mv.rank_delta());
    df != 0 && df.abs() == dr.abs()
}

fn rook_pattern(_board: &BoardState, mv: &Move) -> bool {
    let (df, dr) = (mv.file_delta(), mv.rank_delta());
    (df == 0) != (dr == 0)
}

fn queen_pattern(board: &BoardState, mv: &Move) -> bool {
    rook_pattern(board, mv) || bishop_pattern(board, mv)
}

fn king_pattern(board: &BoardState, mv: &Move) -> bool {
    if KING_OFFSETS.contains(&(mv.file_delta(), mv.rank_delta())) {
        return true;
    }
    mv.flags.castle && can_castle(board, mv)
}

/// Castling preconditions: unmoved king and rook, nothing between them, and
/// the king neither starts on, crosses, nor lands on an attacked square.
fn can_castle(board: &BoardState, mv: &Move) -> bool {
    let color = mv.piece.color;
    let wing = Wing::from_file_delta(mv.file_delta());
    let home = color.home_rank();

    if mv.piece.has_moved || mv.from.rank() != home || mv.to.rank() != home {
        return false;
    }
    if mv.from.file() != 4 || mv.to.file() != wing.king_target_file() {
        return false;
    }
    if !board.castling_available(color, wing) {
        return false;
    }
    let Some(rook_square) = Square::new(wing.rook_file(), home) else {
        return false;
    };
    if !path_is_clear(board, mv.from, rook_square) {
        return false;
    }
    if is_king_attacked(board, color, None) {
        return false;
    }

    // The crossing square and the destination must be safe as well.
    let step = wing_step(wing);
    let crossing = mv.from.offset(step, 0);
    [crossing, Some(mv.to)].into_iter().all(|sq| {
        sq.is_some_and(|sq| {
            let probe = Move::new(mv.piece, mv.from, sq);
            !is_king_attacked(board, color, Some(&probe))
        })
    })
}

fn wing_step(wing: Wing) -> i8 {
    match wing {
        Wing::Kingside => 1,
        Wing::Queenside => -1,
    }
}

/// Whether every square strictly between `from` and `to` is empty. Squares
/// that are not on a shared line count as clear.
pub fn path_is_clear(board: &BoardState, from: Square, to: Square) -> bool {
    let df = to.file() as i8 - from.file() as i8;
    let dr = to.rank() as i8 - from.rank() as i8;
    if !(df == 0 || dr == 0 || df.abs() == dr.abs()) {
        return true;
    }
    let (step_f, step_r) = (df.signum(), dr.signum());
    let mut cursor = from.offset(step_f, step_r);
    while let Some(sq) = cursor {
        if sq == to {
            return true;
        }
        if board.piece_at(sq).is_some() {
            return false;
        }
        cursor = sq.offset(step_f, step_r);
    }
    true
}
