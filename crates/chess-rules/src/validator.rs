//! Move legality, move application and end-of-game detection.

use crate::check::is_king_attacked;
use crate::movement::{movement_rule, path_is_clear};
use crate::result::{DrawReason, GameResult, WinReason};
use crate::BoardState;
use chess_core::{Color, Move, PieceKind, Square, Wing};

/// A committed move together with its side effects on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRecord {
    /// The move as validated, with captured piece and flags filled in.
    pub mv: Move,
    /// Rook relocation for castling moves.
    pub rook_move: Option<(Square, Square)>,
}

/// Whether `mv` may be played on `board`.
///
/// Checked in order: the move matches what the board would build for these
/// squares, the mover belongs to the side to move, the destination does not
/// hold a friendly piece, the movement pattern fits, sliders are not blocked,
/// and the mover's king is not left attacked.
pub fn is_legal(board: &BoardState, mv: &Move) -> bool {
    if board.candidate(mv.from, mv.to).as_ref() != Some(mv) {
        return false;
    }
    if mv.piece.color != board.side_to_move() {
        return false;
    }
    if board
        .piece_at(mv.to)
        .is_some_and(|p| p.color == mv.piece.color)
    {
        return false;
    }
    if !movement_rule(mv.piece.kind)(board, mv) {
        return false;
    }
    if mv.piece.kind.is_slider() && !path_is_clear(board, mv.from, mv.to) {
        return false;
    }
    !is_king_attacked(board, mv.piece.color, Some(mv))
}

/// Plays a move that has passed [`is_legal`], returning the next board.
///
/// Double pawn steps set the en passant target, every other move clears
/// it. Pawns reaching the last rank become queens. Castling also moves the
/// rook. The mover's first-move flag is consumed and the turn passes.
pub fn apply_move(board: &BoardState, mv: &Move) -> (BoardState, MoveRecord) {
    let mut next = board.clone();

    if mv.captured.is_some() {
        next.set(mv.capture_square(), None);
    }
    next.set(mv.from, None);

    let mut placed = mv.piece.moved();
    if mv.flags.promotion {
        placed.kind = PieceKind::Queen;
    }
    next.set(mv.to, Some(placed));

    let rook_move = if mv.flags.castle {
        let wing = Wing::from_file_delta(mv.file_delta());
        let rank = mv.from.rank();
        Square::new(wing.rook_file(), rank)
            .zip(Square::new(wing.rook_target_file(), rank))
            .map(|(rook_from, rook_to)| {
                if let Some(rook) = next.take(rook_from) {
                    next.set(rook_to, Some(rook.moved()));
                }
                (rook_from, rook_to)
            })
    } else {
        None
    };

    let double_step = mv.piece.kind == PieceKind::Pawn && mv.rank_delta().abs() == 2;
    next.set_en_passant(if double_step {
        mv.from.offset(0, mv.piece.color.forward())
    } else {
        None
    });

    next.advance_counters(mv.piece.kind == PieceKind::Pawn || mv.captured.is_some());
    next.set_side_to_move(board.side_to_move().opposite());

    (next, MoveRecord { mv: *mv, rook_move })
}

/// Every legal move for the side to move.
pub fn legal_moves(board: &BoardState) -> Vec<Move> {
    board
        .pieces(board.side_to_move())
        .flat_map(|(from, _)| Square::all().filter_map(move |to| board.candidate(from, to)))
        .filter(|mv| is_legal(board, mv))
        .collect()
}

/// Whether `color` has at least one legal move. Stops at the first one found.
pub fn has_any_legal_move(board: &BoardState, color: Color) -> bool {
    if board.side_to_move() != color {
        let mut flipped = board.clone();
        flipped.set_side_to_move(color);
        flipped.set_en_passant(None);
        return has_any_legal_move(&flipped, color);
    }

    board.pieces(color).any(|(from, _)| {
        Square::all().any(|to| {
            board
                .candidate(from, to)
                .is_some_and(|mv| is_legal(board, &mv))
        })
    })
}

#[derive(Debug, Default)]
struct MinorMaterial {
    knights: usize,
    light_bishops: usize,
    dark_bishops: usize,
    majors_or_pawns: usize,
}

impl MinorMaterial {
    fn count(board: &BoardState, color: Color) -> Self {
        let mut m = Self::default();
        for (sq, piece) in board.pieces(color) {
            match piece.kind {
                PieceKind::King => {}
                PieceKind::Knight => m.knights += 1,
                PieceKind::Bishop if sq.is_light() => m.light_bishops += 1,
                PieceKind::Bishop => m.dark_bishops += 1,
                _ => m.majors_or_pawns += 1,
            }
        }
        m
    }

    fn bishops(&self) -> usize {
        self.light_bishops + self.dark_bishops
    }

    fn is_bare(&self) -> bool {
        self.knights + self.bishops() + self.majors_or_pawns == 0
    }

    /// One minor piece, or up to two knights and nothing else.
    fn is_lone_minor_force(&self) -> bool {
        self.majors_or_pawns == 0
            && ((self.knights + self.bishops() == 1)
                || (self.bishops() == 0 && self.knights <= 2))
    }

    fn is_bishops_only(&self) -> bool {
        self.majors_or_pawns == 0 && self.knights == 0
    }
}

/// Whether neither side can possibly deliver mate.
///
/// Drawn: bare kings; a single minor piece against a bare king; one or two
/// knights against a bare king; and bishops only, all standing on squares of
/// one color, against a bare king or against bishops on that same color.
/// Any pawn, rook or queen on the board rules the draw out.
pub fn is_insufficient_material(board: &BoardState) -> bool {
    let white = MinorMaterial::count(board, Color::White);
    let black = MinorMaterial::count(board, Color::Black);
    if white.majors_or_pawns > 0 || black.majors_or_pawns > 0 {
        return false;
    }

    let lone_force = |strong: &MinorMaterial, weak: &MinorMaterial| {
        weak.is_bare() && strong.is_lone_minor_force()
    };
    if lone_force(&white, &black) || lone_force(&black, &white) {
        return true;
    }

    if white.is_bishops_only() && black.is_bishops_only() {
        let light = white.light_bishops + black.light_bishops;
        let dark = white.dark_bishops + black.dark_bishops;
        return light == 0 || dark == 0;
    }
    false
}

/// The result the position forces, if any: checkmate, stalemate, or a draw
/// by insufficient material.
pub fn status(board: &BoardState) -> Option<GameResult> {
    let mover = board.side_to_move();
    if !has_any_legal_move(board, mover) {
        return Some(if is_king_attacked(board, mover, None) {
            GameResult::win(mover.opposite(), WinReason::Checkmate)
        } else {
            GameResult::Draw(DrawReason::Stalemate)
        });
    }
    if is_insufficient_material(board) {
        return Some(GameResult::Draw(DrawReason::InsufficientMaterial));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(fen: &str) -> BoardState {
        BoardState::from_fen(fen).unwrap()
    }

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    fn legal(b: &BoardState, from: &str, to: &str) -> bool {
        b.candidate(sq(from), sq(to))
            .is_some_and(|mv| is_legal(b, &mv))
    }

    fn play(b: &BoardState, from: &str, to: &str) -> BoardState {
        let mv = b.candidate(sq(from), sq(to)).unwrap();
        assert!(is_legal(b, &mv), "{from}{to} should be legal");
        apply_move(b, &mv).0
    }

    #[test]
    fn twenty_moves_from_start() {
        assert_eq!(legal_moves(&BoardState::startpos()).len(), 20);
    }

    #[test]
    fn wrong_side_cannot_move() {
        let b = BoardState::startpos();
        assert!(!legal(&b, "e7", "e5"));
        assert!(legal(&b, "e2", "e4"));
    }

    #[test]
    fn cannot_capture_own_piece() {
        let b = BoardState::startpos();
        assert!(!legal(&b, "d1", "d2"));
    }

    #[test]
    fn sliders_are_blocked() {
        let b = BoardState::startpos();
        assert!(!legal(&b, "a1", "a3"));
        assert!(!legal(&b, "f1", "c4"));
    }

    #[test]
    fn pinned_piece_cannot_leave_the_line() {
        let b = board("4r1k1/8/8/8/8/8/4B3/4K3 w - - 0 1");
        assert!(!legal(&b, "e2", "d3"));
        assert!(legal(&b, "e1", "d1"));
    }

    #[test]
    fn mismatched_move_is_rejected() {
        let b = BoardState::startpos();
        let mut mv = b.candidate(sq("e2"), sq("e4")).unwrap();
        mv.flags.promotion = true;
        assert!(!is_legal(&b, &mv));
    }

    #[test]
    fn double_step_sets_and_next_ply_clears_en_passant() {
        let b = play(&BoardState::startpos(), "e2", "e4");
        assert_eq!(b.en_passant(), Some(sq("e3")));
        assert_eq!(b.side_to_move(), Color::Black);
        let b = play(&b, "g8", "f6");
        assert_eq!(b.en_passant(), None);
    }

    #[test]
    fn en_passant_only_on_the_following_ply() {
        let b = board("4k3/3p4/8/4P3/8/8/8/4K3 b - - 0 1");
        let b = play(&b, "d7", "d5");
        assert!(legal(&b, "e5", "d6"));

        let captured = play(&b, "e5", "d6");
        assert_eq!(captured.piece_at(sq("d5")), None);
        assert_eq!(
            captured.piece_at(sq("d6")).map(|p| (p.kind, p.color)),
            Some((PieceKind::Pawn, Color::White))
        );

        let waited = play(&b, "e1", "f1");
        let waited = play(&waited, "e8", "f8");
        assert!(!legal(&waited, "e5", "d6"));
    }

    #[test]
    fn castling_moves_rook_and_consumes_flags() {
        let b = board("4k3/8/8/8/8/8/8/R3K3 w Q - 0 1");
        let mv = b.candidate(Square::E1, Square::C1).unwrap();
        assert!(is_legal(&b, &mv));
        let (next, record) = apply_move(&b, &mv);
        assert_eq!(record.rook_move, Some((Square::A1, Square::D1)));
        let rook = next.piece_at(Square::D1).unwrap();
        assert_eq!(rook.kind, PieceKind::Rook);
        assert!(rook.has_moved);
        assert!(next.piece_at(Square::C1).unwrap().has_moved);
        assert_eq!(next.piece_at(Square::A1), None);
        assert!(next.castling_rights().is_empty());
    }

    #[test]
    fn rook_move_revokes_one_wing() {
        let b = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let b = play(&b, "h1", "h2");
        assert_eq!(b.castling_rights().to_fen_field(), "Qkq");
        let b = play(&b, "a8", "a7");
        let b = play(&b, "h2", "h1");
        assert_eq!(b.castling_rights().to_fen_field(), "Qk");
        assert!(!legal(&play(&b, "e8", "d8"), "e1", "g1"));
    }

    #[test]
    fn promotion_makes_a_queen() {
        let b = board("7k/P7/8/8/8/8/8/4K3 w - - 0 1");
        let b = play(&b, "a7", "a8");
        assert_eq!(b.piece_at(Square::A8).map(|p| p.kind), Some(PieceKind::Queen));
    }

    #[test]
    fn counters_advance() {
        let b = play(&BoardState::startpos(), "g1", "f3");
        assert_eq!(b.halfmove_clock(), 1);
        assert_eq!(b.fullmove_number(), 1);
        let b = play(&b, "e7", "e5");
        assert_eq!(b.halfmove_clock(), 0);
        assert_eq!(b.fullmove_number(), 2);
    }

    #[test]
    fn checkmate_and_stalemate() {
        let mate = board("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1");
        assert_eq!(
            status(&mate),
            Some(GameResult::win(Color::White, WinReason::Checkmate))
        );

        let stale = board("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        assert_eq!(status(&stale), Some(GameResult::Draw(DrawReason::Stalemate)));

        assert_eq!(status(&BoardState::startpos()), None);
    }

    #[test]
    fn has_any_legal_move_for_either_side() {
        let stale = board("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        assert!(!has_any_legal_move(&stale, Color::Black));
        assert!(has_any_legal_move(&stale, Color::White));
    }

    #[test]
    fn off_turn_side_is_checked_without_touching_the_board() {
        let b = board("7k/5Q2/6K1/8/8/8/8/8 w - - 0 1");
        let before = b.clone();
        assert!(!has_any_legal_move(&b, Color::Black));
        assert!(has_any_legal_move(&b, Color::White));
        assert_eq!(b, before);
        assert_eq!(b.side_to_move(), Color::White);
    }

    #[test]
    fn insufficient_material_cases() {
        let drawn = [
            "4k3/8/8/8/8/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/2B1K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/1N2K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1",
            "2b1k3/8/8/8/8/8/8/4K3 w - - 0 1",
            // Light-squared bishops on both sides.
            "2b1k3/8/8/8/8/8/8/4KB2 w - - 0 1",
        ];
        for fen in drawn {
            assert!(is_insufficient_material(&board(fen)), "{fen}");
        }

        let playable = [
            "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/R3K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/1NB1K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/NN2KN2 w - - 0 1",
            // Opposite-colored bishops.
            "4kb2/8/8/8/8/8/8/4KB2 w - - 0 1",
            "4k1n1/8/8/8/8/8/8/1N2K3 w - - 0 1",
        ];
        for fen in playable {
            assert!(!is_insufficient_material(&board(fen)), "{fen}");
        }
    }

    #[test]
    fn insufficient_material_is_reported_as_draw() {
        let b = board("4k3/8/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(
            status(&b),
            Some(GameResult::Draw(DrawReason::InsufficientMaterial))
        );
    }
}
