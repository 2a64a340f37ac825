//! Mailbox board representation.

use chess_core::{CastlingRights, Color, FenError, FenRecord, Move, Piece, PieceKind, Square, Wing};

/// A chess position: piece placement, side to move, en passant target and
/// move counters.
///
/// Castling rights are not stored. They are derived from the first-move
/// flags of the kings and corner rooks, so they can only ever be lost.
#[derive(Debug, Clone, Eq)]
pub struct BoardState {
    squares: [Option<Piece>; 64],
    side_to_move: Color,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl BoardState {
    /// The standard starting position.
    pub fn startpos() -> Self {
        let mut board = Self {
            squares: [None; 64],
            side_to_move: Color::White,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        };
        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for color in Color::BOTH {
            for (file, kind) in (0u8..).zip(back) {
                board.put_home(file, color.home_rank(), Piece::new(kind, color));
                board.put_home(file, color.pawn_rank(), Piece::new(PieceKind::Pawn, color));
            }
        }
        board
    }

    fn put_home(&mut self, file: u8, rank: u8, piece: Piece) {
        if let Some(sq) = Square::new(file, rank) {
            self.squares[sq.index()] = Some(piece);
        }
    }

    /// Loads a position from FEN.
    ///
    /// Kings and corner rooks keep an unspent first-move flag only where the
    /// castling field grants it. Pawns count as moved once they have left
    /// their starting rank.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let record = FenRecord::parse(fen)?;
        let mut squares = record.placement;

        for sq in Square::all() {
            let Some(piece) = squares[sq.index()].as_mut() else {
                continue;
            };
            let home = piece.color.home_rank();
            piece.has_moved = match piece.kind {
                PieceKind::Pawn => sq.rank() != piece.color.pawn_rank(),
                PieceKind::King => {
                    !(sq.rank() == home
                        && sq.file() == 4
                        && Wing::BOTH
                            .iter()
                            .any(|&wing| record.castling.allows(piece.color, wing)))
                }
                PieceKind::Rook => !(sq.rank() == home
                    && Wing::BOTH.iter().any(|&wing| {
                        wing.rook_file() == sq.file() && record.castling.allows(piece.color, wing)
                    })),
                _ => false,
            };
        }

        Ok(Self {
            squares,
            side_to_move: record.side_to_move,
            en_passant: record.en_passant,
            halfmove_clock: record.halfmove_clock,
            fullmove_number: record.fullmove_number,
        })
    }

    /// Serializes the position to FEN.
    pub fn to_fen(&self) -> String {
        FenRecord {
            placement: self.squares,
            side_to_move: self.side_to_move,
            castling: self.castling_rights(),
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        }
        .to_fen()
    }

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// Square a pawn skipped over on the previous ply, if any.
    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Every occupied square with its piece, a1 first.
    pub fn occupied(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    /// Every piece of one color with its square.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.occupied().filter(move |(_, p)| p.color == color)
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces(color)
            .find(|(_, p)| p.kind == PieceKind::King)
            .map(|(sq, _)| sq)
    }

    /// Total material of one side in pawns.
    pub fn material(&self, color: Color) -> u32 {
        self.pieces(color).map(|(_, p)| p.value()).sum()
    }

    /// Whether the king and rook for this wing are both still unmoved on
    /// their home squares.
    pub fn castling_available(&self, color: Color, wing: Wing) -> bool {
        let home = color.home_rank();
        let unmoved = |file: u8, kind: PieceKind| {
            Square::new(file, home)
                .and_then(|sq| self.piece_at(sq))
                .is_some_and(|p| p.kind == kind && p.color == color && !p.has_moved)
        };
        unmoved(4, PieceKind::King) && unmoved(wing.rook_file(), PieceKind::Rook)
    }

    /// Castling rights derived from first-move flags.
    pub fn castling_rights(&self) -> CastlingRights {
        let mut rights = CastlingRights::NONE;
        for color in Color::BOTH {
            for wing in Wing::BOTH {
                if self.castling_available(color, wing) {
                    rights.grant(color, wing);
                }
            }
        }
        rights
    }

    /// Builds the move the piece on `from` would make by going to `to`,
    /// filling in the captured piece and special-move flags. Returns `None`
    /// when `from` is empty or the squares coincide. No legality check.
    pub fn candidate(&self, from: Square, to: Square) -> Option<Move> {
        if from == to {
            return None;
        }
        let piece = self.piece_at(from)?;
        let mut mv = Move::new(piece, from, to);
        mv.captured = self.piece_at(to);

        match piece.kind {
            PieceKind::Pawn => {
                if mv.captured.is_none() && from.file() != to.file() && self.en_passant == Some(to)
                {
                    mv.flags.en_passant = true;
                    mv.captured = self.piece_at(mv.capture_square());
                }
                mv.flags.promotion = to.rank() == piece.color.promotion_rank();
            }
            PieceKind::King => {
                mv.flags.castle = from.rank() == to.rank() && mv.file_delta().abs() == 2;
            }
            _ => {}
        }
        Some(mv)
    }

    pub(crate) fn set(&mut self, sq: Square, piece: Option<Piece>) {
        self.squares[sq.index()] = piece;
    }

    pub(crate) fn take(&mut self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()].take()
    }

    pub(crate) fn set_side_to_move(&mut self, color: Color) {
        self.side_to_move = color;
    }

    pub(crate) fn set_en_passant(&mut self, sq: Option<Square>) {
        self.en_passant = sq;
    }

    pub(crate) fn advance_counters(&mut self, reset_halfmove: bool) {
        if reset_halfmove {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if self.side_to_move == Color::Black {
            self.fullmove_number += 1;
        }
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::startpos()
    }
}

/// Two boards are equal when they describe the same position. First-move
/// flags only take part through the castling rights they imply.
impl PartialEq for BoardState {
    fn eq(&self, other: &Self) -> bool {
        let placement = |b: &Self| b.squares.map(|sq| sq.map(|p| (p.kind, p.color)));
        placement(self) == placement(other)
            && self.side_to_move == other.side_to_move
            && self.en_passant == other.en_passant
            && self.castling_rights() == other.castling_rights()
            && self.halfmove_clock == other.halfmove_clock
            && self.fullmove_number == other.fullmove_number
    }
}
