//! Castling availability.

use crate::Color;

/// Which side of the board a castle goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wing {
    Kingside,
    Queenside,
}

impl Wing {
    pub const BOTH: [Wing; 2] = [Wing::Kingside, Wing::Queenside];

    /// File of the rook that castles on this wing.
    #[inline]
    pub const fn rook_file(self) -> u8 {
        match self {
            Wing::Kingside => 7,
            Wing::Queenside => 0,
        }
    }

    /// File the king lands on.
    #[inline]
    pub const fn king_target_file(self) -> u8 {
        match self {
            Wing::Kingside => 6,
            Wing::Queenside => 2,
        }
    }

    /// File the rook lands on.
    #[inline]
    pub const fn rook_target_file(self) -> u8 {
        match self {
            Wing::Kingside => 5,
            Wing::Queenside => 3,
        }
    }

    /// Wing a two-file king step heads towards.
    #[inline]
    pub const fn from_file_delta(delta: i8) -> Self {
        if delta > 0 {
            Wing::Kingside
        } else {
            Wing::Queenside
        }
    }
}

/// Castling rights as four bit flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    const fn bit(color: Color, wing: Wing) -> u8 {
        match (color, wing) {
            (Color::White, Wing::Kingside) => 0b0001,
            (Color::White, Wing::Queenside) => 0b0010,
            (Color::Black, Wing::Kingside) => 0b0100,
            (Color::Black, Wing::Queenside) => 0b1000,
        }
    }

    #[inline]
    pub const fn allows(self, color: Color, wing: Wing) -> bool {
        self.0 & Self::bit(color, wing) != 0
    }

    #[inline]
    pub fn grant(&mut self, color: Color, wing: Wing) {
        self.0 |= Self::bit(color, wing);
    }

    #[inline]
    pub fn revoke(&mut self, color: Color, wing: Wing) {
        self.0 &= !Self::bit(color, wing);
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Reads the FEN castling field (`KQkq`, any subset, or `-`).
    pub fn from_fen_field(field: &str) -> Option<Self> {
        let mut rights = Self::NONE;
        if field == "-" {
            return Some(rights);
        }
        if field.is_empty() {
            return None;
        }
        for c in field.chars() {
            let (color, wing) = match c {
                'K' => (Color::White, Wing::Kingside),
                'Q' => (Color::White, Wing::Queenside),
                'k' => (Color::Black, Wing::Kingside),
                'q' => (Color::Black, Wing::Queenside),
                _ => return None,
            };
            rights.grant(color, wing);
        }
        Some(rights)
    }

    /// Writes the FEN castling field.
    pub fn to_fen_field(self) -> String {
        if self.is_empty() {
            return "-".to_string();
        }
        let letters = [
            (Color::White, Wing::Kingside, 'K'),
            (Color::White, Wing::Queenside, 'Q'),
            (Color::Black, Wing::Kingside, 'k'),
            (Color::Black, Wing::Queenside, 'q'),
        ];
        letters
            .iter()
            .filter(|(color, wing, _)| self.allows(*color, *wing))
            .map(|(_, _, c)| *c)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revoke_one_wing() {
        let mut rights = CastlingRights::ALL;
        rights.revoke(Color::White, Wing::Kingside);
        assert!(!rights.allows(Color::White, Wing::Kingside));
        assert!(rights.allows(Color::White, Wing::Queenside));
        assert!(rights.allows(Color::Black, Wing::Kingside));
    }

    #[test]
    fn fen_field_round_trip() {
        for field in ["KQkq", "Kq", "k", "-"] {
            let rights = CastlingRights::from_fen_field(field).unwrap();
            assert_eq!(rights.to_fen_field(), field);
        }
        assert_eq!(CastlingRights::from_fen_field("XYZ"), None);
        assert_eq!(CastlingRights::from_fen_field(""), None);
    }

    #[test]
    fn wing_files() {
        assert_eq!(Wing::Kingside.king_target_file(), 6);
        assert_eq!(Wing::Queenside.rook_target_file(), 3);
        assert_eq!(Wing::from_file_delta(-2), Wing::Queenside);
    }
}
