//! Board coordinates.

use std::fmt;

/// A square on the board, addressed by file (0 = a) and rank (0 = White's
/// first rank). Both components are always in `0..8`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    file: u8,
    rank: u8,
}

macro_rules! squares {
    ($($name:ident = ($file:expr, $rank:expr)),* $(,)?) => {
        $(pub const $name: Square = Square { file: $file, rank: $rank };)*
    };
}

impl Square {
    squares! {
        A1 = (0, 0), B1 = (1, 0), C1 = (2, 0), D1 = (3, 0),
        E1 = (4, 0), F1 = (5, 0), G1 = (6, 0), H1 = (7, 0),
        A8 = (0, 7), B8 = (1, 7), C8 = (2, 7), D8 = (3, 7),
        E8 = (4, 7), F8 = (5, 7), G8 = (6, 7), H8 = (7, 7),
    }

    /// Creates a square, or `None` if either coordinate is off the board.
    #[inline]
    pub const fn new(file: u8, rank: u8) -> Option<Self> {
        if file < 8 && rank < 8 {
            Some(Self { file, rank })
        } else {
            None
        }
    }

    /// Square for a 0..64 index, a1 = 0, h8 = 63.
    #[inline]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < 64 {
            Some(Self {
                file: (index % 8) as u8,
                rank: (index / 8) as u8,
            })
        } else {
            None
        }
    }

    /// Parses algebraic notation such as `e4`.
    pub fn from_algebraic(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        let file = chars.next()?;
        let rank = chars.next()?;
        if chars.next().is_some() || !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
            return None;
        }
        Self::new(file as u8 - b'a', rank as u8 - b'1')
    }

    /// All 64 squares, a1 first, rank by rank.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..64).filter_map(Self::from_index)
    }

    #[inline]
    pub const fn file(self) -> u8 {
        self.file
    }

    #[inline]
    pub const fn rank(self) -> u8 {
        self.rank
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.rank as usize * 8 + self.file as usize
    }

    /// The square `df` files and `dr` ranks away, if it is on the board.
    #[inline]
    pub fn offset(self, df: i8, dr: i8) -> Option<Self> {
        let file = self.file as i8 + df;
        let rank = self.rank as i8 + dr;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Self {
                file: file as u8,
                rank: rank as u8,
            })
        } else {
            None
        }
    }

    /// True for light squares (h1 is light, a1 is dark).
    #[inline]
    pub const fn is_light(self) -> bool {
        (self.file + self.rank) % 2 == 1
    }

    #[inline]
    pub const fn file_char(self) -> char {
        (b'a' + self.file) as char
    }

    #[inline]
    pub const fn rank_char(self) -> char {
        (b'1' + self.rank) as char
    }

    /// Algebraic name such as `e4`.
    pub fn to_algebraic(self) -> String {
        let mut name = String::with_capacity(2);
        name.push(self.file_char());
        name.push(self.rank_char());
        name
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Square({})", self)
    }
}
