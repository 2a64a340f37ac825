//! Game management: the board plus its append-only move record.
//!
//! [`Game`] is the value a session owns. It validates and commits moves,
//! keeps the notation record, capture lists and result, and can be cloned
//! as a complete checkpoint.

use crate::check::is_king_attacked;
use crate::result::{GameResult, WinReason};
use crate::san::{build_san, check_suffix};
use crate::validator::{apply_move, is_legal, legal_moves, status, MoveRecord};
use crate::{BoardState, RulesError};
use chess_core::{decode_uci, encode_uci, Color, Move, Piece, Square};

/// Committed moves in coordinate and algebraic form, in play order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameRecord {
    uci: Vec<String>,
    san: Vec<String>,
}

impl GameRecord {
    fn push(&mut self, uci: String, san: String) {
        self.uci.push(uci);
        self.san.push(san);
    }

    pub fn len(&self) -> usize {
        self.uci.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uci.is_empty()
    }

    /// Moves in coordinate form; this is what gets replayed for analysis.
    pub fn uci_moves(&self) -> &[String] {
        &self.uci
    }

    /// Moves in SAN, check suffixes included.
    pub fn san_moves(&self) -> &[String] {
        &self.san
    }

    /// Each move prefixed with its number: `1. e4`, `1... e5`.
    pub fn display_moves(&self) -> Vec<String> {
        self.san
            .iter()
            .enumerate()
            .map(|(ply, san)| numbered(ply, san))
            .collect()
    }

    /// PGN move text body: `1. e4 e5 2. Nf3`.
    pub fn movetext(&self) -> String {
        let mut parts = Vec::with_capacity(self.san.len() + self.san.len() / 2);
        for (ply, san) in self.san.iter().enumerate() {
            if ply % 2 == 0 {
                parts.push(format!("{}.", ply / 2 + 1));
            }
            parts.push(san.clone());
        }
        parts.join(" ")
    }
}

/// Numbered notation for one ply: `N. san` for White, `N... san` for Black.
pub fn numbered(ply: usize, san: &str) -> String {
    let number = ply / 2 + 1;
    if ply % 2 == 0 {
        format!("{number}. {san}")
    } else {
        format!("{number}... {san}")
    }
}

/// What a successful [`Game::play`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    pub record: MoveRecord,
    pub uci: String,
    pub san: String,
    /// Numbered SAN, e.g. `12... Qxd4+`.
    pub display: String,
    /// Set when this move ended the game.
    pub result: Option<GameResult>,
}

/// A game in progress or finished.
#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    start: BoardState,
    board: BoardState,
    record: GameRecord,
    /// Pieces taken by each side, indexed by the capturer's color.
    captures: [Vec<Piece>; 2],
    result: Option<GameResult>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Creates a new game with the standard starting position.
    pub fn new() -> Self {
        Self::from_board(BoardState::startpos())
    }

    /// Creates a game from a custom starting position. A position that is
    /// already mate, stalemate or dead starts out finished.
    pub fn from_board(board: BoardState) -> Self {
        let result = status(&board);
        Game {
            start: board.clone(),
            board,
            record: GameRecord::default(),
            captures: [Vec::new(), Vec::new()],
            result,
        }
    }

    /// Creates a game from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        Ok(Self::from_board(BoardState::from_fen(fen)?))
    }

    /// Replays coordinate moves from the standard starting position.
    pub fn replay<S: AsRef<str>>(moves: &[S]) -> Result<Self, RulesError> {
        Self::replay_from(BoardState::startpos(), moves)
    }

    /// Replays coordinate moves from `start`.
    pub fn replay_from<S: AsRef<str>>(start: BoardState, moves: &[S]) -> Result<Self, RulesError> {
        let mut game = Self::from_board(start);
        for mv in moves {
            game.play_uci(mv.as_ref())?;
        }
        Ok(game)
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn start_position(&self) -> &BoardState {
        &self.start
    }

    pub fn record(&self) -> &GameRecord {
        &self.record
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn ply_count(&self) -> usize {
        self.record.len()
    }

    /// True if the side to move is in check.
    pub fn is_check(&self) -> bool {
        is_king_attacked(&self.board, self.board.side_to_move(), None)
    }

    /// Pieces captured by `color`, cheapest first.
    pub fn captured_by(&self, color: Color) -> &[Piece] {
        &self.captures[color.index()]
    }

    /// Material on the board for one side.
    pub fn material(&self, color: Color) -> u32 {
        self.board.material(color)
    }

    /// `White +d`, `Black +d` or `Material even`.
    pub fn material_balance(&self) -> String {
        let white = self.material(Color::White) as i64;
        let black = self.material(Color::Black) as i64;
        match white - black {
            0 => "Material even".to_string(),
            d if d > 0 => format!("White +{d}"),
            d => format!("Black +{}", -d),
        }
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        if self.is_over() {
            return Vec::new();
        }
        legal_moves(&self.board)
    }

    /// Whether `mv` may be played now. Nothing is legal once the game is over.
    pub fn is_legal(&self, mv: &Move) -> bool {
        !self.is_over() && is_legal(&self.board, mv)
    }

    /// Validates and commits the move from `from` to `to`.
    ///
    /// A rejected move leaves the game untouched.
    pub fn play(&mut self, from: Square, to: Square) -> Result<PlayedMove, RulesError> {
        if self.is_over() {
            return Err(RulesError::GameOver);
        }
        let mv = self
            .board
            .candidate(from, to)
            .filter(|mv| is_legal(&self.board, mv))
            .ok_or_else(|| RulesError::IllegalMove(format!("{from}{to}")))?;
        Ok(self.commit(&mv))
    }

    /// Validates and commits a move given in coordinate form.
    pub fn play_uci(&mut self, text: &str) -> Result<PlayedMove, RulesError> {
        let (from, to) =
            decode_uci(text).ok_or_else(|| RulesError::Unparseable(text.to_string()))?;
        self.play(from, to)
    }

    fn commit(&mut self, mv: &Move) -> PlayedMove {
        let ply = self.record.len();
        let san_body = build_san(mv, &self.board);
        let (next, record) = apply_move(&self.board, mv);
        let san = format!("{san_body}{}", check_suffix(&next));
        let uci = encode_uci(mv);

        if let Some(captured) = mv.captured {
            let list = &mut self.captures[mv.piece.color.index()];
            list.push(captured);
            list.sort_by_key(|p| p.value());
        }

        self.board = next;
        self.record.push(uci.clone(), san.clone());
        self.result = status(&self.board);

        PlayedMove {
            record,
            display: numbered(ply, &san),
            uci,
            san,
            result: self.result,
        }
    }

    /// `color` gives up. Returns the result.
    pub fn resign(&mut self, color: Color) -> Result<GameResult, RulesError> {
        self.finish(GameResult::win(color.opposite(), WinReason::Resignation))
    }

    /// `color` ran out of time. Returns the result.
    pub fn flag_fall(&mut self, color: Color) -> Result<GameResult, RulesError> {
        self.finish(GameResult::win(color.opposite(), WinReason::Timeout))
    }

    fn finish(&mut self, result: GameResult) -> Result<GameResult, RulesError> {
        if self.is_over() {
            return Err(RulesError::GameOver);
        }
        self.result = Some(result);
        Ok(result)
    }
}
