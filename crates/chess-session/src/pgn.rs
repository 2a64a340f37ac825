//! PGN (Portable Game Notation) export.
//!
//! Writes the tag block and SAN move text of a [`Game`]. Reading PGN is not
//! supported.

use chess_core::Color;
use chess_rules::Game;
use chrono::{DateTime, Utc};
use std::path::Path;

fn player_name(side: Color, engine_side: Option<Color>) -> &'static str {
    if engine_side == Some(side) {
        "Stockfish"
    } else {
        "Player"
    }
}

/// Renders `game` as PGN dated `date`.
///
/// The result tag is `*` while the game is still running.
pub fn format_pgn(game: &Game, engine_side: Option<Color>, date: DateTime<Utc>) -> String {
    let result = game.result().map_or("*", |r| r.tag());
    let mut pgn = String::new();

    pgn.push_str("[Event \"Casual Game\"]\n");
    pgn.push_str("[Site \"Local\"]\n");
    pgn.push_str(&format!("[Date \"{}\"]\n", date.format("%Y.%m.%d")));
    pgn.push_str(&format!(
        "[White \"{}\"]\n",
        player_name(Color::White, engine_side)
    ));
    pgn.push_str(&format!(
        "[Black \"{}\"]\n",
        player_name(Color::Black, engine_side)
    ));
    pgn.push_str(&format!("[Result \"{}\"]\n\n", result));

    let movetext = game.record().movetext();
    if !movetext.is_empty() {
        pgn.push_str(&movetext);
        pgn.push(' ');
    }
    pgn.push_str(result);
    pgn.push('\n');
    pgn
}

/// Writes `game` to `path` as PGN dated today (UTC).
pub fn write_pgn<P: AsRef<Path>>(
    path: P,
    game: &Game,
    engine_side: Option<Color>,
) -> std::io::Result<()> {
    std::fs::write(path, format_pgn(game, engine_side, Utc::now()))
}
