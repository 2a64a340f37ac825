//! Commands sent from the GUI side to an engine.

use std::fmt;

/// Commands sent from GUI to engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuiCommand {
    /// Switch the engine to UCI mode; answered by `uciok`.
    Uci,
    /// Synchronize; answered by `readyok`.
    IsReady,
    /// The next position belongs to a different game.
    UciNewGame,
    /// Set an engine option. Not acknowledged.
    SetOption { name: String, value: String },
    /// Set up the position reached from the start position by `moves`.
    Position { moves: Vec<String> },
    /// Search for exactly this many milliseconds.
    Go { movetime: u64 },
    /// Quit the engine.
    Quit,
}

impl GuiCommand {
    /// Builds a `setoption` command.
    pub fn set_option(name: impl Into<String>, value: impl ToString) -> Self {
        GuiCommand::SetOption {
            name: name.into(),
            value: value.to_string(),
        }
    }
}

impl fmt::Display for GuiCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuiCommand::Uci => f.write_str("uci"),
            GuiCommand::IsReady => f.write_str("isready"),
            GuiCommand::UciNewGame => f.write_str("ucinewgame"),
            GuiCommand::SetOption { name, value } => {
                write!(f, "setoption name {} value {}", name, value)
            }
            GuiCommand::Position { moves } if moves.is_empty() => f.write_str("position startpos"),
            GuiCommand::Position { moves } => {
                write!(f, "position startpos moves {}", moves.join(" "))
            }
            GuiCommand::Go { movetime } => write!(f, "go movetime {}", movetime),
            GuiCommand::Quit => f.write_str("quit"),
        }
    }
}
