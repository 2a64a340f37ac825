//! GUI side of the UCI (Universal Chess Interface) protocol.
//!
//! This crate renders the commands a GUI sends to an engine process and
//! parses the lines the engine writes back.
//!
//! # Commands sent
//!
//! - `uci` / `uciok` - Initialize engine, get id
//! - `isready` / `readyok` - Synchronization
//! - `setoption name <name> value <value>` - Configure engine
//! - `ucinewgame` - Forget previous game
//! - `position startpos [moves <move>...]` - Set position
//! - `go movetime <ms>` - Start search
//! - `quit` - Exit engine

mod command;
mod info;

pub use command::GuiCommand;
pub use info::{EngineInfo, Score};

use std::io::{BufRead, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UciError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Messages sent from engine to GUI.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    /// `id name <name>`; the author line is folded into `Other`.
    IdName(String),
    /// UCI initialization complete.
    UciOk,
    /// Engine is ready.
    ReadyOk,
    /// Search information.
    Info(EngineInfo),
    /// Best move found. `(none)` and `0000` mean no move is available.
    BestMove { mv: Option<String>, ponder: Option<String> },
    /// Anything else: option declarations, author, copyright banners.
    Other(String),
}

impl EngineMessage {
    /// Classify a line written by the engine.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let mut tokens = trimmed.split_whitespace();

        match tokens.next() {
            Some("uciok") => EngineMessage::UciOk,
            Some("readyok") => EngineMessage::ReadyOk,
            Some("info") => match EngineInfo::parse(trimmed) {
                Some(info) => EngineMessage::Info(info),
                None => EngineMessage::Other(trimmed.to_string()),
            },
            Some("bestmove") => {
                let mv = tokens
                    .next()
                    .filter(|m| *m != "(none)" && *m != "0000")
                    .map(str::to_string);
                let ponder = match (tokens.next(), tokens.next()) {
                    (Some("ponder"), Some(p)) => Some(p.to_string()),
                    _ => None,
                };
                EngineMessage::BestMove { mv, ponder }
            }
            Some("id") if tokens.next() == Some("name") => {
                let name: Vec<&str> = tokens.collect();
                EngineMessage::IdName(name.join(" "))
            }
            _ => EngineMessage::Other(trimmed.to_string()),
        }
    }
}

/// Line-oriented connection to an engine.
pub struct UciClient<R: BufRead, W: Write> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> UciClient<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Send a command to the engine.
    pub fn send(&mut self, cmd: &GuiCommand) -> Result<(), UciError> {
        writeln!(self.writer, "{}", cmd)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Read the next raw line, without its terminator. `None` at end of stream.
    pub fn read_line(&mut self) -> Result<Option<String>, UciError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_handshake_lines() {
        assert_eq!(EngineMessage::parse("uciok"), EngineMessage::UciOk);
        assert_eq!(EngineMessage::parse("readyok\r\n"), EngineMessage::ReadyOk);
        assert_eq!(
            EngineMessage::parse("id name Stockfish 16.1"),
            EngineMessage::IdName("Stockfish 16.1".to_string())
        );
        assert!(matches!(
            EngineMessage::parse("id author the Stockfish developers"),
            EngineMessage::Other(_)
        ));
        assert!(matches!(
            EngineMessage::parse("option name Hash type spin default 16 min 1 max 33554432"),
            EngineMessage::Other(_)
        ));
    }

    #[test]
    fn parse_bestmove() {
        assert_eq!(
            EngineMessage::parse("bestmove e2e4 ponder e7e5"),
            EngineMessage::BestMove {
                mv: Some("e2e4".to_string()),
                ponder: Some("e7e5".to_string())
            }
        );
        assert_eq!(
            EngineMessage::parse("bestmove g1f3"),
            EngineMessage::BestMove {
                mv: Some("g1f3".to_string()),
                ponder: None
            }
        );
        assert_eq!(
            EngineMessage::parse("bestmove (none)"),
            EngineMessage::BestMove { mv: None, ponder: None }
        );
    }

    #[test]
    fn parse_info() {
        match EngineMessage::parse("info depth 1 score cp 20 pv e2e4") {
            EngineMessage::Info(info) => assert_eq!(info.score, Some(Score::Cp(20))),
            other => panic!("expected info, got {:?}", other),
        }
    }

    #[test]
    fn client_sends_and_reads() {
        let engine_output = "id name Fake\r\nuciok\n";
        let mut written = Vec::new();
        let mut client = UciClient::new(Cursor::new(engine_output), &mut written);

        client.send(&GuiCommand::Uci).unwrap();
        client.send(&GuiCommand::IsReady).unwrap();

        assert_eq!(client.read_line().unwrap().as_deref(), Some("id name Fake"));
        assert_eq!(client.read_line().unwrap().as_deref(), Some("uciok"));
        assert_eq!(client.read_line().unwrap(), None);

        drop(client);
        assert_eq!(String::from_utf8(written).unwrap(), "uci\nisready\n");
    }
}
