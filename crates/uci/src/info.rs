//! Engine `info` lines.

use serde::{Deserialize, Serialize};

/// Score in centipawns or mate distance, from the side to move's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Score {
    /// Centipawn score (100 = 1 pawn advantage).
    Cp(i32),
    /// Mate in N moves (positive = side to move mates, negative = gets mated).
    Mate(i32),
}

/// Search information reported by an engine.
///
/// Every field is optional; engines send whatever subset they like per line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineInfo {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    pub score: Option<Score>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    /// Time spent in milliseconds.
    pub time: Option<u64>,
    pub multipv: Option<u32>,
    /// Principal variation in long algebraic notation.
    pub pv: Vec<String>,
    /// Free text; consumes the remainder of the line.
    pub string: Option<String>,
}

const KEYWORDS: &[&str] = &[
    "depth",
    "seldepth",
    "time",
    "nodes",
    "pv",
    "multipv",
    "score",
    "currmove",
    "currmovenumber",
    "hashfull",
    "nps",
    "tbhits",
    "sbhits",
    "cpuload",
    "string",
    "refutation",
    "currline",
];

fn is_keyword(token: &str) -> bool {
    KEYWORDS.contains(&token)
}

impl EngineInfo {
    /// Parse an `info ...` line. Returns `None` for any other line.
    ///
    /// Unknown keywords and malformed values are skipped rather than rejected.
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace().peekable();
        if tokens.next()? != "info" {
            return None;
        }

        let mut info = EngineInfo::default();
        while let Some(token) = tokens.next() {
            match token {
                "depth" => info.depth = tokens.next().and_then(|v| v.parse().ok()),
                "seldepth" => info.seldepth = tokens.next().and_then(|v| v.parse().ok()),
                "nodes" => info.nodes = tokens.next().and_then(|v| v.parse().ok()),
                "nps" => info.nps = tokens.next().and_then(|v| v.parse().ok()),
                "time" => info.time = tokens.next().and_then(|v| v.parse().ok()),
                "multipv" => info.multipv = tokens.next().and_then(|v| v.parse().ok()),
                "score" => {
                    let kind = tokens.next();
                    let value = tokens.next().and_then(|v| v.parse().ok());
                    info.score = match (kind, value) {
                        (Some("cp"), Some(cp)) => Some(Score::Cp(cp)),
                        (Some("mate"), Some(n)) => Some(Score::Mate(n)),
                        _ => info.score,
                    };
                    // Bound markers qualify the score; the value itself is kept.
                    while matches!(tokens.peek(), Some(&"lowerbound") | Some(&"upperbound")) {
                        tokens.next();
                    }
                }
                "pv" => {
                    info.pv.clear();
                    while let Some(mv) = tokens.next_if(|t| !is_keyword(t)) {
                        info.pv.push(mv.to_string());
                    }
                }
                "string" => {
                    let rest: Vec<&str> = tokens.by_ref().collect();
                    info.string = Some(rest.join(" "));
                }
                _ => {}
            }
        }
        Some(info)
    }
}
