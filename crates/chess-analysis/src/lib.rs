//! Post-game analysis against an external UCI engine.
//!
//! This crate drives an engine process over UCI and uses it to classify
//! every move of a finished game.
//!
//! # Overview
//!
//! - [`EngineBridge`] - One engine subprocess behind a request lock
//! - [`PositionAnalyzer`] - What the analyzer needs from an engine
//! - [`AnalysisResult`] - Best move, score and principal variation for a position
//! - [`GameAnalyzer`] - Replays a game and produces an [`AnalysisEntry`] per ply
//! - [`format_report`] - Text review of a [`GameAnalysis`]
//!
//! # Example
//!
//! ```ignore
//! use chess_analysis::{format_report, GameAnalyzer};
//! use std::time::Duration;
//!
//! let analyzer = GameAnalyzer::launch(Some("/usr/bin/stockfish".as_ref()), Duration::from_millis(800))?;
//! let analysis = analyzer.analyze_game(&["e2e4".to_string(), "e7e5".to_string()])?;
//! for line in format_report(&analysis) {
//!     println!("{line}");
//! }
//! ```

pub mod analyzer;
pub mod engine;
pub mod evaluation;
pub mod quality;
pub mod report;

pub use analyzer::{AnalysisEntry, AnalyzerError, GameAnalysis, GameAnalyzer, Summary};
pub use engine::{BridgeState, EngineBridge, EngineError, PositionAnalyzer, MAX_UCI_LINES};
pub use evaluation::AnalysisResult;
pub use quality::{QualityTag, Severity, Thresholds};
pub use report::{format_entry, format_report};
