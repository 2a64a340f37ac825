//! Play a game against a UCI engine, then step through it with the engine's
//! verdict on every move.
//!
//! [`Session`] owns the live [`Game`](chess_rules::Game), a background engine
//! worker for the opponent's moves, per-side clocks and, after
//! [`Session::start_analysis`], a review mode that puts the live game aside
//! and restores it unchanged afterwards. Everything the session wants a
//! front end to know arrives as a [`SessionEvent`] on [`Session::events`].

pub mod clock;
pub mod config;
pub mod events;
pub mod pgn;
pub mod review;
pub mod session;
pub mod worker;

pub use clock::GameClock;
pub use config::{ConfigError, SessionConfig};
pub use events::{format_captures, SessionEvent};
pub use pgn::{format_pgn, write_pgn};
pub use review::Review;
pub use session::{Session, SessionError};
pub use worker::{EngineReply, EngineRequest, EngineWorker, SharedEngine};
