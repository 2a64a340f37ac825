//! Configuration file loading for review sessions.
//!
//! Settings come from `chess-review.toml`. Every field has a default, so a
//! missing file or an empty one gives a working engine-less setup.

use chess_analysis::Thresholds;
use chess_core::Color;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    /// A value parsed but is not acceptable.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings for one play/review session.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SessionConfig {
    /// UCI engine executable. Without it, engine play and analysis are off.
    #[serde(default)]
    pub engine_path: Option<PathBuf>,
    /// Engine think time per move during play.
    #[serde(default = "default_think_time_ms")]
    pub think_time_ms: u64,
    /// Engine think time per position during analysis.
    #[serde(default = "default_analysis_think_time_ms")]
    pub analysis_think_time_ms: u64,
    /// 0–20; out-of-range values are clamped.
    #[serde(default = "default_skill_level")]
    pub skill_level: i32,
    /// 800–2800. When set the engine plays with limited strength.
    #[serde(default)]
    pub target_elo: Option<u32>,
    /// `"white"`, `"black"` or `"none"`.
    #[serde(default = "default_engine_color")]
    pub engine_color: String,
    /// Minutes per side; 0 disables the clock.
    #[serde(default = "default_clock_minutes")]
    pub clock_minutes: u64,
    #[serde(default)]
    pub thresholds: Thresholds,
}

fn default_think_time_ms() -> u64 {
    500
}

fn default_analysis_think_time_ms() -> u64 {
    800
}

fn default_skill_level() -> i32 {
    8
}

fn default_engine_color() -> String {
    "black".to_string()
}

fn default_clock_minutes() -> u64 {
    10
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            engine_path: None,
            think_time_ms: default_think_time_ms(),
            analysis_think_time_ms: default_analysis_think_time_ms(),
            skill_level: default_skill_level(),
            target_elo: None,
            engine_color: default_engine_color(),
            clock_minutes: default_clock_minutes(),
            thresholds: Thresholds::default(),
        }
    }
}

impl SessionConfig {
    /// Loads the configuration from [`Self::config_path()`].
    ///
    /// If the file does not exist, returns the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::config_path())
    }

    /// Loads the configuration from `path`, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file exists but cannot be read,
    /// [`ConfigError::ParseError`] if the file contains invalid TOML, or
    /// [`ConfigError::Invalid`] for an unknown `engine_color`.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses and validates TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.engine_side()?;
        Ok(config)
    }

    /// Returns `chess-review.toml` in the current working directory.
    pub fn config_path() -> PathBuf {
        PathBuf::from("chess-review.toml")
    }

    /// The color the engine plays, or `None` when both sides are human.
    pub fn engine_side(&self) -> Result<Option<Color>, ConfigError> {
        match self.engine_color.to_ascii_lowercase().as_str() {
            "white" => Ok(Some(Color::White)),
            "black" => Ok(Some(Color::Black)),
            "none" => Ok(None),
            other => Err(ConfigError::Invalid(format!(
                "engine_color must be \"white\", \"black\" or \"none\", got \"{}\"",
                other
            ))),
        }
    }

    pub fn skill_level(&self) -> i32 {
        self.skill_level.clamp(0, 20)
    }

    pub fn target_elo(&self) -> Option<u32> {
        self.target_elo.map(|elo| elo.clamp(800, 2800))
    }

    pub fn think_time(&self) -> Duration {
        Duration::from_millis(self.think_time_ms)
    }

    pub fn analysis_think_time(&self) -> Duration {
        Duration::from_millis(self.analysis_think_time_ms)
    }

    /// Time per side, or `None` when clocks are off.
    pub fn clock(&self) -> Option<Duration> {
        (self.clock_minutes > 0).then(|| Duration::from_secs(self.clock_minutes * 60))
    }
}
