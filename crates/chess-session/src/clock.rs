//! Per-side game clocks.

use chess_core::Color;
use std::time::Duration;

/// Remaining time for both sides. A disabled clock never runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameClock {
    initial: Option<Duration>,
    remaining: [Duration; 2],
}

impl GameClock {
    pub fn new(per_side: Duration) -> Self {
        Self {
            initial: Some(per_side),
            remaining: [per_side; 2],
        }
    }

    pub fn disabled() -> Self {
        Self {
            initial: None,
            remaining: [Duration::ZERO; 2],
        }
    }

    /// Clock from an optional time control.
    pub fn from_limit(per_side: Option<Duration>) -> Self {
        per_side.map_or_else(Self::disabled, Self::new)
    }

    pub fn is_enabled(&self) -> bool {
        self.initial.is_some()
    }

    pub fn remaining(&self, color: Color) -> Duration {
        self.remaining[color.index()]
    }

    /// Charge `elapsed` to `color`. Returns true if that side's flag fell.
    pub fn consume(&mut self, color: Color, elapsed: Duration) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let slot = &mut self.remaining[color.index()];
        *slot = slot.saturating_sub(elapsed);
        slot.is_zero()
    }

    /// Both sides back to the full allowance.
    pub fn reset(&mut self) {
        if let Some(initial) = self.initial {
            self.remaining = [initial; 2];
        }
    }

    /// `mm:ss`, or `--:--` when disabled.
    pub fn display(&self, color: Color) -> String {
        if !self.is_enabled() {
            return "--:--".to_string();
        }
        let secs = self.remaining(color).as_secs();
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}
