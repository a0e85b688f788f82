//! Live scoring configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Session tuning shared by every live-scoring session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Minimum gap between two scoring actions; closer taps are dropped
    pub debounce_ms: u64,

    /// Undo entries kept in memory (oldest dropped first)
    pub history_limit: usize,

    /// Undo entries carried into a saved draft
    pub draft_history_limit: usize,

    /// Pause between an automatic completion and persisting it, so the
    /// front end can play its celebration. Zero is valid.
    pub completion_delay_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 150,
            history_limit: 100,
            draft_history_limit: 50,
            completion_delay_ms: 600,
        }
    }
}

impl SessionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.history_limit == 0 {
            return Err("History limit must be at least 1".to_string());
        }

        if self.draft_history_limit > self.history_limit {
            return Err("Draft history limit cannot exceed the history limit".to_string());
        }

        if self.completion_delay_ms > 10_000 {
            return Err("Completion delay must be at most 10 seconds".to_string());
        }

        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn completion_delay(&self) -> Duration {
        Duration::from_millis(self.completion_delay_ms)
    }
}

/// How a single match is scored and when it finishes on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreFormat {
    /// First side to reach this total wins
    pub points_target: Option<i32>,

    /// Match ends when this many seconds of play have elapsed
    pub time_limit_secs: Option<u64>,

    /// Whether a level final score is acceptable
    pub draw_allowed: bool,

    /// Keep running totals from dropping below zero
    pub floor_at_zero: bool,
}

impl Default for ScoreFormat {
    fn default() -> Self {
        Self::open(true)
    }
}

impl ScoreFormat {
    /// No automatic completion; finish explicitly
    pub const fn open(draw_allowed: bool) -> Self {
        Self {
            points_target: None,
            time_limit_secs: None,
            draw_allowed,
            floor_at_zero: false,
        }
    }

    /// First to `target` points
    pub const fn first_to(target: i32) -> Self {
        Self {
            points_target: Some(target),
            time_limit_secs: None,
            draw_allowed: false,
            floor_at_zero: false,
        }
    }

    /// Fixed playing time
    pub const fn timed(limit_secs: u64, draw_allowed: bool) -> Self {
        Self {
            points_target: None,
            time_limit_secs: Some(limit_secs),
            draw_allowed,
            floor_at_zero: false,
        }
    }

    pub const fn with_floor_at_zero(mut self) -> Self {
        self.floor_at_zero = true;
        self
    }
}
