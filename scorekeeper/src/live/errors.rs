//! Live session error types.

use thiserror::Error;

/// Rejected scoring actions. Messages are written for the person holding the scoreboard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("This match is already finished")]
    AlreadyCompleted,

    #[error("Time is up: the {limit_secs}s limit has elapsed")]
    TimeLimitReached { limit_secs: u64 },

    #[error("Draws are not allowed in this sport. Play on until one side leads.")]
    DrawNotAllowed,
}

/// Result type for live session operations
pub type SessionResult<T> = Result<T, SessionError>;
