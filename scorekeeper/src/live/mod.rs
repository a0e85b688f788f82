//! Live scoring module for entering one match's result as it is played.
//!
//! This module provides:
//! - Incremental score changes with a 150 ms double-tap debounce
//! - A bounded, global undo log across both sides
//! - Draft snapshots that let an interrupted edit resume later
//! - Automatic completion on a points target or a time limit
//!
//! ## Example
//!
//! ```
//! use scorekeeper::live::{LiveScoreSession, ScoreFormat, ScoreOutcome, SessionConfig};
//! use scorekeeper::tournament::Side;
//!
//! let mut session = LiveScoreSession::new(ScoreFormat::first_to(1), SessionConfig::default());
//! let outcome = session.add_score(Side::One, 1).unwrap();
//! assert!(matches!(outcome, ScoreOutcome::Completed(_)));
//! ```

pub mod clock;
pub mod config;
pub mod errors;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ScoreFormat, SessionConfig};
pub use errors::{SessionError, SessionResult};
pub use session::{
    CompletionTrigger, LiveScoreSession, MatchCompletion, Outcome, ScoreOutcome,
};
