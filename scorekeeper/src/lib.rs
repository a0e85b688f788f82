//! # Scorekeeper
//!
//! Score tracking for arbitrary games, with round-robin tournaments that can
//! move on into a knockout bracket.
//!
//! Every edit follows one direction: a live-scoring session produces a
//! finished match, the match is patched into its tournament, standings are
//! recomputed from all group results, and the knockout layer uses those
//! standings to decide phase transitions and reseed the bracket. The updated
//! tournament is then committed to the store as a whole.
//!
//! ## Core Modules
//!
//! - [`tournament`]: Models, standings, knockout progression and the manager
//! - [`live`]: Undo-capable live scoring with drafts and auto-completion
//! - [`store`]: Whole-object key-value persistence
//!
//! ## Example
//!
//! ```
//! use scorekeeper::tournament::{GoalsRules, Match, MatchStatus, Team, calculate_goals_standings};
//!
//! let teams = vec![Team::new("a", "Ants"), Team::new("b", "Bees")];
//! let mut result = Match::new("m1", "a", "b");
//! result.sheet.score1 = Some(3);
//! result.sheet.score2 = Some(1);
//! result.sheet.status = MatchStatus::Completed;
//!
//! let table = calculate_goals_standings(&teams, &[result], &GoalsRules::football());
//! assert_eq!(table[0].team_id, "a");
//! assert_eq!(table[0].points, 3);
//! ```

/// Live scoring sessions.
pub mod live;

/// Tournament persistence.
pub mod store;

/// Tournament models and progression engine.
pub mod tournament;

pub use live::{LiveScoreSession, ScoreFormat, SessionConfig};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, TournamentStore};
pub use tournament::{Tournament, TournamentManager};
