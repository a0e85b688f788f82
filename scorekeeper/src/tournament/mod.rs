//! Tournament module for round-robin groups and knockout brackets.
//!
//! This module provides tournament management functionality including:
//! - Round-robin fixture generation
//! - Standings for sets, goals and cricket scoring
//! - One-shot knockout seeding from the final group table
//! - Bracket reseeding (and rollback) as semi-final results change
//! - Completion detection and champion resolution
//!
//! ## Example
//!
//! ```
//! use scorekeeper::store::{MemoryStore, TournamentStore};
//! use scorekeeper::tournament::{
//!     GoalsRules, KnockoutConfig, NewTournament, Team, TournamentManager, WinnerMode,
//! };
//!
//! let store = TournamentStore::new(MemoryStore::default());
//! let mut manager = TournamentManager::load(store, "football").unwrap();
//!
//! let id = manager
//!     .create_tournament(NewTournament {
//!         name: "Sunday League".to_string(),
//!         teams: vec![
//!             Team::new("red", "Red"),
//!             Team::new("blue", "Blue"),
//!             Team::new("green", "Green"),
//!         ],
//!         rules: GoalsRules::football().into(),
//!         knockout_config: Some(KnockoutConfig::new(2, false)),
//!         winner_mode: WinnerMode::Knockouts,
//!     })
//!     .unwrap();
//!
//! assert_eq!(manager.get_tournament(&id).unwrap().matches.len(), 3);
//! ```

pub mod knockout;
pub mod manager;
pub mod models;
pub mod repair;
pub mod rules;
pub mod schedule;
pub mod standings;

pub use knockout::{
    get_tournament_winner, initialize_knockout_stage, is_group_stage_complete,
    is_tournament_complete, update_knockout_bracket,
};
pub use manager::{
    NewTournament, TournamentError, TournamentManager, TournamentProgress, TournamentResult,
};
pub use models::{
    Changed, CricketInnings, CricketScore, DraftState, HistoryEntry, KnockoutConfig,
    KnockoutMatch, KnockoutRound, Match, MatchId, MatchStatus, ScorePair, Scoresheet, SetScore,
    Side, Team, TeamId, Tournament, TournamentId, TournamentPhase, Winner, WinnerMode,
};
pub use repair::repair_stale_single_set_matches;
pub use rules::{CricketRules, GoalsRules, ScoringEngine, ScoringRules, SetsRules};
pub use schedule::generate_round_robin;
pub use standings::{
    StandingsRow, calculate_cricket_standings, calculate_goals_standings, calculate_sets_standings,
};
