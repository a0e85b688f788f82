//! Scoring rule variants.
//!
//! Each sport family is one variant of [`ScoringRules`], chosen when the
//! tournament is created and dispatched through [`ScoringEngine`] with
//! `enum_dispatch`, so no code branches on an engine name at runtime.

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::models::{Match, Scoresheet, SetScore, Team, Winner};
use super::standings::{
    StandingsRow, calculate_cricket_standings, calculate_goals_standings, calculate_sets_standings,
};

/// Contract every scoring family implements
#[enum_dispatch]
pub trait ScoringEngine {
    /// Ranked table computed from the group matches
    #[must_use]
    fn standings(&self, teams: &[Team], matches: &[Match]) -> Vec<StandingsRow>;

    /// Winner implied by a scoresheet, or `None` when the result is not decisive yet
    fn decide_winner(&self, sheet: &Scoresheet, team1_id: &str, team2_id: &str) -> Option<Winner>;

    /// Whether a level result is an acceptable final outcome
    fn draw_allowed(&self) -> bool;

    fn engine_name(&self) -> &'static str;
}

/// Closed set of scoring families
#[enum_dispatch(ScoringEngine)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "engine", rename_all = "kebab-case")]
pub enum ScoringRules {
    Sets(SetsRules),
    Goals(GoalsRules),
    #[serde(rename = "custom-cricket")]
    Cricket(CricketRules),
}

impl Default for ScoringRules {
    fn default() -> Self {
        ScoringRules::Goals(GoalsRules::default())
    }
}

/// Volleyball, badminton, table tennis and the like
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetsRules {
    /// Maximum sets in a match (1, 3, 5)
    pub best_of: u32,
    /// Points needed to take a set
    pub points_per_set: u32,
    /// Winning margin required to close a set
    pub win_by: u32,
    /// Match points for a match win
    pub win_points: u32,
}

impl Default for SetsRules {
    fn default() -> Self {
        Self {
            best_of: 3,
            points_per_set: 25,
            win_by: 2,
            win_points: 2,
        }
    }
}

impl SetsRules {
    /// Badminton-style single game to 21
    pub fn single_set(points_per_set: u32) -> Self {
        Self {
            best_of: 1,
            points_per_set,
            ..Self::default()
        }
    }

    pub const fn sets_to_win(&self) -> u32 {
        self.best_of / 2 + 1
    }

    pub const fn is_single_set(&self) -> bool {
        self.best_of == 1
    }

    /// A set is finished once the leader reached the target with the required margin
    pub fn is_set_complete(&self, set: &SetScore) -> bool {
        let (high, low) = if set.score1 >= set.score2 {
            (set.score1, set.score2)
        } else {
            (set.score2, set.score1)
        };
        high >= self.points_per_set && high - low >= self.win_by.max(1)
    }
}

impl ScoringEngine for SetsRules {
    fn standings(&self, teams: &[Team], matches: &[Match]) -> Vec<StandingsRow> {
        calculate_sets_standings(teams, matches, self)
    }

    fn decide_winner(&self, sheet: &Scoresheet, team1_id: &str, team2_id: &str) -> Option<Winner> {
        let (won1, won2) = sheet
            .sets
            .iter()
            .fold((0u32, 0u32), |(w1, w2), set| match set.score1.cmp(&set.score2) {
                Ordering::Greater => (w1 + 1, w2),
                Ordering::Less => (w1, w2 + 1),
                Ordering::Equal => (w1, w2),
            });
        let needed = self.sets_to_win();
        if won1 >= needed && won1 > won2 {
            Some(Winner::team(team1_id))
        } else if won2 >= needed && won2 > won1 {
            Some(Winner::team(team2_id))
        } else {
            None
        }
    }

    fn draw_allowed(&self) -> bool {
        false
    }

    fn engine_name(&self) -> &'static str {
        "sets"
    }
}

/// Football, hockey, basketball and anything else tallied as two scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalsRules {
    pub win_points: u32,
    pub draw_points: u32,
    pub loss_points: u32,
    pub draw_allowed: bool,
}

impl Default for GoalsRules {
    fn default() -> Self {
        Self {
            win_points: 2,
            draw_points: 1,
            loss_points: 0,
            draw_allowed: true,
        }
    }
}

impl GoalsRules {
    /// Three points for a win, one for a draw
    pub fn football() -> Self {
        Self {
            win_points: 3,
            ..Self::default()
        }
    }

    /// Level games are settled by a shoot-out recorded as the winner
    pub fn shootout() -> Self {
        Self {
            draw_allowed: false,
            ..Self::default()
        }
    }
}

impl ScoringEngine for GoalsRules {
    fn standings(&self, teams: &[Team], matches: &[Match]) -> Vec<StandingsRow> {
        calculate_goals_standings(teams, matches, self)
    }

    fn decide_winner(&self, sheet: &Scoresheet, team1_id: &str, team2_id: &str) -> Option<Winner> {
        let (score1, score2) = sheet.scores()?;
        match score1.cmp(&score2) {
            Ordering::Greater => Some(Winner::team(team1_id)),
            Ordering::Less => Some(Winner::team(team2_id)),
            Ordering::Equal => match sheet.winner.as_ref().and_then(Winner::team_id) {
                Some(id) if id == team1_id || id == team2_id => Some(Winner::team(id.as_str())),
                _ if self.draw_allowed => Some(Winner::Draw),
                _ => None,
            },
        }
    }

    fn draw_allowed(&self) -> bool {
        self.draw_allowed
    }

    fn engine_name(&self) -> &'static str {
        "goals"
    }
}

/// Limited-overs cricket with net run rate tie-breaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CricketRules {
    pub overs_per_innings: u32,
    /// Wickets that end an innings
    pub wickets_per_innings: u32,
    pub win_points: u32,
    pub tie_points: u32,
    pub no_result_points: u32,
}

impl Default for CricketRules {
    fn default() -> Self {
        Self {
            overs_per_innings: 20,
            wickets_per_innings: 10,
            win_points: 2,
            tie_points: 1,
            no_result_points: 1,
        }
    }
}

impl CricketRules {
    pub const fn balls_per_innings(&self) -> u32 {
        self.overs_per_innings * 6
    }
}

impl ScoringEngine for CricketRules {
    fn standings(&self, teams: &[Team], matches: &[Match]) -> Vec<StandingsRow> {
        calculate_cricket_standings(teams, matches, self)
    }

    fn decide_winner(&self, sheet: &Scoresheet, team1_id: &str, team2_id: &str) -> Option<Winner> {
        let innings = sheet.innings.as_ref()?;
        if innings.no_result {
            return None;
        }
        Some(match innings.team1.runs.cmp(&innings.team2.runs) {
            Ordering::Greater => Winner::team(team1_id),
            Ordering::Less => Winner::team(team2_id),
            Ordering::Equal => Winner::Tie,
        })
    }

    fn draw_allowed(&self) -> bool {
        true
    }

    fn engine_name(&self) -> &'static str {
        "custom-cricket"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::models::{CricketInnings, CricketScore};

    fn sheet_with_sets(sets: &[(u32, u32)]) -> Scoresheet {
        Scoresheet {
            sets: sets.iter().map(|&(a, b)| SetScore::new(a, b)).collect(),
            ..Scoresheet::default()
        }
    }

    #[test]
    fn test_rules_tagged_by_engine() {
        let rules = ScoringRules::from(GoalsRules::football());
        let json = serde_json::to_value(&rules).unwrap();
        assert_eq!(json["engine"], "goals");
        assert_eq!(json["winPoints"], 3);

        let cricket = serde_json::to_value(ScoringRules::from(CricketRules::default())).unwrap();
        assert_eq!(cricket["engine"], "custom-cricket");

        let back: ScoringRules = serde_json::from_value(json).unwrap();
        assert_eq!(back.engine_name(), "goals");
    }

    #[test]
    fn test_sets_winner_needs_majority_of_best_of() {
        let rules = SetsRules::default();
        assert_eq!(
            rules.decide_winner(&sheet_with_sets(&[(25, 20), (25, 18)]), "a", "b"),
            Some(Winner::team("a"))
        );
        assert_eq!(
            rules.decide_winner(&sheet_with_sets(&[(25, 20), (18, 25)]), "a", "b"),
            None
        );
        assert_eq!(
            rules.decide_winner(&sheet_with_sets(&[(20, 25), (25, 23), (10, 15)]), "a", "b"),
            Some(Winner::team("b"))
        );
    }

    #[test]
    fn test_set_completion_margin() {
        let rules = SetsRules::single_set(21);
        assert!(rules.is_set_complete(&SetScore::new(21, 18)));
        assert!(!rules.is_set_complete(&SetScore::new(21, 20)));
        assert!(rules.is_set_complete(&SetScore::new(20, 22)));
        assert!(!rules.is_set_complete(&SetScore::new(15, 10)));
    }

    #[test]
    fn test_goals_draw_and_shootout() {
        let level = Scoresheet {
            score1: Some(1),
            score2: Some(1),
            ..Scoresheet::default()
        };
        assert_eq!(
            GoalsRules::default().decide_winner(&level, "a", "b"),
            Some(Winner::Draw)
        );
        assert_eq!(GoalsRules::shootout().decide_winner(&level, "a", "b"), None);

        let shootout = Scoresheet {
            winner: Some(Winner::team("b")),
            ..level
        };
        assert_eq!(
            GoalsRules::shootout().decide_winner(&shootout, "a", "b"),
            Some(Winner::team("b"))
        );
    }

    #[test]
    fn test_goals_needs_both_scores() {
        let half = Scoresheet {
            score1: Some(2),
            ..Scoresheet::default()
        };
        assert_eq!(GoalsRules::default().decide_winner(&half, "a", "b"), None);
    }

    #[test]
    fn test_cricket_tie_and_no_result() {
        let rules = CricketRules::default();
        let mut sheet = Scoresheet {
            innings: Some(CricketScore {
                team1: CricketInnings::new(150, 6, 120),
                team2: CricketInnings::new(150, 9, 120),
                no_result: false,
            }),
            ..Scoresheet::default()
        };
        assert_eq!(rules.decide_winner(&sheet, "a", "b"), Some(Winner::Tie));

        if let Some(innings) = sheet.innings.as_mut() {
            innings.no_result = true;
        }
        assert_eq!(rules.decide_winner(&sheet, "a", "b"), None);
    }
}
