//! Load-time data repair.
//!
//! Older saves of single-set matches could keep a finished set while the
//! match itself stayed `pending`. The repair pass completes those matches and
//! records the winner. It never touches the bracket; reseeding is a separate
//! pass that the manager runs afterwards.

use log::info;

use super::models::{Changed, Scoresheet, Tournament};
use super::rules::{ScoringEngine, ScoringRules, SetsRules};

/// Complete single-set matches whose only set is finished but whose status is stale
pub fn repair_stale_single_set_matches(tournament: Tournament) -> Changed<Tournament> {
    let ScoringRules::Sets(rules) = tournament.rules else {
        return Changed::unchanged(tournament);
    };
    if !rules.is_single_set() {
        return Changed::unchanged(tournament);
    }

    let mut tournament = tournament;
    let mut changed = false;

    for m in &mut tournament.matches {
        if repair_sheet(&rules, &mut m.sheet, &m.team1_id, &m.team2_id) {
            info!("Repaired stale single-set match {} in {}", m.id, tournament.id);
            changed = true;
        }
    }
    for m in &mut tournament.knockout_matches {
        let (Some(team1), Some(team2)) = (m.team1_id.as_deref(), m.team2_id.as_deref()) else {
            continue;
        };
        if repair_sheet(&rules, &mut m.sheet, team1, team2) {
            info!("Repaired stale single-set {} match in {}", m.round, tournament.id);
            changed = true;
        }
    }

    Changed {
        value: tournament,
        changed,
    }
}

fn repair_sheet(rules: &SetsRules, sheet: &mut Scoresheet, team1_id: &str, team2_id: &str) -> bool {
    if sheet.is_completed() || sheet.sets.len() != 1 || !rules.is_set_complete(&sheet.sets[0]) {
        return false;
    }
    let winner = rules.decide_winner(sheet, team1_id, team2_id);
    if winner.is_none() {
        return false;
    }
    sheet.complete(winner);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::models::{
        KnockoutMatch, KnockoutRound, Match, MatchStatus, SetScore, Team, TournamentPhase,
        WinnerMode, Winner,
    };
    use crate::tournament::rules::GoalsRules;
    use chrono::Utc;

    fn tournament(rules: ScoringRules, matches: Vec<Match>) -> Tournament {
        Tournament {
            id: "t1".to_string(),
            name: "Open".to_string(),
            teams: vec![Team::new("a", "A"), Team::new("b", "B")],
            matches,
            rules,
            knockout_config: None,
            knockout_matches: Vec::new(),
            phase: TournamentPhase::Group,
            winner_mode: WinnerMode::TableTopper,
            created_at: Utc::now(),
        }
    }

    fn stale(id: &str, score1: u32, score2: u32) -> Match {
        let mut m = Match::new(id, "a", "b");
        m.sheet.sets = vec![SetScore::new(score1, score2)];
        m
    }

    #[test]
    fn test_repairs_stale_pending_single_set() {
        let t = tournament(SetsRules::single_set(21).into(), vec![stale("m1", 21, 18)]);
        let result = repair_stale_single_set_matches(t);
        assert!(result.is_changed());

        let sheet = &result.value.matches[0].sheet;
        assert_eq!(sheet.status, MatchStatus::Completed);
        assert_eq!(sheet.winner, Some(Winner::team("a")));
    }

    #[test]
    fn test_unfinished_set_left_alone() {
        let t = tournament(SetsRules::single_set(21).into(), vec![stale("m1", 15, 12)]);
        let result = repair_stale_single_set_matches(t);
        assert!(!result.is_changed());
        assert_eq!(result.value.matches[0].sheet.status, MatchStatus::Pending);
    }

    #[test]
    fn test_multi_set_and_goals_rules_untouched() {
        let t = tournament(SetsRules::default().into(), vec![stale("m1", 25, 10)]);
        assert!(!repair_stale_single_set_matches(t).is_changed());

        let t = tournament(GoalsRules::default().into(), vec![stale("m1", 25, 10)]);
        assert!(!repair_stale_single_set_matches(t).is_changed());
    }

    #[test]
    fn test_repairs_seeded_knockout_match() {
        let mut t = tournament(SetsRules::single_set(21).into(), Vec::new());
        let mut final_match = KnockoutMatch::seeded("f", KnockoutRound::Final, "a", "b");
        final_match.sheet.sets = vec![SetScore::new(19, 21)];
        t.knockout_matches.push(final_match);

        let repaired = repair_stale_single_set_matches(t).into_inner();
        assert_eq!(repaired.knockout_matches[0].sheet.winner, Some(Winner::team("b")));
    }

    #[test]
    fn test_repair_is_idempotent() {
        let t = tournament(SetsRules::single_set(21).into(), vec![stale("m1", 21, 18)]);
        let once = repair_stale_single_set_matches(t).into_inner();
        assert!(!repair_stale_single_set_matches(once).is_changed());
    }
}
