//! Group-to-knockout phase transitions and bracket seeding.
//!
//! These functions run opportunistically after every edit, so none of them
//! fail: a missing config, a short roster or an already seeded bracket all
//! hand the input back unchanged.

use log::{debug, info};
use uuid::Uuid;

use super::models::{
    Changed, KnockoutMatch, KnockoutRound, Match, MatchStatus, Team, TeamId, Tournament,
    TournamentPhase, WinnerMode,
};
use super::standings::StandingsRow;

/// True once there is at least one group match and every one is completed
pub fn is_group_stage_complete(matches: &[Match]) -> bool {
    !matches.is_empty() && matches.iter().all(|m| m.sheet.status == MatchStatus::Completed)
}

fn find_round(matches: &[KnockoutMatch], round: KnockoutRound) -> Option<&KnockoutMatch> {
    matches.iter().find(|m| m.round == round)
}

fn new_match_id() -> String {
    Uuid::new_v4().to_string()
}

/// Seed the knockout bracket from the ranked standings and enter the knockout phase.
///
/// One-shot: once knockout matches exist the tournament is returned untouched,
/// even if the standings have moved since.
pub fn initialize_knockout_stage(
    tournament: Tournament,
    standings: &[StandingsRow],
) -> Changed<Tournament> {
    let Some(config) = tournament.knockout_config else {
        debug!("Tournament {} has no knockout stage configured", tournament.id);
        return Changed::unchanged(tournament);
    };
    if !tournament.knockout_matches.is_empty() {
        debug!("Tournament {} bracket already seeded", tournament.id);
        return Changed::unchanged(tournament);
    }
    let advancing = usize::from(config.teams_advancing);
    if !config.is_valid() || standings.len() < advancing {
        debug!(
            "Tournament {} cannot seed {} teams from {} standings rows",
            tournament.id,
            advancing,
            standings.len()
        );
        return Changed::unchanged(tournament);
    }

    let seeds: Vec<TeamId> = standings
        .iter()
        .take(advancing)
        .map(|row| row.team_id.clone())
        .collect();

    let bracket = if advancing == 2 {
        vec![KnockoutMatch::seeded(
            new_match_id(),
            KnockoutRound::Final,
            seeds[0].clone(),
            seeds[1].clone(),
        )]
    } else {
        let mut bracket = vec![
            KnockoutMatch::seeded(
                new_match_id(),
                KnockoutRound::Semi1,
                seeds[0].clone(),
                seeds[3].clone(),
            ),
            KnockoutMatch::seeded(
                new_match_id(),
                KnockoutRound::Semi2,
                seeds[1].clone(),
                seeds[2].clone(),
            ),
            KnockoutMatch::tbd(new_match_id(), KnockoutRound::Final),
        ];
        if config.has_third_place() {
            bracket.push(KnockoutMatch::tbd(new_match_id(), KnockoutRound::ThirdPlace));
        }
        bracket
    };

    info!(
        "Tournament {} entering knockout stage with seeds {:?}",
        tournament.id, seeds
    );

    let mut tournament = tournament;
    tournament.knockout_matches = bracket;
    tournament.phase = TournamentPhase::Knockout;
    Changed::updated(tournament)
}

/// Propagate semi-final results into the final and third-place slots.
///
/// With both semis decided, the final gets the two winners and the
/// third-place match the two losers, semi-1's side first. When a semi is no
/// longer decided, any pending match still holding propagated teams is
/// emptied again. Matches that have left `pending` are never touched.
pub fn update_knockout_bracket(knockout_matches: Vec<KnockoutMatch>) -> Changed<Vec<KnockoutMatch>> {
    let semi1 = find_round(&knockout_matches, KnockoutRound::Semi1);
    let semi2 = find_round(&knockout_matches, KnockoutRound::Semi2);
    let (Some(semi1), Some(semi2)) = (semi1, semi2) else {
        return Changed::unchanged(knockout_matches);
    };

    let results = semi1.decided().zip(semi2.decided());
    let finalists = results
        .as_ref()
        .map(|((w1, _), (w2, _))| (w1.clone(), w2.clone()));
    let third_place = results.map(|((_, l1), (_, l2))| (l1, l2));

    let mut knockout_matches = knockout_matches;
    let mut changed = false;
    for m in &mut knockout_matches {
        let target = match m.round {
            KnockoutRound::Final => finalists.clone(),
            KnockoutRound::ThirdPlace => third_place.clone(),
            KnockoutRound::Semi1 | KnockoutRound::Semi2 => continue,
        };
        if m.sheet.status != MatchStatus::Pending {
            continue;
        }

        match target {
            Some((team1, team2)) => {
                if m.team1_id.as_ref() != Some(&team1) || m.team2_id.as_ref() != Some(&team2) {
                    info!("Seeding {} with {} vs {}", m.round, team1, team2);
                    m.team1_id = Some(team1);
                    m.team2_id = Some(team2);
                    changed = true;
                }
            }
            None => {
                if m.has_any_team() {
                    info!("Semi-final result cleared, resetting {} to TBD", m.round);
                    m.team1_id = None;
                    m.team2_id = None;
                    changed = true;
                }
            }
        }
    }

    Changed {
        value: knockout_matches,
        changed,
    }
}

/// Whether the tournament has produced its champion.
///
/// Table-topper tournaments finish with the group stage. Knockout
/// tournaments need the final, plus the third-place match when configured.
pub fn is_tournament_complete(tournament: &Tournament) -> bool {
    match tournament.winner_mode {
        WinnerMode::TableTopper => is_group_stage_complete(&tournament.matches),
        WinnerMode::Knockouts => {
            let completed = |round| {
                tournament
                    .knockout_match(round)
                    .is_some_and(|m| m.sheet.is_completed())
            };
            let needs_third = tournament
                .knockout_config
                .is_some_and(|c| c.has_third_place());
            completed(KnockoutRound::Final) && (!needs_third || completed(KnockoutRound::ThirdPlace))
        }
    }
}

/// The champion.
///
/// For table-topper tournaments this is the first standings row once the
/// group stage is complete; the caller supplies the standings. For knockout
/// tournaments it is the recorded winner of the completed final.
pub fn get_tournament_winner<'a>(
    tournament: &'a Tournament,
    standings: &[StandingsRow],
) -> Option<&'a Team> {
    match tournament.winner_mode {
        WinnerMode::TableTopper => {
            if !is_tournament_complete(tournament) {
                return None;
            }
            standings.first().and_then(|row| tournament.team(&row.team_id))
        }
        WinnerMode::Knockouts => {
            let final_match = tournament.knockout_match(KnockoutRound::Final)?;
            if !final_match.sheet.is_completed() {
                return None;
            }
            let winner = final_match.sheet.winner.as_ref()?.team_id()?;
            tournament.team(winner)
        }
    }
}
