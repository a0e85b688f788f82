//! Standings tables computed from raw match results.
//!
//! All functions here are pure. Rows start out in roster order and are
//! ordered with a stable sort, so teams that are level on every criterion
//! keep their roster order and identical input always yields identical output.

use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::HashMap};

use super::models::{Match, MatchStatus, Side, Team, TeamId, Winner};
use super::rules::{CricketRules, GoalsRules, SetsRules};

/// One team's line in the table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsRow {
    pub team_id: TeamId,
    pub team_name: String,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub no_result: u32,
    /// Match points
    pub points: u32,
    /// Goals, rally points or runs scored
    pub points_for: i64,
    pub points_against: i64,
    pub sets_won: u32,
    pub sets_lost: u32,
    pub balls_faced: u32,
    pub balls_bowled: u32,
}

impl StandingsRow {
    fn new(team: &Team) -> Self {
        Self {
            team_id: team.id.clone(),
            team_name: team.name.clone(),
            ..Self::default()
        }
    }

    pub fn goal_difference(&self) -> i64 {
        self.points_for - self.points_against
    }

    pub fn set_difference(&self) -> i64 {
        i64::from(self.sets_won) - i64::from(self.sets_lost)
    }

    /// Runs per over scored minus runs per over conceded
    pub fn net_run_rate(&self) -> f64 {
        rate(self.points_for, self.balls_faced) - rate(self.points_against, self.balls_bowled)
    }
}

fn rate(runs: i64, balls: u32) -> f64 {
    if balls == 0 {
        0.0
    } else {
        runs as f64 * 6.0 / f64::from(balls)
    }
}

/// Rows keyed by team id while results are accumulated
struct Table<'a> {
    rows: Vec<StandingsRow>,
    index: HashMap<&'a str, usize>,
}

impl<'a> Table<'a> {
    fn new(teams: &'a [Team]) -> Self {
        let mut index = HashMap::with_capacity(teams.len());
        let mut rows = Vec::with_capacity(teams.len());
        for team in teams {
            // First roster entry wins if an id is duplicated
            if index.contains_key(team.id.as_str()) {
                continue;
            }
            index.insert(team.id.as_str(), rows.len());
            rows.push(StandingsRow::new(team));
        }
        Self { rows, index }
    }

    /// Row indices for both sides; `None` if either team is not on the roster
    fn pair(&self, m: &Match) -> Option<(usize, usize)> {
        let one = *self.index.get(m.team1_id.as_str())?;
        let two = *self.index.get(m.team2_id.as_str())?;
        (one != two).then_some((one, two))
    }

    fn record_win(&mut self, winner: usize, loser: usize, win_points: u32, loss_points: u32) {
        self.rows[winner].won += 1;
        self.rows[winner].points += win_points;
        self.rows[loser].lost += 1;
        self.rows[loser].points += loss_points;
    }

    fn into_sorted(mut self, compare: impl Fn(&StandingsRow, &StandingsRow) -> Ordering) -> Vec<StandingsRow> {
        self.rows.sort_by(compare);
        self.rows
    }
}

/// Standings for sets-based sports.
///
/// Only completed matches with at least one recorded set count. The side that
/// took more of the recorded sets wins the match; level sets count toward
/// rally points but not toward either side's set tally.
pub fn calculate_sets_standings(
    teams: &[Team],
    matches: &[Match],
    rules: &SetsRules,
) -> Vec<StandingsRow> {
    let mut table = Table::new(teams);

    for m in matches
        .iter()
        .filter(|m| m.sheet.status == MatchStatus::Completed && !m.sheet.sets.is_empty())
    {
        let Some((one, two)) = table.pair(m) else {
            continue;
        };

        let mut sets1 = 0u32;
        let mut sets2 = 0u32;
        for set in &m.sheet.sets {
            table.rows[one].points_for += i64::from(set.score1);
            table.rows[one].points_against += i64::from(set.score2);
            table.rows[two].points_for += i64::from(set.score2);
            table.rows[two].points_against += i64::from(set.score1);
            match set.winner() {
                Some(Side::One) => sets1 += 1,
                Some(Side::Two) => sets2 += 1,
                None => {}
            }
        }

        table.rows[one].played += 1;
        table.rows[two].played += 1;
        table.rows[one].sets_won += sets1;
        table.rows[one].sets_lost += sets2;
        table.rows[two].sets_won += sets2;
        table.rows[two].sets_lost += sets1;

        match sets1.cmp(&sets2) {
            Ordering::Greater => table.record_win(one, two, rules.win_points, 0),
            Ordering::Less => table.record_win(two, one, rules.win_points, 0),
            Ordering::Equal => {}
        }
    }

    table.into_sorted(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.set_difference().cmp(&a.set_difference()))
            .then_with(|| b.goal_difference().cmp(&a.goal_difference()))
    })
}

/// Standings for sports tallied as two integer scores.
///
/// A match counts once both scores are present and it has left `pending`.
/// Level scores give draw points only when draws are allowed; otherwise a
/// team winner recorded on the match (a shoot-out) takes the win.
pub fn calculate_goals_standings(
    teams: &[Team],
    matches: &[Match],
    rules: &GoalsRules,
) -> Vec<StandingsRow> {
    let mut table = Table::new(teams);

    for m in matches.iter().filter(|m| !m.sheet.is_pending()) {
        let Some((score1, score2)) = m.sheet.scores() else {
            continue;
        };
        let Some((one, two)) = table.pair(m) else {
            continue;
        };

        table.rows[one].played += 1;
        table.rows[two].played += 1;
        table.rows[one].points_for += i64::from(score1);
        table.rows[one].points_against += i64::from(score2);
        table.rows[two].points_for += i64::from(score2);
        table.rows[two].points_against += i64::from(score1);

        match score1.cmp(&score2) {
            Ordering::Greater => table.record_win(one, two, rules.win_points, rules.loss_points),
            Ordering::Less => table.record_win(two, one, rules.win_points, rules.loss_points),
            Ordering::Equal => {
                let shootout = m.sheet.winner.as_ref().and_then(Winner::team_id);
                match shootout {
                    Some(id) if *id == m.team1_id => {
                        table.record_win(one, two, rules.win_points, rules.loss_points)
                    }
                    Some(id) if *id == m.team2_id => {
                        table.record_win(two, one, rules.win_points, rules.loss_points)
                    }
                    _ if rules.draw_allowed => {
                        table.rows[one].drawn += 1;
                        table.rows[two].drawn += 1;
                        table.rows[one].points += rules.draw_points;
                        table.rows[two].points += rules.draw_points;
                    }
                    _ => {}
                }
            }
        }
    }

    table.into_sorted(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.goal_difference().cmp(&a.goal_difference()))
            .then_with(|| b.points_for.cmp(&a.points_for))
    })
}

/// Standings for limited-overs cricket, tie-broken on net run rate.
///
/// An all-out innings counts as having faced the full over quota.
pub fn calculate_cricket_standings(
    teams: &[Team],
    matches: &[Match],
    rules: &CricketRules,
) -> Vec<StandingsRow> {
    let mut table = Table::new(teams);
    let quota = rules.balls_per_innings();
    let balls_used = |wickets: u32, balls: u32| {
        if wickets >= rules.wickets_per_innings {
            quota
        } else {
            balls
        }
    };

    for m in matches.iter().filter(|m| m.sheet.is_completed()) {
        let Some(innings) = m.sheet.innings.as_ref() else {
            continue;
        };
        let Some((one, two)) = table.pair(m) else {
            continue;
        };

        table.rows[one].played += 1;
        table.rows[two].played += 1;

        if innings.no_result {
            for idx in [one, two] {
                table.rows[idx].no_result += 1;
                table.rows[idx].points += rules.no_result_points;
            }
            continue;
        }

        let faced1 = balls_used(innings.team1.wickets, innings.team1.balls);
        let faced2 = balls_used(innings.team2.wickets, innings.team2.balls);
        table.rows[one].points_for += i64::from(innings.team1.runs);
        table.rows[one].points_against += i64::from(innings.team2.runs);
        table.rows[one].balls_faced += faced1;
        table.rows[one].balls_bowled += faced2;
        table.rows[two].points_for += i64::from(innings.team2.runs);
        table.rows[two].points_against += i64::from(innings.team1.runs);
        table.rows[two].balls_faced += faced2;
        table.rows[two].balls_bowled += faced1;

        match innings.team1.runs.cmp(&innings.team2.runs) {
            Ordering::Greater => table.record_win(one, two, rules.win_points, 0),
            Ordering::Less => table.record_win(two, one, rules.win_points, 0),
            Ordering::Equal => {
                for idx in [one, two] {
                    table.rows[idx].drawn += 1;
                    table.rows[idx].points += rules.tie_points;
                }
            }
        }
    }

    table.into_sorted(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.net_run_rate().total_cmp(&a.net_run_rate()))
            .then_with(|| b.won.cmp(&a.won))
    })
}
