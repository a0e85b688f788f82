//! Subcommand implementations.

use anyhow::{Context, Error, anyhow, bail};
use chrono::Local;
use log::{debug, info};
use pico_args::Arguments;
use scorekeeper::{
    live::{Clock, LiveScoreSession, MatchCompletion, ScoreFormat, ScoreOutcome},
    store::JsonFileStore,
    tournament::{
        CricketInnings, CricketRules, CricketScore, GoalsRules, KnockoutConfig, MatchId,
        NewTournament, ScoringEngine, ScoringRules, Scoresheet, SetScore, SetsRules, Side,
        StandingsRow, Team, Tournament, TournamentManager, Winner, WinnerMode,
    },
};
use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

pub type Manager = TournamentManager<JsonFileStore>;

/// Team id derived from its display name: "Red Lions" becomes "red-lions"
fn slug(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn short(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn parse_rules(
    engine: &str,
    best_of: Option<u32>,
    points: Option<u32>,
    overs: Option<u32>,
) -> Result<ScoringRules, Error> {
    let rules = match engine {
        "goals" => GoalsRules::default().into(),
        "football" => GoalsRules::football().into(),
        "shootout" => GoalsRules::shootout().into(),
        "sets" => {
            let defaults = SetsRules::default();
            SetsRules {
                best_of: best_of.unwrap_or(defaults.best_of),
                points_per_set: points.unwrap_or(defaults.points_per_set),
                ..defaults
            }
            .into()
        }
        "cricket" => CricketRules {
            overs_per_innings: overs.unwrap_or(20),
            ..CricketRules::default()
        }
        .into(),
        other => bail!("Unknown engine {other:?} (goals, football, shootout, sets, cricket)"),
    };
    Ok(rules)
}

fn parse_winner_mode(raw: &str) -> Result<WinnerMode, Error> {
    match raw {
        "table-topper" => Ok(WinnerMode::TableTopper),
        "knockouts" => Ok(WinnerMode::Knockouts),
        other => bail!("Unknown winner mode {other:?} (table-topper, knockouts)"),
    }
}

/// A tournament by full id or unique id prefix
fn resolve_tournament<'a>(manager: &'a Manager, prefix: &str) -> Result<&'a Tournament, Error> {
    let mut found = manager
        .tournaments()
        .iter()
        .filter(|t| t.id.starts_with(prefix));
    match (found.next(), found.next()) {
        (Some(t), None) => Ok(t),
        (Some(_), Some(_)) => bail!("Tournament id {prefix:?} is ambiguous"),
        (None, _) => bail!("No tournament matches {prefix:?}"),
    }
}

/// A match by unique id prefix, or a knockout round name such as `final`
fn resolve_match(tournament: &Tournament, key: &str) -> Result<MatchId, Error> {
    if let Some(ko) = tournament
        .knockout_matches
        .iter()
        .find(|m| m.round.to_string() == key)
    {
        return Ok(ko.id.clone());
    }
    let ids: Vec<&MatchId> = tournament
        .matches
        .iter()
        .map(|m| &m.id)
        .chain(tournament.knockout_matches.iter().map(|m| &m.id))
        .filter(|id| id.starts_with(key))
        .collect();
    match ids.as_slice() {
        [id] => Ok((*id).clone()),
        [] => bail!("No match in {} matches {key:?}", tournament.name),
        _ => bail!("Match id {key:?} is ambiguous"),
    }
}

/// Display names of both sides, `TBD` for unseeded knockout slots
fn side_names(tournament: &Tournament, match_id: &str) -> (String, String) {
    if let Some(m) = tournament.matches.iter().find(|m| m.id == match_id) {
        return (
            tournament.team_name(&m.team1_id).to_string(),
            tournament.team_name(&m.team2_id).to_string(),
        );
    }
    tournament
        .knockout_matches
        .iter()
        .find(|m| m.id == match_id)
        .map(|m| {
            (
                tournament.slot_name(m.team1_id.as_ref()).to_string(),
                tournament.slot_name(m.team2_id.as_ref()).to_string(),
            )
        })
        .unwrap_or_default()
}

fn describe_result(tournament: &Tournament, sheet: &Scoresheet) -> String {
    let mut parts = Vec::new();
    if let Some((s1, s2)) = sheet.scores() {
        parts.push(format!("{s1}-{s2}"));
    }
    if !sheet.sets.is_empty() {
        let sets: Vec<String> = sheet
            .sets
            .iter()
            .map(|s| format!("{}-{}", s.score1, s.score2))
            .collect();
        parts.push(sets.join(", "));
    }
    if let Some(innings) = &sheet.innings {
        let line = |i: &CricketInnings| format!("{}/{} ({} balls)", i.runs, i.wickets, i.balls);
        parts.push(format!("{} v {}", line(&innings.team1), line(&innings.team2)));
    }
    if let Some(draft) = &sheet.draft_state {
        parts.push(format!("draft {}-{}", draft.score1, draft.score2));
    }
    match &sheet.winner {
        Some(Winner::Team(id)) => parts.push(format!("won by {}", tournament.team_name(id))),
        Some(Winner::Draw) => parts.push("draw".to_string()),
        Some(Winner::Tie) => parts.push("tie".to_string()),
        None => {}
    }
    parts.join("  ")
}

pub fn create(manager: &mut Manager, mut args: Arguments) -> Result<(), Error> {
    let teams: String = args
        .value_from_str("--teams")
        .context("--teams is required, e.g. --teams \"Red,Blue,Green\"")?;
    let engine: String = args
        .opt_value_from_str("--engine")?
        .unwrap_or_else(|| "goals".to_string());
    let best_of: Option<u32> = args.opt_value_from_str("--best-of")?;
    let points: Option<u32> = args.opt_value_from_str("--points")?;
    let overs: Option<u32> = args.opt_value_from_str("--overs")?;
    let advance: Option<u8> = args.opt_value_from_str("--advance")?;
    let third_place = args.contains("--third-place");
    let winner_mode: Option<String> = args.opt_value_from_str("--winner-mode")?;
    let name: String = args.free_from_str().context("Tournament name is required")?;

    let teams: Vec<Team> = teams
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| Team::new(slug(n), n))
        .collect();
    let knockout_config = advance.map(|n| KnockoutConfig::new(n, third_place));
    let winner_mode = match winner_mode {
        Some(raw) => parse_winner_mode(&raw)?,
        None if knockout_config.is_some() => WinnerMode::Knockouts,
        None => WinnerMode::TableTopper,
    };

    let id = manager.create_tournament(NewTournament {
        name,
        teams,
        rules: parse_rules(&engine, best_of, points, overs)?,
        knockout_config,
        winner_mode,
    })?;
    println!("Created tournament {id}");
    show_tournament(resolve_tournament(manager, &id)?);
    Ok(())
}

pub fn list(manager: &Manager) -> Result<(), Error> {
    if manager.tournaments().is_empty() {
        println!("No {} tournaments yet", manager.sport());
        return Ok(());
    }
    for tournament in manager.tournaments() {
        let progress = manager.progress(&tournament.id)?;
        let status = match &progress.champion {
            Some(team) if progress.complete => format!("won by {}", team.name),
            _ => format!("{:?}", progress.phase).to_lowercase(),
        };
        println!(
            "{}  {:<24} {:>2} teams  {:<8} {}  created {}",
            short(&tournament.id),
            tournament.name,
            tournament.teams.len(),
            tournament.rules.engine_name(),
            status,
            tournament.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

fn show_tournament(tournament: &Tournament) {
    println!("{} [{}]", tournament.name, tournament.rules.engine_name());
    println!("Group stage:");
    for m in &tournament.matches {
        println!(
            "  {}  {:<16} v {:<16} {:<11} {}",
            short(&m.id),
            tournament.team_name(&m.team1_id),
            tournament.team_name(&m.team2_id),
            m.sheet.status,
            describe_result(tournament, &m.sheet)
        );
    }
    if !tournament.knockout_matches.is_empty() {
        println!("Knockouts:");
        for m in &tournament.knockout_matches {
            println!(
                "  {}  {:<12} {:<16} v {:<16} {:<11} {}",
                short(&m.id),
                m.label,
                tournament.slot_name(m.team1_id.as_ref()),
                tournament.slot_name(m.team2_id.as_ref()),
                m.sheet.status,
                describe_result(tournament, &m.sheet)
            );
        }
    }
}

pub fn show(manager: &Manager, mut args: Arguments) -> Result<(), Error> {
    let json = args.contains("--json");
    let id: String = args.free_from_str().context("Tournament id is required")?;
    let tournament = resolve_tournament(manager, &id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(tournament)?);
    } else {
        show_tournament(tournament);
    }
    Ok(())
}

fn print_row(pos: usize, row: &StandingsRow, rules: &ScoringRules) {
    let detail = match rules {
        ScoringRules::Sets(_) => format!(
            "sets {:>3}-{:<3} pts {:>4}-{:<4}",
            row.sets_won, row.sets_lost, row.points_for, row.points_against
        ),
        ScoringRules::Goals(_) => format!(
            "for {:>3} against {:>3} diff {:>+4}",
            row.points_for,
            row.points_against,
            row.goal_difference()
        ),
        ScoringRules::Cricket(_) => format!("nr {:>2} nrr {:>+7.3}", row.no_result, row.net_run_rate()),
    };
    println!(
        "{:>2}. {:<20} P{:>3} W{:>3} D{:>3} L{:>3}  {}  {:>3} pts",
        pos + 1,
        row.team_name,
        row.played,
        row.won,
        row.drawn,
        row.lost,
        detail,
        row.points
    );
}

pub fn standings(manager: &Manager, mut args: Arguments) -> Result<(), Error> {
    let id: String = args.free_from_str().context("Tournament id is required")?;
    let tournament = resolve_tournament(manager, &id)?;
    let progress = manager.progress(&tournament.id)?;

    println!("{}", tournament.name);
    for (pos, row) in progress.standings.iter().enumerate() {
        print_row(pos, row, &tournament.rules);
    }
    if let Some(team) = progress.champion.filter(|_| progress.complete) {
        println!("Champion: {}", team.name);
    }
    Ok(())
}

/// Tournament and match ids from the two leading free arguments
fn target(manager: &Manager, args: &mut Arguments) -> Result<(String, MatchId), Error> {
    let id: String = args.free_from_str().context("Tournament id is required")?;
    let key: String = args.free_from_str().context("Match id is required")?;
    let tournament = resolve_tournament(manager, &id)?;
    Ok((tournament.id.clone(), resolve_match(tournament, &key)?))
}

fn announce(manager: &Manager, tournament_id: &str, winner: Option<&Winner>) -> Result<(), Error> {
    let tournament = manager.get_tournament(tournament_id)?;
    match winner {
        Some(Winner::Team(id)) => println!("Winner: {}", tournament.team_name(id)),
        Some(Winner::Draw) => println!("Result: draw"),
        Some(Winner::Tie) => println!("Result: tie"),
        None => println!("Saved"),
    }
    let progress = manager.progress(tournament_id)?;
    if let Some(team) = progress.champion.filter(|_| progress.complete) {
        println!("{} is the champion of {}", team.name, tournament.name);
    }
    Ok(())
}

pub fn score(manager: &mut Manager, mut args: Arguments) -> Result<(), Error> {
    let shootout: Option<String> = args.opt_value_from_str("--shootout")?;
    let (tournament_id, match_id) = target(manager, &mut args)?;
    let score1: i32 = args.free_from_str().context("First score is required")?;
    let score2: i32 = args.free_from_str().context("Second score is required")?;

    let winner = manager.record_goals(
        &tournament_id,
        &match_id,
        score1,
        score2,
        shootout.as_deref().map(slug),
    )?;
    announce(manager, &tournament_id, Some(&winner))
}

fn parse_set(raw: &str) -> Result<SetScore, Error> {
    let (a, b) = raw
        .split_once('-')
        .ok_or_else(|| anyhow!("Set {raw:?} should look like 25-21"))?;
    Ok(SetScore::new(a.trim().parse()?, b.trim().parse()?))
}

pub fn sets(manager: &mut Manager, mut args: Arguments) -> Result<(), Error> {
    let (tournament_id, match_id) = target(manager, &mut args)?;
    let raw: String = args.free_from_str().context("Sets are required, e.g. 25-21,19-25")?;
    let sets = raw
        .split(',')
        .map(parse_set)
        .collect::<Result<Vec<_>, _>>()?;

    let winner = manager.record_sets(&tournament_id, &match_id, sets)?;
    announce(manager, &tournament_id, winner.as_ref())
}

fn parse_innings(raw: &str) -> Result<CricketInnings, Error> {
    let parts: Vec<u32> = raw
        .split('/')
        .map(|p| p.trim().parse())
        .collect::<Result<_, _>>()
        .with_context(|| format!("Innings {raw:?} should look like runs/wickets/balls"))?;
    match parts.as_slice() {
        [runs, wickets, balls] => Ok(CricketInnings::new(*runs, *wickets, *balls)),
        _ => bail!("Innings {raw:?} should look like runs/wickets/balls"),
    }
}

pub fn innings(manager: &mut Manager, mut args: Arguments) -> Result<(), Error> {
    let no_result = args.contains("--no-result");
    let (tournament_id, match_id) = target(manager, &mut args)?;
    let first: String = args.free_from_str().context("First innings is required")?;
    let second: String = args.free_from_str().context("Second innings is required")?;

    let winner = manager.record_innings(
        &tournament_id,
        &match_id,
        CricketScore {
            team1: parse_innings(&first)?,
            team2: parse_innings(&second)?,
            no_result,
        },
    )?;
    if no_result {
        println!("No result");
    }
    announce(manager, &tournament_id, winner.as_ref())
}

pub fn reset(manager: &mut Manager, mut args: Arguments) -> Result<(), Error> {
    let (tournament_id, match_id) = target(manager, &mut args)?;
    manager.reset_match(&tournament_id, &match_id)?;
    println!("Match {} reset", short(&match_id));
    Ok(())
}

const LIVE_HELP: &str = "\
  1 / 2      point to side one / two
  -1 / -2    take a point back
  u          undo the last action
  f          finish on the current score
  s          save a draft and leave
  q          leave without saving";

fn persist_completion(
    manager: &mut Manager,
    tournament_id: &str,
    match_id: &str,
    completion: &MatchCompletion,
) -> Result<(), Error> {
    if !completion.persist_after.is_zero() {
        thread::sleep(completion.persist_after);
    }
    let winner = manager.complete_from_session(tournament_id, match_id, completion)?;
    info!("Live session for {match_id} completed ({:?})", completion.trigger);
    announce(manager, tournament_id, Some(&winner))
}

pub fn live(manager: &mut Manager, mut args: Arguments) -> Result<(), Error> {
    let points_target: Option<i32> = args.opt_value_from_str("--target")?;
    let time_limit_secs: Option<u64> = args.opt_value_from_str("--time-limit")?;
    let draw_allowed = !args.contains("--no-draws");
    let floor_at_zero = args.contains("--floor-zero");
    let (tournament_id, match_id) = target(manager, &mut args)?;

    let format = ScoreFormat {
        points_target,
        time_limit_secs,
        draw_allowed,
        floor_at_zero,
    };
    let mut session: LiveScoreSession = manager.open_session(&tournament_id, &match_id, format)?;

    println!("{LIVE_HELP}");
    let input = spawn_stdin_reader();
    run_live(
        manager,
        &tournament_id,
        &match_id,
        &mut session,
        &input,
        Duration::from_secs(1),
    )
}

/// Forward stdin lines over a channel so the play clock keeps running between inputs
fn spawn_stdin_reader() -> Receiver<io::Result<String>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn prompt<C: Clock>(session: &LiveScoreSession<C>, name1: &str, name2: &str) -> io::Result<()> {
    let scores = session.scores();
    match session.remaining_secs() {
        Some(left) => print!("{name1} {} - {} {name2}  [{left}s] > ", scores.score1, scores.score2),
        None => print!("{name1} {} - {} {name2} > ", scores.score1, scores.score2),
    }
    io::stdout().flush()
}

/// Drive a session from `input`, ticking its clock every `tick_every`.
///
/// Returns once the match is finished and recorded, or the scorer leaves.
/// A closed input saves a draft.
fn run_live<C: Clock>(
    manager: &mut Manager,
    tournament_id: &str,
    match_id: &str,
    session: &mut LiveScoreSession<C>,
    input: &Receiver<io::Result<String>>,
    tick_every: Duration,
) -> Result<(), Error> {
    let (name1, name2) = side_names(manager.get_tournament(tournament_id)?, match_id);
    println!("{name1} v {name2}");
    prompt(session, &name1, &name2)?;

    let mut next_tick = Instant::now() + tick_every;
    loop {
        while Instant::now() >= next_tick {
            next_tick += tick_every;
            let was_golden_point = session.is_golden_point();
            if let Some(completion) = session.tick() {
                println!();
                println!("Time is up");
                return persist_completion(manager, tournament_id, match_id, &completion);
            }
            if !was_golden_point && session.is_golden_point() {
                println!();
                println!("Level at full time: next point wins");
                prompt(session, &name1, &name2)?;
            }
        }

        let line = match input.recv_timeout(next_tick.saturating_duration_since(Instant::now())) {
            Ok(line) => line?,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                // Input closed: keep what was scored
                manager.save_draft(tournament_id, match_id, &*session)?;
                println!();
                println!("Draft saved");
                return Ok(());
            }
        };

        let scored = match line.trim() {
            "1" | "+1" => Some((Side::One, 1)),
            "2" | "+2" => Some((Side::Two, 1)),
            "-1" => Some((Side::One, -1)),
            "-2" => Some((Side::Two, -1)),
            "u" => {
                if !session.undo() {
                    println!("Nothing to undo");
                }
                None
            }
            "f" => match session.finish() {
                Ok(completion) => {
                    return persist_completion(manager, tournament_id, match_id, &completion);
                }
                Err(e) => {
                    println!("{e}");
                    None
                }
            },
            "s" => {
                manager.save_draft(tournament_id, match_id, &*session)?;
                println!("Draft saved");
                return Ok(());
            }
            "q" => return Ok(()),
            "" => None,
            other => {
                println!("Unknown input {other:?}");
                None
            }
        };

        if let Some((side, delta)) = scored {
            match session.add_score(side, delta) {
                Ok(ScoreOutcome::Completed(completion)) => {
                    return persist_completion(manager, tournament_id, match_id, &completion);
                }
                Ok(ScoreOutcome::Debounced) => debug!("Ignored repeated input"),
                Ok(ScoreOutcome::Applied) => {}
                Err(e) => println!("{e}"),
            }
        }
        prompt(session, &name1, &name2)?;
    }
}
