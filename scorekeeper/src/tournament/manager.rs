//! Tournament manager: the edit cycle around a persisted tournament list.
//!
//! Every mutation works on a copy of one tournament, then runs the
//! progression passes (repair, bracket reseed, knockout initialisation)
//! and finally commits the whole list to the store.

use chrono::Utc;
use log::{debug, info, warn};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

use super::knockout::{
    get_tournament_winner, initialize_knockout_stage, is_group_stage_complete,
    is_tournament_complete, update_knockout_bracket,
};
use super::models::{
    Changed, CricketScore, FixtureMut, KnockoutConfig, MatchId, MatchStatus, SetScore, Team,
    TeamId, Tournament, TournamentId, TournamentPhase, Winner, WinnerMode,
};
use super::repair::repair_stale_single_set_matches;
use super::rules::{ScoringEngine, ScoringRules};
use super::schedule::generate_round_robin;
use super::standings::StandingsRow;
use crate::live::{
    Clock, CompletionTrigger, LiveScoreSession, MatchCompletion, Outcome, ScoreFormat,
    SessionConfig, SystemClock,
};
use crate::store::{KeyValueStore, StoreError, TournamentStore};

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Not enough teams: need {needed}, have {have}")]
    NotEnoughTeams { needed: usize, have: usize },

    #[error("Team listed twice: {0}")]
    DuplicateTeam(TeamId),

    #[error("Knockout stage must advance 2 or 4 teams, not {0}")]
    InvalidKnockoutConfig(u8),

    #[error("Knockout winner mode needs a knockout configuration")]
    MissingKnockoutConfig,

    #[error("Draws are not allowed here. Record a winner.")]
    DrawNotAllowed,

    #[error("Both teams of match {0} are not known yet")]
    TeamsNotSeeded(MatchId),

    #[error("Match {0} is already completed")]
    MatchCompleted(MatchId),

    #[error("This tournament is scored as {actual}, not {expected}")]
    WrongEngine {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

pub type TournamentResult<T> = Result<T, TournamentError>;

/// Everything needed to create a tournament
#[derive(Debug, Clone)]
pub struct NewTournament {
    pub name: String,
    pub teams: Vec<Team>,
    pub rules: ScoringRules,
    pub knockout_config: Option<KnockoutConfig>,
    pub winner_mode: WinnerMode,
}

/// Snapshot of where a tournament stands
#[derive(Debug, Clone, PartialEq)]
pub struct TournamentProgress {
    pub standings: Vec<StandingsRow>,
    pub phase: TournamentPhase,
    pub group_complete: bool,
    pub complete: bool,
    pub champion: Option<Team>,
}

/// Owns the tournaments of one sport and the store they are committed to
#[derive(Debug)]
pub struct TournamentManager<S: KeyValueStore> {
    store: TournamentStore<S>,
    sport: String,
    tournaments: Vec<Tournament>,
    session_config: SessionConfig,
}

/// Repair, reseed, then seed the bracket once the group stage is over
fn advance(tournament: Tournament) -> Changed<Tournament> {
    repair_stale_single_set_matches(tournament)
        .and_then(reseed_bracket)
        .and_then(|tournament| {
            if !is_group_stage_complete(&tournament.matches) {
                return Changed::unchanged(tournament);
            }
            let standings = tournament.rules.standings(&tournament.teams, &tournament.matches);
            initialize_knockout_stage(tournament, &standings)
        })
}

fn reseed_bracket(mut tournament: Tournament) -> Changed<Tournament> {
    let bracket = std::mem::take(&mut tournament.knockout_matches);
    let Changed { value, changed } = update_knockout_bracket(bracket);
    tournament.knockout_matches = value;
    Changed {
        value: tournament,
        changed,
    }
}

fn seeded_teams(fixture: &FixtureMut<'_>, match_id: &str) -> TournamentResult<(TeamId, TeamId)> {
    fixture
        .team1_id
        .clone()
        .zip(fixture.team2_id.clone())
        .ok_or_else(|| TournamentError::TeamsNotSeeded(match_id.to_string()))
}

fn expect_engine(rules: &ScoringRules, expected: &'static str) -> TournamentResult<()> {
    if rules.engine_name() == expected {
        Ok(())
    } else {
        Err(TournamentError::WrongEngine {
            expected,
            actual: rules.engine_name(),
        })
    }
}

/// Knockout matches must produce a team winner
fn require_team_winner(winner: Option<Winner>, knockout: bool) -> TournamentResult<Winner> {
    match winner {
        Some(Winner::Team(id)) => Ok(Winner::Team(id)),
        Some(level) if !knockout => Ok(level),
        _ => Err(TournamentError::DrawNotAllowed),
    }
}

impl<S: KeyValueStore> TournamentManager<S> {
    /// Load a sport's tournaments, repairing stale records.
    ///
    /// The repaired list is committed straight away when the repair changed anything.
    pub fn load(store: TournamentStore<S>, sport: impl Into<String>) -> TournamentResult<Self> {
        let sport = sport.into();
        let mut repaired = false;
        let tournaments = store
            .load_tournaments(&sport)?
            .into_iter()
            .map(|tournament| {
                let result = repair_stale_single_set_matches(tournament);
                repaired |= result.is_changed();
                result.into_inner()
            })
            .collect();

        let mut manager = Self {
            store,
            sport,
            tournaments,
            session_config: SessionConfig::default(),
        };
        if repaired {
            info!("Committing repaired tournaments for {}", manager.sport);
            manager.commit()?;
        }
        debug!(
            "Loaded {} tournaments for {}",
            manager.tournaments.len(),
            manager.sport
        );
        Ok(manager)
    }

    pub fn with_session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    pub fn sport(&self) -> &str {
        &self.sport
    }

    pub fn store(&self) -> &TournamentStore<S> {
        &self.store
    }

    pub fn into_store(self) -> TournamentStore<S> {
        self.store
    }

    pub fn tournaments(&self) -> &[Tournament] {
        &self.tournaments
    }

    pub fn get_tournament(&self, tournament_id: &str) -> TournamentResult<&Tournament> {
        self.tournaments
            .iter()
            .find(|t| t.id == tournament_id)
            .ok_or_else(|| TournamentError::NotFound(tournament_id.to_string()))
    }

    /// Write the whole tournament list under the sport's key
    pub fn commit(&mut self) -> TournamentResult<()> {
        self.store.save_tournaments(&self.sport, &self.tournaments)?;
        debug!("Committed {} tournaments for {}", self.tournaments.len(), self.sport);
        Ok(())
    }

    /// Create a tournament with a full round-robin schedule
    pub fn create_tournament(&mut self, new: NewTournament) -> TournamentResult<TournamentId> {
        if new.teams.len() < 2 {
            return Err(TournamentError::NotEnoughTeams {
                needed: 2,
                have: new.teams.len(),
            });
        }
        let mut seen = HashSet::new();
        if let Some(dup) = new.teams.iter().find(|t| !seen.insert(t.id.as_str())) {
            return Err(TournamentError::DuplicateTeam(dup.id.clone()));
        }
        match new.knockout_config {
            Some(config) if !config.is_valid() => {
                return Err(TournamentError::InvalidKnockoutConfig(config.teams_advancing));
            }
            Some(config) if usize::from(config.teams_advancing) > new.teams.len() => {
                return Err(TournamentError::NotEnoughTeams {
                    needed: usize::from(config.teams_advancing),
                    have: new.teams.len(),
                });
            }
            None if new.winner_mode == WinnerMode::Knockouts => {
                return Err(TournamentError::MissingKnockoutConfig);
            }
            _ => {}
        }

        let tournament = Tournament {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            matches: generate_round_robin(&new.teams),
            teams: new.teams,
            rules: new.rules,
            knockout_config: new.knockout_config,
            knockout_matches: Vec::new(),
            phase: TournamentPhase::Group,
            winner_mode: new.winner_mode,
            created_at: Utc::now(),
        };
        let id = tournament.id.clone();
        info!(
            "Created tournament {} ({}) with {} teams and {} matches",
            tournament.name,
            id,
            tournament.teams.len(),
            tournament.matches.len()
        );

        self.tournaments.push(tournament);
        if let Err(err) = self.commit() {
            self.tournaments.pop();
            return Err(err);
        }
        Ok(id)
    }

    /// Ranked group table under the tournament's scoring rules
    pub fn standings(&self, tournament_id: &str) -> TournamentResult<Vec<StandingsRow>> {
        let tournament = self.get_tournament(tournament_id)?;
        Ok(tournament.rules.standings(&tournament.teams, &tournament.matches))
    }

    pub fn progress(&self, tournament_id: &str) -> TournamentResult<TournamentProgress> {
        let tournament = self.get_tournament(tournament_id)?;
        let standings = tournament.rules.standings(&tournament.teams, &tournament.matches);
        let champion = get_tournament_winner(tournament, &standings).cloned();
        Ok(TournamentProgress {
            phase: tournament.phase,
            group_complete: is_group_stage_complete(&tournament.matches),
            complete: is_tournament_complete(tournament),
            champion,
            standings,
        })
    }

    /// Record a goals result. A shoot-out winner settles level scores.
    pub fn record_goals(
        &mut self,
        tournament_id: &str,
        match_id: &str,
        score1: i32,
        score2: i32,
        shootout_winner: Option<TeamId>,
    ) -> TournamentResult<Winner> {
        self.edit_match(tournament_id, match_id, |rules, fixture| {
            expect_engine(rules, "goals")?;
            let (team1, team2) = seeded_teams(&fixture, match_id)?;
            let sheet = fixture.sheet;
            sheet.score1 = Some(score1);
            sheet.score2 = Some(score2);
            sheet.winner = shootout_winner.map(Winner::Team);
            let winner = require_team_winner(
                rules.decide_winner(sheet, &team1, &team2),
                fixture.knockout,
            )?;
            sheet.complete(Some(winner.clone()));
            Ok(winner)
        })
    }

    /// Record the sets played so far.
    ///
    /// The match completes once one side holds a majority of the best-of;
    /// otherwise it is left in progress and `None` is returned.
    pub fn record_sets(
        &mut self,
        tournament_id: &str,
        match_id: &str,
        sets: Vec<SetScore>,
    ) -> TournamentResult<Option<Winner>> {
        self.edit_match(tournament_id, match_id, |rules, fixture| {
            expect_engine(rules, "sets")?;
            let (team1, team2) = seeded_teams(&fixture, match_id)?;
            let sheet = fixture.sheet;
            sheet.sets = sets;
            sheet.score1 = None;
            sheet.score2 = None;
            let winner = rules.decide_winner(sheet, &team1, &team2);
            match &winner {
                Some(w) => sheet.complete(Some(w.clone())),
                None => {
                    sheet.winner = None;
                    sheet.status = MatchStatus::InProgress;
                }
            }
            Ok(winner)
        })
    }

    /// Record both innings. No-result matches complete without a winner.
    pub fn record_innings(
        &mut self,
        tournament_id: &str,
        match_id: &str,
        innings: CricketScore,
    ) -> TournamentResult<Option<Winner>> {
        self.edit_match(tournament_id, match_id, |rules, fixture| {
            expect_engine(rules, "custom-cricket")?;
            let (team1, team2) = seeded_teams(&fixture, match_id)?;
            let sheet = fixture.sheet;
            sheet.innings = Some(innings);
            let winner = match rules.decide_winner(sheet, &team1, &team2) {
                Some(w) => Some(require_team_winner(Some(w), fixture.knockout)?),
                None if fixture.knockout => return Err(TournamentError::DrawNotAllowed),
                None => None,
            };
            sheet.complete(winner.clone());
            Ok(winner)
        })
    }

    /// Wipe a match back to unplayed. Resetting a semi-final empties the
    /// pending final and third-place slots it fed.
    pub fn reset_match(&mut self, tournament_id: &str, match_id: &str) -> TournamentResult<()> {
        self.edit_match(tournament_id, match_id, |_, fixture| {
            fixture.sheet.clear();
            Ok(())
        })
    }

    /// Start (or resume from its draft) a live session for a match
    pub fn open_session(
        &self,
        tournament_id: &str,
        match_id: &str,
        format: ScoreFormat,
    ) -> TournamentResult<LiveScoreSession<SystemClock>> {
        self.open_session_with_clock(tournament_id, match_id, format, SystemClock)
    }

    pub fn open_session_with_clock<C: Clock>(
        &self,
        tournament_id: &str,
        match_id: &str,
        mut format: ScoreFormat,
        clock: C,
    ) -> TournamentResult<LiveScoreSession<C>> {
        let tournament = self.get_tournament(tournament_id)?;
        let (sheet, seeded, knockout) = match tournament.matches.iter().find(|m| m.id == match_id) {
            Some(m) => (&m.sheet, true, false),
            None => {
                let ko = tournament
                    .knockout_matches
                    .iter()
                    .find(|m| m.id == match_id)
                    .ok_or_else(|| TournamentError::MatchNotFound(match_id.to_string()))?;
                (&ko.sheet, ko.is_seeded(), true)
            }
        };
        if !seeded {
            return Err(TournamentError::TeamsNotSeeded(match_id.to_string()));
        }
        if sheet.is_completed() {
            return Err(TournamentError::MatchCompleted(match_id.to_string()));
        }

        format.draw_allowed &= tournament.rules.draw_allowed() && !knockout;
        Ok(LiveScoreSession::resume_with_clock(
            sheet,
            format,
            self.session_config,
            clock,
        ))
    }

    /// Park a live session on its match so it can be resumed later
    pub fn save_draft<C: Clock>(
        &mut self,
        tournament_id: &str,
        match_id: &str,
        session: &LiveScoreSession<C>,
    ) -> TournamentResult<()> {
        self.edit_match(tournament_id, match_id, |_, fixture| {
            if fixture.sheet.is_completed() {
                return Err(TournamentError::MatchCompleted(match_id.to_string()));
            }
            session.save_draft(fixture.sheet);
            Ok(())
        })
    }

    /// Write a finished session onto its match.
    ///
    /// Goals tournaments take the scores as they are; single-set tournaments
    /// record them as the one set. A match that already has a result is left alone. A level result is refused in the knockout
    /// stage, and in the group stage only when it was finished by hand.
    pub fn complete_from_session(
        &mut self,
        tournament_id: &str,
        match_id: &str,
        completion: &MatchCompletion,
    ) -> TournamentResult<Winner> {
        self.edit_match(tournament_id, match_id, |rules, fixture| {
            if fixture.sheet.is_completed() {
                return Err(TournamentError::MatchCompleted(match_id.to_string()));
            }
            let (team1, team2) = seeded_teams(&fixture, match_id)?;
            let manual = completion.trigger == CompletionTrigger::Manual;
            let rejected = fixture.knockout || (manual && !rules.draw_allowed());
            if completion.outcome == Outcome::Draw && rejected {
                warn!("Rejected drawn session result for match {match_id}");
                return Err(TournamentError::DrawNotAllowed);
            }
            match rules {
                ScoringRules::Goals(_) => {
                    completion.apply(fixture.sheet, &team1, &team2);
                    let winner = completion.outcome.winner(&team1, &team2);
                    Ok(winner)
                }
                ScoringRules::Sets(sets) if sets.is_single_set() => {
                    let sheet = fixture.sheet;
                    sheet.score1 = None;
                    sheet.score2 = None;
                    sheet.sets = vec![SetScore::new(
                        completion.scores.score1.max(0).unsigned_abs(),
                        completion.scores.score2.max(0).unsigned_abs(),
                    )];
                    let winner = require_team_winner(
                        rules.decide_winner(sheet, &team1, &team2),
                        true,
                    )?;
                    sheet.complete(Some(winner.clone()));
                    Ok(winner)
                }
                other => Err(TournamentError::WrongEngine {
                    expected: "goals",
                    actual: other.engine_name(),
                }),
            }
        })
    }

    /// Apply `edit` to a copy of the tournament, run the progression passes,
    /// swap the copy in and commit. On error, including a failed commit,
    /// nothing changes.
    fn edit_match<T>(
        &mut self,
        tournament_id: &str,
        match_id: &str,
        edit: impl FnOnce(&ScoringRules, FixtureMut<'_>) -> TournamentResult<T>,
    ) -> TournamentResult<T> {
        let index = self
            .tournaments
            .iter()
            .position(|t| t.id == tournament_id)
            .ok_or_else(|| TournamentError::NotFound(tournament_id.to_string()))?;

        let mut tournament = self.tournaments[index].clone();
        let rules = tournament.rules.clone();
        let fixture = tournament
            .fixture_mut(match_id)
            .ok_or_else(|| TournamentError::MatchNotFound(match_id.to_string()))?;
        let output = edit(&rules, fixture)?;

        let advanced = advance(tournament);
        if advanced.is_changed() {
            debug!("Progression passes updated tournament {tournament_id}");
        }
        let previous = std::mem::replace(&mut self.tournaments[index], advanced.into_inner());
        if let Err(err) = self.commit() {
            warn!("Commit failed, keeping tournament {tournament_id} as it was");
            self.tournaments[index] = previous;
            return Err(err);
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::{ManualClock, ScoreOutcome};
    use crate::store::{MemoryStore, StoreResult};
    use crate::tournament::models::{CricketInnings, KnockoutRound, Match, Side};
    use crate::tournament::rules::{CricketRules, GoalsRules, SetsRules};
    use std::{cell::Cell, rc::Rc};

    fn manager() -> TournamentManager<MemoryStore> {
        TournamentManager::load(TournamentStore::new(MemoryStore::default()), "test").unwrap()
    }

    fn teams(ids: &[&str]) -> Vec<Team> {
        ids.iter().map(|id| Team::new(*id, id.to_uppercase())).collect()
    }

    fn create(
        manager: &mut TournamentManager<MemoryStore>,
        ids: &[&str],
        rules: ScoringRules,
        knockout_config: Option<KnockoutConfig>,
        winner_mode: WinnerMode,
    ) -> TournamentId {
        manager
            .create_tournament(NewTournament {
                name: "Cup".to_string(),
                teams: teams(ids),
                rules,
                knockout_config,
                winner_mode,
            })
            .unwrap()
    }

    /// Earlier roster entries beat later ones 1-0
    fn play_group_by_roster(manager: &mut TournamentManager<MemoryStore>, id: &str) {
        let tournament = manager.get_tournament(id).unwrap().clone();
        let rank = |team: &str| tournament.teams.iter().position(|t| t.id == team);
        for Match {
            id: match_id,
            team1_id,
            team2_id,
            ..
        } in &tournament.matches
        {
            let (s1, s2) = if rank(team1_id.as_str()) < rank(team2_id.as_str()) {
                (1, 0)
            } else {
                (0, 1)
            };
            manager.record_goals(id, match_id, s1, s2, None).unwrap();
        }
    }

    fn knockout_id(manager: &TournamentManager<MemoryStore>, id: &str, round: KnockoutRound) -> MatchId {
        manager
            .get_tournament(id)
            .unwrap()
            .knockout_match(round)
            .unwrap()
            .id
            .clone()
    }

    #[test]
    fn test_create_validates_roster_and_config() {
        let mut m = manager();
        let err = m
            .create_tournament(NewTournament {
                name: "Solo".to_string(),
                teams: teams(&["a"]),
                rules: ScoringRules::default(),
                knockout_config: None,
                winner_mode: WinnerMode::TableTopper,
            })
            .unwrap_err();
        assert!(matches!(err, TournamentError::NotEnoughTeams { needed: 2, have: 1 }));

        let err = m
            .create_tournament(NewTournament {
                name: "Dup".to_string(),
                teams: teams(&["a", "a"]),
                rules: ScoringRules::default(),
                knockout_config: None,
                winner_mode: WinnerMode::TableTopper,
            })
            .unwrap_err();
        assert!(matches!(err, TournamentError::DuplicateTeam(ref id) if id == "a"));

        let err = m
            .create_tournament(NewTournament {
                name: "Three".to_string(),
                teams: teams(&["a", "b", "c", "d"]),
                rules: ScoringRules::default(),
                knockout_config: Some(KnockoutConfig::new(3, false)),
                winner_mode: WinnerMode::Knockouts,
            })
            .unwrap_err();
        assert!(matches!(err, TournamentError::InvalidKnockoutConfig(3)));

        let err = m
            .create_tournament(NewTournament {
                name: "Nothing".to_string(),
                teams: teams(&["a", "b"]),
                rules: ScoringRules::default(),
                knockout_config: None,
                winner_mode: WinnerMode::Knockouts,
            })
            .unwrap_err();
        assert!(matches!(err, TournamentError::MissingKnockoutConfig));
        assert!(m.tournaments().is_empty());
    }

    #[test]
    fn test_create_schedules_and_commits() {
        let mut m = manager();
        let id = create(&mut m, &["a", "b", "c", "d"], ScoringRules::default(), None, WinnerMode::TableTopper);
        assert_eq!(m.get_tournament(&id).unwrap().matches.len(), 6);
        assert!(m.store().inner().contains("tournaments:test"));
        assert_eq!(m.store().inner().writes(), 1);
    }

    #[test]
    fn test_full_knockout_cycle() {
        let mut m = manager();
        let id = create(
            &mut m,
            &["a", "b", "c", "d"],
            GoalsRules::football().into(),
            Some(KnockoutConfig::new(4, true)),
            WinnerMode::Knockouts,
        );
        play_group_by_roster(&mut m, &id);

        let tournament = m.get_tournament(&id).unwrap();
        assert_eq!(tournament.phase, TournamentPhase::Knockout);
        assert_eq!(tournament.knockout_matches.len(), 4);
        let semi1 = tournament.knockout_match(KnockoutRound::Semi1).unwrap();
        assert_eq!(semi1.team1_id.as_deref(), Some("a"));
        assert_eq!(semi1.team2_id.as_deref(), Some("d"));

        let final_id = knockout_id(&m, &id, KnockoutRound::Final);
        assert!(matches!(
            m.record_goals(&id, &final_id, 1, 0, None),
            Err(TournamentError::TeamsNotSeeded(_))
        ));

        let semi1_id = knockout_id(&m, &id, KnockoutRound::Semi1);
        let semi2_id = knockout_id(&m, &id, KnockoutRound::Semi2);
        m.record_goals(&id, &semi1_id, 2, 0, None).unwrap();
        m.record_goals(&id, &semi2_id, 1, 1, Some("c".to_string())).unwrap();

        let tournament = m.get_tournament(&id).unwrap();
        let final_match = tournament.knockout_match(KnockoutRound::Final).unwrap();
        assert_eq!(final_match.team1_id.as_deref(), Some("a"));
        assert_eq!(final_match.team2_id.as_deref(), Some("c"));
        let third = tournament.knockout_match(KnockoutRound::ThirdPlace).unwrap();
        assert_eq!(third.team1_id.as_deref(), Some("d"));
        assert_eq!(third.team2_id.as_deref(), Some("b"));

        m.record_goals(&id, &final_id, 0, 3, None).unwrap();
        assert!(!m.progress(&id).unwrap().complete);

        let third_id = knockout_id(&m, &id, KnockoutRound::ThirdPlace);
        m.record_goals(&id, &third_id, 2, 1, None).unwrap();
        let progress = m.progress(&id).unwrap();
        assert!(progress.complete);
        assert_eq!(progress.champion.map(|t| t.id), Some("c".to_string()));
    }

    #[test]
    fn test_knockout_draw_rejected_without_changes() {
        let mut m = manager();
        let id = create(
            &mut m,
            &["a", "b"],
            GoalsRules::default().into(),
            Some(KnockoutConfig::new(2, false)),
            WinnerMode::Knockouts,
        );
        play_group_by_roster(&mut m, &id);
        let final_id = knockout_id(&m, &id, KnockoutRound::Final);
        let writes = m.store().inner().writes();

        let err = m.record_goals(&id, &final_id, 2, 2, None).unwrap_err();
        assert!(matches!(err, TournamentError::DrawNotAllowed));
        assert_eq!(m.store().inner().writes(), writes);
        assert!(m.get_tournament(&id).unwrap().knockout_match(KnockoutRound::Final).unwrap().sheet.is_pending());
    }

    #[test]
    fn test_reset_semi_rolls_back_final() {
        let mut m = manager();
        let id = create(
            &mut m,
            &["a", "b", "c", "d"],
            GoalsRules::default().into(),
            Some(KnockoutConfig::new(4, false)),
            WinnerMode::Knockouts,
        );
        play_group_by_roster(&mut m, &id);
        let semi1_id = knockout_id(&m, &id, KnockoutRound::Semi1);
        let semi2_id = knockout_id(&m, &id, KnockoutRound::Semi2);
        m.record_goals(&id, &semi1_id, 1, 0, None).unwrap();
        m.record_goals(&id, &semi2_id, 1, 0, None).unwrap();
        assert!(m.get_tournament(&id).unwrap().knockout_match(KnockoutRound::Final).unwrap().is_seeded());

        m.reset_match(&id, &semi2_id).unwrap();
        let final_match = m
            .get_tournament(&id)
            .unwrap()
            .knockout_match(KnockoutRound::Final)
            .unwrap()
            .clone();
        assert!(!final_match.has_any_team());
    }

    #[test]
    fn test_table_topper_champion() {
        let mut m = manager();
        let id = create(&mut m, &["a", "b", "c"], ScoringRules::default(), None, WinnerMode::TableTopper);
        assert!(m.progress(&id).unwrap().champion.is_none());
        play_group_by_roster(&mut m, &id);

        let progress = m.progress(&id).unwrap();
        assert!(progress.group_complete);
        assert_eq!(progress.phase, TournamentPhase::Group);
        assert_eq!(progress.champion.map(|t| t.id), Some("a".to_string()));
    }

    #[test]
    fn test_record_sets_partial_then_complete() {
        let mut m = manager();
        let id = create(&mut m, &["a", "b"], SetsRules::default().into(), None, WinnerMode::TableTopper);
        let match_id = m.get_tournament(&id).unwrap().matches[0].id.clone();

        let partial = m
            .record_sets(&id, &match_id, vec![SetScore::new(25, 20)])
            .unwrap();
        assert_eq!(partial, None);
        let sheet = m.get_tournament(&id).unwrap().sheet(&match_id).unwrap().clone();
        assert_eq!(sheet.status, MatchStatus::InProgress);

        let winner = m
            .record_sets(&id, &match_id, vec![SetScore::new(25, 20), SetScore::new(25, 22)])
            .unwrap();
        assert!(winner.is_some());
        assert!(m.progress(&id).unwrap().complete);
    }

    #[test]
    fn test_wrong_engine_rejected() {
        let mut m = manager();
        let id = create(&mut m, &["a", "b"], SetsRules::default().into(), None, WinnerMode::TableTopper);
        let match_id = m.get_tournament(&id).unwrap().matches[0].id.clone();
        let err = m.record_goals(&id, &match_id, 1, 0, None).unwrap_err();
        assert!(matches!(
            err,
            TournamentError::WrongEngine {
                expected: "goals",
                actual: "sets"
            }
        ));
    }

    #[test]
    fn test_record_innings_no_result() {
        let mut m = manager();
        let id = create(&mut m, &["a", "b"], CricketRules::default().into(), None, WinnerMode::TableTopper);
        let match_id = m.get_tournament(&id).unwrap().matches[0].id.clone();
        let winner = m
            .record_innings(
                &id,
                &match_id,
                CricketScore {
                    team1: CricketInnings::new(40, 2, 30),
                    team2: CricketInnings::default(),
                    no_result: true,
                },
            )
            .unwrap();
        assert_eq!(winner, None);

        let standings = m.standings(&id).unwrap();
        assert!(standings.iter().all(|row| row.no_result == 1 && row.points == 1));
    }

    #[test]
    fn test_session_draft_and_completion() {
        let mut m = manager();
        let id = create(&mut m, &["a", "b"], GoalsRules::shootout().into(), None, WinnerMode::TableTopper);
        let match_id = m.get_tournament(&id).unwrap().matches[0].id.clone();
        let team1 = m.get_tournament(&id).unwrap().matches[0].team1_id.clone();

        let clock = ManualClock::default();
        let mut session = m
            .open_session_with_clock(&id, &match_id, ScoreFormat::first_to(2), clock.clone())
            .unwrap();
        assert!(!session.format().draw_allowed);
        clock.advance_millis(200);
        session.add_score(Side::One, 1).unwrap();
        m.save_draft(&id, &match_id, &session).unwrap();

        let sheet = m.get_tournament(&id).unwrap().sheet(&match_id).unwrap().clone();
        assert_eq!(sheet.status, MatchStatus::InProgress);
        assert_eq!(sheet.draft_state.as_ref().map(|d| d.score1), Some(1));

        let mut resumed = m
            .open_session_with_clock(&id, &match_id, ScoreFormat::first_to(2), clock.clone())
            .unwrap();
        assert_eq!(resumed.scores().score1, 1);
        clock.advance_millis(200);
        let ScoreOutcome::Completed(completion) = resumed.add_score(Side::One, 1).unwrap() else {
            panic!("expected the target to finish the match");
        };

        let winner = m.complete_from_session(&id, &match_id, &completion).unwrap();
        assert_eq!(winner, Winner::Team(team1));
        let sheet = m.get_tournament(&id).unwrap().sheet(&match_id).unwrap().clone();
        assert!(sheet.is_completed());
        assert!(sheet.draft_state.is_none());

        assert!(matches!(
            m.open_session(&id, &match_id, ScoreFormat::default()),
            Err(TournamentError::MatchCompleted(_))
        ));
    }

    #[test]
    fn test_load_repairs_and_commits() {
        let mut m = manager();
        let id = create(&mut m, &["a", "b"], SetsRules::single_set(21).into(), None, WinnerMode::TableTopper);
        let mut tournaments = m.tournaments().to_vec();
        tournaments[0].matches[0].sheet.sets = vec![SetScore::new(21, 15)];

        let mut store = m.into_store();
        store.save_tournaments("test", &tournaments).unwrap();
        let writes = store.inner().writes();

        let reloaded = TournamentManager::load(store, "test").unwrap();
        assert_eq!(reloaded.store().inner().writes(), writes + 1);
        assert!(reloaded.get_tournament(&id).unwrap().matches[0].sheet.is_completed());

        let clean = TournamentManager::load(reloaded.into_store(), "test").unwrap();
        assert_eq!(clean.store().inner().writes(), writes + 1);
    }

    /// Memory store whose writes can be switched off
    #[derive(Debug, Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing: Rc<Cell<bool>>,
    }

    impl KeyValueStore for FlakyStore {
        fn read(&self, key: &str) -> StoreResult<Option<serde_json::Value>> {
            self.inner.read(key)
        }

        fn write(&mut self, key: &str, value: serde_json::Value) -> StoreResult<()> {
            if self.failing.get() {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.inner.write(key, value)
        }
    }

    #[test]
    fn test_failed_commit_leaves_state_untouched() {
        let failing = Rc::new(Cell::new(false));
        let store = FlakyStore {
            inner: MemoryStore::default(),
            failing: Rc::clone(&failing),
        };
        let mut m = TournamentManager::load(TournamentStore::new(store), "test").unwrap();
        let id = m
            .create_tournament(NewTournament {
                name: "Cup".to_string(),
                teams: teams(&["a", "b"]),
                rules: GoalsRules::football().into(),
                knockout_config: Some(KnockoutConfig::new(2, false)),
                winner_mode: WinnerMode::Knockouts,
            })
            .unwrap();
        let match_id = m.get_tournament(&id).unwrap().matches[0].id.clone();
        let before = m.get_tournament(&id).unwrap().clone();

        failing.set(true);
        let err = m.record_goals(&id, &match_id, 3, 0, None).unwrap_err();
        assert!(matches!(err, TournamentError::Store(_)));
        assert_eq!(m.get_tournament(&id).unwrap(), &before);
        assert!(m.get_tournament(&id).unwrap().knockout_matches.is_empty());

        let err = m
            .create_tournament(NewTournament {
                name: "Second".to_string(),
                teams: teams(&["c", "d"]),
                rules: ScoringRules::default(),
                knockout_config: None,
                winner_mode: WinnerMode::TableTopper,
            })
            .unwrap_err();
        assert!(matches!(err, TournamentError::Store(_)));
        assert_eq!(m.tournaments().len(), 1);

        let persisted = m.store().load_tournaments("test").unwrap();
        assert_eq!(persisted, vec![before]);

        failing.set(false);
        m.record_goals(&id, &match_id, 3, 0, None).unwrap();
        assert!(m.get_tournament(&id).unwrap().sheet(&match_id).unwrap().is_completed());
        assert_eq!(m.store().load_tournaments("test").unwrap(), m.tournaments());
    }

    #[test]
    fn test_session_cannot_overwrite_recorded_result() {
        let mut m = manager();
        let id = create(&mut m, &["a", "b"], GoalsRules::default().into(), None, WinnerMode::TableTopper);
        let match_id = m.get_tournament(&id).unwrap().matches[0].id.clone();

        let clock = ManualClock::default();
        let mut stale = m
            .open_session_with_clock(&id, &match_id, ScoreFormat::open(true), clock.clone())
            .unwrap();
        clock.advance_millis(200);
        stale.add_score(Side::Two, 1).unwrap();
        let completion = stale.finish().unwrap();

        m.record_goals(&id, &match_id, 2, 0, None).unwrap();
        let writes = m.store().inner().writes();
        let err = m.complete_from_session(&id, &match_id, &completion).unwrap_err();
        assert!(matches!(err, TournamentError::MatchCompleted(ref mid) if mid == &match_id));

        let sheet = m.get_tournament(&id).unwrap().sheet(&match_id).unwrap();
        assert_eq!(sheet.scores(), Some((2, 0)));
        assert_eq!(m.store().inner().writes(), writes);
    }

    #[test]
    fn test_unknown_ids() {
        let mut m = manager();
        assert!(matches!(m.standings("nope"), Err(TournamentError::NotFound(_))));
        let id = create(&mut m, &["a", "b"], ScoringRules::default(), None, WinnerMode::TableTopper);
        assert!(matches!(
            m.reset_match(&id, "nope"),
            Err(TournamentError::MatchNotFound(_))
        ));
    }
}
