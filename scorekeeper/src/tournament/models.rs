//! Tournament data models.
//!
//! Field names serialize in camelCase so a persisted tournament reads back
//! exactly as the store wrote it (`team1Id`, `draftState`, `knockoutMatches`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::rules::ScoringRules;

/// Team ID type
pub type TeamId = String;

/// Match ID type
pub type MatchId = String;

/// Tournament ID type
pub type TournamentId = String;

/// Name shown for a team id that is missing from the roster
pub const UNKNOWN_TEAM: &str = "Unknown";

/// Name shown for an unseeded knockout slot
pub const TBD_TEAM: &str = "TBD";

/// A participating team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
}

impl Team {
    pub fn new(id: impl Into<TeamId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn with_members(mut self, members: Vec<String>) -> Self {
        self.members = members;
        self
    }
}

/// One of the two sides of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    One,
    Two,
}

impl Side {
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Side::One => Side::Two,
            Side::Two => Side::One,
        }
    }
}

/// Match lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStatus::Pending => write!(f, "pending"),
            MatchStatus::InProgress => write!(f, "in-progress"),
            MatchStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Recorded match winner.
///
/// Persisted as a bare string: a team id, `"draw"` or `"tie"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Winner {
    Team(TeamId),
    Draw,
    Tie,
}

impl Winner {
    pub fn team(id: impl Into<TeamId>) -> Self {
        Winner::Team(id.into())
    }

    /// The winning team id, if the match had one
    pub fn team_id(&self) -> Option<&TeamId> {
        match self {
            Winner::Team(id) => Some(id),
            Winner::Draw | Winner::Tie => None,
        }
    }
}

impl Serialize for Winner {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Winner::Team(id) => serializer.serialize_str(id),
            Winner::Draw => serializer.serialize_str("draw"),
            Winner::Tie => serializer.serialize_str("tie"),
        }
    }
}

impl<'de> Deserialize<'de> for Winner {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "draw" => Winner::Draw,
            "tie" => Winner::Tie,
            _ => Winner::Team(raw),
        })
    }
}

/// A single set in a sets-based match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetScore {
    pub score1: u32,
    pub score2: u32,
}

impl SetScore {
    pub const fn new(score1: u32, score2: u32) -> Self {
        Self { score1, score2 }
    }

    /// Side that took the set; `None` for a level set
    pub fn winner(&self) -> Option<Side> {
        match self.score1.cmp(&self.score2) {
            std::cmp::Ordering::Greater => Some(Side::One),
            std::cmp::Ordering::Less => Some(Side::Two),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// One side's batting innings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CricketInnings {
    pub runs: u32,
    pub wickets: u32,
    /// Legal deliveries faced
    pub balls: u32,
}

impl CricketInnings {
    pub const fn new(runs: u32, wickets: u32, balls: u32) -> Self {
        Self {
            runs,
            wickets,
            balls,
        }
    }
}

/// Both innings of a limited-overs match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CricketScore {
    pub team1: CricketInnings,
    pub team2: CricketInnings,
    /// Abandoned without a result
    #[serde(default)]
    pub no_result: bool,
}

/// Both running totals at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorePair {
    pub score1: i32,
    pub score2: i32,
}

impl ScorePair {
    pub const fn new(score1: i32, score2: i32) -> Self {
        Self { score1, score2 }
    }
}

/// Undo log entry: the scores as they were before a scoring action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub score_before: ScorePair,
}

/// Resumable snapshot of an interrupted live-scoring session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftState {
    pub score1: i32,
    pub score2: i32,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub elapsed_secs: u64,
    pub saved_at: DateTime<Utc>,
}

/// Result fields shared by group and knockout matches.
///
/// Only the fields relevant to the tournament's scoring engine are populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scoresheet {
    #[serde(default)]
    pub status: MatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score1: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score2: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sets: Vec<SetScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub innings: Option<CricketScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_state: Option<DraftState>,
}

impl Scoresheet {
    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    pub fn is_pending(&self) -> bool {
        self.status == MatchStatus::Pending
    }

    /// Both integer scores, when both are recorded
    pub fn scores(&self) -> Option<(i32, i32)> {
        self.score1.zip(self.score2)
    }

    /// Mark completed with the given winner. Completion always drops the draft.
    pub fn complete(&mut self, winner: Option<Winner>) {
        self.status = MatchStatus::Completed;
        self.winner = winner;
        self.draft_state = None;
    }

    /// Wipe every result field back to an unplayed match
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// A round-robin group stage match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub team1_id: TeamId,
    pub team2_id: TeamId,
    #[serde(flatten)]
    pub sheet: Scoresheet,
}

impl Match {
    pub fn new(id: impl Into<MatchId>, team1_id: impl Into<TeamId>, team2_id: impl Into<TeamId>) -> Self {
        Self {
            id: id.into(),
            team1_id: team1_id.into(),
            team2_id: team2_id.into(),
            sheet: Scoresheet::default(),
        }
    }

    pub fn involves(&self, team_id: &str) -> bool {
        self.team1_id == team_id || self.team2_id == team_id
    }
}

/// Knockout bracket slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnockoutRound {
    #[serde(rename = "semi-1")]
    Semi1,
    #[serde(rename = "semi-2")]
    Semi2,
    #[serde(rename = "final")]
    Final,
    #[serde(rename = "third-place")]
    ThirdPlace,
}

impl KnockoutRound {
    pub const fn default_label(self) -> &'static str {
        match self {
            KnockoutRound::Semi1 => "Semi-Final 1",
            KnockoutRound::Semi2 => "Semi-Final 2",
            KnockoutRound::Final => "Final",
            KnockoutRound::ThirdPlace => "Third Place",
        }
    }
}

impl fmt::Display for KnockoutRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnockoutRound::Semi1 => write!(f, "semi-1"),
            KnockoutRound::Semi2 => write!(f, "semi-2"),
            KnockoutRound::Final => write!(f, "final"),
            KnockoutRound::ThirdPlace => write!(f, "third-place"),
        }
    }
}

/// A knockout stage match. Team slots stay `None` (TBD) until seeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnockoutMatch {
    pub id: MatchId,
    pub round: KnockoutRound,
    pub label: String,
    pub team1_id: Option<TeamId>,
    pub team2_id: Option<TeamId>,
    #[serde(flatten)]
    pub sheet: Scoresheet,
}

impl KnockoutMatch {
    /// Unseeded slot
    pub fn tbd(id: impl Into<MatchId>, round: KnockoutRound) -> Self {
        Self {
            id: id.into(),
            round,
            label: round.default_label().to_string(),
            team1_id: None,
            team2_id: None,
            sheet: Scoresheet::default(),
        }
    }

    pub fn seeded(
        id: impl Into<MatchId>,
        round: KnockoutRound,
        team1_id: impl Into<TeamId>,
        team2_id: impl Into<TeamId>,
    ) -> Self {
        let mut slot = Self::tbd(id, round);
        slot.team1_id = Some(team1_id.into());
        slot.team2_id = Some(team2_id.into());
        slot
    }

    pub fn is_seeded(&self) -> bool {
        self.team1_id.is_some() && self.team2_id.is_some()
    }

    pub fn has_any_team(&self) -> bool {
        self.team1_id.is_some() || self.team2_id.is_some()
    }

    /// `(winner, loser)` once the match is completed with a team winner
    /// that occupies one of the two slots
    pub fn decided(&self) -> Option<(TeamId, TeamId)> {
        if !self.sheet.is_completed() {
            return None;
        }
        let winner = self.sheet.winner.as_ref()?.team_id()?;
        let (team1, team2) = (self.team1_id.as_ref()?, self.team2_id.as_ref()?);
        if winner == team1 {
            Some((team1.clone(), team2.clone()))
        } else if winner == team2 {
            Some((team2.clone(), team1.clone()))
        } else {
            None
        }
    }
}

/// Knockout configuration, fixed for the life of a tournament
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnockoutConfig {
    /// 2 (straight to the final) or 4 (semi-finals first)
    pub teams_advancing: u8,
    pub third_place_match: bool,
}

impl KnockoutConfig {
    pub const fn new(teams_advancing: u8, third_place_match: bool) -> Self {
        Self {
            teams_advancing,
            third_place_match,
        }
    }

    pub const fn is_valid(&self) -> bool {
        matches!(self.teams_advancing, 2 | 4)
    }

    /// A third-place match only exists when there are semi-finals to lose
    pub const fn has_third_place(&self) -> bool {
        self.third_place_match && self.teams_advancing == 4
    }
}

/// Tournament phase. Moves from `Group` to `Knockout`, never back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentPhase {
    #[default]
    Group,
    Knockout,
}

/// How the champion is decided
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WinnerMode {
    #[default]
    TableTopper,
    Knockouts,
}

/// A tournament: the sole owner of its group and knockout matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub teams: Vec<Team>,
    #[serde(default)]
    pub matches: Vec<Match>,
    /// Scoring engine, selected once at creation
    #[serde(default)]
    pub rules: ScoringRules,
    #[serde(default)]
    pub knockout_config: Option<KnockoutConfig>,
    #[serde(default)]
    pub knockout_matches: Vec<KnockoutMatch>,
    #[serde(default)]
    pub phase: TournamentPhase,
    #[serde(default)]
    pub winner_mode: WinnerMode,
    pub created_at: DateTime<Utc>,
}

/// Mutable view of one match of either stage
#[derive(Debug)]
pub struct FixtureMut<'a> {
    pub team1_id: Option<TeamId>,
    pub team2_id: Option<TeamId>,
    pub knockout: bool,
    pub sheet: &'a mut Scoresheet,
}

impl Tournament {
    pub fn team(&self, team_id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == team_id)
    }

    /// Team name, or `"Unknown"` when the id is not on the roster
    pub fn team_name(&self, team_id: &str) -> &str {
        self.team(team_id).map_or(UNKNOWN_TEAM, |t| t.name.as_str())
    }

    /// Name for a knockout slot, `"TBD"` while unseeded
    pub fn slot_name(&self, team_id: Option<&TeamId>) -> &str {
        team_id.map_or(TBD_TEAM, |id| self.team_name(id))
    }

    pub fn knockout_match(&self, round: KnockoutRound) -> Option<&KnockoutMatch> {
        self.knockout_matches.iter().find(|m| m.round == round)
    }

    pub fn fixture_mut(&mut self, match_id: &str) -> Option<FixtureMut<'_>> {
        if let Some(m) = self.matches.iter_mut().find(|m| m.id == match_id) {
            return Some(FixtureMut {
                team1_id: Some(m.team1_id.clone()),
                team2_id: Some(m.team2_id.clone()),
                knockout: false,
                sheet: &mut m.sheet,
            });
        }
        self.knockout_matches
            .iter_mut()
            .find(|m| m.id == match_id)
            .map(|m| FixtureMut {
                team1_id: m.team1_id.clone(),
                team2_id: m.team2_id.clone(),
                knockout: true,
                sheet: &mut m.sheet,
            })
    }

    /// Scoresheet of a match in either stage
    pub fn sheet(&self, match_id: &str) -> Option<&Scoresheet> {
        self.matches
            .iter()
            .find(|m| m.id == match_id)
            .map(|m| &m.sheet)
            .or_else(|| {
                self.knockout_matches
                    .iter()
                    .find(|m| m.id == match_id)
                    .map(|m| &m.sheet)
            })
    }
}

/// A value paired with whether a pass actually modified it.
///
/// Passes hand back their input untouched when nothing needed doing, so the
/// caller can skip persisting without comparing whole aggregates.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changed<T> {
    pub value: T,
    pub changed: bool,
}

impl<T> Changed<T> {
    pub const fn unchanged(value: T) -> Self {
        Self {
            value,
            changed: false,
        }
    }

    pub const fn updated(value: T) -> Self {
        Self {
            value,
            changed: true,
        }
    }

    pub const fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    /// Run another pass on the value; the result is changed if either pass changed it
    pub fn and_then(self, pass: impl FnOnce(T) -> Changed<T>) -> Changed<T> {
        let next = pass(self.value);
        Changed {
            value: next.value,
            changed: self.changed || next.changed,
        }
    }
}
