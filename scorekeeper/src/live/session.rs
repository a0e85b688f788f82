//! Live scoring for a single match.
//!
//! A session owns the running totals, a bounded undo log and the play
//! clock. It finishes either explicitly ([`LiveScoreSession::finish`]) or on
//! its own when the format's points target or time limit is hit. A timed
//! match that is level at the limit, where draws are not allowed, goes to a
//! golden point: play continues and the next score that breaks the tie wins.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::{cmp::Ordering, collections::VecDeque, time::Duration};

use super::clock::{Clock, SystemClock};
use super::config::{ScoreFormat, SessionConfig};
use super::errors::{SessionError, SessionResult};
use crate::tournament::models::{
    DraftState, HistoryEntry, MatchStatus, ScorePair, Scoresheet, Side, Winner,
};

/// Final result of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won(Side),
    Draw,
}

impl Outcome {
    fn from_scores(scores: ScorePair) -> Self {
        match scores.score1.cmp(&scores.score2) {
            Ordering::Greater => Outcome::Won(Side::One),
            Ordering::Less => Outcome::Won(Side::Two),
            Ordering::Equal => Outcome::Draw,
        }
    }

    pub fn winner(self, team1_id: &str, team2_id: &str) -> Winner {
        match self {
            Outcome::Won(Side::One) => Winner::team(team1_id),
            Outcome::Won(Side::Two) => Winner::team(team2_id),
            Outcome::Draw => Winner::Draw,
        }
    }
}

/// What ended the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionTrigger {
    PointsTarget,
    TimeLimit,
    /// First score after a level finish at the time limit
    GoldenPoint,
    Manual,
}

/// A finished match, ready to be written onto its scoresheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchCompletion {
    pub scores: ScorePair,
    pub outcome: Outcome,
    pub trigger: CompletionTrigger,
    pub completed_at: DateTime<Utc>,
    /// How long the caller should wait before persisting and leaving the view
    pub persist_after: Duration,
}

impl MatchCompletion {
    /// Record the result: scores, status, winner. Clears any draft.
    pub fn apply(&self, sheet: &mut Scoresheet, team1_id: &str, team2_id: &str) {
        sheet.score1 = Some(self.scores.score1);
        sheet.score2 = Some(self.scores.score2);
        sheet.complete(Some(self.outcome.winner(team1_id, team2_id)));
    }
}

/// Result of a single scoring action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreOutcome {
    Applied,
    /// Dropped: too soon after the previous action
    Debounced,
    /// The action reached the points target and finished the match
    Completed(MatchCompletion),
}

/// In-memory scoring state for one match
#[derive(Debug)]
pub struct LiveScoreSession<C: Clock = SystemClock> {
    format: ScoreFormat,
    config: SessionConfig,
    clock: C,
    scores: ScorePair,
    history: VecDeque<HistoryEntry>,
    last_action_at: Option<DateTime<Utc>>,
    elapsed_secs: u64,
    timer_started: bool,
    completion: Option<MatchCompletion>,
}

impl LiveScoreSession<SystemClock> {
    /// Fresh session at 0-0
    pub fn new(format: ScoreFormat, config: SessionConfig) -> Self {
        Self::with_clock(format, config, SystemClock)
    }

    /// Pick up from a match's draft, or from its recorded scores if it has none
    pub fn resume(sheet: &Scoresheet, format: ScoreFormat, config: SessionConfig) -> Self {
        Self::resume_with_clock(sheet, format, config, SystemClock)
    }
}

impl<C: Clock> LiveScoreSession<C> {
    pub fn with_clock(format: ScoreFormat, config: SessionConfig, clock: C) -> Self {
        Self {
            format,
            config,
            clock,
            scores: ScorePair::default(),
            history: VecDeque::with_capacity(config.history_limit),
            last_action_at: None,
            elapsed_secs: 0,
            timer_started: false,
            completion: None,
        }
    }

    pub fn resume_with_clock(
        sheet: &Scoresheet,
        format: ScoreFormat,
        config: SessionConfig,
        clock: C,
    ) -> Self {
        let mut session = Self::with_clock(format, config, clock);
        match &sheet.draft_state {
            Some(draft) => {
                session.scores = ScorePair::new(draft.score1, draft.score2);
                session.history = draft.history.iter().copied().collect();
                session.elapsed_secs = draft.elapsed_secs;
                session.timer_started = draft.elapsed_secs > 0 || !draft.history.is_empty();
                debug!(
                    "Resumed draft at {}-{} with {} undo entries",
                    draft.score1,
                    draft.score2,
                    draft.history.len()
                );
            }
            None => {
                session.scores = ScorePair::new(sheet.score1.unwrap_or(0), sheet.score2.unwrap_or(0));
            }
        }
        session
    }

    pub fn scores(&self) -> ScorePair {
        self.scores
    }

    pub fn format(&self) -> &ScoreFormat {
        &self.format
    }

    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    /// Seconds left on the clock in timed mode
    pub fn remaining_secs(&self) -> Option<u64> {
        self.format
            .time_limit_secs
            .map(|limit| limit.saturating_sub(self.elapsed_secs))
    }

    pub fn is_completed(&self) -> bool {
        self.completion.is_some()
    }

    pub fn completion(&self) -> Option<&MatchCompletion> {
        self.completion.as_ref()
    }

    fn time_expired(&self) -> bool {
        self.format
            .time_limit_secs
            .is_some_and(|limit| self.elapsed_secs >= limit)
    }

    /// Time is up with the scores level and no draw allowed: the next score decides
    pub fn is_golden_point(&self) -> bool {
        self.completion.is_none()
            && self.time_expired()
            && !self.format.draw_allowed
            && self.scores.score1 == self.scores.score2
    }

    /// Change one side's total by `delta`.
    ///
    /// Taps closer than the debounce window to the previous accepted tap are
    /// dropped. Reaching the points target finishes the match, as does
    /// breaking the tie on a golden point.
    pub fn add_score(&mut self, side: Side, delta: i32) -> SessionResult<ScoreOutcome> {
        if self.completion.is_some() {
            return Err(SessionError::AlreadyCompleted);
        }
        let golden_point = self.is_golden_point();
        if let Some(limit_secs) = self.format.time_limit_secs {
            if self.elapsed_secs >= limit_secs && !golden_point {
                warn!("Score change rejected: time limit of {limit_secs}s elapsed");
                return Err(SessionError::TimeLimitReached { limit_secs });
            }
        }

        let now = self.clock.now();
        if let Some(last) = self.last_action_at {
            let since = (now - last).to_std().unwrap_or(Duration::ZERO);
            if since < self.config.debounce() {
                debug!("Dropped score change inside the debounce window");
                return Ok(ScoreOutcome::Debounced);
            }
        }
        self.last_action_at = Some(now);

        self.history.push_back(HistoryEntry {
            timestamp: now,
            score_before: self.scores,
        });
        while self.history.len() > self.config.history_limit {
            self.history.pop_front();
        }

        let total = match side {
            Side::One => &mut self.scores.score1,
            Side::Two => &mut self.scores.score2,
        };
        *total = total.saturating_add(delta);
        if self.format.floor_at_zero {
            *total = (*total).max(0);
        }
        self.timer_started = true;

        if let Some(target) = self.format.points_target {
            if self.scores.score1 >= target || self.scores.score2 >= target {
                let completion = self.complete(CompletionTrigger::PointsTarget);
                return Ok(ScoreOutcome::Completed(completion));
            }
        }
        if golden_point && self.scores.score1 != self.scores.score2 {
            let completion = self.complete(CompletionTrigger::GoldenPoint);
            return Ok(ScoreOutcome::Completed(completion));
        }

        Ok(ScoreOutcome::Applied)
    }

    /// Restore the scores from before the most recent action on either side.
    ///
    /// Returns `false` when there is nothing to undo or the match is finished.
    pub fn undo(&mut self) -> bool {
        if self.completion.is_some() {
            return false;
        }
        match self.history.pop_back() {
            Some(entry) => {
                self.scores = entry.score_before;
                true
            }
            None => false,
        }
    }

    /// Advance the play clock by one second.
    ///
    /// The clock only runs once the first point has been scored. In timed
    /// mode, reaching the limit finishes the match on the current scores
    /// unless it is level and draws are not allowed.
    pub fn tick(&mut self) -> Option<MatchCompletion> {
        if self.completion.is_some() || !self.timer_started {
            return None;
        }
        if self.is_golden_point() {
            return None;
        }
        self.elapsed_secs += 1;
        if self.is_golden_point() {
            info!(
                "Level at {}-{} when time ran out, next score wins",
                self.scores.score1, self.scores.score2
            );
            return None;
        }
        if self.time_expired() {
            return Some(self.complete(CompletionTrigger::TimeLimit));
        }
        None
    }

    /// Finish on the current scores, rejecting a draw where draws are not allowed
    pub fn finish(&mut self) -> SessionResult<MatchCompletion> {
        if self.completion.is_some() {
            return Err(SessionError::AlreadyCompleted);
        }
        if self.scores.score1 == self.scores.score2 && !self.format.draw_allowed {
            warn!(
                "Finish rejected: level at {}-{} and draws are not allowed",
                self.scores.score1, self.scores.score2
            );
            return Err(SessionError::DrawNotAllowed);
        }
        Ok(self.complete(CompletionTrigger::Manual))
    }

    fn complete(&mut self, trigger: CompletionTrigger) -> MatchCompletion {
        let completion = MatchCompletion {
            scores: self.scores,
            outcome: Outcome::from_scores(self.scores),
            trigger,
            completed_at: self.clock.now(),
            persist_after: match trigger {
                CompletionTrigger::Manual => Duration::ZERO,
                CompletionTrigger::PointsTarget
                | CompletionTrigger::TimeLimit
                | CompletionTrigger::GoldenPoint => {
                    self.config.completion_delay()
                }
            },
        };
        info!(
            "Match finished {}-{} ({:?})",
            self.scores.score1, self.scores.score2, trigger
        );
        self.completion = Some(completion);
        completion
    }

    /// Snapshot for resuming later, keeping only the most recent undo entries
    pub fn draft(&self) -> DraftState {
        let skip = self.history.len().saturating_sub(self.config.draft_history_limit);
        DraftState {
            score1: self.scores.score1,
            score2: self.scores.score2,
            history: self.history.iter().skip(skip).copied().collect(),
            elapsed_secs: self.elapsed_secs,
            saved_at: self.clock.now(),
        }
    }

    /// Park the session on the match: stores the draft and marks it in progress
    pub fn save_draft(&self, sheet: &mut Scoresheet) {
        sheet.draft_state = Some(self.draft());
        sheet.status = MatchStatus::InProgress;
    }
}
