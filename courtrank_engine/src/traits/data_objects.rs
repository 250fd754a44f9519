use std::{fmt::Display, str::FromStr};

use chrono::Duration;
use cr_common::Rating;
use serde::{Deserialize, Serialize};

use crate::db_types::{Challenge, Match, MatchId};

//--------------------------------------   PressStartOutcome   -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct PressStartOutcome {
    pub match_record: Match,
    /// Both participants have now pressed start and the clock was set by this call.
    pub went_live: bool,
    /// This call recorded a new press (false when the caller had already pressed).
    pub newly_pressed: bool,
}

//--------------------------------------  PendingConfirmation  -------------------------------------------------------
/// A submitted, unsettled result waiting on the caller. `submitter_name` is resolved for display.
#[derive(Debug, Clone, Serialize)]
pub struct PendingConfirmation {
    pub match_record: Match,
    pub submitter_name: String,
}

//--------------------------------------     RatingDelta       -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingDelta {
    pub user_id: String,
    pub rating_before: Rating,
    pub rating_after: Rating,
}

//--------------------------------------   RatingSkipReason    -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingSkipReason {
    NotFinalized,
    NoResult,
    NoOpponent,
    TieOrBadScore,
    AlreadyApplied,
}

impl Display for RatingSkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RatingSkipReason::NotFinalized => write!(f, "not_finalized"),
            RatingSkipReason::NoResult => write!(f, "no_result"),
            RatingSkipReason::NoOpponent => write!(f, "no_opponent"),
            RatingSkipReason::TieOrBadScore => write!(f, "tie_or_bad_score"),
            RatingSkipReason::AlreadyApplied => write!(f, "already_applied"),
        }
    }
}

//--------------------------------------     RatingOutcome     -------------------------------------------------------
/// The result of an [`apply_match_rating`](crate::traits::RatingManagement::apply_match_rating) call.
/// Skips are not errors; settlement paths probe this call freely and rely on it being idempotent.
#[derive(Debug, Clone, Serialize)]
pub struct RatingOutcome {
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RatingSkipReason>,
    pub deltas: Vec<RatingDelta>,
}

impl RatingOutcome {
    pub fn applied(deltas: Vec<RatingDelta>) -> Self {
        Self { applied: true, reason: None, deltas }
    }

    pub fn skipped(reason: RatingSkipReason) -> Self {
        Self { applied: false, reason: Some(reason), deltas: Vec::new() }
    }
}

//--------------------------------------   RevertSkipReason    -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevertSkipReason {
    NothingApplied,
    AlreadyReverted,
}

impl Display for RevertSkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RevertSkipReason::NothingApplied => write!(f, "nothing_applied"),
            RevertSkipReason::AlreadyReverted => write!(f, "already_reverted"),
        }
    }
}

//--------------------------------------     RevertOutcome     -------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub struct RevertOutcome {
    pub reverted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RevertSkipReason>,
    /// Per-user restorations, recorded as `rating_before` (pre-revert) → `rating_after` (restored value).
    pub restored: Vec<RatingDelta>,
}

impl RevertOutcome {
    pub fn reverted(restored: Vec<RatingDelta>) -> Self {
        Self { reverted: true, reason: None, restored }
    }

    pub fn skipped(reason: RevertSkipReason) -> Self {
        Self { reverted: false, reason: Some(reason), restored: Vec::new() }
    }
}

//--------------------------------------      Reputation       -------------------------------------------------------
/// The trailing 12-month reputation score. Always recomputed from the matches table, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reputation {
    pub posted: i64,
    pub contested: i64,
    pub score: f64,
}

impl Reputation {
    pub fn new(posted: i64, contested: i64) -> Self {
        let score = if posted == 0 {
            5.0
        } else {
            let raw = 5.0 - 4.0 * (contested as f64 / posted as f64);
            (raw * 10.0).round() / 10.0
        };
        Self { posted, contested, score }
    }
}

//--------------------------------------     HistoryRange      -------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryRange {
    Week,
    Month,
    Year,
    #[default]
    All,
}

impl HistoryRange {
    /// The lookback window, or `None` for the full history.
    pub fn window(&self) -> Option<Duration> {
        match self {
            HistoryRange::Week => Some(Duration::days(7)),
            HistoryRange::Month => Some(Duration::days(30)),
            HistoryRange::Year => Some(Duration::days(365)),
            HistoryRange::All => None,
        }
    }
}

impl FromStr for HistoryRange {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1w" => Ok(Self::Week),
            "1m" => Ok(Self::Month),
            "1y" => Ok(Self::Year),
            "all" | "" => Ok(Self::All),
            _ => Err(()),
        }
    }
}

impl Display for HistoryRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryRange::Week => write!(f, "1w"),
            HistoryRange::Month => write!(f, "1m"),
            HistoryRange::Year => write!(f, "1y"),
            HistoryRange::All => write!(f, "all"),
        }
    }
}

//--------------------------------------     ChallengeBox      -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeBox {
    Inbox,
    Outbox,
}

impl FromStr for ChallengeBox {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inbox" => Ok(Self::Inbox),
            "outbox" => Ok(Self::Outbox),
            _ => Err(()),
        }
    }
}

//--------------------------------------   ChallengeOutcome    -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct ChallengeOutcome {
    pub challenge: Challenge,
    /// An equivalent pending challenge already existed and was returned instead of inserting a new one.
    pub deduplicated: bool,
}

//--------------------------------------   MatchSweepReport    -------------------------------------------------------
/// What the settlement sweep did: which overdue matches were auto-accepted, and how many of the finalized,
/// unrated matches had a rating applied on this pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchSweepReport {
    pub auto_accepted: Vec<MatchId>,
    pub rated: usize,
}

impl Display for MatchSweepReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} matches auto-accepted, {} rated", self.auto_accepted.len(), self.rated)
    }
}

//-------------------------------------- ChallengeSweepReport  -------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChallengeSweepReport {
    pub challenges_expired: usize,
    pub invites_expired: usize,
}

impl Display for ChallengeSweepReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} challenges expired, {} invites expired", self.challenges_expired, self.invites_expired)
    }
}

#[cfg(test)]
mod test {
    use super::Reputation;

    #[test]
    fn reputation_with_no_posts_is_five() {
        assert_eq!(Reputation::new(0, 0).score, 5.0);
    }

    #[test]
    fn reputation_rounds_to_one_decimal() {
        // 5 - 4*(1/3) = 3.666… → 3.7
        assert_eq!(Reputation::new(3, 1).score, 3.7);
        // 5 - 4*(2/7) = 3.857… → 3.9
        assert_eq!(Reputation::new(7, 2).score, 3.9);
    }

    #[test]
    fn reputation_bottoms_out_at_one() {
        assert_eq!(Reputation::new(4, 4).score, 1.0);
    }
}
