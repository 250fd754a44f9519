use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use cr_common::Rating;
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::helpers::random_public_id;

//--------------------------------------        MatchId        -------------------------------------------------------
/// The opaque public identifier for a match. Clients only ever see this, never the row id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct MatchId(pub String);

impl MatchId {
    pub fn random() -> Self {
        Self(random_public_id(16))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for MatchId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for MatchId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for MatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------      MatchStatus      -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum MatchStatus {
    /// The match has been created and at least one participant has not pressed start yet.
    Waiting,
    /// Both participants pressed start and the match clock is running.
    Live,
    /// A result has been submitted and the match is in (or past) its settlement window.
    Ended,
}

impl Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Waiting => write!(f, "Waiting"),
            MatchStatus::Live => write!(f, "Live"),
            MatchStatus::Ended => write!(f, "Ended"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid status value: {0}")]
pub struct StatusConversionError(String);

impl FromStr for MatchStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Waiting" => Ok(Self::Waiting),
            "Live" => Ok(Self::Live),
            "Ended" => Ok(Self::Ended),
            s => Err(StatusConversionError(format!("Invalid match status: {s}"))),
        }
    }
}

impl From<String> for MatchStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid match status: {value}. But this conversion cannot fail. Defaulting to Waiting");
            MatchStatus::Waiting
        })
    }
}

//--------------------------------------        Match          -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Match {
    pub id: i64,
    pub match_id: MatchId,
    pub creator_id: String,
    pub opponent_id: Option<String>,
    pub status: MatchStatus,
    pub started_by_creator: bool,
    pub started_by_opponent: bool,
    pub timer_start: Option<DateTime<Utc>>,
    pub score_creator: Option<i64>,
    pub score_opponent: Option<i64>,
    pub submitted_by: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub deadline_at: Option<DateTime<Utc>>,
    pub confirmed_by: Option<String>,
    pub contested_by: Option<String>,
    pub finalized: bool,
    pub auto_accepted_at: Option<DateTime<Utc>>,
    pub provisional_rating_applied: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    pub fn is_participant(&self, user_id: &str) -> bool {
        self.creator_id == user_id || self.opponent_id.as_deref() == Some(user_id)
    }

    pub fn other_participant(&self, user_id: &str) -> Option<&str> {
        if self.creator_id == user_id {
            self.opponent_id.as_deref()
        } else if self.opponent_id.as_deref() == Some(user_id) {
            Some(self.creator_id.as_str())
        } else {
            None
        }
    }

    pub fn has_pressed_start(&self, user_id: &str) -> bool {
        if self.creator_id == user_id {
            self.started_by_creator
        } else {
            self.opponent_id.as_deref() == Some(user_id) && self.started_by_opponent
        }
    }

    pub fn has_result(&self) -> bool {
        self.submitted_by.is_some()
    }

    /// The settled outcome, if there is one. Returns `(winner_id, loser_id, margin)`, or `None` for a missing
    /// result, a missing opponent, or a tie.
    pub fn outcome(&self) -> Option<(&str, &str, i64)> {
        let opponent = self.opponent_id.as_deref()?;
        let (sc, so) = (self.score_creator?, self.score_opponent?);
        match sc.cmp(&so) {
            std::cmp::Ordering::Greater => Some((self.creator_id.as_str(), opponent, sc - so)),
            std::cmp::Ordering::Less => Some((opponent, self.creator_id.as_str(), so - sc)),
            std::cmp::Ordering::Equal => None,
        }
    }
}

//--------------------------------------       NewMatch        -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewMatch {
    pub match_id: MatchId,
    pub creator_id: String,
    pub opponent_id: Option<String>,
}

impl NewMatch {
    pub fn new<S: Into<String>>(creator_id: S) -> Self {
        Self { match_id: MatchId::random(), creator_id: creator_id.into(), opponent_id: None }
    }

    pub fn with_opponent<S: Into<String>>(mut self, opponent_id: S) -> Self {
        self.opponent_id = Some(opponent_id.into());
        self
    }
}

//--------------------------------------      ChallengeId      -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ChallengeId(pub String);

impl ChallengeId {
    pub fn random() -> Self {
        Self(random_public_id(16))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ChallengeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for ChallengeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------    ChallengeStatus    -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ChallengeStatus {
    Pending,
    Accepted,
    Declined,
    Cancelled,
    Expired,
}

impl Display for ChallengeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChallengeStatus::Pending => write!(f, "Pending"),
            ChallengeStatus::Accepted => write!(f, "Accepted"),
            ChallengeStatus::Declined => write!(f, "Declined"),
            ChallengeStatus::Cancelled => write!(f, "Cancelled"),
            ChallengeStatus::Expired => write!(f, "Expired"),
        }
    }
}

impl FromStr for ChallengeStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Accepted" => Ok(Self::Accepted),
            "Declined" => Ok(Self::Declined),
            "Cancelled" => Ok(Self::Cancelled),
            "Expired" => Ok(Self::Expired),
            s => Err(StatusConversionError(format!("Invalid challenge status: {s}"))),
        }
    }
}

impl From<String> for ChallengeStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid challenge status: {value}. But this conversion cannot fail. Defaulting to Pending");
            ChallengeStatus::Pending
        })
    }
}

//--------------------------------------       Challenge       -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Challenge {
    pub id: i64,
    pub challenge_id: ChallengeId,
    pub from_id: String,
    pub to_id: String,
    pub message: Option<String>,
    pub status: ChallengeStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     NewChallenge      -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewChallenge {
    pub challenge_id: ChallengeId,
    pub from_id: String,
    pub to_id: String,
    pub message: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl NewChallenge {
    pub fn new<S: Into<String>>(from_id: S, to_id: S, expires_at: DateTime<Utc>) -> Self {
        Self { challenge_id: ChallengeId::random(), from_id: from_id.into(), to_id: to_id.into(), message: None, expires_at }
    }

    pub fn with_message<S: Into<String>>(mut self, message: S) -> Self {
        self.message = Some(message.into());
        self
    }
}

//--------------------------------------      InviteStatus     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum InviteStatus {
    Open,
    Redeemed,
    Expired,
}

impl Display for InviteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InviteStatus::Open => write!(f, "Open"),
            InviteStatus::Redeemed => write!(f, "Redeemed"),
            InviteStatus::Expired => write!(f, "Expired"),
        }
    }
}

impl FromStr for InviteStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(Self::Open),
            "Redeemed" => Ok(Self::Redeemed),
            "Expired" => Ok(Self::Expired),
            s => Err(StatusConversionError(format!("Invalid invite status: {s}"))),
        }
    }
}

impl From<String> for InviteStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid invite status: {value}. But this conversion cannot fail. Defaulting to Open");
            InviteStatus::Open
        })
    }
}

//--------------------------------------        Invite         -------------------------------------------------------
/// A shareable quick-match token. Anyone other than the issuer can redeem an open invite before it expires,
/// which creates a waiting match between issuer and redeemer.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Invite {
    pub id: i64,
    pub token: String,
    pub created_by: String,
    pub status: InviteStatus,
    pub redeemed_by: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        Player         -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub display_name: String,
    pub rating: Rating,
    pub games_played: i64,
    pub games_contested: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       NewPlayer       -------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct NewPlayer {
    pub id: String,
    pub display_name: String,
}

impl NewPlayer {
    pub fn new<S: Into<String>>(id: S, display_name: S) -> Self {
        Self { id: id.into(), display_name: display_name.into() }
    }
}

//--------------------------------------      HistoryKind      -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum HistoryKind {
    /// A settlement applied a rating delta.
    Forward,
    /// A contest rolled a prior settlement back. The inverse entry is appended; nothing is ever deleted.
    Reversal,
}

impl Display for HistoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryKind::Forward => write!(f, "Forward"),
            HistoryKind::Reversal => write!(f, "Reversal"),
        }
    }
}

impl FromStr for HistoryKind {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Forward" => Ok(Self::Forward),
            "Reversal" => Ok(Self::Reversal),
            s => Err(StatusConversionError(format!("Invalid history kind: {s}"))),
        }
    }
}

impl From<String> for HistoryKind {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid history kind: {value}. But this conversion cannot fail. Defaulting to Forward");
            HistoryKind::Forward
        })
    }
}

//--------------------------------------    RankHistoryEntry   -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RankHistoryEntry {
    pub id: i64,
    pub user_id: String,
    pub match_id: MatchId,
    pub kind: HistoryKind,
    pub rating_before: Rating,
    pub rating_after: Rating,
    pub created_at: DateTime<Utc>,
}
