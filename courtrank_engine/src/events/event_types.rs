use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::{Challenge, ChallengeStatus, Match};

/// One participant has pressed start and is waiting on the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReadyEvent {
    pub match_record: Match,
    /// The participant who just pressed start.
    pub ready_player: String,
}

impl MatchReadyEvent {
    pub fn new(match_record: Match, ready_player: String) -> Self {
        Self { match_record, ready_player }
    }
}

/// A score landed and is waiting on the opponent's confirmation (or contest, or the deadline).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreSubmittedEvent {
    pub match_record: Match,
}

impl ScoreSubmittedEvent {
    pub fn new(match_record: Match) -> Self {
        Self { match_record }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementKind {
    Confirmed,
    Contested,
    AutoAccepted,
}

impl Display for SettlementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettlementKind::Confirmed => write!(f, "confirmed"),
            SettlementKind::Contested => write!(f, "contested"),
            SettlementKind::AutoAccepted => write!(f, "auto-accepted"),
        }
    }
}

/// A match finalized, through exactly one of the three settlement paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSettledEvent {
    pub match_record: Match,
    pub kind: SettlementKind,
}

impl MatchSettledEvent {
    pub fn new(match_record: Match, kind: SettlementKind) -> Self {
        Self { match_record, kind }
    }
}

/// A challenge was created or the recipient responded to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeEvent {
    pub challenge: Challenge,
    pub status: ChallengeStatus,
}

impl ChallengeEvent {
    pub fn new(challenge: Challenge) -> Self {
        let status = challenge.status;
        Self { challenge, status }
    }
}
