use chrono::Duration;
use thiserror::Error;

use crate::{
    db_types::{Challenge, ChallengeId, Invite, Match, NewChallenge},
    traits::data_objects::{ChallengeBox, ChallengeOutcome},
};

/// Challenge and invite negotiation, and their TTL expiry sweeps.
///
/// A challenge is a directed request from one player to another; accepting one creates exactly one `Waiting`
/// match in the same transaction. An invite is an undirected token the issuer shares out-of-band; redeeming one
/// creates the match between issuer and redeemer.
#[allow(async_fn_in_trait)]
pub trait ChallengeManagement: Clone {
    /// Creates a pending challenge. If an equivalent pending challenge between the pair already exists (in
    /// either direction), it is returned instead and nothing is inserted.
    async fn create_challenge(&self, challenge: NewChallenge) -> Result<ChallengeOutcome, ChallengeApiError>;

    /// The recipient accepts. The challenge moves to `Accepted` and a `Waiting` match between the pair is
    /// created in the same transaction.
    async fn accept_challenge(&self, id: &ChallengeId, user_id: &str) -> Result<(Challenge, Match), ChallengeApiError>;

    /// The recipient declines.
    async fn decline_challenge(&self, id: &ChallengeId, user_id: &str) -> Result<Challenge, ChallengeApiError>;

    /// The sender withdraws a pending challenge.
    async fn cancel_challenge(&self, id: &ChallengeId, user_id: &str) -> Result<Challenge, ChallengeApiError>;

    /// Pending challenges involving the user, newest first.
    async fn challenges_for(&self, user_id: &str, mailbox: ChallengeBox) -> Result<Vec<Challenge>, ChallengeApiError>;

    /// Marks pending challenges past their `expires_at` as `Expired`. Returns the number expired.
    async fn expire_stale_challenges(&self) -> Result<usize, ChallengeApiError>;

    /// Issues an open invite token that expires `ttl` from now.
    async fn create_invite(&self, user_id: &str, ttl: Duration) -> Result<Invite, ChallengeApiError>;

    /// Redeems an open, unexpired invite. The redeemer must not be the issuer. Creates the `Waiting` match
    /// between issuer and redeemer in the same transaction.
    async fn redeem_invite(&self, token: &str, user_id: &str) -> Result<(Invite, Match), ChallengeApiError>;

    /// Marks open invites past their `expires_at` as `Expired`. Returns the number expired.
    async fn expire_stale_invites(&self) -> Result<usize, ChallengeApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum ChallengeApiError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("The requested challenge {0} does not exist")]
    ChallengeNotFound(ChallengeId),
    #[error("The requested invite does not exist")]
    InviteNotFound,
    #[error("Only the challenged player can respond to a challenge")]
    NotTheRecipient,
    #[error("Only the challenger can cancel a challenge")]
    NotTheSender,
    #[error("The challenge is no longer pending")]
    NotPending,
    #[error("The invite is no longer open")]
    NotOpen,
    #[error("The challenge or invite has expired")]
    Expired,
    #[error("You cannot challenge yourself")]
    SelfChallenge,
    #[error("You cannot redeem your own invite")]
    SelfRedeem,
}

impl From<sqlx::Error> for ChallengeApiError {
    fn from(e: sqlx::Error) -> Self {
        ChallengeApiError::DatabaseError(e.to_string())
    }
}
