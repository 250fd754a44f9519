use chrono::Duration;
use thiserror::Error;

use crate::{
    db_types::{Match, MatchId, NewMatch},
    traits::{
        data_objects::{PendingConfirmation, PressStartOutcome},
        PlayerApiError,
    },
};

/// The match lifecycle state machine.
///
/// Backends implement every transition as a single atomic transaction that re-reads the match row, validates the
/// transition's preconditions against current state, and commits before returning. Side effects (rating
/// application, notifications) are the caller's concern and always run after the commit.
///
/// The transitions form a strict order within one match: a match is created, goes live when both participants
/// have pressed start, ends when a score is submitted, and settles exactly once via confirmation, contest, or the
/// auto-accept sweep. Under concurrent settlement attempts exactly one commits; the others observe
/// `finalized = true` on their re-read and fail with [`MatchFlowError::AlreadyFinalized`].
#[allow(async_fn_in_trait)]
pub trait MatchLifecycle: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Creates a new match in `Waiting` status. The opponent is optional at creation time; a match cannot take a
    /// score until it has one.
    async fn insert_match(&self, new_match: NewMatch) -> Result<Match, MatchFlowError>;

    /// Fetches a match by its public id.
    async fn fetch_match(&self, match_id: &MatchId) -> Result<Option<Match>, MatchFlowError>;

    /// Records that `user_id` is ready to play. Idempotent per participant; the first call that completes the
    /// pair sets `timer_start` and moves the match to `Live`. The timer is never reset by later calls.
    async fn press_start(&self, match_id: &MatchId, user_id: &str) -> Result<PressStartOutcome, MatchFlowError>;

    /// Submits the final score on behalf of `user_id` (`own_score` is the submitter's own side). Writes the score,
    /// stamps `submitted_by`/`submitted_at`, sets the confirmation deadline `confirm_window` from now, and moves
    /// the match to `Ended`.
    ///
    /// Requires an opponent and a caller who is a participant. A second submission is rejected with
    /// [`MatchFlowError::ScoreAlreadySubmitted`]; the first write wins.
    async fn submit_score(
        &self,
        match_id: &MatchId,
        user_id: &str,
        own_score: i64,
        opponent_score: i64,
        confirm_window: Duration,
    ) -> Result<Match, MatchFlowError>;

    /// The non-submitting participant accepts the result. Sets `confirmed_by` and `finalized`.
    async fn confirm_result(&self, match_id: &MatchId, user_id: &str) -> Result<Match, MatchFlowError>;

    /// The non-submitting participant disputes the result. Sets `contested_by` and `finalized`, and bumps the
    /// contester's `games_contested` counter in the same transaction. Rating reversal is the caller's follow-up.
    async fn contest_result(&self, match_id: &MatchId, user_id: &str) -> Result<Match, MatchFlowError>;

    /// Finalizes every unsettled match whose confirmation deadline has passed, stamping `auto_accepted_at`.
    /// Returns the matches that were auto-accepted by this call. Matches settled between the deadline and the
    /// sweep are skipped; the `finalized = false` predicate makes re-runs no-ops.
    async fn auto_accept_overdue(&self) -> Result<Vec<Match>, MatchFlowError>;

    /// Submitted, unsettled results waiting on `user_id` (the non-submitter), newest first.
    async fn pending_confirmations_for(&self, user_id: &str) -> Result<Vec<PendingConfirmation>, MatchFlowError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), MatchFlowError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum MatchFlowError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("The requested match {0} does not exist")]
    MatchNotFound(MatchId),
    #[error("User {0} is not a participant in match {1}")]
    NotAParticipant(String, MatchId),
    #[error("Match {0} has no opponent yet, so it cannot take a score")]
    OpponentRequired(MatchId),
    #[error("A score has already been submitted for match {0}")]
    ScoreAlreadySubmitted(MatchId),
    #[error("Scores must be non-negative")]
    InvalidScore,
    #[error("Match {0} has no submitted result to settle")]
    NoPendingResult(MatchId),
    #[error("Match {0} has already been finalized")]
    AlreadyFinalized(MatchId),
    #[error("The score submitter cannot confirm their own result")]
    PosterCannotConfirm,
    #[error("The score submitter cannot contest their own result")]
    PosterCannotContest,
    #[error("{0}")]
    PlayerError(#[from] PlayerApiError),
}

impl From<sqlx::Error> for MatchFlowError {
    fn from(e: sqlx::Error) -> Self {
        MatchFlowError::DatabaseError(e.to_string())
    }
}
