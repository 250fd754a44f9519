use cr_common::Rating;
use thiserror::Error;

use crate::{
    db_types::{MatchId, RankHistoryEntry},
    traits::data_objects::{HistoryRange, RatingOutcome, Reputation, RevertOutcome},
};

/// Rating application, reversal, and the read-side rating queries.
///
/// Application is idempotent: the marker is the presence of `Forward` rank history rows for the match, written in
/// the same transaction as the rating update itself. Submission-time application passes `provisional = true`
/// (the match is not finalized yet); the settlement sweep passes `provisional = false`, which additionally
/// requires `finalized = true`.
#[allow(async_fn_in_trait)]
pub trait RatingManagement: Clone {
    /// Applies the rating swing for the match's recorded outcome, in a single transaction: update both players'
    /// ratings (clamped to the rating band), bump their `games_played`, append one `Forward` history entry per
    /// player, and mark `provisional_rating_applied` on the match.
    ///
    /// Skips (tie, no opponent, no result, already applied, not finalized for a non-provisional call) are
    /// reported in the [`RatingOutcome`], not as errors.
    async fn apply_match_rating(&self, match_id: &MatchId, provisional: bool) -> Result<RatingOutcome, RatingApiError>;

    /// Rolls back a previously applied rating, in a single transaction: restore each player's rating to the
    /// `Forward` entry's `rating_before` and append the inverse `Reversal` entries. History is append-only;
    /// nothing is deleted. A second revert, or a revert with nothing applied, is a reported skip.
    async fn revert_match_rating(&self, match_id: &MatchId) -> Result<RevertOutcome, RatingApiError>;

    /// The player's current rating.
    async fn rating_for(&self, user_id: &str) -> Result<Rating, RatingApiError>;

    /// The player's rank history within the range, oldest first.
    async fn rank_history_for(
        &self,
        user_id: &str,
        range: HistoryRange,
    ) -> Result<Vec<RankHistoryEntry>, RatingApiError>;

    /// The trailing 12-month reputation, recomputed from the matches table on every call.
    async fn reputation_for(&self, user_id: &str) -> Result<Reputation, RatingApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum RatingApiError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("The requested match {0} does not exist")]
    MatchNotFound(MatchId),
    #[error("The requested player {0} does not exist")]
    PlayerNotFound(String),
}

impl From<sqlx::Error> for RatingApiError {
    fn from(e: sqlx::Error) -> Self {
        RatingApiError::DatabaseError(e.to_string())
    }
}
