use std::fmt::Debug;

use cr_common::Rating;

use crate::{
    db_types::{MatchId, RankHistoryEntry},
    traits::{HistoryRange, RatingApiError, RatingManagement, RatingOutcome, Reputation, RevertOutcome},
};

/// Read-side access to ratings, rank history and reputation, plus the manual application/reversal calls that
/// admin tooling uses.
pub struct RatingApi<B> {
    db: B,
}

impl<B> Debug for RatingApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RatingApi")
    }
}

impl<B> RatingApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> RatingApi<B>
where B: RatingManagement
{
    pub async fn rating_for(&self, user_id: &str) -> Result<Rating, RatingApiError> {
        self.db.rating_for(user_id).await
    }

    pub async fn rank_history_for(
        &self,
        user_id: &str,
        range: HistoryRange,
    ) -> Result<Vec<RankHistoryEntry>, RatingApiError> {
        self.db.rank_history_for(user_id, range).await
    }

    /// The trailing 12-month reputation. Recomputed on every call; the formula's inputs are the user's submitted
    /// results and how many of those were contested.
    pub async fn reputation_for(&self, user_id: &str) -> Result<Reputation, RatingApiError> {
        self.db.reputation_for(user_id).await
    }

    pub async fn apply_match_rating(&self, match_id: &MatchId, provisional: bool) -> Result<RatingOutcome, RatingApiError> {
        self.db.apply_match_rating(match_id, provisional).await
    }

    pub async fn revert_match_rating(&self, match_id: &MatchId) -> Result<RevertOutcome, RatingApiError> {
        self.db.revert_match_rating(match_id).await
    }
}
