use std::fmt::Debug;

use chrono::Duration;
use log::*;

use crate::{
    db_types::{Match, MatchId, MatchStatus, NewMatch},
    events::{EventProducers, MatchReadyEvent, MatchSettledEvent, ScoreSubmittedEvent, SettlementKind},
    traits::{MatchFlowError, MatchLifecycle, MatchSweepReport, PendingConfirmation, PressStartOutcome, RatingManagement},
};

/// `MatchFlowApi` is the primary API for driving matches through their lifecycle: creation, going live, score
/// submission, and the three settlement paths.
///
/// Rating side effects always run *after* the state transition commits, and are best-effort: a failed rating
/// application never rolls a committed transition back, it is logged and left for the settlement sweep to retry.
pub struct MatchFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for MatchFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MatchFlowApi")
    }
}

impl<B> MatchFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> MatchFlowApi<B>
where B: MatchLifecycle + RatingManagement
{
    pub async fn create_match(&self, new_match: NewMatch) -> Result<Match, MatchFlowError> {
        let match_record = self.db.insert_match(new_match).await?;
        debug!("🔄️🏀️ Match {} created by {}", match_record.match_id, match_record.creator_id);
        Ok(match_record)
    }

    pub async fn fetch_match(&self, match_id: &MatchId) -> Result<Option<Match>, MatchFlowError> {
        self.db.fetch_match(match_id).await
    }

    /// Records the caller's press. Until the match goes live, every press (a repeat included) tells subscribers
    /// the caller is waiting on the other participant.
    pub async fn press_start(&self, match_id: &MatchId, user_id: &str) -> Result<PressStartOutcome, MatchFlowError> {
        let outcome = self.db.press_start(match_id, user_id).await?;
        if outcome.went_live {
            debug!("🔄️🏀️ Match {match_id} is live");
        } else if outcome.match_record.status == MatchStatus::Waiting {
            self.call_match_ready_hook(&outcome.match_record, user_id).await;
        }
        Ok(outcome)
    }

    /// Submits the final score, then applies the provisional rating and notifies the opponent. The score write
    /// is the committed transition; the rating application is best-effort and idempotent, so a failure here is
    /// retried by the settlement sweep after auto-accept.
    pub async fn submit_score(
        &self,
        match_id: &MatchId,
        user_id: &str,
        own_score: i64,
        opponent_score: i64,
        confirm_window: Duration,
    ) -> Result<Match, MatchFlowError> {
        let match_record = self.db.submit_score(match_id, user_id, own_score, opponent_score, confirm_window).await?;
        match self.db.apply_match_rating(match_id, true).await {
            Ok(outcome) if outcome.applied => {
                debug!("🔄️🏀️ Provisional rating applied for match {match_id}");
            },
            Ok(outcome) => {
                debug!("🔄️🏀️ Provisional rating skipped for match {match_id}: {:?}", outcome.reason);
            },
            Err(e) => {
                error!("🔄️🏀️ Provisional rating failed for match {match_id}. The sweep will retry. {e}");
            },
        }
        self.call_score_submitted_hook(&match_record).await;
        debug!("🔄️🏀️ Score submitted for match {match_id} by {user_id}");
        Ok(match_record)
    }

    /// The opponent accepts the submitted result. The provisional rating (applied at submission) stands.
    pub async fn confirm_result(&self, match_id: &MatchId, user_id: &str) -> Result<Match, MatchFlowError> {
        let match_record = self.db.confirm_result(match_id, user_id).await?;
        self.call_match_settled_hook(&match_record, SettlementKind::Confirmed).await;
        debug!("🔄️🏀️ Match {match_id} settled by confirmation");
        Ok(match_record)
    }

    /// The opponent disputes the submitted result. The committed contest transition already bumped the
    /// contester's counter; here the provisional rating is rolled back, best-effort.
    pub async fn contest_result(&self, match_id: &MatchId, user_id: &str) -> Result<Match, MatchFlowError> {
        let match_record = self.db.contest_result(match_id, user_id).await?;
        match self.db.revert_match_rating(match_id).await {
            Ok(outcome) if outcome.reverted => {
                debug!("🔄️🏀️ Rating reverted for contested match {match_id}");
            },
            Ok(outcome) => {
                debug!("🔄️🏀️ Rating revert skipped for match {match_id}: {:?}", outcome.reason);
            },
            Err(e) => {
                error!("🔄️🏀️ Rating revert failed for contested match {match_id}: {e}");
            },
        }
        self.call_match_settled_hook(&match_record, SettlementKind::Contested).await;
        debug!("🔄️🏀️ Match {match_id} settled by contest");
        Ok(match_record)
    }

    pub async fn pending_confirmations(&self, user_id: &str) -> Result<Vec<PendingConfirmation>, MatchFlowError> {
        self.db.pending_confirmations_for(user_id).await
    }

    /// The settlement sweep. Auto-accepts every match whose confirmation deadline has passed, then applies the
    /// (idempotent) rating for each. Individual rating failures are logged and skipped; the next sweep picks
    /// them up again. Safe to run concurrently with live traffic and with itself.
    pub async fn settle_overdue_matches(&self) -> Result<MatchSweepReport, MatchFlowError> {
        let accepted = self.db.auto_accept_overdue().await?;
        let mut report = MatchSweepReport::default();
        for match_record in &accepted {
            report.auto_accepted.push(match_record.match_id.clone());
            match self.db.apply_match_rating(&match_record.match_id, false).await {
                Ok(outcome) if outcome.applied => {
                    report.rated += 1;
                },
                Ok(outcome) => {
                    debug!("🔄️🏀️ Sweep rating skipped for match {}: {:?}", match_record.match_id, outcome.reason);
                },
                Err(e) => {
                    error!("🔄️🏀️ Sweep rating failed for match {}. Skipping. {e}", match_record.match_id);
                },
            }
            self.call_match_settled_hook(match_record, SettlementKind::AutoAccepted).await;
        }
        debug!("🔄️🏀️ Settlement sweep complete: {report}");
        Ok(report)
    }

    async fn call_match_ready_hook(&self, match_record: &Match, ready_player: &str) {
        for emitter in &self.producers.match_ready_producer {
            debug!("🔄️🏀️ Notifying match ready hook subscribers");
            let event = MatchReadyEvent::new(match_record.clone(), ready_player.to_string());
            emitter.publish_event(event).await;
        }
    }

    async fn call_score_submitted_hook(&self, match_record: &Match) {
        for emitter in &self.producers.score_submitted_producer {
            debug!("🔄️🏀️ Notifying score submitted hook subscribers");
            let event = ScoreSubmittedEvent::new(match_record.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_match_settled_hook(&self, match_record: &Match, kind: SettlementKind) {
        for emitter in &self.producers.match_settled_producer {
            debug!("🔄️🏀️ Notifying match settled hook subscribers");
            let event = MatchSettledEvent::new(match_record.clone(), kind);
            emitter.publish_event(event).await;
        }
    }
}
