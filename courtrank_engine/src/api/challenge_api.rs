use std::fmt::Debug;

use chrono::Duration;
use log::*;

use crate::{
    db_types::{Challenge, ChallengeId, Invite, Match, NewChallenge},
    events::{ChallengeEvent, EventProducers},
    traits::{ChallengeApiError, ChallengeBox, ChallengeManagement, ChallengeOutcome, ChallengeSweepReport},
};

/// Challenge and invite negotiation, and the sibling TTL sweep for both.
pub struct ChallengeApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for ChallengeApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ChallengeApi")
    }
}

impl<B> ChallengeApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> ChallengeApi<B>
where B: ChallengeManagement
{
    /// Creates a challenge, deduplicating against an existing pending one between the pair. Subscribers are only
    /// notified for genuinely new challenges.
    pub async fn create_challenge(&self, challenge: NewChallenge) -> Result<ChallengeOutcome, ChallengeApiError> {
        let outcome = self.db.create_challenge(challenge).await?;
        if !outcome.deduplicated {
            self.call_challenge_hook(&outcome.challenge).await;
        }
        Ok(outcome)
    }

    /// Accepts a challenge, creating the match between the pair.
    pub async fn accept_challenge(&self, id: &ChallengeId, user_id: &str) -> Result<(Challenge, Match), ChallengeApiError> {
        let (challenge, match_record) = self.db.accept_challenge(id, user_id).await?;
        self.call_challenge_hook(&challenge).await;
        debug!("🔄️🤝️ Challenge {id} accepted. Match {} is waiting for both players", match_record.match_id);
        Ok((challenge, match_record))
    }

    pub async fn decline_challenge(&self, id: &ChallengeId, user_id: &str) -> Result<Challenge, ChallengeApiError> {
        let challenge = self.db.decline_challenge(id, user_id).await?;
        self.call_challenge_hook(&challenge).await;
        Ok(challenge)
    }

    pub async fn cancel_challenge(&self, id: &ChallengeId, user_id: &str) -> Result<Challenge, ChallengeApiError> {
        self.db.cancel_challenge(id, user_id).await
    }

    pub async fn challenges_for(&self, user_id: &str, mailbox: ChallengeBox) -> Result<Vec<Challenge>, ChallengeApiError> {
        self.db.challenges_for(user_id, mailbox).await
    }

    pub async fn create_invite(&self, user_id: &str, ttl: Duration) -> Result<Invite, ChallengeApiError> {
        self.db.create_invite(user_id, ttl).await
    }

    pub async fn redeem_invite(&self, token: &str, user_id: &str) -> Result<(Invite, Match), ChallengeApiError> {
        let (invite, match_record) = self.db.redeem_invite(token, user_id).await?;
        debug!("🔄️🤝️ Invite redeemed. Match {} is waiting for both players", match_record.match_id);
        Ok((invite, match_record))
    }

    /// Expires stale pending challenges and open invites. Safe to re-run; already-expired rows don't match the
    /// sweep predicates.
    pub async fn expire_stale(&self) -> Result<ChallengeSweepReport, ChallengeApiError> {
        let challenges_expired = self.db.expire_stale_challenges().await?;
        let invites_expired = self.db.expire_stale_invites().await?;
        let report = ChallengeSweepReport { challenges_expired, invites_expired };
        debug!("🔄️🤝️ Challenge sweep complete: {report}");
        Ok(report)
    }

    async fn call_challenge_hook(&self, challenge: &Challenge) {
        for emitter in &self.producers.challenge_producer {
            debug!("🔄️🤝️ Notifying challenge hook subscribers");
            let event = ChallengeEvent::new(challenge.clone());
            emitter.publish_event(event).await;
        }
    }
}
