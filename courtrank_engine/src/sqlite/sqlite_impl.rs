//! `SqliteDatabase` is a concrete implementation of a CourtRank engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module. Every lifecycle transition is a single `pool.begin()` … `tx.commit()` transaction that re-reads the
//! match row and validates preconditions against current state. SQLite's single-writer transactions are what
//! make the "exactly one settlement path commits" guarantee hold: a concurrent settler re-reads post-commit
//! state and fails its precondition.
use std::fmt::Debug;

use chrono::{Duration, Utc};
use cr_common::Rating;
use log::*;
use sqlx::SqlitePool;

use super::db::{challenges, db_url, invites, matches, new_pool, players, ratings};
use crate::{
    db_types::{
        Challenge,
        ChallengeId,
        ChallengeStatus,
        HistoryKind,
        Invite,
        Match,
        MatchId,
        NewChallenge,
        NewMatch,
        NewPlayer,
        Player,
        RankHistoryEntry,
    },
    helpers::{random_public_id, settlement_swing},
    traits::{
        ChallengeApiError,
        ChallengeBox,
        ChallengeManagement,
        ChallengeOutcome,
        HistoryRange,
        MatchFlowError,
        MatchLifecycle,
        PendingConfirmation,
        PlayerApiError,
        PlayerManagement,
        PressStartOutcome,
        RatingApiError,
        RatingDelta,
        RatingManagement,
        RatingOutcome,
        RatingSkipReason,
        Reputation,
        RevertOutcome,
        RevertSkipReason,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database connection pool using the `CR_DATABASE_URL` environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl MatchLifecycle for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_match(&self, new_match: NewMatch) -> Result<Match, MatchFlowError> {
        let mut conn = self.pool.acquire().await?;
        let match_record = matches::insert_match(new_match, &mut conn).await?;
        debug!("🗃️ Match {} has been saved in the DB with id {}", match_record.match_id, match_record.id);
        Ok(match_record)
    }

    async fn fetch_match(&self, match_id: &MatchId) -> Result<Option<Match>, MatchFlowError> {
        let mut conn = self.pool.acquire().await?;
        let match_record = matches::fetch_match(match_id, &mut conn).await?;
        Ok(match_record)
    }

    async fn press_start(&self, match_id: &MatchId, user_id: &str) -> Result<PressStartOutcome, MatchFlowError> {
        let mut tx = self.pool.begin().await?;
        let m = matches::fetch_match(match_id, &mut tx)
            .await?
            .ok_or_else(|| MatchFlowError::MatchNotFound(match_id.clone()))?;
        if !m.is_participant(user_id) {
            return Err(MatchFlowError::NotAParticipant(user_id.to_string(), match_id.clone()));
        }
        let newly_pressed = !m.has_pressed_start(user_id);
        let m = if newly_pressed {
            let creator_side = m.creator_id == user_id;
            matches::set_started(match_id, creator_side, &mut tx).await?
        } else {
            m
        };
        let all_ready = m.opponent_id.is_some() && m.started_by_creator && m.started_by_opponent;
        let (m, went_live) = if all_ready && m.timer_start.is_none() {
            let m = matches::set_live(match_id, Utc::now(), &mut tx).await?;
            (m, true)
        } else {
            (m, false)
        };
        tx.commit().await?;
        if went_live {
            debug!("🗃️ Match {match_id} is live. The clock is running");
        }
        Ok(PressStartOutcome { match_record: m, went_live, newly_pressed })
    }

    async fn submit_score(
        &self,
        match_id: &MatchId,
        user_id: &str,
        own_score: i64,
        opponent_score: i64,
        confirm_window: Duration,
    ) -> Result<Match, MatchFlowError> {
        if own_score < 0 || opponent_score < 0 {
            return Err(MatchFlowError::InvalidScore);
        }
        let mut tx = self.pool.begin().await?;
        let m = matches::fetch_match(match_id, &mut tx)
            .await?
            .ok_or_else(|| MatchFlowError::MatchNotFound(match_id.clone()))?;
        if !m.is_participant(user_id) {
            return Err(MatchFlowError::NotAParticipant(user_id.to_string(), match_id.clone()));
        }
        if m.opponent_id.is_none() {
            return Err(MatchFlowError::OpponentRequired(match_id.clone()));
        }
        if m.has_result() {
            return Err(MatchFlowError::ScoreAlreadySubmitted(match_id.clone()));
        }
        let (score_creator, score_opponent) =
            if m.creator_id == user_id { (own_score, opponent_score) } else { (opponent_score, own_score) };
        let now = Utc::now();
        let deadline = now + confirm_window;
        let m = matches::write_score(match_id, user_id, score_creator, score_opponent, now, deadline, &mut tx)
            .await?
            .ok_or_else(|| MatchFlowError::ScoreAlreadySubmitted(match_id.clone()))?;
        tx.commit().await?;
        debug!("🗃️ Score recorded for match {match_id} by {user_id}. Confirmation deadline is {deadline}");
        Ok(m)
    }

    async fn confirm_result(&self, match_id: &MatchId, user_id: &str) -> Result<Match, MatchFlowError> {
        let mut tx = self.pool.begin().await?;
        let m = matches::fetch_match(match_id, &mut tx)
            .await?
            .ok_or_else(|| MatchFlowError::MatchNotFound(match_id.clone()))?;
        if !m.is_participant(user_id) {
            return Err(MatchFlowError::NotAParticipant(user_id.to_string(), match_id.clone()));
        }
        let submitted_by = m.submitted_by.as_deref().ok_or_else(|| MatchFlowError::NoPendingResult(match_id.clone()))?;
        if m.finalized {
            return Err(MatchFlowError::AlreadyFinalized(match_id.clone()));
        }
        if submitted_by == user_id {
            return Err(MatchFlowError::PosterCannotConfirm);
        }
        let m = matches::settle_confirm(match_id, user_id, Utc::now(), &mut tx)
            .await?
            .ok_or_else(|| MatchFlowError::AlreadyFinalized(match_id.clone()))?;
        tx.commit().await?;
        debug!("🗃️ Match {match_id} confirmed by {user_id}");
        Ok(m)
    }

    async fn contest_result(&self, match_id: &MatchId, user_id: &str) -> Result<Match, MatchFlowError> {
        let mut tx = self.pool.begin().await?;
        let m = matches::fetch_match(match_id, &mut tx)
            .await?
            .ok_or_else(|| MatchFlowError::MatchNotFound(match_id.clone()))?;
        if !m.is_participant(user_id) {
            return Err(MatchFlowError::NotAParticipant(user_id.to_string(), match_id.clone()));
        }
        let submitted_by = m.submitted_by.as_deref().ok_or_else(|| MatchFlowError::NoPendingResult(match_id.clone()))?;
        if m.finalized {
            return Err(MatchFlowError::AlreadyFinalized(match_id.clone()));
        }
        if submitted_by == user_id {
            return Err(MatchFlowError::PosterCannotContest);
        }
        let now = Utc::now();
        let m = matches::settle_contest(match_id, user_id, now, &mut tx)
            .await?
            .ok_or_else(|| MatchFlowError::AlreadyFinalized(match_id.clone()))?;
        players::incr_games_contested(user_id, now, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Match {match_id} contested by {user_id}");
        Ok(m)
    }

    async fn auto_accept_overdue(&self) -> Result<Vec<Match>, MatchFlowError> {
        let mut conn = self.pool.acquire().await?;
        let matches = matches::auto_accept_overdue(Utc::now(), &mut conn).await?;
        Ok(matches)
    }

    async fn pending_confirmations_for(&self, user_id: &str) -> Result<Vec<PendingConfirmation>, MatchFlowError> {
        let mut conn = self.pool.acquire().await?;
        matches::pending_confirmations_for(user_id, &mut conn).await
    }

    async fn close(&mut self) -> Result<(), MatchFlowError> {
        self.pool.close().await;
        Ok(())
    }
}

impl RatingManagement for SqliteDatabase {
    async fn apply_match_rating(&self, match_id: &MatchId, provisional: bool) -> Result<RatingOutcome, RatingApiError> {
        let mut tx = self.pool.begin().await?;
        let m = matches::fetch_match(match_id, &mut tx)
            .await?
            .ok_or_else(|| RatingApiError::MatchNotFound(match_id.clone()))?;
        if !provisional && !m.finalized {
            return Ok(RatingOutcome::skipped(RatingSkipReason::NotFinalized));
        }
        if !m.has_result() {
            return Ok(RatingOutcome::skipped(RatingSkipReason::NoResult));
        }
        if m.opponent_id.is_none() {
            return Ok(RatingOutcome::skipped(RatingSkipReason::NoOpponent));
        }
        let Some((winner, loser, margin)) = m.outcome() else {
            return Ok(RatingOutcome::skipped(RatingSkipReason::TieOrBadScore));
        };
        if !ratings::forward_entries(match_id, &mut tx).await?.is_empty() {
            return Ok(RatingOutcome::skipped(RatingSkipReason::AlreadyApplied));
        }
        let winner_rec = players::fetch_player(winner, &mut tx)
            .await?
            .ok_or_else(|| RatingApiError::PlayerNotFound(winner.to_string()))?;
        let loser_rec =
            players::fetch_player(loser, &mut tx).await?.ok_or_else(|| RatingApiError::PlayerNotFound(loser.to_string()))?;
        let swing = settlement_swing(winner_rec.rating, loser_rec.rating, margin);
        let new_winner = (winner_rec.rating + swing.winner_gain).clamped();
        let new_loser = (loser_rec.rating - swing.loser_loss).clamped();
        let now = Utc::now();
        players::set_rating(winner, new_winner, now, &mut tx).await?;
        players::set_rating(loser, new_loser, now, &mut tx).await?;
        players::incr_games_played(winner, now, &mut tx).await?;
        players::incr_games_played(loser, now, &mut tx).await?;
        ratings::insert_entry(winner, match_id, HistoryKind::Forward, winner_rec.rating, new_winner, now, &mut tx).await?;
        ratings::insert_entry(loser, match_id, HistoryKind::Forward, loser_rec.rating, new_loser, now, &mut tx).await?;
        matches::set_rating_applied(match_id, true, now, &mut tx).await?;
        let deltas = vec![
            RatingDelta { user_id: winner.to_string(), rating_before: winner_rec.rating, rating_after: new_winner },
            RatingDelta { user_id: loser.to_string(), rating_before: loser_rec.rating, rating_after: new_loser },
        ];
        tx.commit().await?;
        debug!(
            "📈️ Rating applied for match {match_id} (provisional: {provisional}): {} {} → {}, {} {} → {}",
            winner, winner_rec.rating, new_winner, loser, loser_rec.rating, new_loser
        );
        Ok(RatingOutcome::applied(deltas))
    }

    async fn revert_match_rating(&self, match_id: &MatchId) -> Result<RevertOutcome, RatingApiError> {
        let mut tx = self.pool.begin().await?;
        let _ = matches::fetch_match(match_id, &mut tx)
            .await?
            .ok_or_else(|| RatingApiError::MatchNotFound(match_id.clone()))?;
        let forwards = ratings::forward_entries(match_id, &mut tx).await?;
        if forwards.is_empty() {
            return Ok(RevertOutcome::skipped(RevertSkipReason::NothingApplied));
        }
        if ratings::reversal_exists(match_id, &mut tx).await? {
            return Ok(RevertOutcome::skipped(RevertSkipReason::AlreadyReverted));
        }
        let now = Utc::now();
        let mut restored = Vec::with_capacity(forwards.len());
        for entry in &forwards {
            players::set_rating(&entry.user_id, entry.rating_before, now, &mut tx).await?;
            ratings::insert_entry(
                &entry.user_id,
                match_id,
                HistoryKind::Reversal,
                entry.rating_after,
                entry.rating_before,
                now,
                &mut tx,
            )
            .await?;
            restored.push(RatingDelta {
                user_id: entry.user_id.clone(),
                rating_before: entry.rating_after,
                rating_after: entry.rating_before,
            });
        }
        matches::set_rating_applied(match_id, false, now, &mut tx).await?;
        tx.commit().await?;
        debug!("📈️ Rating reverted for match {match_id}. {} players restored", restored.len());
        Ok(RevertOutcome::reverted(restored))
    }

    async fn rating_for(&self, user_id: &str) -> Result<Rating, RatingApiError> {
        let mut conn = self.pool.acquire().await?;
        let player =
            players::fetch_player(user_id, &mut conn).await?.ok_or_else(|| RatingApiError::PlayerNotFound(user_id.to_string()))?;
        Ok(player.rating)
    }

    async fn rank_history_for(
        &self,
        user_id: &str,
        range: HistoryRange,
    ) -> Result<Vec<RankHistoryEntry>, RatingApiError> {
        let mut conn = self.pool.acquire().await?;
        let since = range.window().map(|w| Utc::now() - w);
        let entries = ratings::history_for(user_id, since, &mut conn).await?;
        Ok(entries)
    }

    async fn reputation_for(&self, user_id: &str) -> Result<Reputation, RatingApiError> {
        let mut conn = self.pool.acquire().await?;
        let since = Utc::now() - Duration::days(365);
        let (posted, contested) = ratings::reputation_counts(user_id, since, &mut conn).await?;
        Ok(Reputation::new(posted, contested))
    }
}

impl ChallengeManagement for SqliteDatabase {
    async fn create_challenge(&self, challenge: NewChallenge) -> Result<ChallengeOutcome, ChallengeApiError> {
        if challenge.from_id == challenge.to_id {
            return Err(ChallengeApiError::SelfChallenge);
        }
        let mut tx = self.pool.begin().await?;
        if let Some(existing) = challenges::find_pending_between(&challenge.from_id, &challenge.to_id, &mut tx).await? {
            debug!("🗃️ A pending challenge already exists between {} and {}", challenge.from_id, challenge.to_id);
            return Ok(ChallengeOutcome { challenge: existing, deduplicated: true });
        }
        let challenge = challenges::insert_challenge(challenge, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Challenge {} created from {} to {}", challenge.challenge_id, challenge.from_id, challenge.to_id);
        Ok(ChallengeOutcome { challenge, deduplicated: false })
    }

    async fn accept_challenge(&self, id: &ChallengeId, user_id: &str) -> Result<(Challenge, Match), ChallengeApiError> {
        let mut tx = self.pool.begin().await?;
        let challenge =
            challenges::fetch_challenge(id, &mut tx).await?.ok_or_else(|| ChallengeApiError::ChallengeNotFound(id.clone()))?;
        if challenge.to_id != user_id {
            return Err(ChallengeApiError::NotTheRecipient);
        }
        if challenge.status != ChallengeStatus::Pending {
            return Err(ChallengeApiError::NotPending);
        }
        let now = Utc::now();
        if challenge.expires_at < now {
            return Err(ChallengeApiError::Expired);
        }
        let challenge = challenges::set_status(id, ChallengeStatus::Accepted, now, &mut tx).await?;
        let new_match = NewMatch::new(challenge.from_id.as_str()).with_opponent(challenge.to_id.as_str());
        let match_record = matches::insert_match(new_match, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Challenge {id} accepted. Match {} created", match_record.match_id);
        Ok((challenge, match_record))
    }

    async fn decline_challenge(&self, id: &ChallengeId, user_id: &str) -> Result<Challenge, ChallengeApiError> {
        let mut tx = self.pool.begin().await?;
        let challenge =
            challenges::fetch_challenge(id, &mut tx).await?.ok_or_else(|| ChallengeApiError::ChallengeNotFound(id.clone()))?;
        if challenge.to_id != user_id {
            return Err(ChallengeApiError::NotTheRecipient);
        }
        if challenge.status != ChallengeStatus::Pending {
            return Err(ChallengeApiError::NotPending);
        }
        let challenge = challenges::set_status(id, ChallengeStatus::Declined, Utc::now(), &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Challenge {id} declined");
        Ok(challenge)
    }

    async fn cancel_challenge(&self, id: &ChallengeId, user_id: &str) -> Result<Challenge, ChallengeApiError> {
        let mut tx = self.pool.begin().await?;
        let challenge =
            challenges::fetch_challenge(id, &mut tx).await?.ok_or_else(|| ChallengeApiError::ChallengeNotFound(id.clone()))?;
        if challenge.from_id != user_id {
            return Err(ChallengeApiError::NotTheSender);
        }
        if challenge.status != ChallengeStatus::Pending {
            return Err(ChallengeApiError::NotPending);
        }
        let challenge = challenges::set_status(id, ChallengeStatus::Cancelled, Utc::now(), &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Challenge {id} cancelled by its sender");
        Ok(challenge)
    }

    async fn challenges_for(&self, user_id: &str, mailbox: ChallengeBox) -> Result<Vec<Challenge>, ChallengeApiError> {
        let mut conn = self.pool.acquire().await?;
        let challenges = challenges::pending_for(user_id, mailbox, Utc::now(), &mut conn).await?;
        Ok(challenges)
    }

    async fn expire_stale_challenges(&self) -> Result<usize, ChallengeApiError> {
        let mut conn = self.pool.acquire().await?;
        let n = challenges::expire_stale(Utc::now(), &mut conn).await?;
        Ok(n as usize)
    }

    async fn create_invite(&self, user_id: &str, ttl: Duration) -> Result<Invite, ChallengeApiError> {
        let mut conn = self.pool.acquire().await?;
        let token = random_public_id(10);
        let invite = invites::insert_invite(user_id, &token, Utc::now() + ttl, &mut conn).await?;
        debug!("🗃️ Invite {token} created by {user_id}");
        Ok(invite)
    }

    async fn redeem_invite(&self, token: &str, user_id: &str) -> Result<(Invite, Match), ChallengeApiError> {
        let mut tx = self.pool.begin().await?;
        let invite = invites::fetch_invite(token, &mut tx).await?.ok_or(ChallengeApiError::InviteNotFound)?;
        if invite.created_by == user_id {
            return Err(ChallengeApiError::SelfRedeem);
        }
        if invite.status != crate::db_types::InviteStatus::Open {
            return Err(ChallengeApiError::NotOpen);
        }
        let now = Utc::now();
        if invite.expires_at < now {
            return Err(ChallengeApiError::Expired);
        }
        let invite = invites::mark_redeemed(token, user_id, now, &mut tx).await?.ok_or(ChallengeApiError::NotOpen)?;
        let new_match = NewMatch::new(invite.created_by.as_str()).with_opponent(user_id);
        let match_record = matches::insert_match(new_match, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Invite {token} redeemed by {user_id}. Match {} created", match_record.match_id);
        Ok((invite, match_record))
    }

    async fn expire_stale_invites(&self) -> Result<usize, ChallengeApiError> {
        let mut conn = self.pool.acquire().await?;
        let n = invites::expire_stale(Utc::now(), &mut conn).await?;
        Ok(n as usize)
    }
}

impl PlayerManagement for SqliteDatabase {
    async fn upsert_player(&self, player: NewPlayer) -> Result<Player, PlayerApiError> {
        let mut conn = self.pool.acquire().await?;
        let player = players::upsert_player(player, &mut conn).await?;
        debug!("🗃️ Player {} ({}) upserted", player.id, player.display_name);
        Ok(player)
    }

    async fn fetch_player(&self, user_id: &str) -> Result<Option<Player>, PlayerApiError> {
        let mut conn = self.pool.acquire().await?;
        let player = players::fetch_player(user_id, &mut conn).await?;
        Ok(player)
    }
}
