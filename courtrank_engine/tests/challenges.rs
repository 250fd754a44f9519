mod support;

use chrono::{Duration, Utc};
use courtrank_engine::{
    db_types::{ChallengeStatus, InviteStatus, MatchStatus, NewChallenge},
    events::EventProducers,
    traits::ChallengeBox,
    ChallengeApi,
    ChallengeApiError,
    ChallengeManagement,
};
use support::new_db_with_players;

fn fresh_challenge(from: &str, to: &str) -> NewChallenge {
    NewChallenge::new(from, to, Utc::now() + Duration::days(7))
}

#[tokio::test]
async fn challenges_are_deduplicated_per_pair() {
    let db = new_db_with_players().await;
    let first = db.create_challenge(fresh_challenge("alice", "bob")).await.unwrap();
    assert!(!first.deduplicated);

    // Same pair, either direction, resolves to the existing pending challenge
    let second = db.create_challenge(fresh_challenge("bob", "alice")).await.unwrap();
    assert!(second.deduplicated);
    assert_eq!(second.challenge.challenge_id, first.challenge.challenge_id);

    let inbox = db.challenges_for("bob", ChallengeBox::Inbox).await.unwrap();
    assert_eq!(inbox.len(), 1);
    let outbox = db.challenges_for("alice", ChallengeBox::Outbox).await.unwrap();
    assert_eq!(outbox.len(), 1);
}

#[tokio::test]
async fn you_cannot_challenge_yourself() {
    let db = new_db_with_players().await;
    let err = db.create_challenge(fresh_challenge("alice", "alice")).await.unwrap_err();
    assert!(matches!(err, ChallengeApiError::SelfChallenge));
}

#[tokio::test]
async fn accepting_a_challenge_creates_the_match() {
    let db = new_db_with_players().await;
    let api = ChallengeApi::new(db.clone(), EventProducers::default());
    let outcome = api.create_challenge(fresh_challenge("alice", "bob")).await.unwrap();
    let id = outcome.challenge.challenge_id.clone();

    // Only the recipient can respond
    let err = api.accept_challenge(&id, "alice").await.unwrap_err();
    assert!(matches!(err, ChallengeApiError::NotTheRecipient));
    let err = api.accept_challenge(&id, "carol").await.unwrap_err();
    assert!(matches!(err, ChallengeApiError::NotTheRecipient));

    let (challenge, match_record) = api.accept_challenge(&id, "bob").await.unwrap();
    assert_eq!(challenge.status, ChallengeStatus::Accepted);
    assert_eq!(match_record.status, MatchStatus::Waiting);
    assert_eq!(match_record.creator_id, "alice");
    assert_eq!(match_record.opponent_id.as_deref(), Some("bob"));

    // Accepting twice fails: the challenge is no longer pending
    let err = api.accept_challenge(&id, "bob").await.unwrap_err();
    assert!(matches!(err, ChallengeApiError::NotPending));
}

#[tokio::test]
async fn declining_and_cancelling_are_role_checked() {
    let db = new_db_with_players().await;
    let outcome = db.create_challenge(fresh_challenge("alice", "bob")).await.unwrap();
    let id = outcome.challenge.challenge_id.clone();

    // The recipient cannot cancel and the sender cannot decline
    let err = db.cancel_challenge(&id, "bob").await.unwrap_err();
    assert!(matches!(err, ChallengeApiError::NotTheSender));
    let err = db.decline_challenge(&id, "alice").await.unwrap_err();
    assert!(matches!(err, ChallengeApiError::NotTheRecipient));

    let challenge = db.decline_challenge(&id, "bob").await.unwrap();
    assert_eq!(challenge.status, ChallengeStatus::Declined);

    // A declined pair can be challenged again
    let outcome = db.create_challenge(fresh_challenge("alice", "bob")).await.unwrap();
    assert!(!outcome.deduplicated);
    let challenge = db.cancel_challenge(&outcome.challenge.challenge_id, "alice").await.unwrap();
    assert_eq!(challenge.status, ChallengeStatus::Cancelled);
}

#[tokio::test]
async fn stale_challenges_are_swept() {
    let db = new_db_with_players().await;
    let api = ChallengeApi::new(db.clone(), EventProducers::default());
    let stale = NewChallenge::new("alice", "bob", Utc::now() - Duration::hours(1));
    let stale = db.create_challenge(stale).await.unwrap().challenge;
    db.create_challenge(fresh_challenge("alice", "carol")).await.unwrap();

    let report = api.expire_stale().await.unwrap();
    assert_eq!(report.challenges_expired, 1);
    assert_eq!(report.invites_expired, 0);

    // Accepting an expired challenge fails
    let err = api.accept_challenge(&stale.challenge_id, "bob").await.unwrap_err();
    assert!(matches!(err, ChallengeApiError::NotPending));

    // Re-running the sweep finds nothing
    let report = api.expire_stale().await.unwrap();
    assert_eq!(report.challenges_expired, 0);
}

#[tokio::test]
async fn invites_create_matches_and_redeem_once() {
    let db = new_db_with_players().await;
    let invite = db.create_invite("alice", Duration::hours(1)).await.unwrap();
    assert_eq!(invite.status, InviteStatus::Open);

    let err = db.redeem_invite(&invite.token, "alice").await.unwrap_err();
    assert!(matches!(err, ChallengeApiError::SelfRedeem));

    let (redeemed, match_record) = db.redeem_invite(&invite.token, "bob").await.unwrap();
    assert_eq!(redeemed.status, InviteStatus::Redeemed);
    assert_eq!(redeemed.redeemed_by.as_deref(), Some("bob"));
    assert_eq!(match_record.creator_id, "alice");
    assert_eq!(match_record.opponent_id.as_deref(), Some("bob"));
    assert_eq!(match_record.status, MatchStatus::Waiting);

    // A token only works once
    let err = db.redeem_invite(&invite.token, "carol").await.unwrap_err();
    assert!(matches!(err, ChallengeApiError::NotOpen));

    let err = db.redeem_invite("no-such-token", "carol").await.unwrap_err();
    assert!(matches!(err, ChallengeApiError::InviteNotFound));
}

#[tokio::test]
async fn expired_invites_cannot_be_redeemed() {
    let db = new_db_with_players().await;
    let invite = db.create_invite("alice", Duration::seconds(-5)).await.unwrap();

    let err = db.redeem_invite(&invite.token, "bob").await.unwrap_err();
    assert!(matches!(err, ChallengeApiError::Expired));

    let report = db.expire_stale_invites().await.unwrap();
    assert_eq!(report, 1);

    // Once swept, the token reads as closed rather than merely expired
    let err = db.redeem_invite(&invite.token, "bob").await.unwrap_err();
    assert!(matches!(err, ChallengeApiError::NotOpen));
}
