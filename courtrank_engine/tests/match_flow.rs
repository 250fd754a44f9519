mod support;

use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use chrono::Duration;
use courtrank_engine::{
    db_types::{MatchStatus, NewMatch},
    events::{EventHandler, EventProducers, Handler, MatchReadyEvent},
    MatchFlowApi,
    MatchFlowError,
    MatchLifecycle,
};
use support::new_db_with_players;

#[tokio::test]
async fn match_goes_live_when_both_press_start_and_the_clock_is_set_once() {
    let db = new_db_with_players().await;
    let m = db.insert_match(NewMatch::new("alice").with_opponent("bob")).await.unwrap();
    assert_eq!(m.status, MatchStatus::Waiting);

    let outcome = db.press_start(&m.match_id, "alice").await.unwrap();
    assert!(outcome.newly_pressed);
    assert!(!outcome.went_live);
    assert_eq!(outcome.match_record.status, MatchStatus::Waiting);
    assert!(outcome.match_record.timer_start.is_none());

    let outcome = db.press_start(&m.match_id, "bob").await.unwrap();
    assert!(outcome.went_live);
    assert_eq!(outcome.match_record.status, MatchStatus::Live);
    let clock = outcome.match_record.timer_start.expect("clock should be set");

    // Pressing again neither resets the clock nor re-fires the transition
    let outcome = db.press_start(&m.match_id, "alice").await.unwrap();
    assert!(!outcome.newly_pressed);
    assert!(!outcome.went_live);
    assert_eq!(outcome.match_record.timer_start, Some(clock));
}

#[tokio::test]
async fn every_press_start_nudges_a_missing_opponent() {
    let db = new_db_with_players().await;
    let nudges = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&nudges);
    let handler: Handler<MatchReadyEvent> = Arc::new(move |ev: MatchReadyEvent| {
        let counter = Arc::clone(&counter);
        Box::pin(async move {
            assert_eq!(ev.ready_player, "alice");
            counter.fetch_add(1, Ordering::SeqCst);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let event_handler = EventHandler::new(8, handler);
    let mut producers = EventProducers::default();
    producers.match_ready_producer.push(event_handler.subscribe());
    let api = MatchFlowApi::new(db, producers);

    let m = api.create_match(NewMatch::new("alice").with_opponent("bob")).await.unwrap();
    api.press_start(&m.match_id, "alice").await.unwrap();
    // Alice gets impatient and presses again while Bob still hasn't. That re-sends the nudge
    let outcome = api.press_start(&m.match_id, "alice").await.unwrap();
    assert!(!outcome.newly_pressed);

    // Once the match is live, repeat presses are silent
    api.press_start(&m.match_id, "bob").await.unwrap();
    api.press_start(&m.match_id, "alice").await.unwrap();

    drop(api);
    event_handler.start_handler().await;
    assert_eq!(nudges.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn outsiders_cannot_touch_a_match() {
    let db = new_db_with_players().await;
    let m = db.insert_match(NewMatch::new("alice").with_opponent("bob")).await.unwrap();
    let err = db.press_start(&m.match_id, "carol").await.unwrap_err();
    assert!(matches!(err, MatchFlowError::NotAParticipant(..)));
    let err = db.submit_score(&m.match_id, "carol", 21, 15, Duration::hours(24)).await.unwrap_err();
    assert!(matches!(err, MatchFlowError::NotAParticipant(..)));
}

#[tokio::test]
async fn score_submission_needs_an_opponent() {
    let db = new_db_with_players().await;
    let m = db.insert_match(NewMatch::new("alice")).await.unwrap();
    let err = db.submit_score(&m.match_id, "alice", 21, 15, Duration::hours(24)).await.unwrap_err();
    assert!(matches!(err, MatchFlowError::OpponentRequired(_)));
}

#[tokio::test]
async fn first_score_wins_and_resubmission_is_rejected() {
    let db = new_db_with_players().await;
    let m = db.insert_match(NewMatch::new("alice").with_opponent("bob")).await.unwrap();
    let before = chrono::Utc::now();
    let m2 = db.submit_score(&m.match_id, "bob", 21, 15, Duration::hours(24)).await.unwrap();
    assert_eq!(m2.status, MatchStatus::Ended);
    assert_eq!(m2.submitted_by.as_deref(), Some("bob"));
    // Bob submitted, so his score lands on the opponent side
    assert_eq!(m2.score_opponent, Some(21));
    assert_eq!(m2.score_creator, Some(15));
    let deadline = m2.deadline_at.expect("deadline should be set");
    assert!(deadline >= before + Duration::hours(24));
    assert!(deadline <= chrono::Utc::now() + Duration::hours(24));

    let err = db.submit_score(&m.match_id, "alice", 30, 0, Duration::hours(24)).await.unwrap_err();
    assert!(matches!(err, MatchFlowError::ScoreAlreadySubmitted(_)));
}

#[tokio::test]
async fn negative_scores_are_rejected() {
    let db = new_db_with_players().await;
    let m = db.insert_match(NewMatch::new("alice").with_opponent("bob")).await.unwrap();
    let err = db.submit_score(&m.match_id, "alice", -1, 10, Duration::hours(24)).await.unwrap_err();
    assert!(matches!(err, MatchFlowError::InvalidScore));
}

#[tokio::test]
async fn confirmation_settles_exactly_once() {
    let db = new_db_with_players().await;
    let m = db.insert_match(NewMatch::new("alice").with_opponent("bob")).await.unwrap();

    // Nothing to confirm yet
    let err = db.confirm_result(&m.match_id, "alice").await.unwrap_err();
    assert!(matches!(err, MatchFlowError::NoPendingResult(_)));

    db.submit_score(&m.match_id, "bob", 21, 15, Duration::hours(24)).await.unwrap();

    // The poster cannot settle their own result
    let err = db.confirm_result(&m.match_id, "bob").await.unwrap_err();
    assert!(matches!(err, MatchFlowError::PosterCannotConfirm));

    let m2 = db.confirm_result(&m.match_id, "alice").await.unwrap();
    assert!(m2.finalized);
    assert_eq!(m2.confirmed_by.as_deref(), Some("alice"));
    assert!(m2.contested_by.is_none());
    assert!(m2.auto_accepted_at.is_none());

    // Every later settlement attempt sees the finalized row
    let err = db.confirm_result(&m.match_id, "alice").await.unwrap_err();
    assert!(matches!(err, MatchFlowError::AlreadyFinalized(_)));
    let err = db.contest_result(&m.match_id, "alice").await.unwrap_err();
    assert!(matches!(err, MatchFlowError::AlreadyFinalized(_)));
}

#[tokio::test]
async fn contest_settles_and_excludes_the_other_paths() {
    let db = new_db_with_players().await;
    let m = db.insert_match(NewMatch::new("alice").with_opponent("bob")).await.unwrap();
    db.submit_score(&m.match_id, "bob", 21, 15, Duration::hours(24)).await.unwrap();

    let err = db.contest_result(&m.match_id, "bob").await.unwrap_err();
    assert!(matches!(err, MatchFlowError::PosterCannotContest));

    let m2 = db.contest_result(&m.match_id, "alice").await.unwrap();
    assert!(m2.finalized);
    assert_eq!(m2.contested_by.as_deref(), Some("alice"));
    assert!(m2.confirmed_by.is_none());
    assert!(m2.auto_accepted_at.is_none());
}

#[tokio::test]
async fn pending_confirmations_list_only_the_opponents_matches() {
    let db = new_db_with_players().await;
    let m1 = db.insert_match(NewMatch::new("alice").with_opponent("bob")).await.unwrap();
    db.submit_score(&m1.match_id, "bob", 21, 15, Duration::hours(24)).await.unwrap();
    let m2 = db.insert_match(NewMatch::new("alice").with_opponent("carol")).await.unwrap();
    db.submit_score(&m2.match_id, "alice", 11, 7, Duration::hours(24)).await.unwrap();

    // Alice has one result waiting on her (from Bob); her own submission waits on Carol
    let pending = db.pending_confirmations_for("alice").await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].match_record.match_id, m1.match_id);
    assert_eq!(pending[0].submitter_name, "Bob");

    let pending = db.pending_confirmations_for("carol").await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].match_record.match_id, m2.match_id);
    assert_eq!(pending[0].submitter_name, "Alice");

    // Settling removes the entry
    db.confirm_result(&m1.match_id, "alice").await.unwrap();
    let pending = db.pending_confirmations_for("alice").await.unwrap();
    assert!(pending.is_empty());
}

#[tokio::test]
async fn sweep_auto_accepts_overdue_matches_and_is_idempotent() {
    let db = new_db_with_players().await;
    let api = MatchFlowApi::new(db.clone(), EventProducers::default());

    let overdue = api.create_match(NewMatch::new("alice").with_opponent("bob")).await.unwrap();
    // A negative window puts the deadline in the past immediately
    api.submit_score(&overdue.match_id, "bob", 21, 15, Duration::seconds(-5)).await.unwrap();
    let fresh = api.create_match(NewMatch::new("alice").with_opponent("carol")).await.unwrap();
    api.submit_score(&fresh.match_id, "carol", 11, 9, Duration::hours(24)).await.unwrap();

    let report = api.settle_overdue_matches().await.unwrap();
    assert_eq!(report.auto_accepted, vec![overdue.match_id.clone()]);
    // The provisional rating was already applied at submission, so the sweep rates nothing new
    assert_eq!(report.rated, 0);

    let settled = api.fetch_match(&overdue.match_id).await.unwrap().unwrap();
    assert!(settled.finalized);
    assert!(settled.auto_accepted_at.is_some());
    assert!(settled.confirmed_by.is_none());
    assert!(settled.contested_by.is_none());

    // Within-deadline matches are untouched
    let untouched = api.fetch_match(&fresh.match_id).await.unwrap().unwrap();
    assert!(!untouched.finalized);

    // Re-running the sweep is a no-op
    let report = api.settle_overdue_matches().await.unwrap();
    assert!(report.auto_accepted.is_empty());
    assert_eq!(report.rated, 0);
}
