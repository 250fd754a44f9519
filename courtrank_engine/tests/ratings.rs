mod support;

use chrono::Duration;
use courtrank_engine::{
    db_types::{HistoryKind, NewMatch},
    events::EventProducers,
    traits::{HistoryRange, RatingSkipReason, RevertSkipReason},
    MatchFlowApi,
    MatchLifecycle,
    PlayerManagement,
    RatingManagement,
};
use cr_common::Rating;
use support::new_db_with_players;

const WINDOW: Duration = Duration::hours(24);

#[tokio::test]
async fn submission_applies_a_provisional_rating_exactly_once() {
    let db = new_db_with_players().await;
    let api = MatchFlowApi::new(db.clone(), EventProducers::default());
    let m = api.create_match(NewMatch::new("alice").with_opponent("bob")).await.unwrap();

    // Bob wins 21-15: evenly matched, so base 10 plus one centi-point for the 6-point margin
    api.submit_score(&m.match_id, "bob", 21, 15, WINDOW).await.unwrap();

    let bob = db.fetch_player("bob").await.unwrap().unwrap();
    let alice = db.fetch_player("alice").await.unwrap().unwrap();
    assert_eq!(bob.rating, Rating::from(311));
    assert_eq!(alice.rating, Rating::from(289));
    assert_eq!(bob.games_played, 1);
    assert_eq!(alice.games_played, 1);

    // Applying again is a reported skip, and changes nothing
    let outcome = db.apply_match_rating(&m.match_id, true).await.unwrap();
    assert!(!outcome.applied);
    assert_eq!(outcome.reason, Some(RatingSkipReason::AlreadyApplied));
    let bob = db.fetch_player("bob").await.unwrap().unwrap();
    assert_eq!(bob.rating, Rating::from(311));
    assert_eq!(bob.games_played, 1);

    // One forward history entry per player
    let history = db.rank_history_for("bob", HistoryRange::All).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, HistoryKind::Forward);
    assert_eq!(history[0].rating_before, Rating::from(300));
    assert_eq!(history[0].rating_after, Rating::from(311));
    assert_eq!(history[0].match_id, m.match_id);
}

#[tokio::test]
async fn ties_are_skipped_and_change_nothing() {
    let db = new_db_with_players().await;
    let api = MatchFlowApi::new(db.clone(), EventProducers::default());
    let m = api.create_match(NewMatch::new("alice").with_opponent("bob")).await.unwrap();
    api.submit_score(&m.match_id, "bob", 15, 15, WINDOW).await.unwrap();

    let outcome = db.apply_match_rating(&m.match_id, true).await.unwrap();
    assert!(!outcome.applied);
    assert_eq!(outcome.reason, Some(RatingSkipReason::TieOrBadScore));
    let alice = db.fetch_player("alice").await.unwrap().unwrap();
    assert_eq!(alice.rating, Rating::from(300));
    assert!(db.rank_history_for("alice", HistoryRange::All).await.unwrap().is_empty());
}

#[tokio::test]
async fn contest_reverts_the_rating_exactly_and_appends_the_audit_trail() {
    let db = new_db_with_players().await;
    let api = MatchFlowApi::new(db.clone(), EventProducers::default());
    let m = api.create_match(NewMatch::new("alice").with_opponent("bob")).await.unwrap();
    api.submit_score(&m.match_id, "bob", 21, 15, WINDOW).await.unwrap();

    api.contest_result(&m.match_id, "alice").await.unwrap();

    // Both players are back to their pre-match ratings: the contest nets zero
    let bob = db.fetch_player("bob").await.unwrap().unwrap();
    let alice = db.fetch_player("alice").await.unwrap().unwrap();
    assert_eq!(bob.rating, Rating::from(300));
    assert_eq!(alice.rating, Rating::from(300));
    // and the contester's counter moved
    assert_eq!(alice.games_contested, 1);
    assert_eq!(bob.games_contested, 0);

    // The history shows the full story: a forward entry and its reversal, nothing deleted
    let history = db.rank_history_for("bob", HistoryRange::All).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].kind, HistoryKind::Forward);
    assert_eq!(history[1].kind, HistoryKind::Reversal);
    assert_eq!(history[1].rating_before, Rating::from(311));
    assert_eq!(history[1].rating_after, Rating::from(300));

    // A second revert is a reported skip
    let outcome = db.revert_match_rating(&m.match_id).await.unwrap();
    assert!(!outcome.reverted);
    assert_eq!(outcome.reason, Some(RevertSkipReason::AlreadyReverted));
}

#[tokio::test]
async fn reverting_an_unrated_match_is_a_reported_skip() {
    let db = new_db_with_players().await;
    let m = db.insert_match(NewMatch::new("alice").with_opponent("bob")).await.unwrap();
    let outcome = db.revert_match_rating(&m.match_id).await.unwrap();
    assert!(!outcome.reverted);
    assert_eq!(outcome.reason, Some(RevertSkipReason::NothingApplied));
}

#[tokio::test]
async fn upsets_pay_the_underdog_more() {
    let db = new_db_with_players().await;
    let api = MatchFlowApi::new(db.clone(), EventProducers::default());

    // Pump Bob up past the upset threshold: Bob beats Carol repeatedly
    for _ in 0..6 {
        let m = api.create_match(NewMatch::new("bob").with_opponent("carol")).await.unwrap();
        api.submit_score(&m.match_id, "bob", 21, 0, WINDOW).await.unwrap();
        api.confirm_result(&m.match_id, "carol").await.unwrap();
    }
    let bob = db.fetch_player("bob").await.unwrap().unwrap();
    let alice = db.fetch_player("alice").await.unwrap().unwrap();
    assert!(bob.rating.gap(&alice.rating) > 50);

    // Alice (300) upsets Bob: base 10 + upset 5 + margin 2/5 = 0
    let bob_before = bob.rating;
    let m = api.create_match(NewMatch::new("alice").with_opponent("bob")).await.unwrap();
    api.submit_score(&m.match_id, "alice", 11, 9, WINDOW).await.unwrap();
    let alice = db.fetch_player("alice").await.unwrap().unwrap();
    let bob = db.fetch_player("bob").await.unwrap().unwrap();
    assert_eq!(alice.rating, Rating::from(315));
    assert_eq!(bob.rating, bob_before - Rating::from(5));
}

#[tokio::test]
async fn reputation_tracks_contested_share_of_submissions() {
    let db = new_db_with_players().await;
    let api = MatchFlowApi::new(db.clone(), EventProducers::default());

    // Before posting anything, Alice has a perfect score
    let rep = db.reputation_for("alice").await.unwrap();
    assert_eq!(rep.posted, 0);
    assert_eq!(rep.score, 5.0);

    // Alice posts three results; Bob contests one of them
    for i in 0..3 {
        let m = api.create_match(NewMatch::new("alice").with_opponent("bob")).await.unwrap();
        api.submit_score(&m.match_id, "alice", 21, 15, WINDOW).await.unwrap();
        if i == 0 {
            api.contest_result(&m.match_id, "bob").await.unwrap();
        } else {
            api.confirm_result(&m.match_id, "bob").await.unwrap();
        }
    }

    let rep = db.reputation_for("alice").await.unwrap();
    assert_eq!(rep.posted, 3);
    assert_eq!(rep.contested, 1);
    // 5 - 4/3 = 3.666… → 3.7
    assert_eq!(rep.score, 3.7);

    // Bob contested but never posted, so his own reputation is untouched
    let rep = db.reputation_for("bob").await.unwrap();
    assert_eq!(rep.posted, 0);
    assert_eq!(rep.score, 5.0);
}
