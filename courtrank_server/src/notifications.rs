//! The push notification boundary.
//!
//! Engine events get translated into [`NotificationDispatcher`] calls here. The dispatcher is the seam where a real
//! push transport (APNs, FCM, email) would plug in; the default [`LogDispatcher`] just writes the payloads to the log.
//! Delivery is fire-and-forget: a failed send is logged and never propagated back into the match flow.

use std::sync::Arc;

use courtrank_engine::{
    db_types::ChallengeStatus,
    events::{ChallengeEvent, EventHooks, MatchReadyEvent, MatchSettledEvent, ScoreSubmittedEvent, SettlementKind},
    PlayerManagement,
    SqliteDatabase,
};
use log::*;
use serde_json::json;

pub trait NotificationDispatcher: Send + Sync {
    /// Delivers a notification to a single user. Returns false when delivery failed.
    fn send_to_user(&self, user_id: &str, title: &str, body: &str, data: serde_json::Value) -> bool;
}

/// The default dispatcher. Writes every notification to the log and reports success.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogDispatcher;

impl NotificationDispatcher for LogDispatcher {
    fn send_to_user(&self, user_id: &str, title: &str, body: &str, data: serde_json::Value) -> bool {
        info!("🔔️ [{user_id}] {title}: {body} {data}");
        true
    }
}

/// Looks up a display name for notification copy, falling back to the raw user id.
async fn display_name(db: &SqliteDatabase, user_id: &str) -> String {
    match db.fetch_player(user_id).await {
        Ok(Some(player)) => player.display_name,
        Ok(None) => user_id.to_string(),
        Err(e) => {
            warn!("📬️ Could not look up display name for {user_id}. {e}");
            user_id.to_string()
        },
    }
}

fn dispatch(dispatcher: &dyn NotificationDispatcher, user_id: &str, title: &str, body: &str, data: serde_json::Value) {
    if !dispatcher.send_to_user(user_id, title, body, data) {
        warn!("📬️ Notification delivery to {user_id} failed");
    }
}

/// Wires the notification hooks into the event system. Every hook clones its own handles, looks up friendly names and
/// hands the message to the dispatcher.
pub fn register_notification_hooks(
    hooks: &mut EventHooks,
    dispatcher: Arc<dyn NotificationDispatcher>,
    db: SqliteDatabase,
) {
    let (d, dbc) = (dispatcher.clone(), db.clone());
    hooks.on_match_ready(move |ev: MatchReadyEvent| {
        let (d, db) = (d.clone(), dbc.clone());
        Box::pin(async move {
            let Some(other) = ev.match_record.other_participant(&ev.ready_player).map(str::to_string) else {
                return;
            };
            let name = display_name(&db, &ev.ready_player).await;
            let data = json!({ "match_id": ev.match_record.match_id, "type": "match_ready" });
            dispatch(&*d, &other, "Ready to play", &format!("{name} has pressed start"), data);
        })
    });

    let (d, dbc) = (dispatcher.clone(), db.clone());
    hooks.on_score_submitted(move |ev: ScoreSubmittedEvent| {
        let (d, db) = (d.clone(), dbc.clone());
        Box::pin(async move {
            let Some(submitter) = ev.match_record.submitted_by.clone() else { return };
            let Some(other) = ev.match_record.other_participant(&submitter).map(str::to_string) else { return };
            let name = display_name(&db, &submitter).await;
            let data = json!({ "match_id": ev.match_record.match_id, "type": "score_submitted" });
            dispatch(&*d, &other, "Score posted", &format!("{name} posted a result. Confirm or contest it."), data);
        })
    });

    let (d, dbc) = (dispatcher.clone(), db.clone());
    hooks.on_match_settled(move |ev: MatchSettledEvent| {
        let d = d.clone();
        let _db = dbc.clone();
        Box::pin(async move {
            let body = match ev.kind {
                SettlementKind::Confirmed => "The result was confirmed and ratings are final.",
                SettlementKind::Contested => "The result was contested and the rating change was rolled back.",
                SettlementKind::AutoAccepted => "The confirmation window lapsed, so the result stands.",
            };
            let data = json!({ "match_id": ev.match_record.match_id, "type": "match_settled", "kind": ev.kind });
            let mut recipients = vec![ev.match_record.creator_id.clone()];
            recipients.extend(ev.match_record.opponent_id.clone());
            for user in recipients {
                dispatch(&*d, &user, "Match settled", body, data.clone());
            }
        })
    });

    let d = dispatcher;
    hooks.on_challenge(move |ev: ChallengeEvent| {
        let (d, db) = (d.clone(), db.clone());
        Box::pin(async move {
            let data = json!({ "challenge_id": ev.challenge.challenge_id, "type": "challenge", "status": ev.status });
            match ev.status {
                ChallengeStatus::Pending => {
                    let name = display_name(&db, &ev.challenge.from_id).await;
                    dispatch(&*d, &ev.challenge.to_id, "New challenge", &format!("{name} wants a game"), data);
                },
                ChallengeStatus::Accepted => {
                    let name = display_name(&db, &ev.challenge.to_id).await;
                    dispatch(
                        &*d,
                        &ev.challenge.from_id,
                        "Challenge accepted",
                        &format!("{name} accepted. Your match is ready."),
                        data,
                    );
                },
                ChallengeStatus::Declined => {
                    let name = display_name(&db, &ev.challenge.to_id).await;
                    dispatch(&*d, &ev.challenge.from_id, "Challenge declined", &format!("{name} declined"), data);
                },
                // Cancellations and expiry don't warrant a push
                ChallengeStatus::Cancelled | ChallengeStatus::Expired => {},
            }
        })
    });
}
