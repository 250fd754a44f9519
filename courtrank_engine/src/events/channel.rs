//! The fan-out channel behind the engine's event hooks
//!
//! The flow APIs publish lifecycle events (a match went ready, a score landed, a match settled, a
//! challenge changed state) into these channels and move on. Subscribers only ever see the event
//! value itself. They never get a handle on engine internals, but they may be async.
use std::{
    future::Future,
    pin::Pin,
    sync::{atomic::AtomicI64, Arc},
};

use log::*;
use tokio::sync::mpsc;

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    receiver: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size);
        Self { receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    pub async fn start_handler(mut self) {
        debug!("📬️ Starting event handler");
        // The internal sender must go first, otherwise the recv loop below never terminates once
        // the flow APIs drop their producers
        drop(self.sender);
        let jobs = Arc::new(AtomicI64::new(0));
        while let Some(ev) = self.receiver.recv().await {
            trace!("📬️ Handling event");
            let handler = Arc::clone(&self.handler);
            jobs.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let job = jobs.clone();
            tokio::spawn(async move {
                (handler)(ev).await;
                job.fetch_sub(1, std::sync::atomic::Ordering::Relaxed);
                trace!("📬️ Event handled");
            });
        }
        // All producers are gone. Drain the in-flight jobs before reporting shutdown
        match tokio::spawn(async move {
            while jobs.load(std::sync::atomic::Ordering::SeqCst) > 0 {
                debug!("📬️ Waiting for jobs to complete");
                tokio::time::sleep(tokio::time::Duration::from_millis(1000)).await;
            }
        })
        .await
        {
            Ok(_) => {
                debug!("📬️ Event handler shutting down gracefully");
            },
            Err(e) => {
                warn!("📬️ Event handler shutdown process failed: {e}. Logging this just in case.");
            },
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event: {e}");
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;
    use crate::{
        db_types::{Match, MatchId, MatchStatus},
        events::{MatchSettledEvent, SettlementKind},
    };

    fn settled(match_id: &str, kind: SettlementKind) -> MatchSettledEvent {
        let now = Utc::now();
        let match_record = Match {
            id: 1,
            match_id: MatchId(match_id.to_string()),
            creator_id: "alice".to_string(),
            opponent_id: Some("bob".to_string()),
            status: MatchStatus::Ended,
            started_by_creator: true,
            started_by_opponent: true,
            timer_start: Some(now),
            score_creator: Some(15),
            score_opponent: Some(21),
            submitted_by: Some("bob".to_string()),
            submitted_at: Some(now),
            deadline_at: Some(now),
            confirmed_by: Some("alice".to_string()),
            contested_by: None,
            finalized: true,
            auto_accepted_at: None,
            provisional_rating_applied: true,
            created_at: now,
            updated_at: now,
        };
        MatchSettledEvent::new(match_record, kind)
    }

    #[tokio::test]
    async fn every_settlement_reaches_the_handler_before_shutdown() {
        let _ = env_logger::try_init();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let collector = Arc::clone(&seen);
        let handler = Arc::new(move |ev: MatchSettledEvent| {
            let seen = Arc::clone(&collector);
            Box::pin(async move {
                debug!("Handler received settlement of {}", ev.match_record.match_id);
                // A slow subscriber must not lose events to the shutdown
                tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                seen.lock().unwrap().push(ev.match_record.match_id.as_str().to_string());
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
        let event_handler = EventHandler::new(1, handler);
        let confirmations = event_handler.subscribe();
        let sweeps = event_handler.subscribe();
        tokio::spawn(async move {
            for i in 0..5 {
                confirmations.publish_event(settled(&format!("c{i}"), SettlementKind::Confirmed)).await;
            }
        });
        tokio::spawn(async move {
            for i in 0..5 {
                sweeps.publish_event(settled(&format!("s{i}"), SettlementKind::AutoAccepted)).await;
            }
        });

        event_handler.start_handler().await;
        debug!("Handler done");
        let mut ids = seen.lock().unwrap().clone();
        ids.sort();
        assert_eq!(ids, ["c0", "c1", "c2", "c3", "c4", "s0", "s1", "s2", "s3", "s4"]);
    }
}
