use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    ChallengeEvent,
    EventHandler,
    EventProducer,
    Handler,
    MatchReadyEvent,
    MatchSettledEvent,
    ScoreSubmittedEvent,
};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub match_ready_producer: Vec<EventProducer<MatchReadyEvent>>,
    pub score_submitted_producer: Vec<EventProducer<ScoreSubmittedEvent>>,
    pub match_settled_producer: Vec<EventProducer<MatchSettledEvent>>,
    pub challenge_producer: Vec<EventProducer<ChallengeEvent>>,
}

pub struct EventHandlers {
    pub on_match_ready: Option<EventHandler<MatchReadyEvent>>,
    pub on_score_submitted: Option<EventHandler<ScoreSubmittedEvent>>,
    pub on_match_settled: Option<EventHandler<MatchSettledEvent>>,
    pub on_challenge: Option<EventHandler<ChallengeEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_match_ready = hooks.on_match_ready.map(|f| EventHandler::new(buffer_size, f));
        let on_score_submitted = hooks.on_score_submitted.map(|f| EventHandler::new(buffer_size, f));
        let on_match_settled = hooks.on_match_settled.map(|f| EventHandler::new(buffer_size, f));
        let on_challenge = hooks.on_challenge.map(|f| EventHandler::new(buffer_size, f));
        Self { on_match_ready, on_score_submitted, on_match_settled, on_challenge }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_match_ready {
            result.match_ready_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_score_submitted {
            result.score_submitted_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_match_settled {
            result.match_settled_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_challenge {
            result.challenge_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_match_ready {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_score_submitted {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_match_settled {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_challenge {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_match_ready: Option<Handler<MatchReadyEvent>>,
    pub on_score_submitted: Option<Handler<ScoreSubmittedEvent>>,
    pub on_match_settled: Option<Handler<MatchSettledEvent>>,
    pub on_challenge: Option<Handler<ChallengeEvent>>,
}

impl EventHooks {
    pub fn on_match_ready<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(MatchReadyEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_match_ready = Some(Arc::new(f));
        self
    }

    pub fn on_score_submitted<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ScoreSubmittedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_score_submitted = Some(Arc::new(f));
        self
    }

    pub fn on_match_settled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(MatchSettledEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_match_settled = Some(Arc::new(f));
        self
    }

    pub fn on_challenge<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ChallengeEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_challenge = Some(Arc::new(f));
        self
    }
}
