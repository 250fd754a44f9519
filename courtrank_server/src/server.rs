use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use courtrank_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    ChallengeApi,
    MatchFlowApi,
    PlayerApi,
    RatingApi,
    SqliteDatabase,
};
use log::info;

use crate::{
    auth::{AdminGate, TokenIssuer},
    config::{FlowSettings, ServerConfig},
    errors::ServerError,
    notifications::{register_notification_hooks, LogDispatcher},
    routes::{
        accept_challenge,
        admin_challenge_sweep,
        admin_issue_token,
        admin_match_sweep,
        cancel_challenge,
        confirm_result,
        contest_result,
        create_challenge,
        create_invite,
        create_match,
        decline_challenge,
        get_match,
        get_player,
        get_rank_history,
        get_rating,
        get_reputation,
        health,
        list_challenges,
        pending_confirmations,
        press_start,
        redeem_invite,
        register_player,
        submit_score,
    },
    sweep_worker::start_sweep_worker,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let mut hooks = EventHooks::default();
    register_notification_hooks(&mut hooks, Arc::new(LogDispatcher), db.clone());
    let handlers = EventHandlers::new(25, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    info!("📬️ Event handlers started");
    if config.sweep_interval_secs > 0 {
        start_sweep_worker(db.clone(), producers.clone(), config.sweep_interval_secs);
    }
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let settings = FlowSettings::from_config(&config);
    let auth = config.auth.clone();
    let srv = HttpServer::new(move || {
        let matches_api = MatchFlowApi::new(db.clone(), producers.clone());
        let ratings_api = RatingApi::new(db.clone());
        let players_api = PlayerApi::new(db.clone());
        let challenges_api = ChallengeApi::new(db.clone(), producers.clone());
        let token_issuer = TokenIssuer::new(&auth);
        let admin_gate = AdminGate::new(&auth);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("cr::access_log"))
            .app_data(web::Data::new(matches_api))
            .app_data(web::Data::new(ratings_api))
            .app_data(web::Data::new(players_api))
            .app_data(web::Data::new(challenges_api))
            .app_data(web::Data::new(token_issuer))
            .app_data(web::Data::new(admin_gate))
            .app_data(web::Data::new(settings))
            .service(health)
            .service(register_player)
            .service(get_player)
            // The fixed path must register before the `{id}` catch-all
            .service(pending_confirmations)
            .service(create_match)
            .service(get_match)
            .service(press_start)
            .service(submit_score)
            .service(confirm_result)
            .service(contest_result)
            .service(get_rating)
            .service(get_rank_history)
            .service(get_reputation)
            .service(create_challenge)
            .service(list_challenges)
            .service(accept_challenge)
            .service(decline_challenge)
            .service(cancel_challenge)
            .service(create_invite)
            .service(redeem_invite)
            .service(admin_match_sweep)
            .service(admin_challenge_sweep)
            .service(admin_issue_token)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
