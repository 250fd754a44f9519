//! Endpoint tests that drive the real handlers over a throwaway SQLite database.

use actix_web::{
    test,
    web,
    web::ServiceConfig,
    App,
};
use courtrank_engine::{
    db_types::{NewPlayer, Player},
    events::EventProducers,
    test_utils::{prepare_test_env, random_db_path},
    ChallengeApi,
    MatchFlowApi,
    PlayerApi,
    PlayerManagement,
    RatingApi,
    SqliteDatabase,
};
use cr_common::Secret;
use serde_json::{json, Value};

use crate::{
    auth::{AdminGate, TokenIssuer, ADMIN_SECRET_HEADER, AUTH_TOKEN_HEADER},
    config::{AuthConfig, FlowSettings, ServerConfig},
    routes::*,
};

const ADMIN_SECRET: &str = "test-admin-secret";

fn test_auth_config() -> AuthConfig {
    AuthConfig {
        auth_secret: Secret::new("endpoint-test-auth-secret".to_string()),
        admin_secret: Secret::new(ADMIN_SECRET.to_string()),
    }
}

async fn test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
    for (id, name) in [("alice", "Alice"), ("bob", "Bob")] {
        db.upsert_player(NewPlayer::new(id, name)).await.expect("Error seeding player");
    }
    db
}

fn configure(db: SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let auth = test_auth_config();
        let settings = FlowSettings::from_config(&ServerConfig::default());
        cfg.app_data(web::Data::new(MatchFlowApi::new(db.clone(), EventProducers::default())))
            .app_data(web::Data::new(RatingApi::new(db.clone())))
            .app_data(web::Data::new(PlayerApi::new(db.clone())))
            .app_data(web::Data::new(ChallengeApi::new(db, EventProducers::default())))
            .app_data(web::Data::new(TokenIssuer::new(&auth)))
            .app_data(web::Data::new(AdminGate::new(&auth)))
            .app_data(web::Data::new(settings))
            .service(health)
            .service(register_player)
            .service(get_player)
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
            .service(admin_match_sweep)
            .service(admin_challenge_sweep)
            .service(admin_issue_token);
    }
}

fn token_for(user_id: &str) -> String {
    TokenIssuer::new(&test_auth_config()).issue_token(user_id)
}

#[actix_web::test]
async fn health_needs_no_auth() {
    let db = test_db().await;
    let app = test::init_service(App::new().configure(configure(db))).await;
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn missing_or_forged_tokens_are_rejected() {
    let db = test_db().await;
    let app = test::init_service(App::new().configure(configure(db))).await;

    let req = test::TestRequest::get().uri("/matches/pending-confirmation").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 401);

    let req = test::TestRequest::get()
        .uri("/matches/pending-confirmation")
        .insert_header((AUTH_TOKEN_HEADER, "alice.bm90LWEtc2ln"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 401);
}

#[actix_web::test]
async fn admin_endpoints_are_gated() {
    let db = test_db().await;
    let app = test::init_service(App::new().configure(configure(db))).await;

    let req = test::TestRequest::get().uri("/admin/sweep").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 403);

    let req = test::TestRequest::get().uri("/admin/sweep").insert_header((ADMIN_SECRET_HEADER, "wrong")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 403);

    let req =
        test::TestRequest::get().uri("/admin/sweep").insert_header((ADMIN_SECRET_HEADER, ADMIN_SECRET)).to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn admin_issues_tokens_that_the_extractor_accepts() {
    let db = test_db().await;
    let app = test::init_service(App::new().configure(configure(db))).await;

    let req = test::TestRequest::post()
        .uri("/admin/token")
        .insert_header((ADMIN_SECRET_HEADER, ADMIN_SECRET))
        .set_json(json!({ "user_id": "carol" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let token = body["token"].as_str().expect("token should be a string").to_string();

    // Use the freshly minted token to register the player
    let req = test::TestRequest::post()
        .uri("/players")
        .insert_header((AUTH_TOKEN_HEADER, token.as_str()))
        .set_json(json!({ "display_name": "Carol" }))
        .to_request();
    let player: Player = test::call_and_read_body_json(&app, req).await;
    assert_eq!(player.id, "carol");
    assert_eq!(player.display_name, "Carol");
}

#[actix_web::test]
async fn a_match_settles_over_http() {
    let db = test_db().await;
    let app = test::init_service(App::new().configure(configure(db))).await;
    let alice = token_for("alice");
    let bob = token_for("bob");

    let req = test::TestRequest::post()
        .uri("/matches")
        .insert_header((AUTH_TOKEN_HEADER, alice.as_str()))
        .set_json(json!({ "opponent_id": "bob" }))
        .to_request();
    let m: Value = test::call_and_read_body_json(&app, req).await;
    let match_id = m["match_id"].as_str().expect("match_id should be a string").to_string();

    for token in [&alice, &bob] {
        let req = test::TestRequest::post()
            .uri(&format!("/matches/{match_id}/press-start"))
            .insert_header((AUTH_TOKEN_HEADER, token.as_str()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    let req = test::TestRequest::post()
        .uri(&format!("/matches/{match_id}/score"))
        .insert_header((AUTH_TOKEN_HEADER, bob.as_str()))
        .set_json(json!({ "me": 21, "opponent": 15 }))
        .to_request();
    let m: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(m["status"], "Ended");
    assert_eq!(m["submitted_by"], "bob");

    // Bob cannot confirm his own submission
    let req = test::TestRequest::post()
        .uri(&format!("/matches/{match_id}/confirm"))
        .insert_header((AUTH_TOKEN_HEADER, bob.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "poster_cannot_confirm");

    let req = test::TestRequest::post()
        .uri(&format!("/matches/{match_id}/confirm"))
        .insert_header((AUTH_TOKEN_HEADER, alice.as_str()))
        .to_request();
    let m: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(m["finalized"], Value::Bool(true));

    // And a second confirmation is a settled-state violation
    let req = test::TestRequest::post()
        .uri(&format!("/matches/{match_id}/confirm"))
        .insert_header((AUTH_TOKEN_HEADER, alice.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);

    let req = test::TestRequest::get()
        .uri("/users/bob/rating")
        .insert_header((AUTH_TOKEN_HEADER, alice.as_str()))
        .to_request();
    let rating: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(rating["rating"], json!(311));
    assert_eq!(rating["display"], "3.11");
}
