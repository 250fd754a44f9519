//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! All handlers are concrete over [`SqliteDatabase`]; the engine traits stay generic, the HTTP surface does not.
//! Any long, non-cpu-bound operation (database calls, especially) must be awaited, never blocked on, so that the
//! worker threads keep serving other requests.

use std::str::FromStr;

use actix_web::{delete, get, post, web, HttpResponse, Responder};
use chrono::Utc;
use courtrank_engine::{
    db_types::{ChallengeId, MatchId, NewChallenge, NewMatch, NewPlayer},
    traits::{ChallengeBox, HistoryRange},
    ChallengeApi,
    MatchFlowApi,
    PlayerApi,
    RatingApi,
    SqliteDatabase,
};
use log::*;
use serde_json::json;

use crate::{
    auth::{AuthenticatedPlayer, RequireAdmin, TokenIssuer},
    config::FlowSettings,
    data_objects::{
        ChallengeBoxQuery,
        HistoryRangeQuery,
        NewChallengeRequest,
        NewMatchRequest,
        RegisterPlayerRequest,
        ScoreSubmission,
        TokenRequest,
        TokenResponse,
    },
    errors::ServerError,
};

type Matches = web::Data<MatchFlowApi<SqliteDatabase>>;
type Ratings = web::Data<RatingApi<SqliteDatabase>>;
type Players = web::Data<PlayerApi<SqliteDatabase>>;
type Challenges = web::Data<ChallengeApi<SqliteDatabase>>;

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Players   ----------------------------------------------------

#[post("/players")]
pub async fn register_player(
    auth: AuthenticatedPlayer,
    body: web::Json<RegisterPlayerRequest>,
    api: Players,
) -> Result<HttpResponse, ServerError> {
    let name = body.into_inner().display_name;
    if name.trim().is_empty() {
        return Err(ServerError::InvalidRequestBody("display_name must not be empty".to_string()));
    }
    debug!("💻️ POST register player {}", auth.user_id);
    let player = api.upsert_player(NewPlayer::new(auth.user_id, name)).await?;
    Ok(HttpResponse::Ok().json(player))
}

#[get("/players/{id}")]
pub async fn get_player(
    _auth: AuthenticatedPlayer,
    path: web::Path<String>,
    api: Players,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let player = api.fetch_player(&id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("player {id}")))?;
    Ok(HttpResponse::Ok().json(player))
}

//----------------------------------------------   Matches   ----------------------------------------------------

#[post("/matches")]
pub async fn create_match(
    auth: AuthenticatedPlayer,
    body: web::Json<NewMatchRequest>,
    api: Matches,
) -> Result<HttpResponse, ServerError> {
    let mut new_match = NewMatch::new(auth.user_id.as_str());
    if let Some(opponent) = body.into_inner().opponent_id {
        if opponent == auth.user_id {
            return Err(ServerError::InvalidRequestBody("You cannot play against yourself".to_string()));
        }
        new_match = new_match.with_opponent(opponent);
    }
    debug!("💻️ POST create match for {}", auth.user_id);
    let match_record = api.create_match(new_match).await?;
    Ok(HttpResponse::Ok().json(match_record))
}

#[get("/matches/pending-confirmation")]
pub async fn pending_confirmations(auth: AuthenticatedPlayer, api: Matches) -> Result<HttpResponse, ServerError> {
    let pending = api.pending_confirmations(&auth.user_id).await?;
    Ok(HttpResponse::Ok().json(pending))
}

#[get("/matches/{id}")]
pub async fn get_match(
    auth: AuthenticatedPlayer,
    path: web::Path<MatchId>,
    api: Matches,
) -> Result<HttpResponse, ServerError> {
    let match_id = path.into_inner();
    let match_record = api
        .fetch_match(&match_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("match {match_id}")))?;
    if !match_record.is_participant(&auth.user_id) {
        return Err(ServerError::InsufficientPermissions(format!(
            "User {} is not a participant in match {match_id}",
            auth.user_id
        )));
    }
    Ok(HttpResponse::Ok().json(match_record))
}

#[post("/matches/{id}/press-start")]
pub async fn press_start(
    auth: AuthenticatedPlayer,
    path: web::Path<MatchId>,
    api: Matches,
) -> Result<HttpResponse, ServerError> {
    let match_id = path.into_inner();
    debug!("💻️ POST press start on {match_id} by {}", auth.user_id);
    let outcome = api.press_start(&match_id, &auth.user_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "match": outcome.match_record,
        "went_live": outcome.went_live,
        "newly_pressed": outcome.newly_pressed,
    })))
}

#[post("/matches/{id}/score")]
pub async fn submit_score(
    auth: AuthenticatedPlayer,
    path: web::Path<MatchId>,
    body: web::Json<ScoreSubmission>,
    api: Matches,
    settings: web::Data<FlowSettings>,
) -> Result<HttpResponse, ServerError> {
    let match_id = path.into_inner();
    let score = body.into_inner();
    debug!("💻️ POST score {}-{} on {match_id} by {}", score.me, score.opponent, auth.user_id);
    let match_record =
        api.submit_score(&match_id, &auth.user_id, score.me, score.opponent, settings.confirm_window).await?;
    Ok(HttpResponse::Ok().json(match_record))
}

#[post("/matches/{id}/confirm")]
pub async fn confirm_result(
    auth: AuthenticatedPlayer,
    path: web::Path<MatchId>,
    api: Matches,
) -> Result<HttpResponse, ServerError> {
    let match_id = path.into_inner();
    debug!("💻️ POST confirm on {match_id} by {}", auth.user_id);
    let match_record = api.confirm_result(&match_id, &auth.user_id).await?;
    Ok(HttpResponse::Ok().json(match_record))
}

#[post("/matches/{id}/contest")]
pub async fn contest_result(
    auth: AuthenticatedPlayer,
    path: web::Path<MatchId>,
    api: Matches,
) -> Result<HttpResponse, ServerError> {
    let match_id = path.into_inner();
    debug!("💻️ POST contest on {match_id} by {}", auth.user_id);
    let match_record = api.contest_result(&match_id, &auth.user_id).await?;
    Ok(HttpResponse::Ok().json(match_record))
}

//----------------------------------------------   Ratings   ----------------------------------------------------

#[get("/users/{id}/rating")]
pub async fn get_rating(
    _auth: AuthenticatedPlayer,
    path: web::Path<String>,
    api: Ratings,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    let rating = api.rating_for(&user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "user_id": user_id, "rating": rating, "display": rating.to_string() })))
}

#[get("/users/{id}/rank-history")]
pub async fn get_rank_history(
    _auth: AuthenticatedPlayer,
    path: web::Path<String>,
    query: web::Query<HistoryRangeQuery>,
    api: Ratings,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    let range = query.into_inner().range.unwrap_or_default();
    let range = HistoryRange::from_str(&range)
        .map_err(|_| ServerError::InvalidRequestBody(format!("Invalid history range: {range}")))?;
    let history = api.rank_history_for(&user_id, range).await?;
    Ok(HttpResponse::Ok().json(history))
}

#[get("/users/{id}/reputation")]
pub async fn get_reputation(
    _auth: AuthenticatedPlayer,
    path: web::Path<String>,
    api: Ratings,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    let reputation = api.reputation_for(&user_id).await?;
    Ok(HttpResponse::Ok().json(reputation))
}

//----------------------------------------------   Challenges  ---------------------------------------------------

#[post("/challenges")]
pub async fn create_challenge(
    auth: AuthenticatedPlayer,
    body: web::Json<NewChallengeRequest>,
    api: Challenges,
    settings: web::Data<FlowSettings>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    let mut challenge = NewChallenge::new(auth.user_id.as_str(), req.to_user.as_str(), Utc::now() + settings.challenge_ttl);
    if let Some(message) = req.message {
        challenge = challenge.with_message(message);
    }
    debug!("💻️ POST challenge {} -> {}", auth.user_id, req.to_user);
    let outcome = api.create_challenge(challenge).await?;
    Ok(HttpResponse::Ok().json(json!({ "challenge": outcome.challenge, "deduplicated": outcome.deduplicated })))
}

#[get("/challenges")]
pub async fn list_challenges(
    auth: AuthenticatedPlayer,
    query: web::Query<ChallengeBoxQuery>,
    api: Challenges,
) -> Result<HttpResponse, ServerError> {
    let mailbox = query.into_inner().mailbox.unwrap_or_else(|| "inbox".to_string());
    let mailbox = ChallengeBox::from_str(&mailbox)
        .map_err(|_| ServerError::InvalidRequestBody(format!("Invalid challenge box: {mailbox}")))?;
    let challenges = api.challenges_for(&auth.user_id, mailbox).await?;
    Ok(HttpResponse::Ok().json(challenges))
}

#[post("/challenges/{id}/accept")]
pub async fn accept_challenge(
    auth: AuthenticatedPlayer,
    path: web::Path<ChallengeId>,
    api: Challenges,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ POST accept challenge {id} by {}", auth.user_id);
    let (challenge, match_record) = api.accept_challenge(&id, &auth.user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "challenge": challenge, "match": match_record })))
}

#[post("/challenges/{id}/decline")]
pub async fn decline_challenge(
    auth: AuthenticatedPlayer,
    path: web::Path<ChallengeId>,
    api: Challenges,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ POST decline challenge {id} by {}", auth.user_id);
    let challenge = api.decline_challenge(&id, &auth.user_id).await?;
    Ok(HttpResponse::Ok().json(challenge))
}

#[delete("/challenges/{id}")]
pub async fn cancel_challenge(
    auth: AuthenticatedPlayer,
    path: web::Path<ChallengeId>,
    api: Challenges,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ DELETE challenge {id} by {}", auth.user_id);
    let challenge = api.cancel_challenge(&id, &auth.user_id).await?;
    Ok(HttpResponse::Ok().json(challenge))
}

//----------------------------------------------   Invites    ----------------------------------------------------

#[post("/invites")]
pub async fn create_invite(
    auth: AuthenticatedPlayer,
    api: Challenges,
    settings: web::Data<FlowSettings>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST create invite by {}", auth.user_id);
    let invite = api.create_invite(&auth.user_id, settings.invite_ttl).await?;
    Ok(HttpResponse::Ok().json(invite))
}

#[post("/invites/{token}/redeem")]
pub async fn redeem_invite(
    auth: AuthenticatedPlayer,
    path: web::Path<String>,
    api: Challenges,
) -> Result<HttpResponse, ServerError> {
    let token = path.into_inner();
    debug!("💻️ POST redeem invite by {}", auth.user_id);
    let (invite, match_record) = api.redeem_invite(&token, &auth.user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "invite": invite, "match": match_record })))
}

//----------------------------------------------   Admin      ----------------------------------------------------

#[get("/admin/match-sweep")]
pub async fn admin_match_sweep(_admin: RequireAdmin, api: Matches) -> Result<HttpResponse, ServerError> {
    info!("💻️ Admin requested a settlement sweep");
    let report = api.settle_overdue_matches().await?;
    info!("💻️ {report}");
    Ok(HttpResponse::Ok().json(report))
}

#[get("/admin/sweep")]
pub async fn admin_challenge_sweep(_admin: RequireAdmin, api: Challenges) -> Result<HttpResponse, ServerError> {
    info!("💻️ Admin requested a challenge expiry sweep");
    let report = api.expire_stale().await?;
    info!("💻️ {report}");
    Ok(HttpResponse::Ok().json(report))
}

#[post("/admin/token")]
pub async fn admin_issue_token(
    _admin: RequireAdmin,
    body: web::Json<TokenRequest>,
    issuer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let user_id = body.into_inner().user_id;
    if user_id.trim().is_empty() {
        return Err(ServerError::InvalidRequestBody("user_id must not be empty".to_string()));
    }
    info!("💻️ Admin issued an access token for {user_id}");
    let token = issuer.issue_token(&user_id);
    Ok(HttpResponse::Ok().json(TokenResponse { user_id, token }))
}
