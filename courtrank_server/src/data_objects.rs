use serde::{Deserialize, Serialize};

/// Body for `POST /players`. The caller's identity comes from the auth token, so only the display name is needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterPlayerRequest {
    pub display_name: String,
}

/// Body for `POST /matches`. An open match (no opponent yet) is created when `opponent_id` is omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMatchRequest {
    #[serde(default)]
    pub opponent_id: Option<String>,
}

/// Body for `POST /matches/{id}/score`. Scores are from the submitter's point of view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub me: i64,
    pub opponent: i64,
}

/// Body for `POST /challenges`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChallengeRequest {
    pub to_user: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Query parameters for `GET /challenges?box=inbox|outbox`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeBoxQuery {
    #[serde(rename = "box", default)]
    pub mailbox: Option<String>,
}

/// Query parameters for `GET /users/{id}/rank-history?range=1w|1m|1y|all`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRangeQuery {
    #[serde(default)]
    pub range: Option<String>,
}

/// Body for the admin-gated `POST /admin/token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub user_id: String,
    pub token: String,
}
