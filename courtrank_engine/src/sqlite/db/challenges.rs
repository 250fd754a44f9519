use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Challenge, ChallengeId, ChallengeStatus, NewChallenge},
    traits::ChallengeBox,
};

pub async fn insert_challenge(challenge: NewChallenge, conn: &mut SqliteConnection) -> Result<Challenge, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as(
        r#"
            INSERT INTO challenges (challenge_id, from_id, to_id, message, expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *;
        "#,
    )
    .bind(challenge.challenge_id)
    .bind(challenge.from_id)
    .bind(challenge.to_id)
    .bind(challenge.message)
    .bind(challenge.expires_at)
    .bind(now)
    .fetch_one(conn)
    .await
}

pub async fn fetch_challenge(id: &ChallengeId, conn: &mut SqliteConnection) -> Result<Option<Challenge>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM challenges WHERE challenge_id = $1").bind(id.as_str()).fetch_optional(conn).await
}

/// An existing pending challenge between the pair, in either direction.
pub async fn find_pending_between(
    a: &str,
    b: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Challenge>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM challenges WHERE status = 'Pending' \
         AND ((from_id = $1 AND to_id = $2) OR (from_id = $2 AND to_id = $1)) LIMIT 1",
    )
    .bind(a)
    .bind(b)
    .fetch_optional(conn)
    .await
}

pub async fn set_status(
    id: &ChallengeId,
    status: ChallengeStatus,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Challenge, sqlx::Error> {
    sqlx::query_as("UPDATE challenges SET status = $2, updated_at = $3 WHERE challenge_id = $1 RETURNING *")
        .bind(id.as_str())
        .bind(status)
        .bind(now)
        .fetch_one(conn)
        .await
}

/// Pending, unexpired challenges in the user's inbox or outbox, newest first.
pub async fn pending_for(
    user_id: &str,
    mailbox: ChallengeBox,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Challenge>, sqlx::Error> {
    let column = match mailbox {
        ChallengeBox::Inbox => "to_id",
        ChallengeBox::Outbox => "from_id",
    };
    let q = format!(
        "SELECT * FROM challenges WHERE {column} = $1 AND status = 'Pending' AND expires_at > $2 \
         ORDER BY created_at DESC"
    );
    sqlx::query_as(&q).bind(user_id).bind(now).fetch_all(conn).await
}

/// Marks pending challenges past their expiry as `Expired`. Returns the number of rows changed.
pub async fn expire_stale(now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE challenges SET status = 'Expired', updated_at = $1 WHERE status = 'Pending' AND expires_at < $1",
    )
    .bind(now)
    .execute(conn)
    .await?;
    let n = result.rows_affected();
    if n > 0 {
        debug!("🗃️ {n} stale challenges expired");
    }
    Ok(n)
}
