use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::Invite;

pub async fn insert_invite(
    created_by: &str,
    token: &str,
    expires_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Invite, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as(
        r#"
            INSERT INTO invites (token, created_by, expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING *;
        "#,
    )
    .bind(token)
    .bind(created_by)
    .bind(expires_at)
    .bind(now)
    .fetch_one(conn)
    .await
}

pub async fn fetch_invite(token: &str, conn: &mut SqliteConnection) -> Result<Option<Invite>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM invites WHERE token = $1").bind(token).fetch_optional(conn).await
}

/// Marks the invite redeemed. The `status = 'Open'` predicate means a token can only ever be redeemed once.
pub async fn mark_redeemed(
    token: &str,
    redeemed_by: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Invite>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE invites SET status = 'Redeemed', redeemed_by = $2, updated_at = $3 \
         WHERE token = $1 AND status = 'Open' RETURNING *",
    )
    .bind(token)
    .bind(redeemed_by)
    .bind(now)
    .fetch_optional(conn)
    .await
}

/// Marks open invites past their expiry as `Expired`. Returns the number of rows changed.
pub async fn expire_stale(now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("UPDATE invites SET status = 'Expired', updated_at = $1 WHERE status = 'Open' AND expires_at < $1")
            .bind(now)
            .execute(conn)
            .await?;
    let n = result.rows_affected();
    if n > 0 {
        debug!("🗃️ {n} stale invites expired");
    }
    Ok(n)
}
