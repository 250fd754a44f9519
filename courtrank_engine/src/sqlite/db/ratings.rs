use chrono::{DateTime, Utc};
use cr_common::Rating;
use sqlx::{Row, SqliteConnection};

use crate::db_types::{HistoryKind, MatchId, RankHistoryEntry};

/// The `Forward` history entries for a match. Their presence is the idempotence marker for rating application.
pub async fn forward_entries(
    match_id: &MatchId,
    conn: &mut SqliteConnection,
) -> Result<Vec<RankHistoryEntry>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM rank_history WHERE match_id = $1 AND kind = 'Forward' ORDER BY id ASC")
        .bind(match_id.as_str())
        .fetch_all(conn)
        .await
}

pub async fn reversal_exists(match_id: &MatchId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT 1 FROM rank_history WHERE match_id = $1 AND kind = 'Reversal' LIMIT 1")
        .bind(match_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(row.is_some())
}

pub async fn insert_entry(
    user_id: &str,
    match_id: &MatchId,
    kind: HistoryKind,
    rating_before: Rating,
    rating_after: Rating,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<RankHistoryEntry, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO rank_history (user_id, match_id, kind, rating_before, rating_after, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(match_id.as_str())
    .bind(kind)
    .bind(rating_before)
    .bind(rating_after)
    .bind(now)
    .fetch_one(conn)
    .await
}

/// The user's history, oldest first. `since` bounds the window; `None` returns everything.
/// Capped at 500 entries, which comfortably covers a year of play.
pub async fn history_for(
    user_id: &str,
    since: Option<DateTime<Utc>>,
    conn: &mut SqliteConnection,
) -> Result<Vec<RankHistoryEntry>, sqlx::Error> {
    match since {
        Some(since) => {
            sqlx::query_as(
                "SELECT * FROM rank_history WHERE user_id = $1 AND created_at > $2 ORDER BY created_at ASC LIMIT 500",
            )
            .bind(user_id)
            .bind(since)
            .fetch_all(conn)
            .await
        },
        None => {
            sqlx::query_as("SELECT * FROM rank_history WHERE user_id = $1 ORDER BY created_at ASC LIMIT 500")
                .bind(user_id)
                .fetch_all(conn)
                .await
        },
    }
}

/// Counts the user's submitted results and how many of those were contested, within the window starting at
/// `since`. Always computed from the matches table; reputation is never cached.
pub async fn reputation_counts(
    user_id: &str,
    since: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(i64, i64), sqlx::Error> {
    let row = sqlx::query(
        r#"
            SELECT COUNT(*) AS posted,
                   COALESCE(SUM(CASE WHEN contested_by IS NOT NULL THEN 1 ELSE 0 END), 0) AS contested
            FROM matches
            WHERE submitted_by = $1 AND submitted_at >= $2;
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_one(conn)
    .await?;
    Ok((row.try_get("posted")?, row.try_get("contested")?))
}
