use chrono::{DateTime, Utc};
use log::debug;
use sqlx::{FromRow, Row, SqliteConnection};

use crate::{
    db_types::{Match, MatchId, NewMatch},
    traits::{MatchFlowError, PendingConfirmation},
};

/// Inserts a new match in `Waiting` status using the given connection. This is not atomic. You can embed this
/// call inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_match(new_match: NewMatch, conn: &mut SqliteConnection) -> Result<Match, sqlx::Error> {
    let now = Utc::now();
    let match_record = sqlx::query_as(
        r#"
            INSERT INTO matches (match_id, creator_id, opponent_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING *;
        "#,
    )
    .bind(new_match.match_id)
    .bind(new_match.creator_id)
    .bind(new_match.opponent_id)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(match_record)
}

pub async fn fetch_match(match_id: &MatchId, conn: &mut SqliteConnection) -> Result<Option<Match>, sqlx::Error> {
    let match_record =
        sqlx::query_as("SELECT * FROM matches WHERE match_id = $1").bind(match_id.as_str()).fetch_optional(conn).await?;
    Ok(match_record)
}

/// Marks the given side as having pressed start. Idempotent per side.
pub async fn set_started(
    match_id: &MatchId,
    creator_side: bool,
    conn: &mut SqliteConnection,
) -> Result<Match, sqlx::Error> {
    let column = if creator_side { "started_by_creator" } else { "started_by_opponent" };
    let q = format!("UPDATE matches SET {column} = 1, updated_at = $2 WHERE match_id = $1 RETURNING *");
    sqlx::query_as(&q).bind(match_id.as_str()).bind(Utc::now()).fetch_one(conn).await
}

/// Moves the match to `Live` and sets the clock. The `timer_start IS NULL` predicate makes sure the clock is
/// only ever set once.
pub async fn set_live(match_id: &MatchId, now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<Match, sqlx::Error> {
    sqlx::query_as(
        "UPDATE matches SET status = 'Live', timer_start = $2, updated_at = $2 \
         WHERE match_id = $1 AND timer_start IS NULL RETURNING *",
    )
    .bind(match_id.as_str())
    .bind(now)
    .fetch_one(conn)
    .await
}

/// Writes the score and the submission stamp, and moves the match to `Ended`. The caller has already verified
/// that no score exists; the `submitted_by IS NULL` predicate backstops that check so the first write wins.
#[allow(clippy::too_many_arguments)]
pub async fn write_score(
    match_id: &MatchId,
    submitter: &str,
    score_creator: i64,
    score_opponent: i64,
    now: DateTime<Utc>,
    deadline: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Match>, sqlx::Error> {
    let match_record = sqlx::query_as(
        r#"
            UPDATE matches
            SET status = 'Ended',
                score_creator = $3,
                score_opponent = $4,
                submitted_by = $2,
                submitted_at = $5,
                deadline_at = $6,
                updated_at = $5
            WHERE match_id = $1 AND submitted_by IS NULL
            RETURNING *;
        "#,
    )
    .bind(match_id.as_str())
    .bind(submitter)
    .bind(score_creator)
    .bind(score_opponent)
    .bind(now)
    .bind(deadline)
    .fetch_optional(conn)
    .await?;
    Ok(match_record)
}

/// Settles by confirmation. The `finalized = 0` predicate means exactly one settlement path can ever commit.
pub async fn settle_confirm(
    match_id: &MatchId,
    user_id: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Match>, sqlx::Error> {
    let match_record = sqlx::query_as(
        "UPDATE matches SET confirmed_by = $2, finalized = 1, updated_at = $3 \
         WHERE match_id = $1 AND finalized = 0 RETURNING *",
    )
    .bind(match_id.as_str())
    .bind(user_id)
    .bind(now)
    .fetch_optional(conn)
    .await?;
    Ok(match_record)
}

/// Settles by contest. See [`settle_confirm`] for the exclusivity predicate.
pub async fn settle_contest(
    match_id: &MatchId,
    user_id: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Match>, sqlx::Error> {
    let match_record = sqlx::query_as(
        "UPDATE matches SET contested_by = $2, finalized = 1, updated_at = $3 \
         WHERE match_id = $1 AND finalized = 0 RETURNING *",
    )
    .bind(match_id.as_str())
    .bind(user_id)
    .bind(now)
    .fetch_optional(conn)
    .await?;
    Ok(match_record)
}

/// Finalizes every submitted, unsettled match whose deadline has passed, stamping `auto_accepted_at`.
/// Matches settled since their deadline fail the `finalized = 0` predicate and are skipped, so re-running the
/// sweep is a no-op.
pub async fn auto_accept_overdue(now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<Vec<Match>, sqlx::Error> {
    let matches: Vec<Match> = sqlx::query_as(
        r#"
            UPDATE matches
            SET finalized = 1, auto_accepted_at = $1, updated_at = $1
            WHERE finalized = 0 AND submitted_by IS NOT NULL AND deadline_at IS NOT NULL AND deadline_at < $1
            RETURNING *;
        "#,
    )
    .bind(now)
    .fetch_all(conn)
    .await?;
    if !matches.is_empty() {
        debug!("🗃️ {} overdue matches auto-accepted", matches.len());
    }
    Ok(matches)
}

/// Records whether a rating delta has been applied for this match.
pub async fn set_rating_applied(
    match_id: &MatchId,
    applied: bool,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE matches SET provisional_rating_applied = $2, updated_at = $3 WHERE match_id = $1")
        .bind(match_id.as_str())
        .bind(applied)
        .bind(now)
        .execute(conn)
        .await?;
    Ok(())
}

/// Submitted, unsettled results where `user_id` is the non-submitting participant, newest first. The
/// submitter's display name is resolved in the same query.
pub async fn pending_confirmations_for(
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<PendingConfirmation>, MatchFlowError> {
    let rows = sqlx::query(
        r#"
            SELECT m.*, u.display_name AS submitter_name
            FROM matches m
            JOIN users u ON u.id = m.submitted_by
            WHERE m.finalized = 0
              AND m.submitted_by IS NOT NULL
              AND m.submitted_by <> $1
              AND (m.creator_id = $1 OR m.opponent_id = $1)
            ORDER BY m.submitted_at DESC;
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    rows.iter()
        .map(|row| {
            let match_record = Match::from_row(row)?;
            let submitter_name = row.try_get("submitter_name")?;
            Ok(PendingConfirmation { match_record, submitter_name })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()
        .map_err(MatchFlowError::from)
}
