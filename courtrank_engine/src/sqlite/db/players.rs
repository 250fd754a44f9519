use chrono::{DateTime, Utc};
use cr_common::{Rating, STARTING_RATING};
use sqlx::SqliteConnection;

use crate::db_types::{NewPlayer, Player};

/// Inserts the player, or refreshes the display name if the id already exists. New players start at the
/// starting rating with zeroed counters.
pub async fn upsert_player(player: NewPlayer, conn: &mut SqliteConnection) -> Result<Player, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as(
        r#"
            INSERT INTO users (id, display_name, rating, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ON CONFLICT (id) DO UPDATE SET display_name = excluded.display_name, updated_at = excluded.updated_at
            RETURNING *;
        "#,
    )
    .bind(player.id)
    .bind(player.display_name)
    .bind(STARTING_RATING)
    .bind(now)
    .fetch_one(conn)
    .await
}

pub async fn fetch_player(user_id: &str, conn: &mut SqliteConnection) -> Result<Option<Player>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await
}

pub async fn set_rating(
    user_id: &str,
    rating: Rating,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET rating = $2, updated_at = $3 WHERE id = $1")
        .bind(user_id)
        .bind(rating)
        .bind(now)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn incr_games_played(user_id: &str, now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET games_played = games_played + 1, updated_at = $2 WHERE id = $1")
        .bind(user_id)
        .bind(now)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn incr_games_contested(
    user_id: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET games_contested = games_contested + 1, updated_at = $2 WHERE id = $1")
        .bind(user_id)
        .bind(now)
        .execute(conn)
        .await?;
    Ok(())
}
