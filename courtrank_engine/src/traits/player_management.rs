use thiserror::Error;

use crate::db_types::{NewPlayer, Player};

/// Minimal player records. The engine only needs ids, display names, the current rating, and the two
/// settlement counters; everything else about a profile lives outside this service.
#[allow(async_fn_in_trait)]
pub trait PlayerManagement: Clone {
    /// Inserts the player, or updates the display name if the id already exists. New players start at the
    /// starting rating with zeroed counters.
    async fn upsert_player(&self, player: NewPlayer) -> Result<Player, PlayerApiError>;

    /// Fetches a player by id.
    async fn fetch_player(&self, user_id: &str) -> Result<Option<Player>, PlayerApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum PlayerApiError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("The requested player {0} does not exist")]
    PlayerNotFound(String),
}

impl From<sqlx::Error> for PlayerApiError {
    fn from(e: sqlx::Error) -> Self {
        PlayerApiError::DatabaseError(e.to_string())
    }
}
