use std::fmt::Debug;

use crate::{
    db_types::{NewPlayer, Player},
    traits::{PlayerApiError, PlayerManagement},
};

/// The minimal player-record API: registration (upsert) and lookup.
pub struct PlayerApi<B> {
    db: B,
}

impl<B> Debug for PlayerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PlayerApi")
    }
}

impl<B> PlayerApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> PlayerApi<B>
where B: PlayerManagement
{
    pub async fn upsert_player(&self, player: NewPlayer) -> Result<Player, PlayerApiError> {
        self.db.upsert_player(player).await
    }

    pub async fn fetch_player(&self, user_id: &str) -> Result<Option<Player>, PlayerApiError> {
        self.db.fetch_player(user_id).await
    }
}
