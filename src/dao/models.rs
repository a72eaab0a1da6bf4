use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::state::player::Player;

/// Representation of a player as kept by the player store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Identity assigned on first persistence.
    pub id: u64,
    /// Display name at the time of the last upsert.
    pub name: String,
    /// Cumulative score.
    pub score: u32,
    /// Last time this player was written.
    pub updated_at: SystemTime,
}

impl From<&PlayerEntity> for Player {
    fn from(entity: &PlayerEntity) -> Self {
        Player::with_score(Some(entity.id), entity.name.clone(), i64::from(entity.score))
    }
}
