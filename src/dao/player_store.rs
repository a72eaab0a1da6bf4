use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::SystemTime,
};

use dashmap::DashMap;
use futures::{FutureExt, future::BoxFuture};

use crate::{
    dao::{models::PlayerEntity, storage::StorageResult},
    state::player::Player,
};

/// Durable score storage: a plain upsert keyed by player identity.
pub trait PlayerStore: Send + Sync {
    /// Insert or update `player`, assigning an id on first persistence.
    fn upsert(&self, player: Player) -> BoxFuture<'static, StorageResult<PlayerEntity>>;
    fn find(&self, id: u64) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
}

/// Process-local [`PlayerStore`]; records do not survive a restart.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPlayerStore {
    players: Arc<DashMap<u64, PlayerEntity>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryPlayerStore {
    /// Empty store; ids start at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether nothing was stored yet.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl PlayerStore for InMemoryPlayerStore {
    fn upsert(&self, player: Player) -> BoxFuture<'static, StorageResult<PlayerEntity>> {
        let id = player
            .id
            .unwrap_or_else(|| self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let entity = PlayerEntity {
            id,
            name: player.name().to_string(),
            score: player.score(),
            updated_at: SystemTime::now(),
        };
        self.players.insert(id, entity.clone());
        futures::future::ready(Ok(entity)).boxed()
    }

    fn find(&self, id: u64) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let found = self.players.get(&id).map(|entry| entry.value().clone());
        futures::future::ready(Ok(found)).boxed()
    }
}
