//! In-memory game store.

use async_trait::async_trait;
use dashmap::DashMap;
use questforge_domain::{Game, GameId};

use crate::infrastructure::ports::{GameRepo, RepoError};

/// Process-local store keyed by game id.
///
/// `get` hands out clones, so a caller mutating a loaded game never touches
/// the stored copy until it calls `save`.
#[derive(Debug, Default)]
pub struct InMemoryGameRepo {
    games: DashMap<GameId, Game>,
}

impl InMemoryGameRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameRepo for InMemoryGameRepo {
    async fn get(&self, id: GameId) -> Result<Option<Game>, RepoError> {
        Ok(self.games.get(&id).map(|entry| entry.value().clone()))
    }

    async fn save(&self, game: &Game) -> Result<(), RepoError> {
        self.games.insert(game.id(), game.clone());
        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<GameId>, RepoError> {
        Ok(self.games.iter().map(|entry| *entry.key()).collect())
    }
}
