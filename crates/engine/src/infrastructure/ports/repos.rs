//! Repository port traits for game storage.

use async_trait::async_trait;
use questforge_domain::{Game, GameId};

use super::error::RepoError;

// =============================================================================
// Game Storage
// =============================================================================

/// Whole-aggregate storage for games.
///
/// A game is always loaded and saved as one unit, tree included. `save`
/// overwrites whatever was stored under the game's id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameRepo: Send + Sync {
    async fn get(&self, id: GameId) -> Result<Option<Game>, RepoError>;
    async fn save(&self, game: &Game) -> Result<(), RepoError>;
    async fn list_ids(&self) -> Result<Vec<GameId>, RepoError>;
}
