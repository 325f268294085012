//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    clock::SystemClock,
    config::{EngineConfig, StoreKind},
    persistence::{InMemoryGameRepo, JsonFileGameRepo},
    ports::{ClockPort, GameRepo, RepoError},
};
use crate::use_cases::{AuditGames, GameNodeOps};

/// Main application state.
///
/// Holds the game store and the use cases built on it.
pub struct App {
    pub games: Arc<dyn GameRepo>,
    pub use_cases: UseCases,
}

/// Container for all use cases.
pub struct UseCases {
    pub game_nodes: Arc<GameNodeOps>,
    pub audit: Arc<AuditGames>,
}

impl App {
    pub fn new(games: Arc<dyn GameRepo>, clock: Arc<dyn ClockPort>) -> Self {
        let use_cases = UseCases {
            game_nodes: Arc::new(GameNodeOps::new(games.clone(), clock)),
            audit: Arc::new(AuditGames::new(games.clone())),
        };

        Self { games, use_cases }
    }

    /// Open the configured store and wire the use cases to it.
    pub async fn from_config(config: &EngineConfig) -> Result<Self, RepoError> {
        let games: Arc<dyn GameRepo> = match config.store {
            StoreKind::File => Arc::new(JsonFileGameRepo::open(&config.data_dir).await?),
            StoreKind::Memory => Arc::new(InMemoryGameRepo::new()),
        };

        Ok(Self::new(games, Arc::new(SystemClock::new())))
    }
}
