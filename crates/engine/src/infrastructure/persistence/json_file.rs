//! JSON file game store.
//!
//! Layout: `<data_dir>/<game_id>.json`, one pretty-printed document per game.
//! A save writes a uniquely named temp file in the same directory and renames
//! it over the target, so readers see either the old or the new document.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use questforge_domain::{Game, GameId};
use uuid::Uuid;

use crate::infrastructure::ports::{GameRepo, RepoError};

const EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct JsonFileGameRepo {
    dir: PathBuf,
}

impl JsonFileGameRepo {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, RepoError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| RepoError::storage("create data dir", e))?;
        Ok(Self { dir })
    }

    fn path_for(&self, id: GameId) -> PathBuf {
        self.dir.join(format!("{id}.{EXTENSION}"))
    }
}

#[async_trait]
impl GameRepo for JsonFileGameRepo {
    async fn get(&self, id: GameId) -> Result<Option<Game>, RepoError> {
        let bytes = match tokio::fs::read(self.path_for(id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RepoError::storage("read game", e)),
        };

        // Deserializing a tree re-runs every tree invariant check.
        let game = serde_json::from_slice(&bytes)
            .map_err(|e| RepoError::serialization(format!("game {id}: {e}")))?;
        Ok(Some(game))
    }

    async fn save(&self, game: &Game) -> Result<(), RepoError> {
        let bytes = serde_json::to_vec_pretty(game).map_err(RepoError::serialization)?;

        let target = self.path_for(game.id());
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", game.id(), Uuid::new_v4().simple()));

        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| RepoError::storage("write game", e))?;

        if let Err(e) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(RepoError::storage("rename game", e));
        }

        tracing::debug!(game_id = %game.id(), path = %target.display(), "Saved game");
        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<GameId>, RepoError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| RepoError::storage("list games", e))?;

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RepoError::storage("list games", e))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            match Uuid::parse_str(stem) {
                Ok(uuid) => ids.push(GameId::from_uuid(uuid)),
                Err(_) => {
                    tracing::warn!(path = %path.display(), "Skipping file with non-uuid name");
                }
            }
        }

        ids.sort_by_key(|id| id.to_uuid());
        Ok(ids)
    }
}
