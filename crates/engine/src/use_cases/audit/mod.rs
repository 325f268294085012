//! Store audit.
//!
//! Loads every stored game and re-checks its tree. A game that fails to load
//! (bad JSON, or a tree that breaks an invariant) is reported, not fatal.

use std::sync::Arc;

use questforge_domain::GameId;

use crate::infrastructure::ports::{GameRepo, RepoError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditFailure {
    pub game_id: GameId,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    /// Games that loaded and verified.
    pub verified: usize,
    /// Games with no tree yet.
    pub empty: usize,
    /// Nodes across all verified games.
    pub nodes: usize,
    pub failures: Vec<AuditFailure>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct AuditGames {
    games: Arc<dyn GameRepo>,
}

impl AuditGames {
    pub fn new(games: Arc<dyn GameRepo>) -> Self {
        Self { games }
    }

    /// Check every game in the store.
    ///
    /// # Errors
    ///
    /// Only when the store cannot list its games. Per-game problems land in
    /// [`AuditReport::failures`].
    pub async fn execute(&self) -> Result<AuditReport, RepoError> {
        let mut report = AuditReport::default();

        for game_id in self.games.list_ids().await? {
            let game = match self.games.get(game_id).await {
                Ok(Some(game)) => game,
                // Removed between listing and loading.
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(game_id = %game_id, error = %e, "Game failed to load");
                    report.failures.push(AuditFailure {
                        game_id,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let Some(tree) = game.tree() else {
                report.empty += 1;
                continue;
            };

            match tree.verify() {
                Ok(()) => {
                    report.verified += 1;
                    report.nodes += tree.len();
                    tracing::debug!(game_id = %game_id, nodes = tree.len(), flags = tree.flags().count(), "Game verified");
                }
                Err(e) => {
                    tracing::warn!(game_id = %game_id, error = %e, "Game failed verification");
                    report.failures.push(AuditFailure {
                        game_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockGameRepo;
    use chrono::Utc;
    use questforge_domain::{Actor, Game, NewGameNode, UserId, ROOT_PARENT_ID};

    fn game(with_root: bool) -> Game {
        let author = Actor::user(UserId::new());
        let mut game = Game::new(author.user_id, Utc::now());
        if with_root {
            game.add_node(
                NewGameNode::room("R", ROOT_PARENT_ID, "n", "d"),
                &author,
                Utc::now(),
            )
            .unwrap();
            game.add_node(NewGameNode::flag("F", "R", "f"), &author, Utc::now())
                .unwrap();
        }
        game
    }

    #[tokio::test]
    async fn reports_verified_empty_and_failed_games() {
        let full = game(true);
        let empty = game(false);
        let broken = GameId::new();
        let gone = GameId::new();
        let (full_id, empty_id) = (full.id(), empty.id());

        let mut repo = MockGameRepo::new();
        repo.expect_list_ids()
            .returning(move || Ok(vec![full_id, empty_id, broken, gone]));
        repo.expect_get().returning(move |id| {
            if id == full_id {
                Ok(Some(full.clone()))
            } else if id == empty_id {
                Ok(Some(empty.clone()))
            } else if id == broken {
                Err(RepoError::serialization("The flag ghost does not exist"))
            } else {
                Ok(None)
            }
        });

        let report = AuditGames::new(Arc::new(repo)).execute().await.unwrap();

        assert_eq!(report.verified, 1);
        assert_eq!(report.empty, 1);
        assert_eq!(report.nodes, 2);
        assert!(!report.is_clean());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].game_id, broken);
        assert!(report.failures[0].error.contains("ghost"));
    }

    #[tokio::test]
    async fn listing_failure_is_an_error() {
        let mut repo = MockGameRepo::new();
        repo.expect_list_ids()
            .returning(|| Err(RepoError::storage("list games", "permission denied")));
        repo.expect_get().never();

        let result = AuditGames::new(Arc::new(repo)).execute().await;
        assert!(matches!(result, Err(RepoError::Storage { .. })));
    }
}
