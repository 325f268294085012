//! Game node operations.
//!
//! Every mutation is one load -> mutate -> save cycle on the whole game. A
//! rejected mutation never reaches `save`, so the stored game is unchanged.

mod error;

use std::sync::Arc;

use questforge_domain::{
    Actor, Game, GameError, GameId, GameNodeEdit, NewGameNode, NodeTreeUpdate,
};

use crate::infrastructure::ports::{ClockPort, GameRepo};

pub use error::{ErrorKind, GameNodeError};

pub struct GameNodeOps {
    games: Arc<dyn GameRepo>,
    clock: Arc<dyn ClockPort>,
}

impl GameNodeOps {
    pub fn new(games: Arc<dyn GameRepo>, clock: Arc<dyn ClockPort>) -> Self {
        Self { games, clock }
    }

    /// Create an empty game authored by `author`.
    pub async fn create_game(&self, author: &Actor) -> Result<Game, GameNodeError> {
        let game = Game::new(author.user_id, self.clock.now());
        self.games.save(&game).await?;

        tracing::info!(game_id = %game.id(), author_id = %author.user_id, "Game created");
        Ok(game)
    }

    pub async fn get_game(&self, game_id: GameId) -> Result<Game, GameNodeError> {
        self.games
            .get(game_id)
            .await?
            .ok_or(GameNodeError::GameNotFound(game_id))
    }

    /// Add a node to a game. The first node of a game becomes its root.
    pub async fn create_node(
        &self,
        game_id: GameId,
        node: NewGameNode,
        actor: &Actor,
    ) -> Result<NodeTreeUpdate, GameNodeError> {
        let mut game = self.get_game(game_id).await?;
        let node_id = node.id.clone();

        let outcome = game.add_node(node, actor, self.clock.now());
        self.commit(game, outcome, "create", &node_id).await
    }

    pub async fn edit_node(
        &self,
        game_id: GameId,
        node_id: &str,
        edit: GameNodeEdit,
        actor: &Actor,
    ) -> Result<NodeTreeUpdate, GameNodeError> {
        let mut game = self.get_game(game_id).await?;

        let outcome = game.edit_node(node_id, edit, actor, self.clock.now());
        self.commit(game, outcome, "edit", node_id).await
    }

    /// Delete a node, its subtree, and any Conditions left pointing at a
    /// removed Flag.
    pub async fn delete_node(
        &self,
        game_id: GameId,
        node_id: &str,
        actor: &Actor,
    ) -> Result<NodeTreeUpdate, GameNodeError> {
        let mut game = self.get_game(game_id).await?;

        let outcome = game.delete_node(node_id, actor, self.clock.now());
        self.commit(game, outcome, "delete", node_id).await
    }

    async fn commit(
        &self,
        game: Game,
        outcome: Result<NodeTreeUpdate, GameError>,
        operation: &'static str,
        node_id: &str,
    ) -> Result<NodeTreeUpdate, GameNodeError> {
        let update = match outcome {
            Ok(update) => update,
            Err(e) => {
                if matches!(e, GameError::ForbiddenManipulation(_)) {
                    tracing::warn!(game_id = %game.id(), node_id, operation, error = %e, "Node mutation forbidden");
                } else {
                    tracing::debug!(game_id = %game.id(), node_id, operation, error = %e, "Node mutation rejected");
                }
                return Err(e.into());
            }
        };

        self.games.save(&game).await?;

        if let NodeTreeUpdate::NodeDeleted {
            removed,
            cascaded_conditions,
            ..
        } = &update
        {
            tracing::info!(
                game_id = %game.id(),
                node_id,
                removed = removed.len(),
                cascaded = cascaded_conditions.len(),
                "Node deleted"
            );
        } else {
            tracing::info!(game_id = %game.id(), node_id, event = update.event_type(), "Node {operation} applied");
        }

        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::ports::{MockClockPort, MockGameRepo, RepoError};
    use chrono::{TimeZone, Utc};
    use questforge_domain::{FlagState, NodeId, UserId, ROOT_PARENT_ID};

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()))
    }

    fn author() -> Actor {
        Actor::user(UserId::new())
    }

    fn game_with_root(author: &Actor) -> Game {
        let mut game = Game::new(author.user_id, Utc::now());
        game.add_node(
            NewGameNode::room("R", ROOT_PARENT_ID, "Gate", "A gate"),
            author,
            Utc::now(),
        )
        .unwrap();
        game
    }

    fn repo_returning(game: Game) -> MockGameRepo {
        let game_id = game.id();
        let mut repo = MockGameRepo::new();
        repo.expect_get()
            .withf(move |id| *id == game_id)
            .returning(move |_| Ok(Some(game.clone())));
        repo
    }

    #[tokio::test]
    async fn create_game_saves_empty_game() {
        let author = author();
        let mut repo = MockGameRepo::new();
        let user_id = author.user_id;
        repo.expect_save()
            .withf(move |g: &Game| g.author_id() == user_id && g.tree().is_none())
            .times(1)
            .returning(|_| Ok(()));

        let now = Utc.with_ymd_and_hms(2024, 6, 2, 9, 30, 0).unwrap();
        let mut clock = MockClockPort::new();
        clock.expect_now().times(1).returning(move || now);

        let ops = GameNodeOps::new(Arc::new(repo), Arc::new(clock));
        let game = ops.create_game(&author).await.unwrap();

        assert_eq!(game.author_id(), author.user_id);
        assert_eq!(game.created_at(), now);
        assert_eq!(game.updated_at(), now);
    }

    #[tokio::test]
    async fn when_game_missing_returns_not_found() {
        let mut repo = MockGameRepo::new();
        repo.expect_get().returning(|_| Ok(None));
        repo.expect_save().never();

        let ops = GameNodeOps::new(Arc::new(repo), clock());
        let err = ops
            .create_node(
                GameId::new(),
                NewGameNode::room("R", ROOT_PARENT_ID, "n", "d"),
                &author(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, GameNodeError::GameNotFound(_)));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn create_root_saves_game() {
        let author = author();
        let game = Game::new(author.user_id, Utc::now());
        let mut repo = repo_returning(game.clone());
        repo.expect_save()
            .withf(|g: &Game| g.root_node().is_some_and(|root| root.id().as_str() == "R"))
            .times(1)
            .returning(|_| Ok(()));

        let ops = GameNodeOps::new(Arc::new(repo), clock());
        let update = ops
            .create_node(
                game.id(),
                NewGameNode::room("R", ROOT_PARENT_ID, "n", "d"),
                &author,
            )
            .await
            .unwrap();

        assert_eq!(
            update,
            NodeTreeUpdate::RootCreated {
                id: NodeId::new("R").unwrap()
            }
        );
    }

    #[tokio::test]
    async fn saved_game_carries_clock_time() {
        let author = author();
        let game = game_with_root(&author);
        let expected = clock().0;
        let mut repo = repo_returning(game.clone());
        repo.expect_save()
            .withf(move |g: &Game| g.updated_at() == expected && g.find_node("C").is_some())
            .times(1)
            .returning(|_| Ok(()));

        let ops = GameNodeOps::new(Arc::new(repo), clock());
        ops.create_node(game.id(), NewGameNode::choice("C", "R", "Go"), &author)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rejected_mutations_are_not_saved() {
        let author = author();
        let game = game_with_root(&author);
        let mut repo = repo_returning(game.clone());
        repo.expect_save().never();

        let ops = GameNodeOps::new(Arc::new(repo), clock());

        let err = ops
            .create_node(game.id(), NewGameNode::choice("R", "R", "dup"), &author)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        let err = ops
            .create_node(
                game.id(),
                NewGameNode::condition("K", "R", "missing", FlagState::Active),
                &author,
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        let err = ops
            .edit_node(game.id(), "ghost", GameNodeEdit::name("x"), &author)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = ops.delete_node(game.id(), "R", &author).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let stranger = Actor::user(UserId::new());
        let err = ops
            .create_node(game.id(), NewGameNode::choice("C", "R", "Go"), &stranger)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn edit_on_empty_game_is_bad_request() {
        let author = author();
        let game = Game::new(author.user_id, Utc::now());
        let mut repo = repo_returning(game.clone());
        repo.expect_save().never();

        let ops = GameNodeOps::new(Arc::new(repo), clock());
        let err = ops
            .edit_node(game.id(), "R", GameNodeEdit::name("x"), &author)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GameNodeError::Game(GameError::RootNodeNotExists)
        ));
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn edit_node_saves_new_fields() {
        let author = author();
        let game = game_with_root(&author);
        let mut repo = repo_returning(game.clone());
        repo.expect_save()
            .withf(|g: &Game| {
                g.root_node()
                    .is_some_and(|root| root.name() == Some("Hall") && root.description() == Some("Dusty"))
            })
            .times(1)
            .returning(|_| Ok(()));

        let ops = GameNodeOps::new(Arc::new(repo), clock());
        let update = ops
            .edit_node(game.id(), "R", GameNodeEdit::room(" Hall ", "Dusty"), &author)
            .await
            .unwrap();

        assert!(matches!(update, NodeTreeUpdate::NodeEdited { .. }));
    }

    #[tokio::test]
    async fn delete_flag_cascades_and_saves() {
        let author = author();
        let mut game = game_with_root(&author);
        for node in [
            NewGameNode::flag("F", "R", "Lit"),
            NewGameNode::choice("C", "R", "Go"),
            NewGameNode::condition("K", "C", "F", FlagState::NotActive),
        ] {
            game.add_node(node, &author, Utc::now()).unwrap();
        }

        let mut repo = repo_returning(game.clone());
        repo.expect_save()
            .withf(|g: &Game| g.find_node("F").is_none() && g.find_node("K").is_none())
            .times(1)
            .returning(|_| Ok(()));

        let ops = GameNodeOps::new(Arc::new(repo), clock());
        let update = ops.delete_node(game.id(), "F", &author).await.unwrap();

        match update {
            NodeTreeUpdate::NodeDeleted {
                cascaded_conditions,
                ..
            } => assert_eq!(cascaded_conditions, vec![NodeId::new("K").unwrap()]),
            other => panic!("unexpected update: {other:?}"),
        }
    }

    #[tokio::test]
    async fn save_failure_is_internal() {
        let author = author();
        let game = game_with_root(&author);
        let mut repo = repo_returning(game.clone());
        repo.expect_save()
            .returning(|_| Err(RepoError::storage("write game", "disk full")));

        let ops = GameNodeOps::new(Arc::new(repo), clock());
        let err = ops
            .create_node(game.id(), NewGameNode::choice("C", "R", "Go"), &author)
            .await
            .unwrap_err();

        assert!(matches!(err, GameNodeError::Repo(_)));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
