//! Game aggregate - owner of a game's node tree
//!
//! # Rustic DDD Design
//!
//! - **Private fields**: the tree is only reachable through `add_node`,
//!   `edit_node` and `delete_node`
//! - **Authorization first**: every mutation checks the acting user before
//!   touching the tree
//! - **Narrow error surface**: tree errors are folded into [`GameError`]
//!
//! A new game has no tree. The first node added must be the root: a Room
//! whose parent id is [`ROOT_PARENT_ID`]. After that, every call is handed
//! to [`NodeTree`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::game_node::{GameNode, GameNodeEdit, NewGameNode, NodeType};
use super::node_tree::NodeTree;
use crate::error::{ForbiddenReason, GameError, NodeTreeError};
use crate::events::NodeTreeUpdate;
use crate::ids::{GameId, NodeId, UserId, ROOT_PARENT_ID};
use crate::value_objects::Actor;

/// A text-adventure game as seen by the authoring tools.
///
/// # Invariants
///
/// - The tree, once present, satisfies every [`NodeTree`] invariant
/// - Only the author or an admin can change the tree
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use questforge_domain::{Actor, Game, NewGameNode, UserId};
///
/// let author = Actor::user(UserId::new());
/// let mut game = Game::new(author.user_id, Utc::now());
///
/// game.add_node(NewGameNode::room("start", "###", "Gate", "A rusty gate"), &author, Utc::now())
///     .unwrap();
/// game.add_node(NewGameNode::choice("enter", "start", "Enter"), &author, Utc::now())
///     .unwrap();
///
/// assert_eq!(game.find_node("enter").unwrap().name(), Some("Enter"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    id: GameId,
    author_id: UserId,
    #[serde(rename = "nodes", default, skip_serializing_if = "Option::is_none")]
    tree: Option<NodeTree>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Game {
    // =========================================================================
    // Constructor
    // =========================================================================

    pub fn new(author_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: GameId::new(),
            author_id,
            tree: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the game's ID (used when loading from storage).
    pub fn with_id(mut self, id: GameId) -> Self {
        self.id = id;
        self
    }

    /// Set the game's tree (used when loading from storage).
    pub fn with_tree(mut self, tree: NodeTree) -> Self {
        self.tree = Some(tree);
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> GameId {
        self.id
    }

    #[inline]
    pub fn author_id(&self) -> UserId {
        self.author_id
    }

    #[inline]
    pub fn tree(&self) -> Option<&NodeTree> {
        self.tree.as_ref()
    }

    pub fn root_node(&self) -> Option<&GameNode> {
        self.tree.as_ref().map(NodeTree::root)
    }

    pub fn find_node(&self, id: &str) -> Option<&GameNode> {
        self.tree.as_ref().and_then(|tree| tree.find(id))
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[inline]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// The author and admins may modify a game.
    pub fn can_be_modified_by(&self, actor: &Actor) -> bool {
        actor.user_id == self.author_id || actor.is_admin
    }

    // =========================================================================
    // Node Mutations
    // =========================================================================

    /// Add a node, creating the root if the game has none yet.
    ///
    /// # Errors
    ///
    /// - `ForbiddenManipulation` - the actor may not modify this game
    /// - `NotRootNode` - no root yet and the parent id is not `"###"`
    /// - `IllegalRootNodeType` - no root yet and the node is not a Room
    /// - `NodeVerification` - any rule of [`NodeTree::insert`], or invalid
    ///   root fields
    pub fn add_node(
        &mut self,
        node: NewGameNode,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<NodeTreeUpdate, GameError> {
        self.ensure_can_modify(actor)?;

        let update = match self.tree.as_mut() {
            Some(tree) => tree.insert(node).map_err(GameError::NodeVerification)?,
            None => {
                let tree = Self::plant(&node)?;
                let id = tree.root().id().clone();
                self.tree = Some(tree);
                NodeTreeUpdate::RootCreated { id }
            }
        };

        self.updated_at = now;
        Ok(update)
    }

    /// Edit a node's fields.
    ///
    /// # Errors
    ///
    /// - `ForbiddenManipulation` - the actor may not modify this game
    /// - `RootNodeNotExists` - the game has no tree yet
    /// - `NodeNotFound` - no node has this id
    /// - `NodeVerification` - any other rule of [`NodeTree::update`]
    pub fn edit_node(
        &mut self,
        node_id: &str,
        edit: GameNodeEdit,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<NodeTreeUpdate, GameError> {
        self.ensure_can_modify(actor)?;
        let tree = self.tree.as_mut().ok_or(GameError::RootNodeNotExists)?;

        let update = tree.update(node_id, edit).map_err(|e| match e {
            NodeTreeError::NodeNotFound { id } => GameError::NodeNotFound { id },
            other => GameError::NodeVerification(other),
        })?;

        self.updated_at = now;
        Ok(update)
    }

    /// Delete a node and its subtree.
    ///
    /// # Errors
    ///
    /// - `ForbiddenManipulation` - the actor may not modify this game, or the
    ///   node is the root
    /// - `RootNodeNotExists` - the game has no tree yet
    /// - `NodeNotFound` - no node has this id
    pub fn delete_node(
        &mut self,
        node_id: &str,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<NodeTreeUpdate, GameError> {
        self.ensure_can_modify(actor)?;
        let tree = self.tree.as_mut().ok_or(GameError::RootNodeNotExists)?;

        let update = tree.delete(node_id).map_err(|e| match e {
            NodeTreeError::NodeNotFound { id } => GameError::NodeNotFound { id },
            NodeTreeError::RootNodeDeleting { id } => {
                GameError::ForbiddenManipulation(ForbiddenReason::RootNodeDeleting { node_id: id })
            }
            other => GameError::NodeVerification(other),
        })?;

        self.updated_at = now;
        Ok(update)
    }

    fn ensure_can_modify(&self, actor: &Actor) -> Result<(), GameError> {
        if self.can_be_modified_by(actor) {
            Ok(())
        } else {
            Err(GameError::forbidden_for(actor.user_id))
        }
    }

    /// Build the tree from its first node.
    fn plant(node: &NewGameNode) -> Result<NodeTree, GameError> {
        if node.parent_id != ROOT_PARENT_ID {
            return Err(GameError::NotRootNode {
                parent_id: node.parent_id.clone(),
            });
        }
        if node.node_type != NodeType::Room {
            return Err(GameError::IllegalRootNodeType {
                node_type: node.node_type,
            });
        }

        let id = NodeId::new(node.id.as_str()).map_err(GameError::NodeVerification)?;
        let kind = node.kind().map_err(GameError::NodeVerification)?;
        NodeTree::new(GameNode::new(id, kind)).map_err(GameError::NodeVerification)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregates::FlagState;
    use crate::error::NodeField;
    use chrono::Duration;

    fn author() -> Actor {
        Actor::user(UserId::new())
    }

    fn new_game(author: &Actor) -> Game {
        Game::new(author.user_id, Utc::now())
    }

    fn game_with_root(author: &Actor) -> Game {
        let mut game = new_game(author);
        game.add_node(
            NewGameNode::room("R", ROOT_PARENT_ID, "n", "d"),
            author,
            Utc::now(),
        )
        .unwrap();
        game
    }

    mod root_bootstrap {
        use super::*;

        #[test]
        fn first_room_becomes_root() {
            let author = author();
            let mut game = new_game(&author);

            let update = game
                .add_node(
                    NewGameNode::room("R", ROOT_PARENT_ID, "n", "d"),
                    &author,
                    Utc::now(),
                )
                .unwrap();

            assert_eq!(
                update,
                NodeTreeUpdate::RootCreated {
                    id: NodeId::new("R").unwrap()
                }
            );
            let root = game.root_node().unwrap();
            assert_eq!(root.id().as_str(), "R");
            assert_eq!(root.name(), Some("n"));
            assert_eq!(root.description(), Some("d"));
        }

        #[test]
        fn root_must_be_room() {
            let author = author();
            let mut game = new_game(&author);

            let err = game
                .add_node(
                    NewGameNode::choice("R", ROOT_PARENT_ID, "n"),
                    &author,
                    Utc::now(),
                )
                .unwrap_err();

            assert_eq!(
                err,
                GameError::IllegalRootNodeType {
                    node_type: NodeType::Choice
                }
            );
            assert!(game.tree().is_none());
        }

        #[test]
        fn root_needs_sentinel_parent() {
            let author = author();
            let mut game = new_game(&author);

            let err = game
                .add_node(NewGameNode::room("R", "P", "n", "d"), &author, Utc::now())
                .unwrap_err();

            assert!(matches!(err, GameError::NotRootNode { parent_id } if parent_id == "P"));
            assert!(game.tree().is_none());
        }

        #[test]
        fn invalid_root_fields_are_wrapped() {
            let author = author();
            let mut game = new_game(&author);

            let err = game
                .add_node(
                    NewGameNode::room("R", ROOT_PARENT_ID, "n", " "),
                    &author,
                    Utc::now(),
                )
                .unwrap_err();

            assert_eq!(
                err,
                GameError::NodeVerification(NodeTreeError::EmptyString {
                    field: NodeField::Description
                })
            );
        }

        #[test]
        fn sentinel_parent_after_root_is_a_missing_parent() {
            let author = author();
            let mut game = game_with_root(&author);

            let err = game
                .add_node(
                    NewGameNode::room("R2", ROOT_PARENT_ID, "n", "d"),
                    &author,
                    Utc::now(),
                )
                .unwrap_err();

            assert!(matches!(
                err,
                GameError::NodeVerification(NodeTreeError::ParentNotExists { .. })
            ));
        }
    }

    mod authorization {
        use super::*;

        #[test]
        fn stranger_cannot_mutate() {
            let author = author();
            let stranger = Actor::user(UserId::new());
            let mut game = game_with_root(&author);

            let err = game
                .add_node(NewGameNode::choice("A", "R", "a"), &stranger, Utc::now())
                .unwrap_err();
            assert_eq!(
                err,
                GameError::ForbiddenManipulation(ForbiddenReason::NotAuthor {
                    user_id: stranger.user_id
                })
            );

            assert!(matches!(
                game.edit_node("R", GameNodeEdit::room("x", "y"), &stranger, Utc::now()),
                Err(GameError::ForbiddenManipulation(_))
            ));
            assert!(matches!(
                game.delete_node("R", &stranger, Utc::now()),
                Err(GameError::ForbiddenManipulation(_))
            ));
        }

        #[test]
        fn admin_can_mutate() {
            let author = author();
            let admin = Actor::admin(UserId::new());
            let mut game = game_with_root(&author);

            game.add_node(NewGameNode::choice("A", "R", "a"), &admin, Utc::now())
                .unwrap();
            assert!(game.find_node("A").is_some());
        }
    }

    mod mutations {
        use super::*;

        #[test]
        fn edit_and_delete_need_a_root() {
            let author = author();
            let mut game = new_game(&author);

            assert_eq!(
                game.edit_node("R", GameNodeEdit::name("x"), &author, Utc::now()),
                Err(GameError::RootNodeNotExists)
            );
            assert_eq!(
                game.delete_node("R", &author, Utc::now()),
                Err(GameError::RootNodeNotExists)
            );
        }

        #[test]
        fn tree_errors_are_wrapped_as_verification() {
            let author = author();
            let mut game = game_with_root(&author);

            let err = game
                .add_node(NewGameNode::choice("A", "missing", "a"), &author, Utc::now())
                .unwrap_err();
            assert!(matches!(
                err,
                GameError::NodeVerification(NodeTreeError::ParentNotExists { .. })
            ));

            game.add_node(NewGameNode::choice("A", "R", "a"), &author, Utc::now())
                .unwrap();
            let err = game
                .add_node(
                    NewGameNode::condition("K", "A", "nope", FlagState::Active),
                    &author,
                    Utc::now(),
                )
                .unwrap_err();
            assert!(matches!(
                err,
                GameError::NodeVerification(NodeTreeError::FlagNotExists { .. })
            ));
        }

        #[test]
        fn edit_maps_not_found() {
            let author = author();
            let mut game = game_with_root(&author);

            let err = game
                .edit_node("ghost", GameNodeEdit::name("x"), &author, Utc::now())
                .unwrap_err();
            assert_eq!(
                err,
                GameError::NodeNotFound {
                    id: "ghost".to_string()
                }
            );

            let err = game
                .edit_node("R", GameNodeEdit::room("", "d"), &author, Utc::now())
                .unwrap_err();
            assert!(matches!(err, GameError::NodeVerification(_)));
        }

        #[test]
        fn deleting_root_is_forbidden() {
            let author = author();
            let mut game = game_with_root(&author);
            game.add_node(NewGameNode::choice("A", "R", "a"), &author, Utc::now())
                .unwrap();

            let err = game.delete_node("R", &author, Utc::now()).unwrap_err();
            assert_eq!(
                err,
                GameError::ForbiddenManipulation(ForbiddenReason::RootNodeDeleting {
                    node_id: "R".to_string()
                })
            );
            assert!(game.find_node("A").is_some());

            assert!(matches!(
                game.delete_node("ghost", &author, Utc::now()),
                Err(GameError::NodeNotFound { .. })
            ));
        }

        #[test]
        fn success_touches_updated_at_failure_does_not() {
            let author = author();
            let start = Utc::now();
            let mut game = Game::new(author.user_id, start);
            let later = start + Duration::minutes(5);

            game.add_node(NewGameNode::room("R", ROOT_PARENT_ID, "n", "d"), &author, later)
                .unwrap();
            assert_eq!(game.updated_at(), later);
            assert_eq!(game.created_at(), start);

            let even_later = later + Duration::minutes(5);
            let _ = game.delete_node("R", &author, even_later);
            assert_eq!(game.updated_at(), later);
        }
    }

    mod serde_format {
        use super::*;

        #[test]
        fn round_trips_with_tree() {
            let author = author();
            let mut game = game_with_root(&author);
            game.add_node(NewGameNode::flag("F", "R", "Lit"), &author, Utc::now())
                .unwrap();

            let json = serde_json::to_value(&game).unwrap();
            assert_eq!(json["nodes"][0]["id"], "R");
            assert_eq!(json["nodes"][1]["type"], "FLAG");
            assert_eq!(json["nodes"][1]["parentId"], "R");
            assert_eq!(json["authorId"], serde_json::json!(author.user_id));

            let back: Game = serde_json::from_value(json).unwrap();
            assert_eq!(back.id(), game.id());
            assert_eq!(back.find_node("F").unwrap().name(), Some("Lit"));
        }

        #[test]
        fn empty_game_omits_root() {
            let author = author();
            let game = new_game(&author);

            let json = serde_json::to_value(&game).unwrap();
            assert!(json.get("nodes").is_none());

            let back: Game = serde_json::from_value(json).unwrap();
            assert!(back.tree().is_none());
        }
    }
}
