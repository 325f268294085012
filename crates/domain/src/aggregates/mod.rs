//! Aggregate roots - domain objects that own their related data
//!
//! - [`Game`] owns an optional [`NodeTree`]
//! - [`NodeTree`] owns its root [`GameNode`], which owns its children
//!
//! Ownership is the tree structure: a node has exactly one parent because
//! exactly one `Vec` holds it.

pub mod game;
pub mod game_node;
pub mod node_tree;

pub use game::Game;
pub use game_node::{FlagState, GameNode, GameNodeEdit, Iter, NewGameNode, NodeKind, NodeType};
pub use node_tree::NodeTree;
