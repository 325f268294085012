pub mod aggregates;
pub mod error;
pub mod events;
pub mod ids;
pub mod value_objects;

pub use aggregates::{
    FlagState, Game, GameNode, GameNodeEdit, NewGameNode, NodeKind, NodeTree, NodeType,
};
pub use error::{ErrorCategory, ForbiddenReason, GameError, NodeField, NodeTreeError, PlacementViolation};
pub use events::NodeTreeUpdate;
pub use ids::{GameId, NodeId, UserId, ROOT_PARENT_ID};
pub use value_objects::{Actor, NodeDescription, NodeName};
