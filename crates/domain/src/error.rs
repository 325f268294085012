//! Error types for the node tree and the game aggregate
//!
//! Two layers:
//! - [`NodeTreeError`] is raised by the tree itself and names the exact rule
//!   that was broken.
//! - [`GameError`] is what the game aggregate hands to callers. It folds the
//!   tree errors into a small outward set so a service layer can map them onto
//!   not-found / forbidden / bad-request without knowing the tree's internals.

use std::fmt;

use thiserror::Error;

use crate::aggregates::NodeType;
use crate::ids::UserId;

/// Node input field a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeField {
    Id,
    Name,
    Description,
    ConditionFlagId,
    ConditionFlagState,
}

impl fmt::Display for NodeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Description => "description",
            Self::ConditionFlagId => "condition flag id",
            Self::ConditionFlagState => "condition flag state",
        };
        f.write_str(name)
    }
}

/// Why a parent refused a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementViolation {
    /// The parent type never hosts children of this type.
    Incompatible,
    /// The parent already has a Room among its direct children.
    RoomAlreadyPresent,
}

impl fmt::Display for PlacementViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incompatible => f.write_str("incompatible node types"),
            Self::RoomAlreadyPresent => f.write_str("there is already a room in this node"),
        }
    }
}

/// Coarse classification of [`NodeTreeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Tree-shape violation.
    Structural,
    /// Broken cross-reference between nodes.
    Referential,
    /// Malformed author input.
    FieldValidation,
}

/// Errors raised by node tree operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeTreeError {
    #[error("The parent {parent_id} does not exist")]
    ParentNotExists { parent_id: String },

    #[error("The node with id {id} already exists")]
    AlreadyExists { id: String },

    #[error("{child_type} node cannot be added to {parent_type} node {parent_id}: {violation}")]
    ParentMismatch {
        parent_id: String,
        parent_type: NodeType,
        child_type: NodeType,
        violation: PlacementViolation,
    },

    #[error("The flag {flag_id} does not exist")]
    FlagNotExists { flag_id: String },

    #[error("The {field} cannot be empty")]
    EmptyString { field: NodeField },

    #[error("The {field} cannot be null")]
    NullValue { field: NodeField },

    #[error("The id {id} is reserved")]
    ReservedId { id: String },

    #[error("The node {id} is not found")]
    NodeNotFound { id: String },

    #[error("Cannot delete the root node {id}")]
    RootNodeDeleting { id: String },

    #[error("The root node must be a {expected}, found {found}", expected = NodeType::Room)]
    RootNotRoom { found: NodeType },

    #[error("No node has the root parent id '{expected}'", expected = crate::ids::ROOT_PARENT_ID)]
    MissingRoot,
}

impl NodeTreeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ParentNotExists { .. }
            | Self::AlreadyExists { .. }
            | Self::ParentMismatch { .. }
            | Self::NodeNotFound { .. }
            | Self::RootNodeDeleting { .. }
            | Self::RootNotRoom { .. }
            | Self::MissingRoot => ErrorCategory::Structural,
            Self::FlagNotExists { .. } => ErrorCategory::Referential,
            Self::EmptyString { .. } | Self::NullValue { .. } | Self::ReservedId { .. } => {
                ErrorCategory::FieldValidation
            }
        }
    }

    pub(crate) fn not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }
}

/// Why the game refused a mutation outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForbiddenReason {
    /// The acting user is neither the author nor an admin.
    NotAuthor { user_id: UserId },
    /// The root node can never be deleted.
    RootNodeDeleting { node_id: String },
}

impl fmt::Display for ForbiddenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAuthor { user_id } => write!(f, "user {user_id} cannot modify the game"),
            Self::RootNodeDeleting { node_id } => {
                write!(f, "cannot delete the root node {node_id}")
            }
        }
    }
}

/// Errors returned by the game aggregate's node operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Forbidden manipulation: {0}")]
    ForbiddenManipulation(ForbiddenReason),

    #[error("Node verification failed: {0}")]
    NodeVerification(#[source] NodeTreeError),

    #[error("Node not found: {id}")]
    NodeNotFound { id: String },

    #[error("Root node does not exist, nothing to edit")]
    RootNodeNotExists,

    #[error("The game does not have a root node; a root node's parent id must be '{expected}', got '{parent_id}'", expected = crate::ids::ROOT_PARENT_ID)]
    NotRootNode { parent_id: String },

    #[error("Root node type can only be {expected}, got {node_type}", expected = NodeType::Room)]
    IllegalRootNodeType { node_type: NodeType },
}

impl GameError {
    pub(crate) fn forbidden_for(user_id: UserId) -> Self {
        Self::ForbiddenManipulation(ForbiddenReason::NotAuthor { user_id })
    }
}
