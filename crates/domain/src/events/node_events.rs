//! Node tree mutation outcomes.

use crate::aggregates::{NodeKind, NodeType};
use crate::ids::NodeId;

/// Outcome of a successful node tree mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTreeUpdate {
    RootCreated {
        id: NodeId,
    },
    NodeAdded {
        id: NodeId,
        parent_id: NodeId,
        node_type: NodeType,
    },
    NodeEdited {
        id: NodeId,
        from: NodeKind,
        to: NodeKind,
    },
    NodeDeleted {
        id: NodeId,
        node_type: NodeType,
        /// Every node that left the tree, in removal order.
        removed: Vec<NodeId>,
        /// Conditions removed because the flag they waited on was deleted.
        cascaded_conditions: Vec<NodeId>,
    },
}

impl NodeTreeUpdate {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RootCreated { .. } => "root_created",
            Self::NodeAdded { .. } => "node_added",
            Self::NodeEdited { .. } => "node_edited",
            Self::NodeDeleted { .. } => "node_deleted",
        }
    }

    /// The node the mutation was addressed to.
    pub fn node_id(&self) -> &NodeId {
        match self {
            Self::RootCreated { id }
            | Self::NodeAdded { id, .. }
            | Self::NodeEdited { id, .. }
            | Self::NodeDeleted { id, .. } => id,
        }
    }
}
