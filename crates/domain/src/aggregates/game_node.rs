//! Game node - the polymorphic unit of a game's tree
//!
//! Every node carries an id, a fixed [`NodeType`] and an ordered list of
//! children. The per-type payload lives in [`NodeKind`], a tagged union, so
//! field requirements and the placement table are each a single `match`.
//!
//! | Type      | Fields                         | May host                     |
//! |-----------|--------------------------------|------------------------------|
//! | Room      | name, description              | Choice, Flag                 |
//! | Choice    | name                           | one Room, any Conditions     |
//! | Flag      | name                           | nothing                      |
//! | Condition | condition flag id, flag state  | one Room, any Conditions     |
//!
//! Nodes are created and mutated only through [`NodeTree`](super::NodeTree),
//! which owns the rules that span more than one node.

use std::collections::HashSet;
use std::fmt;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{NodeField, NodeTreeError, PlacementViolation};
use crate::ids::NodeId;
use crate::value_objects::{NodeDescription, NodeName};

/// Discriminant of a node, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Room,
    Choice,
    Flag,
    Condition,
}

impl NodeType {
    /// Whether a node of this type may directly host a child of type `child`.
    ///
    /// This is the whole placement table. The "at most one Room" rule for
    /// Choice and Condition parents depends on existing children and is
    /// checked by [`GameNode::check_placement`].
    pub fn can_host(self, child: NodeType) -> bool {
        use NodeType::*;
        matches!(
            (self, child),
            (Room, Choice)
                | (Room, Flag)
                | (Choice, Room)
                | (Choice, Condition)
                | (Condition, Room)
                | (Condition, Condition)
        )
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Room => "ROOM",
            Self::Choice => "CHOICE",
            Self::Flag => "FLAG",
            Self::Condition => "CONDITION",
        };
        f.write_str(s)
    }
}

/// State of a flag that a Condition node waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagState {
    Active,
    NotActive,
}

/// Per-type node payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Room {
        name: NodeName,
        description: NodeDescription,
    },
    Choice {
        name: NodeName,
    },
    Flag {
        name: NodeName,
    },
    Condition {
        flag_id: NodeId,
        flag_state: FlagState,
    },
}

fn required<T>(value: Option<T>, field: NodeField) -> Result<T, NodeTreeError> {
    value.ok_or(NodeTreeError::NullValue { field })
}

impl NodeKind {
    /// Build the payload for `node_type` from raw author input.
    ///
    /// Only the fields the type uses are read; the rest are ignored.
    pub fn from_fields(
        node_type: NodeType,
        name: Option<&str>,
        description: Option<&str>,
        condition_flag_id: Option<&str>,
        condition_flag_state: Option<FlagState>,
    ) -> Result<Self, NodeTreeError> {
        match node_type {
            NodeType::Room => Ok(Self::Room {
                name: NodeName::new(required(name, NodeField::Name)?)?,
                description: NodeDescription::new(required(description, NodeField::Description)?)?,
            }),
            NodeType::Choice => Ok(Self::Choice {
                name: NodeName::new(required(name, NodeField::Name)?)?,
            }),
            NodeType::Flag => Ok(Self::Flag {
                name: NodeName::new(required(name, NodeField::Name)?)?,
            }),
            NodeType::Condition => Ok(Self::Condition {
                flag_id: NodeId::for_field(
                    required(condition_flag_id, NodeField::ConditionFlagId)?,
                    NodeField::ConditionFlagId,
                )?,
                flag_state: required(condition_flag_state, NodeField::ConditionFlagState)?,
            }),
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Room { .. } => NodeType::Room,
            Self::Choice { .. } => NodeType::Choice,
            Self::Flag { .. } => NodeType::Flag,
            Self::Condition { .. } => NodeType::Condition,
        }
    }
}

/// Request to add a node to a game.
///
/// Which optional fields are required depends on `node_type`:
/// Room needs name and description, Choice and Flag need a name, Condition
/// needs both condition fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGameNode {
    pub id: String,
    pub parent_id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_flag_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_flag_state: Option<FlagState>,
}

impl NewGameNode {
    fn bare(id: impl Into<String>, parent_id: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.into(),
            node_type,
            name: None,
            description: None,
            condition_flag_id: None,
            condition_flag_state: None,
        }
    }

    pub fn room(
        id: impl Into<String>,
        parent_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let mut node = Self::bare(id, parent_id, NodeType::Room);
        node.name = Some(name.into());
        node.description = Some(description.into());
        node
    }

    pub fn choice(
        id: impl Into<String>,
        parent_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let mut node = Self::bare(id, parent_id, NodeType::Choice);
        node.name = Some(name.into());
        node
    }

    pub fn flag(id: impl Into<String>, parent_id: impl Into<String>, name: impl Into<String>) -> Self {
        let mut node = Self::bare(id, parent_id, NodeType::Flag);
        node.name = Some(name.into());
        node
    }

    pub fn condition(
        id: impl Into<String>,
        parent_id: impl Into<String>,
        flag_id: impl Into<String>,
        flag_state: FlagState,
    ) -> Self {
        let mut node = Self::bare(id, parent_id, NodeType::Condition);
        node.condition_flag_id = Some(flag_id.into());
        node.condition_flag_state = Some(flag_state);
        node
    }

    /// The record that recreates `node` under `parent_id`, children excluded.
    pub fn from_node(node: &GameNode, parent_id: impl Into<String>) -> Self {
        let mut record = Self::bare(node.id().as_str(), parent_id, node.node_type());
        record.name = node.name().map(str::to_string);
        record.description = node.description().map(str::to_string);
        record.condition_flag_id = node.condition_flag_id().map(|id| id.to_string());
        record.condition_flag_state = node.condition_flag_state();
        record
    }

    pub(crate) fn kind(&self) -> Result<NodeKind, NodeTreeError> {
        NodeKind::from_fields(
            self.node_type,
            self.name.as_deref(),
            self.description.as_deref(),
            self.condition_flag_id.as_deref(),
            self.condition_flag_state,
        )
    }
}

/// Request to edit an existing node.
///
/// Fields the node's type does not use are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameNodeEdit {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub condition_flag_id: Option<String>,
    #[serde(default)]
    pub condition_flag_state: Option<FlagState>,
}

impl GameNodeEdit {
    /// Edit for Choice and Flag nodes.
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn room(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            description: Some(description.into()),
            ..Self::default()
        }
    }

    pub fn condition(flag_id: impl Into<String>, flag_state: FlagState) -> Self {
        Self {
            condition_flag_id: Some(flag_id.into()),
            condition_flag_state: Some(flag_state),
            ..Self::default()
        }
    }

    pub(crate) fn kind_for(&self, node_type: NodeType) -> Result<NodeKind, NodeTreeError> {
        NodeKind::from_fields(
            node_type,
            self.name.as_deref(),
            self.description.as_deref(),
            self.condition_flag_id.as_deref(),
            self.condition_flag_state,
        )
    }
}

/// A node of a game's tree.
///
/// Two nodes are equal when their ids are equal.
#[derive(Debug, Clone)]
pub struct GameNode {
    id: NodeId,
    kind: NodeKind,
    children: Vec<GameNode>,
}

impl GameNode {
    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            children: Vec::new(),
        }
    }

    pub fn room(id: NodeId, name: NodeName, description: NodeDescription) -> Self {
        Self::new(id, NodeKind::Room { name, description })
    }

    pub fn choice(id: NodeId, name: NodeName) -> Self {
        Self::new(id, NodeKind::Choice { name })
    }

    pub fn flag(id: NodeId, name: NodeName) -> Self {
        Self::new(id, NodeKind::Flag { name })
    }

    pub fn condition(id: NodeId, flag_id: NodeId, flag_state: FlagState) -> Self {
        Self::new(
            id,
            NodeKind::Condition {
                flag_id,
                flag_state,
            },
        )
    }

    /// Attach children (used when loading from storage).
    ///
    /// Nothing is checked here; pass the assembled root to [`NodeTree::new`](super::NodeTree::new)
    /// to verify it.
    pub fn with_children(mut self, children: Vec<GameNode>) -> Self {
        self.children = children;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    #[inline]
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Name of a Room, Choice or Flag.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Room { name, .. } | NodeKind::Choice { name } | NodeKind::Flag { name } => {
                Some(name.as_str())
            }
            NodeKind::Condition { .. } => None,
        }
    }

    /// Description of a Room.
    pub fn description(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Room { description, .. } => Some(description.as_str()),
            _ => None,
        }
    }

    /// Flag id of a Condition.
    pub fn condition_flag_id(&self) -> Option<&NodeId> {
        match &self.kind {
            NodeKind::Condition { flag_id, .. } => Some(flag_id),
            _ => None,
        }
    }

    /// Flag state of a Condition.
    pub fn condition_flag_state(&self) -> Option<FlagState> {
        match &self.kind {
            NodeKind::Condition { flag_state, .. } => Some(*flag_state),
            _ => None,
        }
    }

    #[inline]
    pub fn children(&self) -> &[GameNode] {
        &self.children
    }

    /// This node and all of its descendants, depth-first, parents before children.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    // =========================================================================
    // Tree walking (used by NodeTree)
    // =========================================================================

    pub(crate) fn find(&self, id: &str) -> Option<&GameNode> {
        self.iter().find(|node| node.id == *id)
    }

    pub(crate) fn find_mut(&mut self, id: &str) -> Option<&mut GameNode> {
        if self.id == *id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    pub(crate) fn push_child(&mut self, child: GameNode) {
        self.children.push(child);
    }

    pub(crate) fn replace_kind(&mut self, kind: NodeKind) -> NodeKind {
        std::mem::replace(&mut self.kind, kind)
    }

    /// Detach the descendant with `id`, together with its subtree.
    pub(crate) fn detach(&mut self, id: &str) -> Option<GameNode> {
        if let Some(pos) = self.children.iter().position(|child| child.id == *id) {
            return Some(self.children.remove(pos));
        }
        self.children.iter_mut().find_map(|child| child.detach(id))
    }

    /// Detach every descendant Condition that waits on one of `flag_ids`.
    pub(crate) fn detach_conditions_on(
        &mut self,
        flag_ids: &HashSet<NodeId>,
        detached: &mut Vec<GameNode>,
    ) {
        let (dropped, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.children)
            .into_iter()
            .partition(|child| {
                child
                    .condition_flag_id()
                    .is_some_and(|flag_id| flag_ids.contains(flag_id))
            });
        self.children = kept;
        detached.extend(dropped);
        for child in &mut self.children {
            child.detach_conditions_on(flag_ids, detached);
        }
    }

    /// Check that this node can take one more child of type `child`.
    pub(crate) fn check_placement(&self, child: NodeType) -> Result<(), NodeTreeError> {
        let violation = if !self.node_type().can_host(child) {
            Some(PlacementViolation::Incompatible)
        } else if child == NodeType::Room
            && self
                .children
                .iter()
                .any(|c| c.node_type() == NodeType::Room)
        {
            Some(PlacementViolation::RoomAlreadyPresent)
        } else {
            None
        };

        match violation {
            Some(violation) => Err(NodeTreeError::ParentMismatch {
                parent_id: self.id.to_string(),
                parent_type: self.node_type(),
                child_type: child,
                violation,
            }),
            None => Ok(()),
        }
    }
}

impl PartialEq for GameNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for GameNode {}

/// Depth-first pre-order iterator over a subtree.
#[derive(Debug)]
pub struct Iter<'a> {
    stack: Vec<&'a GameNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a GameNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

// ============================================================================
// Serde Implementation
// ============================================================================

/// Wire format for writing: borrows the node so children are not cloned.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GameNodeWireRef<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    node_type: NodeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    condition_flag_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    condition_flag_state: Option<FlagState>,
    children: &'a [GameNode],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameNodeWireFormat {
    id: String,
    #[serde(rename = "type")]
    node_type: NodeType,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    condition_flag_id: Option<String>,
    #[serde(default)]
    condition_flag_state: Option<FlagState>,
    #[serde(default)]
    children: Vec<GameNode>,
}

impl Serialize for GameNode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = GameNodeWireRef {
            id: self.id.as_str(),
            node_type: self.node_type(),
            name: self.name(),
            description: self.description(),
            condition_flag_id: self.condition_flag_id().map(NodeId::as_str),
            condition_flag_state: self.condition_flag_state(),
            children: &self.children,
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GameNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = GameNodeWireFormat::deserialize(deserializer)?;

        let id = NodeId::new(wire.id).map_err(DeError::custom)?;
        let kind = NodeKind::from_fields(
            wire.node_type,
            wire.name.as_deref(),
            wire.description.as_deref(),
            wire.condition_flag_id.as_deref(),
            wire.condition_flag_state,
        )
        .map_err(DeError::custom)?;

        Ok(GameNode::new(id, kind).with_children(wire.children))
    }
}

// ============================================================================
// Tests
// ============================================================================
