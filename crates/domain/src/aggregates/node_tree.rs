//! Node tree - the recursive structure behind a game
//!
//! A [`NodeTree`] owns a root Room and every node below it. It is the only
//! place where nodes are inserted, edited or deleted, and each of those
//! operations is all-or-nothing: every rule is checked against the current
//! tree before the first write, so a failed call leaves the tree untouched.
//!
//! Rules enforced here:
//! - node ids are unique across the whole tree, not just among siblings
//! - a child must fit its parent (see [`NodeType::can_host`])
//! - a Condition must point at a Flag that exists somewhere in the tree
//! - the root cannot be deleted
//!
//! Lookups walk the tree depth-first. Game trees are authored by hand and
//! stay small, so no id index is kept.
//!
//! On the wire a tree is a flat list of node records with parent ids (see
//! [`NodeTree::to_records`]), so loading a deep tree never nests.

use std::collections::{HashMap, HashSet};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::game_node::{GameNode, GameNodeEdit, Iter, NewGameNode, NodeType};
use crate::error::{NodeField, NodeTreeError, PlacementViolation};
use crate::events::NodeTreeUpdate;
use crate::ids::{NodeId, ROOT_PARENT_ID};

/// A game's node tree, rooted at a Room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTree {
    root: GameNode,
}

impl NodeTree {
    /// Wrap an assembled tree after checking every invariant.
    ///
    /// Used for root creation and for trees loaded from storage.
    ///
    /// # Errors
    ///
    /// Whatever [`NodeTree::verify`] reports.
    pub fn new(root: GameNode) -> Result<Self, NodeTreeError> {
        let tree = Self { root };
        tree.verify()?;
        Ok(tree)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[inline]
    pub fn root(&self) -> &GameNode {
        &self.root
    }

    pub fn into_root(self) -> GameNode {
        self.root
    }

    /// First node with `id`, searching depth-first from the root.
    pub fn find(&self, id: &str) -> Option<&GameNode> {
        self.root.find(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Every node, depth-first, parents before children.
    pub fn iter(&self) -> Iter<'_> {
        self.root.iter()
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Never true: a tree always has its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// All Flag nodes, in tree order.
    pub fn flags(&self) -> impl Iterator<Item = &GameNode> {
        self.iter()
            .filter(|node| node.node_type() == NodeType::Flag)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a node under the node named by `new_node.parent_id`.
    ///
    /// # Errors
    ///
    /// Checked in this order:
    /// - `AlreadyExists` - the new id is taken anywhere in the tree
    /// - `ParentNotExists` - no node has the parent id
    /// - `NullValue` / `FlagNotExists` - a Condition's flag id is missing or
    ///   does not name a Flag
    /// - `ParentMismatch` - the parent cannot host this type
    /// - `EmptyString` / `NullValue` / `ReservedId` - field validation
    pub fn insert(&mut self, new_node: NewGameNode) -> Result<NodeTreeUpdate, NodeTreeError> {
        if self.contains(&new_node.id) {
            return Err(NodeTreeError::AlreadyExists { id: new_node.id });
        }

        let parent = self
            .find(&new_node.parent_id)
            .ok_or_else(|| NodeTreeError::ParentNotExists {
                parent_id: new_node.parent_id.clone(),
            })?;

        if new_node.node_type == NodeType::Condition {
            self.require_flag(new_node.condition_flag_id.as_deref())?;
        }

        parent.check_placement(new_node.node_type)?;
        let parent_id = parent.id().clone();

        let id = NodeId::new(new_node.id.as_str())?;
        let node = GameNode::new(id.clone(), new_node.kind()?);

        self.root
            .find_mut(parent_id.as_str())
            .ok_or_else(|| NodeTreeError::ParentNotExists {
                parent_id: parent_id.to_string(),
            })?
            .push_child(node);

        Ok(NodeTreeUpdate::NodeAdded {
            id,
            parent_id,
            node_type: new_node.node_type,
        })
    }

    /// Replace the editable fields of the node with `node_id`.
    ///
    /// The node keeps its id, type and children.
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` - no node has this id
    /// - `NullValue` / `FlagNotExists` - for a Condition, the new flag id is
    ///   missing or does not name a Flag
    /// - `EmptyString` / `NullValue` - field validation for the node's type
    pub fn update(
        &mut self,
        node_id: &str,
        edit: GameNodeEdit,
    ) -> Result<NodeTreeUpdate, NodeTreeError> {
        let node = self
            .find(node_id)
            .ok_or_else(|| NodeTreeError::not_found(node_id))?;
        let node_type = node.node_type();

        if node_type == NodeType::Condition {
            self.require_flag(edit.condition_flag_id.as_deref())?;
        }

        let kind = edit.kind_for(node_type)?;

        let node = self
            .root
            .find_mut(node_id)
            .ok_or_else(|| NodeTreeError::not_found(node_id))?;
        let from = node.replace_kind(kind);

        Ok(NodeTreeUpdate::NodeEdited {
            id: node.id().clone(),
            from,
            to: node.kind().clone(),
        })
    }

    /// Remove the node with `node_id` and its whole subtree.
    ///
    /// Removing a Flag also removes every Condition that waits on it, with the
    /// Condition's own subtree. That can take further Flags with it, so the
    /// sweep repeats until no removed Flag is still referenced.
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` - no node has this id
    /// - `RootNodeDeleting` - the id names the root
    pub fn delete(&mut self, node_id: &str) -> Result<NodeTreeUpdate, NodeTreeError> {
        if !self.contains(node_id) {
            return Err(NodeTreeError::not_found(node_id));
        }
        if self.root.id() == node_id {
            return Err(NodeTreeError::RootNodeDeleting {
                id: node_id.to_string(),
            });
        }

        let detached = self
            .root
            .detach(node_id)
            .ok_or_else(|| NodeTreeError::not_found(node_id))?;

        let mut removed = Vec::new();
        let mut orphaned_flags = HashSet::new();
        collect_removed(&detached, &mut removed, &mut orphaned_flags);

        let mut cascaded_conditions = Vec::new();
        while !orphaned_flags.is_empty() {
            let mut dropped = Vec::new();
            self.root
                .detach_conditions_on(&orphaned_flags, &mut dropped);
            orphaned_flags.clear();

            for condition in &dropped {
                cascaded_conditions.push(condition.id().clone());
                collect_removed(condition, &mut removed, &mut orphaned_flags);
            }
        }

        Ok(NodeTreeUpdate::NodeDeleted {
            id: detached.id().clone(),
            node_type: detached.node_type(),
            removed,
            cascaded_conditions,
        })
    }

    // =========================================================================
    // Invariants
    // =========================================================================

    /// Check every tree invariant.
    ///
    /// Mutations keep these by construction; this is for trees assembled
    /// elsewhere, such as ones loaded from storage.
    ///
    /// # Errors
    ///
    /// - `RootNotRoom` - the root is not a Room
    /// - `AlreadyExists` - two nodes share an id
    /// - `ParentMismatch` - a child does not fit its parent
    /// - `FlagNotExists` - a Condition points at something other than a Flag
    pub fn verify(&self) -> Result<(), NodeTreeError> {
        if self.root.node_type() != NodeType::Room {
            return Err(NodeTreeError::RootNotRoom {
                found: self.root.node_type(),
            });
        }

        let mut seen = HashSet::new();
        for node in self.iter() {
            if !seen.insert(node.id().as_str()) {
                return Err(NodeTreeError::AlreadyExists {
                    id: node.id().to_string(),
                });
            }

            let mut has_room = false;
            for child in node.children() {
                let child_type = child.node_type();
                let violation = if !node.node_type().can_host(child_type) {
                    Some(PlacementViolation::Incompatible)
                } else if child_type == NodeType::Room && has_room {
                    Some(PlacementViolation::RoomAlreadyPresent)
                } else {
                    None
                };
                if let Some(violation) = violation {
                    return Err(NodeTreeError::ParentMismatch {
                        parent_id: node.id().to_string(),
                        parent_type: node.node_type(),
                        child_type,
                        violation,
                    });
                }
                has_room |= child_type == NodeType::Room;
            }

            if let Some(flag_id) = node.condition_flag_id() {
                self.require_flag(Some(flag_id.as_str()))?;
            }
        }

        Ok(())
    }

    // =========================================================================
    // Flat records
    // =========================================================================

    /// The tree as a flat list of records, parents before children.
    ///
    /// The root's record carries [`ROOT_PARENT_ID`] as its parent.
    pub fn to_records(&self) -> Vec<NewGameNode> {
        let mut records = Vec::new();
        let mut stack = vec![(&self.root, ROOT_PARENT_ID)];
        while let Some((node, parent_id)) = stack.pop() {
            records.push(NewGameNode::from_node(node, parent_id));
            stack.extend(
                node.children()
                    .iter()
                    .rev()
                    .map(|child| (child, node.id().as_str())),
            );
        }
        records
    }

    /// Rebuild a tree from records such as [`NodeTree::to_records`] produces.
    ///
    /// Siblings keep the order they have in `records`. No recursion is
    /// involved, so depth is bounded only by memory.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` - two records share an id
    /// - `ParentNotExists` - a record's parent is missing, a second record
    ///   claims the root parent id, or a record is not connected to the root
    /// - `MissingRoot` - no record has the root parent id
    /// - field validation and everything [`NodeTree::verify`] reports
    pub fn from_records(records: Vec<NewGameNode>) -> Result<Self, NodeTreeError> {
        let mut index: HashMap<String, usize> = HashMap::with_capacity(records.len());
        let mut parents = Vec::with_capacity(records.len());
        let mut slots = Vec::with_capacity(records.len());
        let mut root = None;

        for (i, record) in records.into_iter().enumerate() {
            if index.contains_key(&record.id) {
                return Err(NodeTreeError::AlreadyExists { id: record.id });
            }
            let node = GameNode::new(NodeId::new(record.id.as_str())?, record.kind()?);

            if record.parent_id == ROOT_PARENT_ID {
                if root.is_some() {
                    return Err(NodeTreeError::ParentNotExists {
                        parent_id: record.parent_id,
                    });
                }
                root = Some(i);
            }

            index.insert(record.id, i);
            parents.push(record.parent_id);
            slots.push(Some(node));
        }
        let root = root.ok_or(NodeTreeError::MissingRoot)?;

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); slots.len()];
        for (i, parent_id) in parents.iter().enumerate() {
            if i == root {
                continue;
            }
            let parent = index
                .get(parent_id)
                .ok_or_else(|| NodeTreeError::ParentNotExists {
                    parent_id: parent_id.clone(),
                })?;
            children[*parent].push(i);
        }

        // Pre-order from the root; anything left over sits on a parent cycle.
        let mut order = Vec::with_capacity(slots.len());
        let mut stack = vec![root];
        while let Some(i) = stack.pop() {
            order.push(i);
            stack.extend(children[i].iter().copied());
        }
        if order.len() != slots.len() {
            let mut reached = vec![false; slots.len()];
            for &i in &order {
                reached[i] = true;
            }
            if let Some(i) = reached.iter().position(|r| !r) {
                return Err(NodeTreeError::ParentNotExists {
                    parent_id: parents[i].clone(),
                });
            }
        }

        // Children are finished before their parent in reverse pre-order.
        for &i in order.iter().rev() {
            let kids: Vec<GameNode> = children[i]
                .iter()
                .filter_map(|&child| slots[child].take())
                .collect();
            if let Some(node) = slots[i].take() {
                slots[i] = Some(node.with_children(kids));
            }
        }

        let root = slots[root].take().ok_or(NodeTreeError::MissingRoot)?;
        Self::new(root)
    }

    fn require_flag(&self, flag_id: Option<&str>) -> Result<(), NodeTreeError> {
        let flag_id = flag_id.ok_or(NodeTreeError::NullValue {
            field: NodeField::ConditionFlagId,
        })?;
        match self.find(flag_id) {
            Some(node) if node.node_type() == NodeType::Flag => Ok(()),
            _ => Err(NodeTreeError::FlagNotExists {
                flag_id: flag_id.to_string(),
            }),
        }
    }
}

fn collect_removed(subtree: &GameNode, removed: &mut Vec<NodeId>, flags: &mut HashSet<NodeId>) {
    for node in subtree.iter() {
        removed.push(node.id().clone());
        if node.node_type() == NodeType::Flag {
            flags.insert(node.id().clone());
        }
    }
}

impl Serialize for NodeTree {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_records().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NodeTree {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let records = Vec::<NewGameNode>::deserialize(deserializer)?;
        NodeTree::from_records(records).map_err(DeError::custom)
    }
}

// ============================================================================
// Tests
// ============================================================================
