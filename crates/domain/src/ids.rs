use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{NodeField, NodeTreeError};

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn to_uuid(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

define_id!(GameId);
define_id!(UserId);

/// Parent id that marks a node as the root of a game's tree.
pub const ROOT_PARENT_ID: &str = "###";

/// Author-chosen node identifier.
///
/// Node ids form one namespace per game: no two nodes of the same tree may
/// share an id, regardless of where they sit. Ids are kept exactly as given
/// (no trimming), but a blank id or the root sentinel [`ROOT_PARENT_ID`] is
/// rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    /// Create a validated node id.
    ///
    /// # Errors
    ///
    /// - `NodeTreeError::EmptyString` if the id is blank
    /// - `NodeTreeError::ReservedId` if the id equals [`ROOT_PARENT_ID`]
    pub fn new(id: impl Into<String>) -> Result<Self, NodeTreeError> {
        Self::for_field(id, NodeField::Id)
    }

    /// Same rules as [`NodeId::new`], reporting failures against `field`.
    pub(crate) fn for_field(id: impl Into<String>, field: NodeField) -> Result<Self, NodeTreeError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(NodeTreeError::EmptyString { field });
        }
        if id == ROOT_PARENT_ID {
            return Err(NodeTreeError::ReservedId { id });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NodeId {
    type Error = NodeTreeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> String {
        id.0
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}
