//! Validated text newtypes for game nodes
//!
//! These newtypes ensure that node text is valid by construction:
//! - Non-blank
//! - Trimmed of leading/trailing whitespace

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{NodeField, NodeTreeError};

fn trimmed_non_blank(value: String, field: NodeField) -> Result<String, NodeTreeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(NodeTreeError::EmptyString { field });
    }
    Ok(trimmed.to_string())
}

// ============================================================================
// NodeName
// ============================================================================

/// A validated node name (non-blank, trimmed)
///
/// Carried by Room, Choice and Flag nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeName(String);

impl NodeName {
    /// Create a new validated node name.
    ///
    /// # Errors
    ///
    /// Returns `NodeTreeError::EmptyString` if the name is empty after trimming.
    pub fn new(name: impl Into<String>) -> Result<Self, NodeTreeError> {
        trimmed_non_blank(name.into(), NodeField::Name).map(Self)
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for NodeName {
    type Error = NodeTreeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<NodeName> for String {
    fn from(name: NodeName) -> String {
        name.0
    }
}

// ============================================================================
// NodeDescription
// ============================================================================

/// A validated room description (non-blank, trimmed)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeDescription(String);

impl NodeDescription {
    /// Create a new validated description.
    ///
    /// # Errors
    ///
    /// Returns `NodeTreeError::EmptyString` if the description is empty after trimming.
    pub fn new(description: impl Into<String>) -> Result<Self, NodeTreeError> {
        trimmed_non_blank(description.into(), NodeField::Description).map(Self)
    }

    /// Returns the description as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for NodeDescription {
    type Error = NodeTreeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<NodeDescription> for String {
    fn from(description: NodeDescription) -> String {
        description.0
    }
}
