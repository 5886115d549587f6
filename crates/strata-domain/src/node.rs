//! Node identifiers and node/edge classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a node in the chronology graph arena
///
/// Identifiers are never reused within one graph instance, so a removed
/// node's id can never alias a live node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a NodeId from a raw arena index
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Arena slot of this node
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// What a graph node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A stratigraphic context
    Context,

    /// A phase boundary (alpha, beta, or a shared abutting boundary)
    Boundary,
}

/// What an edge encodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Context-to-context excavation relationship
    Stratigraphic,

    /// Any edge touching a phase boundary node
    Phase,
}
