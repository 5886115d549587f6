//! Validated input tables for graph construction
//!
//! These are the tables the ingestion layer hands over once CSV parsing and
//! context-equality merges are done. They deserialize from JSON.

use serde::{Deserialize, Serialize};
use strata_domain::{ContextKind, GroupRelationship, Radiocarbon};

/// One row of the context table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRecord {
    /// Unique context label
    pub label: String,

    /// Label of the owning phase
    pub phase: String,

    /// Context kind; normal unless stated
    #[serde(default)]
    pub kind: ContextKind,

    /// Radiocarbon determination, if dated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement: Option<Radiocarbon>,
}

/// A stratigraphic relation: `above` was deposited after `below`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StratigraphicRelation {
    /// Later context
    pub above: String,

    /// Earlier context
    pub below: String,
}

/// Declared relationship between two adjacent phases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRelationRecord {
    /// Older phase label
    pub older: String,

    /// Younger phase label
    pub younger: String,

    /// How the two phases meet
    pub relationship: GroupRelationship,
}

/// Complete model description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelInput {
    /// Context table
    pub contexts: Vec<ContextRecord>,

    /// Stratigraphic relations between contexts
    #[serde(default)]
    pub stratigraphy: Vec<StratigraphicRelation>,

    /// Relationships between consecutive phases
    #[serde(default)]
    pub group_relationships: Vec<GroupRelationRecord>,
}

impl ModelInput {
    /// Empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an undated normal context
    pub fn context(mut self, label: &str, phase: &str) -> Self {
        self.contexts.push(ContextRecord {
            label: label.to_string(),
            phase: phase.to_string(),
            kind: ContextKind::Normal,
            measurement: None,
        });
        self
    }

    /// Add a dated normal context
    pub fn dated_context(mut self, label: &str, phase: &str, age: f64, error: f64) -> Self {
        self.contexts.push(ContextRecord {
            label: label.to_string(),
            phase: phase.to_string(),
            kind: ContextKind::Normal,
            measurement: Some(Radiocarbon { age, error }),
        });
        self
    }

    /// Set the kind of an already added context
    pub fn with_kind(mut self, label: &str, kind: ContextKind) -> Self {
        if let Some(record) = self.contexts.iter_mut().find(|c| c.label == label) {
            record.kind = kind;
        }
        self
    }

    /// Declare that `above` lies over (is later than) `below`
    pub fn above(mut self, above: &str, below: &str) -> Self {
        self.stratigraphy.push(StratigraphicRelation {
            above: above.to_string(),
            below: below.to_string(),
        });
        self
    }

    /// Declare the relationship between an older and a younger phase
    pub fn relate(mut self, older: &str, younger: &str, relationship: GroupRelationship) -> Self {
        self.group_relationships.push(GroupRelationRecord {
            older: older.to_string(),
            younger: younger.to_string(),
            relationship,
        });
        self
    }

    /// Parse from a JSON document
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
