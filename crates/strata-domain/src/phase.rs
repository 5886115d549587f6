//! Phase relationships (how adjacent groups meet in time)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared temporal relationship between two adjacent phases
///
/// Always read as "older phase RELATIONSHIP younger phase".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupRelationship {
    /// The older phase ends exactly where the younger begins
    Abutting,

    /// A free interval may separate the two phases
    Gap,

    /// The phases may share calendar time
    Overlap,
}

impl GroupRelationship {
    /// Get the relationship name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupRelationship::Abutting => "abutting",
            GroupRelationship::Gap => "gap",
            GroupRelationship::Overlap => "overlap",
        }
    }

    /// Parse a relationship from a string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "abutting" | "abutt" => Some(GroupRelationship::Abutting),
            "gap" => Some(GroupRelationship::Gap),
            "overlap" => Some(GroupRelationship::Overlap),
            _ => None,
        }
    }
}

impl fmt::Display for GroupRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What lies on one side of a phase in the phase sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseLink {
    /// Sentinel before the oldest phase
    Start,

    /// A real neighbouring phase, related as declared
    Related(GroupRelationship),

    /// Sentinel after the youngest phase
    End,
}

impl PhaseLink {
    /// Whether this link is one of the two sentinels
    pub fn is_sentinel(&self) -> bool {
        matches!(self, PhaseLink::Start | PhaseLink::End)
    }
}
