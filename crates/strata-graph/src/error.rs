//! Error types for graph construction and maintenance

use thiserror::Error;

/// Errors that can occur while building or editing a chronology graph
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Input tables are inconsistent (unknown labels, duplicates, broken phase chain, cycles)
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// An edit would break an invariant; the graph was left unchanged
    #[error("Graph integrity violation: {0}")]
    Integrity(String),

    /// No live context carries this label
    #[error("Unknown context: {0}")]
    UnknownContext(String),
}

impl GraphError {
    /// Whether the error came from a rejected structural edit
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity(_))
    }
}
