//! Strata Graph
//!
//! The chronology graph: contexts and phase boundaries linked by
//! "earlier than" edges, plus the maintenance edits that keep it valid.
//!
//! # Overview
//!
//! - **Construction**: [`ChronologyGraph::build`] turns validated input
//!   tables ([`ModelInput`]) into a DAG, chaining phases by their declared
//!   relationships and binding floating contexts to phase boundaries
//! - **Maintenance**: context removal, residual/intrusive reclassification,
//!   phase contraction and floating repair, all transactional
//! - **Validation**: [`ChronologyGraph::check_invariants`] reports cycles,
//!   disconnected contexts and dangling phase references
//! - **Rendering view**: [`ChronologyGraph::view`] exposes nodes, edges and
//!   boundary attributes in stable order
//!
//! # Phase Boundaries
//!
//! | Relationship | Structure |
//! |--------------|-----------|
//! | Abutting | beta of the older phase *is* alpha of the younger |
//! | Gap | edge beta(older) → alpha(younger) |
//! | Overlap | edges alpha → alpha and beta → beta |
//!
//! # Example Usage
//!
//! ```
//! use strata_domain::GroupRelationship;
//! use strata_graph::{ChronologyGraph, ModelInput};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let input = ModelInput::new()
//!     .dated_context("A", "1", 3010.0, 30.0)
//!     .dated_context("B", "1", 2950.0, 30.0)
//!     .context("C", "2")
//!     .above("B", "A")
//!     .relate("1", "2", GroupRelationship::Abutting);
//!
//! let mut graph = ChronologyGraph::build(&input)?;
//! assert_eq!(graph.phase_count(), 2);
//!
//! // Emptying phase 2 contracts it away
//! let report = graph.remove_context("C")?;
//! assert_eq!(report.contracted_phases, vec!["2".to_string()]);
//! assert_eq!(graph.phase_count(), 1);
//! assert!(graph.relationships().is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! Edits take `&mut self`; a sampler borrows the graph immutably for the
//! length of a run, so edits and sampling cannot interleave.

#![warn(missing_docs)]

mod build;
mod error;
mod graph;
mod input;
mod maintenance;
mod validate;
mod view;

pub use error::GraphError;
pub use graph::{BoundaryNode, ChronologyGraph, ContextNode, NodeData, Phase, PhaseId};
pub use input::{ContextRecord, GroupRelationRecord, ModelInput, StratigraphicRelation};
pub use maintenance::{MaintenanceNotice, MaintenanceReport};
pub use validate::IntegrityViolation;
pub use view::{EdgeView, GraphView, NodeView};
