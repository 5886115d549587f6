//! Strata Domain Layer
//!
//! Value types shared by every crate in the workspace. The only external
//! dependency is `serde` for the derives that let input tables and result
//! records cross the persistence boundary.
//!
//! ## Key Concepts
//!
//! - **Context**: a stratigraphic excavation unit, optionally radiocarbon dated
//! - **Phase**: an ordered group of contexts bounded by alpha/beta boundary nodes
//! - **Group relationship**: how adjacent phases meet (abutting, gap, overlap)
//! - **Context kind**: normal, residual (displaced early) or intrusive (displaced late)
//! - **Run state**: lifecycle of a sampling run
//!
//! ## Architecture
//!
//! - Pure value types and trait definitions only
//! - Graph structure lives in `strata-graph`, sampling in `strata-sampler`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod node;
pub mod phase;
pub mod run_state;
pub mod traits;

// Re-exports for convenience
pub use context::{ContextKind, Radiocarbon};
pub use node::{EdgeKind, NodeId, NodeKind};
pub use phase::{GroupRelationship, PhaseLink};
pub use run_state::RunState;
pub use traits::{NoProgress, ProgressSink};
