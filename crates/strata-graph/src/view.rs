//! Read-only snapshot of the graph for layout and display

use crate::{ChronologyGraph, NodeData, PhaseId};
use serde::{Deserialize, Serialize};
use strata_domain::{ContextKind, EdgeKind, NodeId, NodeKind, Radiocarbon};

/// A node as seen by a renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    /// Arena id
    pub id: NodeId,
    /// Context label or derived boundary label
    pub label: String,
    /// Context or boundary
    pub kind: NodeKind,
    /// Owning phase label (contexts only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// Context kind (contexts only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_kind: Option<ContextKind>,
    /// Radiocarbon determination (dated contexts only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement: Option<Radiocarbon>,
    /// Phase this boundary starts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha_of: Option<String>,
    /// Phase this boundary ends
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta_of: Option<String>,
}

/// An edge as seen by a renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeView {
    /// Earlier node
    pub from: NodeId,
    /// Later node
    pub to: NodeId,
    /// Stratigraphic or phase edge
    pub kind: EdgeKind,
}

/// Nodes and edges in stable (ascending id) order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphView {
    /// Phase labels, oldest first
    pub phases: Vec<String>,
    /// Every live node
    pub nodes: Vec<NodeView>,
    /// Every edge
    pub edges: Vec<EdgeView>,
}

impl ChronologyGraph {
    /// Snapshot of the structure a renderer needs
    pub fn view(&self) -> GraphView {
        let phase_label = |p: PhaseId| self.phase(p).map(|ph| ph.label.clone());

        let nodes = self
            .node_ids()
            .filter_map(|id| {
                let data = self.node(id)?;
                let mut view = NodeView {
                    id,
                    label: self.node_label(id),
                    kind: data.kind(),
                    phase: None,
                    context_kind: None,
                    measurement: None,
                    alpha_of: None,
                    beta_of: None,
                };
                match data {
                    NodeData::Context(ctx) => {
                        view.phase = phase_label(ctx.phase);
                        view.context_kind = Some(ctx.kind);
                        view.measurement = ctx.measurement;
                    }
                    NodeData::Boundary(b) => {
                        view.alpha_of = b.alpha_of.and_then(phase_label);
                        view.beta_of = b.beta_of.and_then(phase_label);
                    }
                }
                Some(view)
            })
            .collect();

        let edges = self
            .edges()
            .map(|(from, to)| {
                let both_contexts = self.context(from).is_some() && self.context(to).is_some();
                EdgeView {
                    from,
                    to,
                    kind: if both_contexts {
                        EdgeKind::Stratigraphic
                    } else {
                        EdgeKind::Phase
                    },
                }
            })
            .collect();

        GraphView {
            phases: self.phase_labels(),
            nodes,
            edges,
        }
    }
}
