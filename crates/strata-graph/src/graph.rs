//! The chronology graph: an arena of contexts and phase boundaries
//!
//! Nodes are addressed by stable [`NodeId`]s and phases by [`PhaseId`]s.
//! An edge `u -> v` means `u` is no later than `v`. Phase identity and
//! context kind are typed attributes, so relabeling a boundary is an
//! attribute update and never a change of storage key.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};
use std::fmt;
use strata_domain::{ContextKind, GroupRelationship, NodeId, NodeKind, PhaseLink, Radiocarbon};

/// Stable identifier of a phase in the phase table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhaseId(u32);

impl PhaseId {
    /// Phase table slot
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Attributes of a context node
#[derive(Debug, Clone, PartialEq)]
pub struct ContextNode {
    /// Unique context label
    pub label: String,

    /// Owning phase
    pub phase: PhaseId,

    /// Normal, residual or intrusive
    pub kind: ContextKind,

    /// Radiocarbon determination, if the context is dated
    pub measurement: Option<Radiocarbon>,
}

/// Attributes of a boundary node
///
/// A node can be the alpha of one phase and the beta of the phase before it
/// at the same time (an abutting boundary). Both fields are re-derived from
/// the phase table after every structural edit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryNode {
    /// Phase whose start this node marks
    pub alpha_of: Option<PhaseId>,

    /// Phase whose end this node marks
    pub beta_of: Option<PhaseId>,
}

/// A node of the chronology graph
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    /// Stratigraphic context
    Context(ContextNode),

    /// Phase boundary
    Boundary(BoundaryNode),
}

impl NodeData {
    /// Node classification
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Context(_) => NodeKind::Context,
            NodeData::Boundary(_) => NodeKind::Boundary,
        }
    }
}

/// A phase (group) and its two boundary nodes
#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    /// Label as given in the input tables
    pub label: String,

    /// Boundary before every context of the phase
    pub alpha: NodeId,

    /// Boundary after every context of the phase
    pub beta: NodeId,
}

/// Directed acyclic graph of contexts and phase boundaries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChronologyGraph {
    nodes: Vec<Option<NodeData>>,
    succ: Vec<BTreeSet<NodeId>>,
    pred: Vec<BTreeSet<NodeId>>,
    labels: HashMap<String, NodeId>,
    phases: Vec<Option<Phase>>,
    phase_order: Vec<PhaseId>,
    relationships: Vec<GroupRelationship>,
}

impl ChronologyGraph {
    /// Empty graph with no phases
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------
    // Node queries
    // ---------------------------------------------------------------

    /// Attributes of a live node
    pub fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    /// Whether `id` names a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Context attributes, if `id` is a live context
    pub fn context(&self, id: NodeId) -> Option<&ContextNode> {
        match self.node(id) {
            Some(NodeData::Context(ctx)) => Some(ctx),
            _ => None,
        }
    }

    /// Boundary attributes, if `id` is a live boundary
    pub fn boundary(&self, id: NodeId) -> Option<&BoundaryNode> {
        match self.node(id) {
            Some(NodeData::Boundary(b)) => Some(b),
            _ => None,
        }
    }

    /// Node of the context with this label
    pub fn context_id(&self, label: &str) -> Option<NodeId> {
        self.labels.get(label).copied()
    }

    /// Live node ids in ascending order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_some())
            .map(|(i, _)| NodeId::from_index(i))
    }

    /// Live contexts in ascending id order
    pub fn contexts(&self) -> impl Iterator<Item = (NodeId, &ContextNode)> + '_ {
        self.nodes.iter().enumerate().filter_map(|(i, n)| match n {
            Some(NodeData::Context(ctx)) => Some((NodeId::from_index(i), ctx)),
            _ => None,
        })
    }

    /// Live boundary nodes in ascending id order
    pub fn boundaries(&self) -> impl Iterator<Item = (NodeId, &BoundaryNode)> + '_ {
        self.nodes.iter().enumerate().filter_map(|(i, n)| match n {
            Some(NodeData::Boundary(b)) => Some((NodeId::from_index(i), b)),
            _ => None,
        })
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Number of live contexts
    pub fn context_count(&self) -> usize {
        self.labels.len()
    }

    /// Upper bound (exclusive) of node indices ever allocated
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Display label of a node
    ///
    /// Contexts use their own label; boundaries render as `a_<phase>`,
    /// `b_<phase>` or `a_<younger> = b_<older>` for a shared boundary.
    pub fn node_label(&self, id: NodeId) -> String {
        match self.node(id) {
            Some(NodeData::Context(ctx)) => ctx.label.clone(),
            Some(NodeData::Boundary(b)) => {
                let alpha = b.alpha_of.and_then(|p| self.phase(p)).map(|p| &p.label);
                let beta = b.beta_of.and_then(|p| self.phase(p)).map(|p| &p.label);
                match (alpha, beta) {
                    (Some(a), Some(b)) => format!("a_{} = b_{}", a, b),
                    (Some(a), None) => format!("a_{}", a),
                    (None, Some(b)) => format!("b_{}", b),
                    (None, None) => format!("boundary_{}", id.index()),
                }
            }
            None => format!("removed_{}", id.index()),
        }
    }

    // ---------------------------------------------------------------
    // Edge queries
    // ---------------------------------------------------------------

    /// Nodes directly after `id`
    pub fn successors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.succ.get(id.index()).into_iter().flatten().copied()
    }

    /// Nodes directly before `id`
    pub fn predecessors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.pred.get(id.index()).into_iter().flatten().copied()
    }

    /// Whether the edge `from -> to` exists
    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.succ
            .get(from.index())
            .is_some_and(|s| s.contains(&to))
    }

    /// All edges, ordered by source then target
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.succ
            .iter()
            .enumerate()
            .flat_map(|(i, s)| s.iter().map(move |&t| (NodeId::from_index(i), t)))
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.succ.iter().map(BTreeSet::len).sum()
    }

    // ---------------------------------------------------------------
    // Phase queries
    // ---------------------------------------------------------------

    /// A live phase
    pub fn phase(&self, id: PhaseId) -> Option<&Phase> {
        self.phases.get(id.index()).and_then(Option::as_ref)
    }

    /// Phase with this label
    pub fn phase_id(&self, label: &str) -> Option<PhaseId> {
        self.phase_order
            .iter()
            .copied()
            .find(|&p| self.phase(p).is_some_and(|ph| ph.label == label))
    }

    /// Phase sequence, oldest first (`PHI_REF`)
    pub fn phase_order(&self) -> &[PhaseId] {
        &self.phase_order
    }

    /// Phase labels, oldest first
    pub fn phase_labels(&self) -> Vec<String> {
        self.phase_order
            .iter()
            .filter_map(|&p| self.phase(p).map(|ph| ph.label.clone()))
            .collect()
    }

    /// Number of live phases
    pub fn phase_count(&self) -> usize {
        self.phase_order.len()
    }

    /// Relationships between consecutive phases; entry `i` relates
    /// `phase_order[i]` (older) to `phase_order[i + 1]` (younger)
    pub fn relationships(&self) -> &[GroupRelationship] {
        &self.relationships
    }

    /// Position of a phase in the sequence
    pub fn phase_position(&self, id: PhaseId) -> Option<usize> {
        self.phase_order.iter().position(|&p| p == id)
    }

    /// What precedes a phase: `Start` for the oldest
    pub fn prev_link(&self, id: PhaseId) -> Option<PhaseLink> {
        let pos = self.phase_position(id)?;
        Some(if pos == 0 {
            PhaseLink::Start
        } else {
            PhaseLink::Related(self.relationships[pos - 1])
        })
    }

    /// What follows a phase: `End` for the youngest
    pub fn post_link(&self, id: PhaseId) -> Option<PhaseLink> {
        let pos = self.phase_position(id)?;
        Some(if pos + 1 == self.phase_order.len() {
            PhaseLink::End
        } else {
            PhaseLink::Related(self.relationships[pos])
        })
    }

    /// Live contexts belonging to a phase, ascending id order
    pub fn phase_contexts(&self, id: PhaseId) -> Vec<NodeId> {
        self.contexts()
            .filter(|(_, ctx)| ctx.phase == id)
            .map(|(n, _)| n)
            .collect()
    }

    // ---------------------------------------------------------------
    // Order queries
    // ---------------------------------------------------------------

    /// Every node reachable from `start` (including `start`), as a slot mask
    pub fn descendants(&self, start: NodeId) -> Vec<bool> {
        self.reach(start, &self.succ)
    }

    /// Every node that reaches `end` (including `end`), as a slot mask
    pub fn ancestors(&self, end: NodeId) -> Vec<bool> {
        self.reach(end, &self.pred)
    }

    /// Whether a directed path `from ~> to` exists (a node reaches itself)
    pub fn has_path(&self, from: NodeId, to: NodeId) -> bool {
        self.descendants(from)
            .get(to.index())
            .copied()
            .unwrap_or(false)
    }

    fn reach(&self, start: NodeId, adjacency: &[BTreeSet<NodeId>]) -> Vec<bool> {
        let mut seen = vec![false; self.nodes.len()];
        if !self.contains(start) {
            return seen;
        }
        let mut stack = vec![start];
        seen[start.index()] = true;
        while let Some(n) = stack.pop() {
            for &next in &adjacency[n.index()] {
                if !seen[next.index()] {
                    seen[next.index()] = true;
                    stack.push(next);
                }
            }
        }
        seen
    }

    /// Live nodes in a topological order (smallest id first among ties)
    ///
    /// # Errors
    ///
    /// Returns the nodes left on or behind a cycle.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, Vec<NodeId>> {
        let mut in_degree: Vec<usize> = self.pred.iter().map(BTreeSet::len).collect();
        let mut ready: BinaryHeap<Reverse<NodeId>> =
            self.node_ids().filter(|n| in_degree[n.index()] == 0).map(Reverse).collect();

        let mut order = Vec::with_capacity(self.node_count());
        while let Some(Reverse(n)) = ready.pop() {
            order.push(n);
            for &next in &self.succ[n.index()] {
                in_degree[next.index()] -= 1;
                if in_degree[next.index()] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        if order.len() == self.node_count() {
            Ok(order)
        } else {
            Err(self
                .node_ids()
                .filter(|n| in_degree[n.index()] > 0)
                .collect())
        }
    }

    /// Whether the graph has no directed cycle
    pub fn is_acyclic(&self) -> bool {
        self.topological_order().is_ok()
    }

    // ---------------------------------------------------------------
    // Mutation (crate-internal; public edits go through maintenance)
    // ---------------------------------------------------------------

    pub(crate) fn add_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        if let NodeData::Context(ctx) = &data {
            self.labels.insert(ctx.label.clone(), id);
        }
        self.nodes.push(Some(data));
        self.succ.push(BTreeSet::new());
        self.pred.push(BTreeSet::new());
        id
    }

    pub(crate) fn add_boundary(&mut self) -> NodeId {
        self.add_node(NodeData::Boundary(BoundaryNode::default()))
    }

    /// Remove a node and its incident edges; returns the removed edges
    pub(crate) fn remove_node(&mut self, id: NodeId) -> Vec<(NodeId, NodeId)> {
        let Some(data) = self.nodes.get_mut(id.index()).and_then(Option::take) else {
            return Vec::new();
        };
        if let NodeData::Context(ctx) = &data {
            self.labels.remove(&ctx.label);
        }

        let mut removed = Vec::new();
        for s in std::mem::take(&mut self.succ[id.index()]) {
            self.pred[s.index()].remove(&id);
            removed.push((id, s));
        }
        for p in std::mem::take(&mut self.pred[id.index()]) {
            self.succ[p.index()].remove(&id);
            removed.push((p, id));
        }
        removed
    }

    /// Insert `from -> to`; self loops and edges to dead nodes are ignored
    pub(crate) fn add_edge(&mut self, from: NodeId, to: NodeId) -> bool {
        if from == to || !self.contains(from) || !self.contains(to) {
            return false;
        }
        let inserted = self.succ[from.index()].insert(to);
        self.pred[to.index()].insert(from);
        inserted
    }

    pub(crate) fn remove_edge(&mut self, from: NodeId, to: NodeId) -> bool {
        if !self.has_edge(from, to) {
            return false;
        }
        self.succ[from.index()].remove(&to);
        self.pred[to.index()].remove(&from);
        true
    }

    /// Merge `absorb` into `keep`: `keep` inherits every edge of `absorb`
    /// (self loops dropped) and every phase reference to `absorb`
    pub(crate) fn contract_into(&mut self, keep: NodeId, absorb: NodeId) {
        if keep == absorb {
            return;
        }
        let outgoing: Vec<NodeId> = self.successors(absorb).collect();
        let incoming: Vec<NodeId> = self.predecessors(absorb).collect();
        self.remove_node(absorb);
        for s in outgoing {
            self.add_edge(keep, s);
        }
        for p in incoming {
            self.add_edge(p, keep);
        }
        for phase in self.phases.iter_mut().flatten() {
            if phase.alpha == absorb {
                phase.alpha = keep;
            }
            if phase.beta == absorb {
                phase.beta = keep;
            }
        }
    }

    pub(crate) fn context_mut(&mut self, id: NodeId) -> Option<&mut ContextNode> {
        match self.nodes.get_mut(id.index()).and_then(Option::as_mut) {
            Some(NodeData::Context(ctx)) => Some(ctx),
            _ => None,
        }
    }

    pub(crate) fn add_phase(&mut self, label: String, alpha: NodeId, beta: NodeId) -> PhaseId {
        let id = PhaseId(self.phases.len() as u32);
        self.phases.push(Some(Phase { label, alpha, beta }));
        self.phase_order.push(id);
        id
    }

    pub(crate) fn phase_mut(&mut self, id: PhaseId) -> Option<&mut Phase> {
        self.phases.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Drop a phase from the table and the sequence; the caller fixes relationships
    pub(crate) fn take_phase(&mut self, id: PhaseId) -> Option<Phase> {
        let phase = self.phases.get_mut(id.index()).and_then(Option::take)?;
        self.phase_order.retain(|&p| p != id);
        Some(phase)
    }

    pub(crate) fn relationships_mut(&mut self) -> &mut Vec<GroupRelationship> {
        &mut self.relationships
    }

    /// Rewrite every boundary's `alpha_of`/`beta_of` from the phase table
    pub(crate) fn rederive_boundary_attributes(&mut self) {
        for node in self.nodes.iter_mut().flatten() {
            if let NodeData::Boundary(b) = node {
                *b = BoundaryNode::default();
            }
        }
        let roles: Vec<(PhaseId, NodeId, NodeId)> = self
            .phase_order
            .iter()
            .filter_map(|&p| self.phase(p).map(|ph| (p, ph.alpha, ph.beta)))
            .collect();
        for (p, alpha, beta) in roles {
            if let Some(Some(NodeData::Boundary(b))) = self.nodes.get_mut(alpha.index()) {
                b.alpha_of = Some(p);
            }
            if let Some(Some(NodeData::Boundary(b))) = self.nodes.get_mut(beta.index()) {
                b.beta_of = Some(p);
            }
        }
    }
}
