//! Structural edits that keep the chronology graph valid
//!
//! Every public edit is transactional: it runs on a scratch copy of the
//! graph, the copy is checked with [`ChronologyGraph::check_invariants`],
//! and only then swapped in. A failed edit leaves the graph untouched.

use crate::{ChronologyGraph, GraphError, PhaseId};
use std::collections::BTreeSet;
use strata_domain::{ContextKind, GroupRelationship, NodeId};

/// Something an edit decided on the caller's behalf
#[derive(Debug, Clone, PartialEq)]
pub enum MaintenanceNotice {
    /// A phase between `older` and `younger` vanished and their relationship
    /// was set without being declared
    RelationshipAssumed {
        /// Older neighbouring phase
        older: String,
        /// Younger neighbouring phase
        younger: String,
        /// Relationship now in force
        relationship: GroupRelationship,
    },
}

/// What an edit changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaintenanceReport {
    /// Edges present after the edit but not before
    pub edges_added: Vec<(NodeId, NodeId)>,

    /// Edges present before the edit but not after
    pub edges_removed: Vec<(NodeId, NodeId)>,

    /// Nodes deleted by the edit
    pub removed_nodes: Vec<NodeId>,

    /// Labels of phases that were emptied and contracted
    pub contracted_phases: Vec<String>,

    /// Policy decisions taken during the edit
    pub notices: Vec<MaintenanceNotice>,
}

impl MaintenanceReport {
    /// Whether the edit left the graph exactly as it was
    pub fn is_noop(&self) -> bool {
        self.edges_added.is_empty()
            && self.edges_removed.is_empty()
            && self.removed_nodes.is_empty()
            && self.contracted_phases.is_empty()
    }

    /// One-line description for logs
    pub fn summary(&self) -> String {
        format!(
            "+{} edges, -{} edges, -{} nodes, {} phases contracted, {} notices",
            self.edges_added.len(),
            self.edges_removed.len(),
            self.removed_nodes.len(),
            self.contracted_phases.len(),
            self.notices.len()
        )
    }

    fn record_diff(&mut self, before: &ChronologyGraph, after: &ChronologyGraph) {
        let old: BTreeSet<(NodeId, NodeId)> = before.edges().collect();
        let new: BTreeSet<(NodeId, NodeId)> = after.edges().collect();
        self.edges_added = new.difference(&old).copied().collect();
        self.edges_removed = old.difference(&new).copied().collect();
        self.removed_nodes = before.node_ids().filter(|&n| !after.contains(n)).collect();
    }
}

impl ChronologyGraph {
    /// Remove a context and repair its phase
    ///
    /// Siblings left without an in-phase predecessor are attached to the
    /// phase's alpha, those without an in-phase successor to its beta. If the
    /// phase is left empty it is contracted (see [`MaintenanceNotice`] for
    /// the relationship policy).
    ///
    /// # Errors
    ///
    /// `GraphError::UnknownContext` if no live context has this label,
    /// `GraphError::Integrity` if the result would violate an invariant.
    pub fn remove_context(&mut self, label: &str) -> Result<MaintenanceReport, GraphError> {
        self.transact("remove context", |graph, report| {
            let id = graph
                .context_id(label)
                .ok_or_else(|| GraphError::UnknownContext(label.to_string()))?;
            remove_context_node(graph, id, report);
            Ok(())
        })
    }

    /// Mark a context as residual (deposited later than its true date)
    ///
    /// Every predecessor/successor pair on an alpha to beta path through the
    /// context is bypassed with a direct edge, then the context loses its
    /// outgoing edges and is bound only to its phase's beta. A no-op for a
    /// context that is already residual.
    pub fn reclassify_residual(&mut self, label: &str) -> Result<MaintenanceReport, GraphError> {
        self.reclassify(label, ContextKind::Residual)
    }

    /// Mark a context as intrusive (deposited earlier than its true date)
    ///
    /// The context loses its incoming edges and is bound only to its
    /// phase's alpha. A no-op for a context that is already intrusive.
    pub fn reclassify_intrusive(&mut self, label: &str) -> Result<MaintenanceReport, GraphError> {
        self.reclassify(label, ContextKind::Intrusive)
    }

    fn reclassify(
        &mut self,
        label: &str,
        kind: ContextKind,
    ) -> Result<MaintenanceReport, GraphError> {
        self.transact("reclassify", |graph, _| {
            let id = graph
                .context_id(label)
                .ok_or_else(|| GraphError::UnknownContext(label.to_string()))?;
            apply_kind(graph, id, kind);
            Ok(())
        })
    }

    /// Declare that `above` was deposited after `below`
    ///
    /// # Errors
    ///
    /// `GraphError::Integrity` if the relation contradicts the existing
    /// order (it would close a cycle).
    pub fn add_stratigraphic_relation(
        &mut self,
        above: &str,
        below: &str,
    ) -> Result<MaintenanceReport, GraphError> {
        self.transact("add relation", |graph, _| {
            let (above_id, below_id) = graph.context_pair(above, below)?;
            if above_id == below_id {
                return Err(GraphError::Integrity(format!(
                    "context '{}' cannot lie above itself",
                    above
                )));
            }
            graph.add_edge(below_id, above_id);
            Ok(())
        })
    }

    /// Drop the relation `above` over `below`, if present
    pub fn remove_stratigraphic_relation(
        &mut self,
        above: &str,
        below: &str,
    ) -> Result<MaintenanceReport, GraphError> {
        self.transact("remove relation", |graph, _| {
            let (above_id, below_id) = graph.context_pair(above, below)?;
            graph.remove_edge(below_id, above_id);
            repair_floating(graph);
            Ok(())
        })
    }

    /// Attach every floating context to its phase boundaries
    ///
    /// Idempotent: repairing a repaired graph changes nothing.
    pub fn repair(&mut self) -> Result<MaintenanceReport, GraphError> {
        self.transact("repair", |graph, _| {
            repair_floating(graph);
            Ok(())
        })
    }

    fn context_pair(&self, above: &str, below: &str) -> Result<(NodeId, NodeId), GraphError> {
        let above_id = self
            .context_id(above)
            .ok_or_else(|| GraphError::UnknownContext(above.to_string()))?;
        let below_id = self
            .context_id(below)
            .ok_or_else(|| GraphError::UnknownContext(below.to_string()))?;
        Ok((above_id, below_id))
    }

    fn transact<F>(&mut self, operation: &str, edit: F) -> Result<MaintenanceReport, GraphError>
    where
        F: FnOnce(&mut ChronologyGraph, &mut MaintenanceReport) -> Result<(), GraphError>,
    {
        let mut scratch = self.clone();
        let mut report = MaintenanceReport::default();

        edit(&mut scratch, &mut report)?;
        if let Err(e) = scratch.check_invariants() {
            tracing::warn!("Rejected {}: {}", operation, e);
            return Err(e);
        }

        report.record_diff(self, &scratch);
        *self = scratch;
        tracing::debug!("Applied {}: {}", operation, report.summary());
        Ok(report)
    }
}

/// Delete a context node, contracting its phase if it was the last one
fn remove_context_node(graph: &mut ChronologyGraph, id: NodeId, report: &mut MaintenanceReport) {
    let Some(phase) = graph.context(id).map(|c| c.phase) else {
        return;
    };
    graph.remove_node(id);
    if graph.phase_contexts(phase).is_empty() {
        contract_phase(graph, phase, report);
    }
    repair_floating(graph);
}

/// Merge the boundaries of an emptied phase and drop it from the sequence
fn contract_phase(graph: &mut ChronologyGraph, phase: PhaseId, report: &mut MaintenanceReport) {
    let Some(pos) = graph.phase_position(phase) else {
        return;
    };
    let count = graph.phase_count();
    let prev = pos.checked_sub(1).map(|i| graph.phase_order()[i]);
    let next = graph.phase_order().get(pos + 1).copied();

    let Some(removed) = graph.take_phase(phase) else {
        return;
    };
    // Merging rewrites any neighbour reference to the removed beta as well
    graph.contract_into(removed.alpha, removed.beta);
    let merged = removed.alpha;

    match (prev, next) {
        (None, None) => {
            graph.remove_node(merged);
        }
        (None, Some(next)) => {
            graph.relationships_mut().remove(0);
            if let Some(alpha) = graph.phase(next).map(|p| p.alpha) {
                graph.contract_into(alpha, merged);
            }
        }
        (Some(prev), None) => {
            graph.relationships_mut().remove(pos - 1);
            if let Some(beta) = graph.phase(prev).map(|p| p.beta) {
                graph.contract_into(beta, merged);
            }
        }
        (Some(prev), Some(next)) => {
            let relationships = graph.relationships_mut();
            relationships[pos - 1] = GroupRelationship::Gap;
            relationships.remove(pos);
            join_neighbours(graph, merged, prev, next);

            let older = graph.phase(prev).map(|p| p.label.clone()).unwrap_or_default();
            let younger = graph.phase(next).map(|p| p.label.clone()).unwrap_or_default();
            tracing::warn!(
                "Phase '{}' removed; assuming a gap between '{}' and '{}'",
                removed.label,
                older,
                younger
            );
            report.notices.push(MaintenanceNotice::RelationshipAssumed {
                older,
                younger,
                relationship: GroupRelationship::Gap,
            });
        }
    }

    graph.rederive_boundary_attributes();
    tracing::info!(
        "Contracted empty phase '{}' ({} -> {} phases)",
        removed.label,
        count,
        graph.phase_count()
    );
    report.contracted_phases.push(removed.label);
}

/// Reconnect the two phases around a contracted interior phase with a gap
fn join_neighbours(graph: &mut ChronologyGraph, merged: NodeId, prev: PhaseId, next: PhaseId) {
    let (Some(beta), Some(alpha)) = (
        graph.phase(prev).map(|p| p.beta),
        graph.phase(next).map(|p| p.alpha),
    ) else {
        return;
    };

    match (beta == merged, alpha == merged) {
        (true, true) => {
            // One node serves both neighbours: split it so a gap can open
            let split = graph.add_boundary();
            let outgoing: Vec<NodeId> = graph.successors(merged).collect();
            for s in outgoing {
                graph.remove_edge(merged, s);
                graph.add_edge(split, s);
            }
            if let Some(p) = graph.phase_mut(next) {
                p.alpha = split;
            }
        }
        (false, false) => graph.contract_into(beta, merged),
        _ => {}
    }

    let beta = graph.phase(prev).map(|p| p.beta);
    let alpha = graph.phase(next).map(|p| p.alpha);
    if let (Some(beta), Some(alpha)) = (beta, alpha) {
        graph.add_edge(beta, alpha);
    }
}

/// Rewire a context for a new kind; a no-op if it already has that kind
pub(crate) fn apply_kind(graph: &mut ChronologyGraph, id: NodeId, kind: ContextKind) {
    let Some(ctx) = graph.context(id) else {
        return;
    };
    if ctx.kind == kind {
        return;
    }
    let Some((alpha, beta)) = graph.phase(ctx.phase).map(|p| (p.alpha, p.beta)) else {
        return;
    };

    match kind {
        ContextKind::Residual => {
            let from_alpha = graph.descendants(alpha);
            let to_beta = graph.ancestors(beta);
            let preds: Vec<NodeId> = graph
                .predecessors(id)
                .filter(|p| from_alpha[p.index()])
                .collect();
            let succs: Vec<NodeId> = graph.successors(id).collect();
            for &p in &preds {
                for &q in succs.iter().filter(|q| to_beta[q.index()]) {
                    graph.add_edge(p, q);
                }
            }
            for q in succs {
                graph.remove_edge(id, q);
            }
        }
        ContextKind::Intrusive => {
            let preds: Vec<NodeId> = graph.predecessors(id).collect();
            for p in preds {
                graph.remove_edge(p, id);
            }
        }
        ContextKind::Normal => {}
    }

    if let Some(ctx) = graph.context_mut(id) {
        tracing::debug!("Context '{}' reclassified as {}", ctx.label, kind);
        ctx.kind = kind;
    }
    repair_floating(graph);
}

/// Bind floating contexts to their phase boundaries
///
/// A context with no predecessor among its own phase's contexts and alpha
/// gets `alpha -> ctx`; one with no successor among its own phase's
/// contexts and beta gets `ctx -> beta`.
pub(crate) fn repair_floating(graph: &mut ChronologyGraph) {
    let contexts: Vec<(NodeId, PhaseId)> = graph.contexts().map(|(id, c)| (id, c.phase)).collect();

    for (id, phase) in contexts {
        let Some((alpha, beta)) = graph.phase(phase).map(|p| (p.alpha, p.beta)) else {
            continue;
        };
        let in_phase = |graph: &ChronologyGraph, n: NodeId, boundary: NodeId| {
            n == boundary || graph.context(n).is_some_and(|c| c.phase == phase)
        };

        if !graph.predecessors(id).any(|p| in_phase(graph, p, alpha)) {
            graph.add_edge(alpha, id);
        }
        if !graph.successors(id).any(|s| in_phase(graph, s, beta)) {
            graph.add_edge(id, beta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelInput;

    fn chain() -> ChronologyGraph {
        ChronologyGraph::build(
            &ModelInput::new()
                .context("A", "1")
                .context("B", "1")
                .context("C", "1")
                .above("B", "A")
                .above("C", "B"),
        )
        .unwrap()
    }

    fn ids(graph: &ChronologyGraph, labels: &[&str]) -> Vec<NodeId> {
        labels
            .iter()
            .map(|l| graph.context_id(l).unwrap())
            .collect()
    }

    #[test]
    fn test_remove_middle_of_chain_reattaches_neighbours() {
        let mut graph = chain();
        let phase = graph.phase(graph.phase_order()[0]).unwrap().clone();
        let [a, c] = ids(&graph, &["A", "C"])[..] else {
            unreachable!()
        };

        let report = graph.remove_context("B").unwrap();
        assert!(graph.has_edge(a, phase.beta));
        assert!(graph.has_edge(phase.alpha, c));
        assert_eq!(report.removed_nodes.len(), 1);
        assert_eq!(report.edges_added.len(), 2);
        assert!(graph.is_acyclic());
    }

    #[test]
    fn test_unknown_context_leaves_graph_unchanged() {
        let mut graph = chain();
        let before = graph.clone();
        assert_eq!(
            graph.remove_context("Z"),
            Err(GraphError::UnknownContext("Z".to_string()))
        );
        assert_eq!(graph, before);
    }

    #[test]
    fn test_residual_bypass() {
        let mut graph = chain();
        let [a, b, c] = ids(&graph, &["A", "B", "C"])[..] else {
            unreachable!()
        };
        let beta = graph.phase(graph.phase_order()[0]).unwrap().beta;

        graph.reclassify_residual("B").unwrap();
        assert!(graph.has_edge(a, c));
        assert!(!graph.has_edge(b, c));
        assert_eq!(graph.successors(b).collect::<Vec<_>>(), vec![beta]);
        assert!(graph.has_edge(a, b));
    }

    #[test]
    fn test_residual_twice_is_noop() {
        let mut graph = chain();
        graph.reclassify_residual("B").unwrap();
        let once = graph.clone();
        let report = graph.reclassify_residual("B").unwrap();
        assert!(report.is_noop());
        assert_eq!(graph, once);
    }

    #[test]
    fn test_intrusive_drops_incoming() {
        let mut graph = chain();
        let [a, b, c] = ids(&graph, &["A", "B", "C"])[..] else {
            unreachable!()
        };
        let phase = graph.phase(graph.phase_order()[0]).unwrap().clone();

        graph.reclassify_intrusive("B").unwrap();
        assert_eq!(graph.predecessors(b).collect::<Vec<_>>(), vec![phase.alpha]);
        assert!(graph.has_edge(b, c));
        // A lost its only in-phase successor
        assert!(graph.has_edge(a, phase.beta));
        assert_eq!(graph.context(b).unwrap().kind, ContextKind::Intrusive);
    }

    #[test]
    fn test_contradictory_relation_rejected() {
        let mut graph = chain();
        let before = graph.clone();
        let err = graph.add_stratigraphic_relation("A", "C").unwrap_err();
        assert!(err.is_integrity());
        assert_eq!(graph, before);
    }

    #[test]
    fn test_remove_relation_repairs() {
        let mut graph = chain();
        let [a, b] = ids(&graph, &["A", "B"])[..] else {
            unreachable!()
        };
        let phase = graph.phase(graph.phase_order()[0]).unwrap().clone();
        graph.remove_stratigraphic_relation("B", "A").unwrap();
        assert!(!graph.has_edge(a, b));
        assert!(graph.has_edge(a, phase.beta));
        assert!(graph.has_edge(phase.alpha, b));
    }

    #[test]
    fn test_repair_is_idempotent() {
        let mut graph = chain();
        let report = graph.repair().unwrap();
        assert!(report.is_noop());
    }

    #[test]
    fn test_first_phase_contraction() {
        let mut graph = ChronologyGraph::build(
            &ModelInput::new()
                .context("X", "1")
                .context("Y", "2")
                .relate("1", "2", GroupRelationship::Gap),
        )
        .unwrap();
        let report = graph.remove_context("X").unwrap();
        assert_eq!(report.contracted_phases, vec!["1".to_string()]);
        assert!(report.notices.is_empty());
        assert_eq!(graph.phase_labels(), vec!["2"]);
        assert!(graph.relationships().is_empty());
        // a_2, Y, b_2
        assert_eq!(graph.node_count(), 3);
        assert!(graph.violations().is_empty());
    }

    #[test]
    fn test_interior_contraction_of_abutting_chain_splits_boundary() {
        let mut graph = ChronologyGraph::build(
            &ModelInput::new()
                .context("X", "1")
                .context("Y", "2")
                .context("Z", "3")
                .relate("1", "2", GroupRelationship::Abutting)
                .relate("2", "3", GroupRelationship::Abutting),
        )
        .unwrap();

        let report = graph.remove_context("Y").unwrap();
        assert_eq!(graph.phase_labels(), vec!["1", "3"]);
        assert_eq!(graph.relationships(), &[GroupRelationship::Gap]);
        assert_eq!(
            report.notices,
            vec![MaintenanceNotice::RelationshipAssumed {
                older: "1".to_string(),
                younger: "3".to_string(),
                relationship: GroupRelationship::Gap,
            }]
        );

        let p1 = graph.phase(graph.phase_order()[0]).unwrap();
        let p3 = graph.phase(graph.phase_order()[1]).unwrap();
        assert_ne!(p1.beta, p3.alpha);
        assert!(graph.has_edge(p1.beta, p3.alpha));
        assert_eq!(graph.node_label(p1.beta), "b_1");
        assert_eq!(graph.node_label(p3.alpha), "a_3");
        assert!(graph.violations().is_empty());
    }
}
