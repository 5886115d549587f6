//! Structural invariant checks
//!
//! Every maintenance edit runs [`ChronologyGraph::check_invariants`] on its
//! scratch copy before swapping it in.

use crate::{ChronologyGraph, GraphError, PhaseId};
use strata_domain::NodeId;
use thiserror::Error;

/// A single broken invariant
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrityViolation {
    /// The listed nodes sit on or behind a directed cycle
    #[error("cycle through {}", format_labels(.0))]
    Cycle(Vec<String>),

    /// A context lost its path from alpha or to beta of its phase
    #[error("context '{context}' is not connected to the {boundary} boundary of phase '{phase}'")]
    Disconnected {
        /// Context label
        context: String,
        /// Phase label
        phase: String,
        /// "alpha" or "beta"
        boundary: &'static str,
    },

    /// Something refers to a phase or boundary that no longer exists
    #[error("dangling phase reference: {0}")]
    DanglingPhase(String),

    /// A boundary node plays no role in any live phase
    #[error("boundary node {0} belongs to no phase")]
    OrphanBoundary(NodeId),

    /// Relationship records do not match the phase sequence
    #[error("{relationships} relationships for {phases} phases")]
    RelationshipCount {
        /// Number of phases
        phases: usize,
        /// Number of relationship records
        relationships: usize,
    },
}

fn format_labels(labels: &[String]) -> String {
    labels.join(", ")
}

impl ChronologyGraph {
    /// Every invariant the graph currently violates
    pub fn violations(&self) -> Vec<IntegrityViolation> {
        let mut violations = Vec::new();

        let expected = self.phase_count().saturating_sub(1);
        if self.relationships().len() != expected {
            violations.push(IntegrityViolation::RelationshipCount {
                phases: self.phase_count(),
                relationships: self.relationships().len(),
            });
        }

        for &p in self.phase_order() {
            match self.phase(p) {
                Some(phase) => {
                    for (role, node) in [("alpha", phase.alpha), ("beta", phase.beta)] {
                        if self.boundary(node).is_none() {
                            violations.push(IntegrityViolation::DanglingPhase(format!(
                                "{} of phase '{}' is not a live boundary",
                                role, phase.label
                            )));
                        }
                    }
                }
                None => violations.push(IntegrityViolation::DanglingPhase(format!(
                    "phase sequence lists removed phase {}",
                    p
                ))),
            }
        }

        for (id, boundary) in self.boundaries() {
            let roles = [boundary.alpha_of, boundary.beta_of];
            if roles.iter().all(Option::is_none) {
                violations.push(IntegrityViolation::OrphanBoundary(id));
            }
            for p in roles.into_iter().flatten() {
                if self.phase_position(p).is_none() {
                    violations.push(IntegrityViolation::DanglingPhase(format!(
                        "boundary {} refers to removed phase {}",
                        self.node_label(id),
                        p
                    )));
                }
            }
        }

        if let Err(stuck) = self.topological_order() {
            violations.push(IntegrityViolation::Cycle(
                stuck.into_iter().map(|n| self.node_label(n)).collect(),
            ));
            // Reachability below is meaningless on a cyclic graph
            return violations;
        }

        violations.extend(self.connectivity_violations());
        violations
    }

    fn connectivity_violations(&self) -> Vec<IntegrityViolation> {
        let mut violations = Vec::new();
        let mut reach: Vec<(PhaseId, Vec<bool>, Vec<bool>)> = Vec::new();

        for (id, ctx) in self.contexts() {
            let Some(phase) = self.phase(ctx.phase) else {
                violations.push(IntegrityViolation::DanglingPhase(format!(
                    "context '{}' belongs to removed phase {}",
                    ctx.label, ctx.phase
                )));
                continue;
            };

            let entry = match reach.iter().position(|(p, _, _)| *p == ctx.phase) {
                Some(i) => &reach[i],
                None => {
                    reach.push((
                        ctx.phase,
                        self.descendants(phase.alpha),
                        self.ancestors(phase.beta),
                    ));
                    &reach[reach.len() - 1]
                }
            };

            if !entry.1[id.index()] {
                violations.push(IntegrityViolation::Disconnected {
                    context: ctx.label.clone(),
                    phase: phase.label.clone(),
                    boundary: "alpha",
                });
            }
            if !entry.2[id.index()] {
                violations.push(IntegrityViolation::Disconnected {
                    context: ctx.label.clone(),
                    phase: phase.label.clone(),
                    boundary: "beta",
                });
            }
        }

        violations
    }

    /// Check every invariant
    ///
    /// # Errors
    ///
    /// `GraphError::Integrity` listing the violations.
    pub fn check_invariants(&self) -> Result<(), GraphError> {
        let violations = self.violations();
        if violations.is_empty() {
            return Ok(());
        }
        let message = violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(GraphError::Integrity(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelInput;

    fn one_phase() -> ChronologyGraph {
        ChronologyGraph::build(
            &ModelInput::new()
                .context("A", "1")
                .context("B", "1")
                .above("B", "A"),
        )
        .unwrap()
    }

    #[test]
    fn test_built_graph_is_clean() {
        let graph = one_phase();
        assert!(graph.violations().is_empty());
        assert!(graph.check_invariants().is_ok());
    }

    #[test]
    fn test_cycle_reported() {
        let mut graph = one_phase();
        let a = graph.context_id("A").unwrap();
        let b = graph.context_id("B").unwrap();
        graph.add_edge(b, a);

        let violations = graph.violations();
        assert!(violations
            .iter()
            .any(|v| matches!(v, IntegrityViolation::Cycle(_))));
        assert!(graph.check_invariants().unwrap_err().is_integrity());
    }

    #[test]
    fn test_disconnection_reported() {
        let mut graph = one_phase();
        let b = graph.context_id("B").unwrap();
        let beta = graph.phase(graph.phase_order()[0]).unwrap().beta;
        graph.remove_edge(b, beta);

        let violations = graph.violations();
        assert!(violations.contains(&IntegrityViolation::Disconnected {
            context: "B".to_string(),
            phase: "1".to_string(),
            boundary: "beta",
        }));
    }

    #[test]
    fn test_relationship_count_reported() {
        let mut graph = one_phase();
        graph
            .relationships_mut()
            .push(strata_domain::GroupRelationship::Gap);
        assert!(graph
            .violations()
            .contains(&IntegrityViolation::RelationshipCount {
                phases: 1,
                relationships: 1
            }));
    }

    #[test]
    fn test_violation_messages() {
        let v = IntegrityViolation::Cycle(vec!["A".to_string(), "B".to_string()]);
        assert_eq!(v.to_string(), "cycle through A, B");
    }
}
