//! Graph construction from validated input tables

use crate::maintenance::{apply_kind, repair_floating};
use crate::{ChronologyGraph, ContextNode, GraphError, ModelInput, NodeData, PhaseId};
use std::collections::{HashMap, HashSet};
use strata_domain::{ContextKind, GroupRelationship};

impl ChronologyGraph {
    /// Build the graph for a model
    ///
    /// Phases are chained by the declared group relationships; contexts are
    /// bound to their phase boundaries, stratigraphic relations become
    /// edges, floating contexts are attached to alpha and beta, and finally
    /// residual and intrusive kinds are applied.
    ///
    /// # Errors
    ///
    /// `GraphError::MalformedInput` for duplicate or unknown labels,
    /// undefined groups, self relations, invalid measurements, phase
    /// relationships that are not a single chain, or cyclic stratigraphy.
    pub fn build(input: &ModelInput) -> Result<Self, GraphError> {
        check_contexts(input)?;
        let (phase_labels, relationships) = phase_chain(input)?;

        let mut graph = ChronologyGraph::new();
        let mut phase_ids: HashMap<&str, PhaseId> = HashMap::new();

        for (i, label) in phase_labels.iter().enumerate() {
            let alpha = match i.checked_sub(1) {
                Some(prev) if relationships[prev] == GroupRelationship::Abutting => {
                    // Abutting phases share one boundary node
                    let prev_id = phase_ids[phase_labels[prev].as_str()];
                    graph
                        .phase(prev_id)
                        .map(|p| p.beta)
                        .ok_or_else(|| GraphError::MalformedInput(label.clone()))?
                }
                _ => graph.add_boundary(),
            };
            let beta = graph.add_boundary();
            let id = graph.add_phase(label.clone(), alpha, beta);
            phase_ids.insert(label.as_str(), id);
        }

        for (i, relationship) in relationships.iter().enumerate() {
            let older = graph.phase(phase_ids[phase_labels[i].as_str()]).cloned();
            let younger = graph.phase(phase_ids[phase_labels[i + 1].as_str()]).cloned();
            let (Some(older), Some(younger)) = (older, younger) else {
                continue;
            };
            match relationship {
                GroupRelationship::Abutting => {}
                GroupRelationship::Gap => {
                    graph.add_edge(older.beta, younger.alpha);
                }
                GroupRelationship::Overlap => {
                    graph.add_edge(older.alpha, younger.alpha);
                    graph.add_edge(older.beta, younger.beta);
                }
            }
        }
        *graph.relationships_mut() = relationships;
        graph.rederive_boundary_attributes();

        for record in &input.contexts {
            graph.add_node(NodeData::Context(ContextNode {
                label: record.label.clone(),
                phase: phase_ids[record.phase.as_str()],
                kind: ContextKind::Normal,
                measurement: record.measurement,
            }));
        }

        for relation in &input.stratigraphy {
            let below = graph.context_id(&relation.below);
            let above = graph.context_id(&relation.above);
            if let (Some(below), Some(above)) = (below, above) {
                graph.add_edge(below, above);
            }
        }

        repair_floating(&mut graph);

        if let Err(stuck) = graph.topological_order() {
            let labels: Vec<String> = stuck
                .into_iter()
                .filter_map(|n| graph.context(n).map(|c| c.label.clone()))
                .collect();
            return Err(GraphError::MalformedInput(format!(
                "stratigraphy contains a cycle through {}",
                labels.join(", ")
            )));
        }

        for record in &input.contexts {
            if record.kind != ContextKind::Normal {
                if let Some(id) = graph.context_id(&record.label) {
                    apply_kind(&mut graph, id, record.kind);
                }
            }
        }

        graph
            .check_invariants()
            .map_err(|e| GraphError::MalformedInput(e.to_string()))?;

        tracing::info!(
            "Built chronology graph: {} contexts, {} phases, {} edges",
            graph.context_count(),
            graph.phase_count(),
            graph.edge_count()
        );
        Ok(graph)
    }
}

fn check_contexts(input: &ModelInput) -> Result<(), GraphError> {
    if input.contexts.is_empty() {
        return Err(GraphError::MalformedInput("no contexts".to_string()));
    }

    let mut seen = HashSet::new();
    for record in &input.contexts {
        if record.label.trim().is_empty() {
            return Err(GraphError::MalformedInput("empty context label".to_string()));
        }
        if record.phase.trim().is_empty() {
            return Err(GraphError::MalformedInput(format!(
                "context '{}' has no phase",
                record.label
            )));
        }
        if !seen.insert(record.label.as_str()) {
            return Err(GraphError::MalformedInput(format!(
                "duplicate context label '{}'",
                record.label
            )));
        }
        if let Some(m) = &record.measurement {
            if !m.is_valid() {
                return Err(GraphError::MalformedInput(format!(
                    "context '{}' has an invalid measurement ({} ± {})",
                    record.label, m.age, m.error
                )));
            }
        }
    }

    for relation in &input.stratigraphy {
        for label in [&relation.above, &relation.below] {
            if !seen.contains(label.as_str()) {
                return Err(GraphError::MalformedInput(format!(
                    "stratigraphic relation mentions unknown context '{}'",
                    label
                )));
            }
        }
        if relation.above == relation.below {
            return Err(GraphError::MalformedInput(format!(
                "context '{}' is related to itself",
                relation.above
            )));
        }
    }

    Ok(())
}

/// Order the phases oldest first by walking the relationship chain
fn phase_chain(input: &ModelInput) -> Result<(Vec<String>, Vec<GroupRelationship>), GraphError> {
    let mut groups: Vec<&str> = Vec::new();
    for record in &input.contexts {
        if !groups.contains(&record.phase.as_str()) {
            groups.push(&record.phase);
        }
    }

    let mut next: HashMap<&str, (&str, GroupRelationship)> = HashMap::new();
    let mut has_older: HashSet<&str> = HashSet::new();
    for rel in &input.group_relationships {
        for label in [&rel.older, &rel.younger] {
            if !groups.contains(&label.as_str()) {
                return Err(GraphError::MalformedInput(format!(
                    "relationship mentions undefined group '{}'",
                    label
                )));
            }
        }
        if rel.older == rel.younger {
            return Err(GraphError::MalformedInput(format!(
                "group '{}' is related to itself",
                rel.older
            )));
        }
        if next
            .insert(&rel.older, (&rel.younger, rel.relationship))
            .is_some()
        {
            return Err(GraphError::MalformedInput(format!(
                "group '{}' has more than one younger neighbour",
                rel.older
            )));
        }
        if !has_older.insert(&rel.younger) {
            return Err(GraphError::MalformedInput(format!(
                "group '{}' has more than one older neighbour",
                rel.younger
            )));
        }
    }

    let oldest: Vec<&str> = groups
        .iter()
        .copied()
        .filter(|g| !has_older.contains(g))
        .collect();
    let [first] = oldest.as_slice() else {
        return Err(GraphError::MalformedInput(format!(
            "group relationships must form one chain over all groups; unlinked groups: {}",
            oldest.join(", ")
        )));
    };

    let mut labels = vec![first.to_string()];
    let mut relationships = Vec::new();
    let mut current = *first;
    while let Some(&(younger, relationship)) = next.get(current) {
        if labels.iter().any(|l| l == younger) {
            return Err(GraphError::MalformedInput(format!(
                "group relationships loop back to '{}'",
                younger
            )));
        }
        labels.push(younger.to_string());
        relationships.push(relationship);
        current = younger;
    }

    if labels.len() != groups.len() {
        return Err(GraphError::MalformedInput(format!(
            "group relationships cover {} of {} groups",
            labels.len(),
            groups.len()
        )));
    }

    Ok((labels, relationships))
}
