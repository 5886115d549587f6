//! Per-node sample traces produced by a run

use crate::posterior::NodeSummary;
use crate::{RunMetrics, SamplerError, SamplingRecord};
use std::collections::BTreeMap;
use strata_domain::{NodeId, NodeKind, RunState};
use strata_graph::ChronologyGraph;
use uuid::Uuid;

/// Samples of one node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeTrace {
    /// Value after every sweep, accepted or not
    pub all: Vec<f64>,

    /// Value after every accepted move
    pub accepted: Vec<f64>,
}

/// Accumulated traces for every context and phase boundary of a run
///
/// Created empty (`NotStarted`), appended to while `Running`, and frozen
/// once `Completed`. Only completed results are serializable.
#[derive(Debug, Clone)]
pub struct SamplingResults {
    run_id: Uuid,
    state: RunState,
    a: f64,
    p: f64,
    burn_in: usize,
    phases: Vec<String>,
    ids: Vec<NodeId>,
    labels: Vec<String>,
    kinds: Vec<NodeKind>,
    traces: Vec<NodeTrace>,
    slots: Vec<Option<usize>>,
    metrics: RunMetrics,
}

impl SamplingResults {
    /// Empty results for every live node of `graph`
    pub fn new(graph: &ChronologyGraph, a: f64, p: f64, burn_in: usize) -> Self {
        let mut results = Self::empty(a, p, burn_in, graph.phase_labels());
        results.slots = vec![None; graph.capacity()];

        // Contexts first, then boundaries, each in id order
        let contexts = graph.contexts().map(|(id, _)| (id, NodeKind::Context));
        let boundaries = graph.boundaries().map(|(id, _)| (id, NodeKind::Boundary));
        for (id, kind) in contexts.chain(boundaries) {
            results.push_node(id, graph.node_label(id), kind);
        }
        results
    }

    fn empty(a: f64, p: f64, burn_in: usize, phases: Vec<String>) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            state: RunState::NotStarted,
            a,
            p,
            burn_in,
            phases,
            ids: Vec::new(),
            labels: Vec::new(),
            kinds: Vec::new(),
            traces: Vec::new(),
            slots: Vec::new(),
            metrics: RunMetrics::new(),
        }
    }

    fn push_node(&mut self, id: NodeId, label: String, kind: NodeKind) {
        if self.slots.len() <= id.index() {
            self.slots.resize(id.index() + 1, None);
        }
        self.slots[id.index()] = Some(self.ids.len());
        self.ids.push(id);
        self.labels.push(label);
        self.kinds.push(kind);
        self.traces.push(NodeTrace::default());
    }

    /// Append a sample for `node`; `accepted` also appends to the accepted trace
    ///
    /// # Errors
    ///
    /// `SamplerError::Record` if the node is unknown or the run is complete.
    pub fn record(&mut self, node: NodeId, value: f64, accepted: bool) -> Result<(), SamplerError> {
        if self.state.is_complete() {
            return Err(SamplerError::Record("results are frozen".to_string()));
        }
        let slot = self
            .slots
            .get(node.index())
            .copied()
            .flatten()
            .ok_or_else(|| SamplerError::Record(format!("unknown node {}", node)))?;

        let trace = &mut self.traces[slot];
        trace.all.push(value);
        if accepted {
            trace.accepted.push(value);
        }
        Ok(())
    }

    /// Mark the run as started
    pub fn start(&mut self) {
        self.state = RunState::Running;
    }

    /// Mark the run as complete and attach its metrics
    pub fn complete(&mut self, metrics: RunMetrics) {
        self.metrics = metrics;
        self.state = RunState::Completed;
    }

    /// Lifecycle state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run identifier
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Sampling bounds `(A, P)`
    pub fn bounds(&self) -> (f64, f64) {
        (self.a, self.p)
    }

    /// Sweeps dropped before summarising
    pub fn burn_in(&self) -> usize {
        self.burn_in
    }

    /// Phase labels, oldest first
    pub fn phases(&self) -> &[String] {
        &self.phases
    }

    /// Counters collected during the run
    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// Trace of a node
    pub fn trace(&self, node: NodeId) -> Option<&NodeTrace> {
        let slot = self.slots.get(node.index()).copied().flatten()?;
        self.traces.get(slot)
    }

    /// Trace of a node by its label
    pub fn trace_by_label(&self, label: &str) -> Option<&NodeTrace> {
        let slot = self.labels.iter().position(|l| l == label)?;
        self.traces.get(slot)
    }

    /// Labels and kinds of every recorded node
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &str, NodeKind)> + '_ {
        self.ids
            .iter()
            .zip(&self.labels)
            .zip(&self.kinds)
            .map(|((&id, label), &kind)| (id, label.as_str(), kind))
    }

    /// Smallest accepted-trace length over all nodes
    pub fn min_accepted(&self) -> usize {
        self.traces.iter().map(|t| t.accepted.len()).min().unwrap_or(0)
    }

    /// Sweeps recorded so far
    pub fn sweeps(&self) -> usize {
        self.traces.first().map_or(0, |t| t.all.len())
    }

    /// Posterior samples: every sweep after burn-in
    pub fn summarize(&self) -> PosteriorSummary {
        let mut summary = PosteriorSummary::default();
        for ((label, kind), trace) in self.labels.iter().zip(&self.kinds).zip(&self.traces) {
            let samples: Vec<f64> = trace.all.iter().skip(self.burn_in).copied().collect();
            match kind {
                NodeKind::Context => summary.contexts.insert(label.clone(), samples),
                NodeKind::Boundary => summary.boundaries.insert(label.clone(), samples),
            };
        }
        summary
    }

    /// Structured record for persistence
    ///
    /// # Errors
    ///
    /// `SamplerError::IncompleteRun` unless the run completed.
    pub fn to_serializable(&self) -> Result<SamplingRecord, SamplerError> {
        if !self.state.is_complete() {
            return Err(SamplerError::IncompleteRun(self.state));
        }

        let mut record = SamplingRecord {
            run_id: Some(self.run_id),
            a: self.a,
            p: self.p,
            burn_in: self.burn_in,
            phases: self.phases.clone(),
            metrics: Some(self.metrics.clone()),
            ..SamplingRecord::default()
        };
        for ((label, kind), trace) in self.labels.iter().zip(&self.kinds).zip(&self.traces) {
            match kind {
                NodeKind::Context => {
                    record.contexts.push(label.clone());
                    record.context_samples.insert(label.clone(), trace.all.clone());
                    record.context_accepted.insert(label.clone(), trace.accepted.clone());
                }
                NodeKind::Boundary => {
                    record.boundaries.push(label.clone());
                    record.boundary_samples.insert(label.clone(), trace.all.clone());
                    record.boundary_accepted.insert(label.clone(), trace.accepted.clone());
                }
            }
        }
        Ok(record)
    }

    /// Rebuild completed results from a record
    ///
    /// Node ids are assigned in record order: contexts, then boundaries.
    pub fn from_record(record: &SamplingRecord) -> Self {
        let mut results = Self::empty(record.a, record.p, record.burn_in, record.phases.clone());
        if let Some(id) = record.run_id {
            results.run_id = id;
        }

        let groups = [
            (&record.contexts, NodeKind::Context, &record.context_samples, &record.context_accepted),
            (&record.boundaries, NodeKind::Boundary, &record.boundary_samples, &record.boundary_accepted),
        ];
        for (labels, kind, samples, accepted) in groups {
            for label in labels {
                let id = NodeId::from_index(results.ids.len());
                results.push_node(id, label.clone(), kind);
                if let Some(trace) = results.traces.last_mut() {
                    trace.all = samples.get(label).cloned().unwrap_or_default();
                    trace.accepted = accepted.get(label).cloned().unwrap_or_default();
                }
            }
        }

        results.metrics = record.metrics.clone().unwrap_or_default();
        results.state = RunState::Completed;
        results
    }
}

/// Burn-in-trimmed posterior samples per node, keyed by label
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PosteriorSummary {
    /// Context samples
    pub contexts: BTreeMap<String, Vec<f64>>,

    /// Phase boundary samples
    pub boundaries: BTreeMap<String, Vec<f64>>,
}

impl PosteriorSummary {
    /// Samples of a context or boundary
    pub fn samples(&self, label: &str) -> Option<&[f64]> {
        self.contexts
            .get(label)
            .or_else(|| self.boundaries.get(label))
            .map(Vec::as_slice)
    }

    /// Statistics for one node
    pub fn node_summary(&self, label: &str, mass: f64) -> Option<NodeSummary> {
        NodeSummary::from_samples(label, self.samples(label)?, mass)
    }

    /// Statistics for every node, contexts first
    pub fn all_summaries(&self, mass: f64) -> Vec<NodeSummary> {
        self.contexts
            .iter()
            .chain(&self.boundaries)
            .filter_map(|(label, samples)| NodeSummary::from_samples(label, samples, mass))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_graph::ModelInput;

    fn graph() -> ChronologyGraph {
        ChronologyGraph::build(&ModelInput::new().context("A", "1")).unwrap()
    }

    #[test]
    fn test_new_registers_contexts_then_boundaries() {
        let results = SamplingResults::new(&graph(), 0.0, 1000.0, 2);
        let labels: Vec<&str> = results.nodes().map(|(_, l, _)| l).collect();
        assert_eq!(labels, vec!["A", "a_1", "b_1"]);
        assert_eq!(results.state(), RunState::NotStarted);
        assert_eq!(results.bounds(), (0.0, 1000.0));
    }

    #[test]
    fn test_record_and_summarize() {
        let g = graph();
        let a = g.context_id("A").unwrap();
        let mut results = SamplingResults::new(&g, 0.0, 1000.0, 2);
        results.start();
        for (i, v) in [10.0, 11.0, 12.0, 13.0].into_iter().enumerate() {
            results.record(a, v, i % 2 == 0).unwrap();
        }

        let trace = results.trace(a).unwrap();
        assert_eq!(trace.all.len(), 4);
        assert_eq!(trace.accepted, vec![10.0, 12.0]);

        let summary = results.summarize();
        assert_eq!(summary.samples("A"), Some(&[12.0, 13.0][..]));
        assert_eq!(summary.samples("a_1"), Some(&[][..]));
    }

    #[test]
    fn test_unknown_node_rejected() {
        let mut results = SamplingResults::new(&graph(), 0.0, 1.0, 0);
        assert!(matches!(
            results.record(NodeId::from_index(99), 1.0, true),
            Err(SamplerError::Record(_))
        ));
    }

    #[test]
    fn test_incomplete_run_not_serializable() {
        let mut results = SamplingResults::new(&graph(), 0.0, 1.0, 0);
        assert!(matches!(
            results.to_serializable(),
            Err(SamplerError::IncompleteRun(RunState::NotStarted))
        ));
        results.start();
        assert!(matches!(
            results.to_serializable(),
            Err(SamplerError::IncompleteRun(RunState::Running))
        ));
    }

    #[test]
    fn test_record_roundtrip_through_from_record() {
        let g = graph();
        let a = g.context_id("A").unwrap();
        let mut results = SamplingResults::new(&g, -100.0, 100.0, 0);
        results.start();
        results.record(a, 5.0, true).unwrap();
        results.complete(RunMetrics::new());

        let record = results.to_serializable().unwrap();
        assert_eq!(record.contexts, vec!["A"]);
        assert_eq!(record.boundaries, vec!["a_1", "b_1"]);

        let restored = SamplingResults::from_record(&record);
        assert_eq!(restored.state(), RunState::Completed);
        assert_eq!(restored.run_id(), results.run_id());
        assert_eq!(restored.trace_by_label("A").unwrap().accepted, vec![5.0]);
        assert!(restored.clone().record(a, 1.0, true).is_err());
    }
}
