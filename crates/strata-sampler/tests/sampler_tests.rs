//! End-to-end sampling over built graphs

use std::sync::Arc;
use strata_calibration::CalibrationCurve;
use strata_domain::{GroupRelationship, NoProgress, RunState};
use strata_graph::{ChronologyGraph, ModelInput};
use strata_sampler::{
    ConstraintSampler, SamplerConfig, SamplerError, SamplingRecord, SamplingResults,
    DEFAULT_HPD_MASS,
};

fn linear_curve() -> Arc<CalibrationCurve> {
    // age = 1950 - year over years 0..=1000
    Arc::new(
        CalibrationCurve::from_points("linear", &[(0.0, 1950.0, 10.0), (1000.0, 950.0, 10.0)])
            .unwrap(),
    )
}

fn config(target: usize) -> SamplerConfig {
    SamplerConfig {
        min_accepted_samples: target,
        burn_in: target / 5,
        ..SamplerConfig::quick()
    }
    .with_bounds(0.0, 1000.0)
    .with_seed(2024)
}

fn two_phase_model() -> ModelInput {
    ModelInput::new()
        .dated_context("A", "1", 1600.0, 30.0)
        .dated_context("B", "1", 1500.0, 30.0)
        .context("C", "1")
        .dated_context("D", "2", 1300.0, 30.0)
        .context("E", "2")
        .above("B", "A")
        .above("E", "D")
        .relate("1", "2", GroupRelationship::Gap)
}

#[test]
fn test_every_joint_sample_respects_every_edge() {
    let graph = ChronologyGraph::build(&two_phase_model()).unwrap();
    let results = ConstraintSampler::new(&graph, linear_curve(), config(2_000))
        .unwrap()
        .run(&mut NoProgress)
        .unwrap();

    let sweeps = results.sweeps();
    assert!(sweeps >= 2_000);
    for (from, to) in graph.edges() {
        let early = &results.trace(from).unwrap().all;
        let late = &results.trace(to).unwrap().all;
        assert_eq!(early.len(), sweeps);
        for k in 0..sweeps {
            assert!(
                early[k] <= late[k],
                "sweep {}: {} ({}) after {} ({})",
                k,
                graph.node_label(from),
                early[k],
                graph.node_label(to),
                late[k]
            );
        }
    }
}

#[test]
fn test_single_measurement_concentrates_on_calibrated_year() {
    let graph =
        ChronologyGraph::build(&ModelInput::new().dated_context("A", "1", 1450.0, 25.0)).unwrap();
    let results = ConstraintSampler::new(&graph, linear_curve(), config(5_000))
        .unwrap()
        .run(&mut NoProgress)
        .unwrap();

    let summary = results
        .summarize()
        .node_summary("A", DEFAULT_HPD_MASS)
        .unwrap();
    assert!((summary.mean - 500.0).abs() < 15.0, "mean {}", summary.mean);
    assert!(summary.std_dev > 10.0 && summary.std_dev < 50.0);
    let (lo, hi) = (summary.hpd[0].0, summary.hpd[summary.hpd.len() - 1].1);
    assert!(lo > 400.0 && hi < 600.0, "hpd {:?}", summary.hpd);
}

#[test]
fn test_measurement_near_a_bound_is_pulled_inward() {
    // Year 100 with a combined sd of about 61, 1.6 sd above A = 0. The
    // likelihood truncated at A has mean ~106.7; the boundaries either side
    // add a (t - A)(P - t) prior, which moves the exact posterior mean to
    // ~131.7 with sd ~51.8.
    let graph =
        ChronologyGraph::build(&ModelInput::new().dated_context("A", "1", 1850.0, 60.0)).unwrap();
    let sampler = ConstraintSampler::new(&graph, linear_curve(), config(20_000)).unwrap();
    assert_eq!(sampler.crowded_contexts().unwrap(), vec!["A"]);

    let results = sampler.run(&mut NoProgress).unwrap();
    let summary = results
        .summarize()
        .node_summary("A", DEFAULT_HPD_MASS)
        .unwrap();
    assert!(
        summary.mean > 118.0 && summary.mean < 146.0,
        "mean {}",
        summary.mean
    );
    assert!(
        summary.std_dev > 40.0 && summary.std_dev < 60.0,
        "sd {}",
        summary.std_dev
    );
}

#[test]
fn test_every_node_reaches_the_target() {
    let graph = ChronologyGraph::build(&two_phase_model()).unwrap();
    let results = ConstraintSampler::new(&graph, linear_curve(), config(1_000))
        .unwrap()
        .run(&mut NoProgress)
        .unwrap();

    assert_eq!(results.state(), RunState::Completed);
    for (id, label, _) in results.nodes() {
        assert!(
            results.trace(id).unwrap().accepted.len() >= 1_000,
            "{} under target",
            label
        );
    }
    assert_eq!(results.metrics().sweeps, results.sweeps());
    assert!(results.metrics().acceptance_rate() > 0.0);
}

#[test]
fn test_posterior_drops_burn_in() {
    let graph = ChronologyGraph::build(&two_phase_model()).unwrap();
    let results = ConstraintSampler::new(&graph, linear_curve(), config(1_000))
        .unwrap()
        .run(&mut NoProgress)
        .unwrap();

    let summary = results.summarize();
    let all = &results.trace_by_label("C").unwrap().all;
    assert_eq!(summary.samples("C").unwrap(), &all[results.burn_in()..]);
    assert!(summary.samples("a_1").is_some());
    assert!(summary.samples("b_2").is_some());
}

#[test]
fn test_record_survives_json() {
    let graph = ChronologyGraph::build(&two_phase_model()).unwrap();
    let results = ConstraintSampler::new(&graph, linear_curve(), config(500))
        .unwrap()
        .run(&mut NoProgress)
        .unwrap();

    let record = results.to_serializable().unwrap();
    assert_eq!(record.contexts, vec!["A", "B", "C", "D", "E"]);
    assert_eq!(record.phases, vec!["1", "2"]);
    assert_eq!((record.a, record.p), (0.0, 1000.0));

    let (loaded, diagnostics) = SamplingRecord::from_json(&record.to_json().unwrap()).unwrap();
    assert!(diagnostics.is_empty());
    let restored = SamplingResults::from_record(&loaded).summarize();
    let original = results.summarize();
    for (label, samples) in original.contexts.iter().chain(&original.boundaries) {
        let reloaded = restored.samples(label).unwrap();
        assert_eq!(reloaded.len(), samples.len());
        assert!(reloaded
            .iter()
            .zip(samples)
            .all(|(x, y)| (x - y).abs() <= 1e-9 * y.abs().max(1.0)));
    }
}

#[test]
fn test_cap_too_low_fails_without_results() {
    let graph = ChronologyGraph::build(&two_phase_model()).unwrap();
    let config = SamplerConfig {
        max_sweeps: 1_000,
        ..config(1_000)
    };
    let outcome = ConstraintSampler::new(&graph, linear_curve(), config)
        .unwrap()
        .run(&mut NoProgress);
    assert!(matches!(outcome, Err(SamplerError::IterationLimit { .. })));
}

#[test]
fn test_status_lines_bracket_the_run() {
    struct Recorder {
        statuses: Vec<String>,
        ticks: usize,
    }
    impl strata_domain::ProgressSink for Recorder {
        fn on_progress(&mut self, _percent: f64) {
            self.ticks += 1;
        }
        fn on_status(&mut self, message: &str) {
            self.statuses.push(message.to_string());
        }
    }

    let graph =
        ChronologyGraph::build(&ModelInput::new().dated_context("A", "1", 1450.0, 25.0)).unwrap();
    let mut recorder = Recorder {
        statuses: Vec::new(),
        ticks: 0,
    };
    ConstraintSampler::new(&graph, linear_curve(), config(500))
        .unwrap()
        .run(&mut recorder)
        .unwrap();

    assert_eq!(recorder.statuses.len(), 2);
    assert!(recorder.statuses[0].starts_with("Sampling 3 nodes"));
    assert!(recorder.statuses[1].starts_with("Sampling finished"));
    assert!(recorder.ticks >= 1 && recorder.ticks <= 10);

    let graph =
        ChronologyGraph::build(&ModelInput::new().dated_context("A", "1", 1850.0, 60.0)).unwrap();
    let mut recorder = Recorder {
        statuses: Vec::new(),
        ticks: 0,
    };
    ConstraintSampler::new(&graph, linear_curve(), config(500))
        .unwrap()
        .run(&mut recorder)
        .unwrap();

    assert_eq!(recorder.statuses.len(), 3);
    assert!(recorder.statuses[1].starts_with("Context 'A' reaches the sampling bounds"));
}
