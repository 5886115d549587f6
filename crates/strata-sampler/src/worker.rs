//! Parallel independent chains on the blocking thread pool

use crate::{ConstraintSampler, SamplerConfig, SamplerError, SamplingResults};
use std::sync::Arc;
use strata_calibration::CalibrationCurve;
use strata_domain::ProgressSink;
use strata_graph::ChronologyGraph;
use tokio::sync::mpsc;

/// Progress of one chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEvent {
    /// Chain index, from zero
    pub chain: usize,

    /// Percent of the accepted-sample target reached
    pub percent: f64,
}

/// Forwards progress into a channel without ever blocking the chain
struct ChannelSink {
    chain: usize,
    sender: Option<mpsc::Sender<ProgressEvent>>,
}

impl ProgressSink for ChannelSink {
    fn on_progress(&mut self, percent: f64) {
        if let Some(sender) = &self.sender {
            // A full or closed channel drops the event
            let _ = sender.try_send(ProgressEvent {
                chain: self.chain,
                percent,
            });
        }
    }

    fn on_status(&mut self, message: &str) {
        tracing::debug!("Chain {}: {}", self.chain, message);
    }
}

/// Runs several independent chains over the same frozen graph
///
/// Each chain gets its own `spawn_blocking` task. With a configured seed,
/// chain `i` uses `seed + i`, so the whole set is reproducible.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use strata_calibration::CurveRegistry;
/// use strata_graph::{ChronologyGraph, ModelInput};
/// use strata_sampler::{ChainWorker, SamplerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let input = ModelInput::from_json(&std::fs::read_to_string("model.json")?)?;
///     let graph = Arc::new(ChronologyGraph::build(&input)?);
///     let curve = CurveRegistry::in_memory().load("intcal20")?;
///
///     let worker = ChainWorker::new(SamplerConfig::default(), 4);
///     let chains = worker.run(graph, curve, None).await?;
///     println!("{} chains finished", chains.len());
///     Ok(())
/// }
/// ```
pub struct ChainWorker {
    config: SamplerConfig,
    chains: usize,
}

impl ChainWorker {
    /// Create a worker running `chains` chains (at least one)
    pub fn new(config: SamplerConfig, chains: usize) -> Self {
        Self {
            config,
            chains: chains.max(1),
        }
    }

    /// Number of chains this worker runs
    pub fn chains(&self) -> usize {
        self.chains
    }

    /// Run every chain to completion
    ///
    /// Results come back in chain order. Progress events are sent to
    /// `progress` when given.
    ///
    /// # Errors
    ///
    /// The first chain error in chain order, or `SamplerError::Worker` if a
    /// task panicked. No partial results are returned.
    pub async fn run(
        &self,
        graph: Arc<ChronologyGraph>,
        curve: Arc<CalibrationCurve>,
        progress: Option<mpsc::Sender<ProgressEvent>>,
    ) -> Result<Vec<SamplingResults>, SamplerError> {
        self.config.validate().map_err(SamplerError::Config)?;
        tracing::info!("Chain worker started ({} chains)", self.chains);

        let mut handles = Vec::with_capacity(self.chains);
        for chain in 0..self.chains {
            let graph = Arc::clone(&graph);
            let curve = Arc::clone(&curve);
            let mut config = self.config.clone();
            config.seed = config.seed.map(|seed| seed.wrapping_add(chain as u64));
            let mut sink = ChannelSink {
                chain,
                sender: progress.clone(),
            };

            handles.push(tokio::task::spawn_blocking(move || {
                ConstraintSampler::new(&graph, curve, config)?.run(&mut sink)
            }));
        }
        // Only the tasks hold senders now; the receiver sees the channel close when they finish
        drop(progress);

        let mut results = Vec::with_capacity(self.chains);
        for (chain, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(Ok(chain_results)) => {
                    tracing::info!(
                        "Chain {} completed:\n{}",
                        chain,
                        chain_results.metrics().summary()
                    );
                    results.push(chain_results);
                }
                Ok(Err(e)) => {
                    tracing::error!("Chain {} failed: {}", chain, e);
                    return Err(e);
                }
                Err(e) => {
                    tracing::error!("Chain {} task failed: {}", chain, e);
                    return Err(SamplerError::Worker(format!("chain {}: {}", chain, e)));
                }
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_graph::ModelInput;

    fn fixtures() -> (Arc<ChronologyGraph>, Arc<CalibrationCurve>) {
        let graph = ChronologyGraph::build(
            &ModelInput::new()
                .dated_context("A", "1", 1450.0, 25.0)
                .context("B", "1")
                .above("B", "A"),
        )
        .unwrap();
        let curve = CalibrationCurve::from_points(
            "linear",
            &[(0.0, 1950.0, 10.0), (1000.0, 950.0, 10.0)],
        )
        .unwrap();
        (Arc::new(graph), Arc::new(curve))
    }

    fn config() -> SamplerConfig {
        SamplerConfig {
            min_accepted_samples: 500,
            burn_in: 50,
            progress_interval_percent: 50.0,
            ..SamplerConfig::quick()
        }
        .with_bounds(0.0, 1000.0)
        .with_seed(7)
    }

    #[tokio::test]
    async fn test_runs_every_chain() {
        let (graph, curve) = fixtures();
        let worker = ChainWorker::new(config(), 3);
        let results = worker.run(graph, curve, None).await.unwrap();

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.state().is_complete()));
        assert!(results.iter().all(|r| r.min_accepted() >= 500));
        // Different seeds, different chains
        assert_ne!(
            results[0].trace_by_label("A").unwrap(),
            results[1].trace_by_label("A").unwrap()
        );
    }

    #[tokio::test]
    async fn test_progress_events_reach_the_channel() {
        let (graph, curve) = fixtures();
        let (tx, mut rx) = mpsc::channel(64);
        let worker = ChainWorker::new(config(), 2);
        worker.run(graph, curve, Some(tx)).await.unwrap();

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        for chain in 0..2 {
            assert!(events
                .iter()
                .any(|e| e.chain == chain && e.percent == 100.0));
        }
    }

    #[tokio::test]
    async fn test_chain_error_is_returned() {
        let (graph, curve) = fixtures();
        let worker = ChainWorker::new(config().with_bounds(10.0, 10.0), 2);
        assert!(matches!(
            worker.run(graph, curve, None).await,
            Err(SamplerError::InfeasibleModel(_))
        ));
    }

    #[test]
    fn test_at_least_one_chain() {
        assert_eq!(ChainWorker::new(SamplerConfig::default(), 0).chains(), 1);
    }
}
