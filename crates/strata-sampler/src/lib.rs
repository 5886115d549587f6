//! Strata Sampler
//!
//! Markov chain Monte Carlo over a chronology graph: draws calendar dates
//! for every context and phase boundary that respect the graph's ordering
//! and the calibrated radiocarbon measurements.
//!
//! # Overview
//!
//! - **Sampling**: [`ConstraintSampler`] runs one chain of single-node
//!   Metropolis updates until every node has enough accepted moves
//! - **Parallel chains**: [`ChainWorker`] runs independent chains on the
//!   tokio blocking pool and forwards [`ProgressEvent`]s over a channel
//! - **Results**: [`SamplingResults`] holds per-node traces;
//!   [`SamplingResults::summarize`] drops burn-in and
//!   [`SamplingResults::to_serializable`] produces a [`SamplingRecord`]
//! - **Summaries**: [`NodeSummary`] with mean, median and HPD regions
//!
//! # Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use strata_calibration::CalibrationCurve;
//! use strata_graph::{ChronologyGraph, ModelInput};
//! use strata_sampler::{ConstraintSampler, SamplerConfig, DEFAULT_HPD_MASS};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let curve = Arc::new(CalibrationCurve::from_points(
//!     "linear",
//!     &[(0.0, 1950.0, 10.0), (1000.0, 950.0, 10.0)],
//! )?);
//! let input = ModelInput::new()
//!     .dated_context("A", "1", 1500.0, 25.0)
//!     .dated_context("B", "1", 1400.0, 25.0)
//!     .above("B", "A");
//! let graph = ChronologyGraph::build(&input)?;
//!
//! let config = SamplerConfig {
//!     min_accepted_samples: 1_000,
//!     burn_in: 200,
//!     ..SamplerConfig::quick()
//! }
//! .with_seed(11);
//! let results = ConstraintSampler::new(&graph, curve, config)?.run(&mut |_: f64| {})?;
//!
//! let summary = results.summarize();
//! let b = summary.node_summary("B", DEFAULT_HPD_MASS).expect("B was sampled");
//! assert!(!b.hpd.is_empty());
//!
//! let record = results.to_serializable()?;
//! assert_eq!(record.contexts, vec!["A", "B"]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod metrics;
mod posterior;
mod record;
mod results;
mod sampler;
mod worker;

pub use config::SamplerConfig;
pub use error::SamplerError;
pub use metrics::{ProposalOutcome, RunMetrics};
pub use posterior::{hpd_regions, NodeSummary, DEFAULT_HPD_MASS};
pub use record::SamplingRecord;
pub use results::{NodeTrace, PosteriorSummary, SamplingResults};
pub use sampler::ConstraintSampler;
pub use worker::{ChainWorker, ProgressEvent};
