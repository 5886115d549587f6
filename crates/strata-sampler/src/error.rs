//! Error types for sampling runs

use strata_calibration::CurveError;
use strata_domain::RunState;
use thiserror::Error;

/// Errors that can occur while sampling or handling results
#[derive(Error, Debug)]
pub enum SamplerError {
    /// No date assignment satisfies the ordering within the bounds
    #[error("Infeasible model: {0}")]
    InfeasibleModel(String),

    /// The run hit its sweep cap before every node reached the target
    #[error("Iteration limit reached after {sweeps} sweeps ({accepted} of {target} accepted samples)")]
    IterationLimit {
        /// Sweeps completed
        sweeps: usize,
        /// Smallest accepted count over all nodes
        accepted: usize,
        /// Target accepted count
        target: usize,
    },

    /// Results were requested from a run that has not completed
    #[error("Run is not complete (state: {0:?})")]
    IncompleteRun(RunState),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Calibration curve error
    #[error("Calibration error: {0}")]
    Calibration(#[from] CurveError),

    /// A results record could not be read or written
    #[error("Results record error: {0}")]
    Record(String),

    /// Worker error (tokio runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),
}
