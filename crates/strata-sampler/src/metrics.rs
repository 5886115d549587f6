//! Counters collected during a sampling run

use serde::{Deserialize, Serialize};

/// Metrics collected during a chain
///
/// Tracks proposals, acceptances and why rejected proposals were rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Sweeps completed
    pub sweeps: usize,

    /// Single-node proposals made
    pub proposals: usize,

    /// Proposals accepted
    pub accepted: usize,

    /// Proposals rejected for breaking the ordering
    pub rejected_order: usize,

    /// Proposals rejected by the likelihood ratio
    pub rejected_likelihood: usize,

    /// Wall-clock time of the run in seconds
    pub elapsed_secs: f64,
}

impl RunMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one proposal and its outcome
    pub fn record_proposal(&mut self, outcome: ProposalOutcome) {
        self.proposals += 1;
        match outcome {
            ProposalOutcome::Accepted => self.accepted += 1,
            ProposalOutcome::OrderViolation => self.rejected_order += 1,
            ProposalOutcome::Likelihood => self.rejected_likelihood += 1,
        }
    }

    /// Record a sweep completion
    pub fn record_sweep(&mut self) {
        self.sweeps += 1;
    }

    /// Fraction of proposals accepted
    pub fn acceptance_rate(&self) -> f64 {
        if self.proposals == 0 {
            0.0
        } else {
            self.accepted as f64 / self.proposals as f64
        }
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        [
            "Sampling Metrics Summary".to_string(),
            "========================".to_string(),
            format!("Sweeps: {}", self.sweeps),
            format!("Proposals: {}", self.proposals),
            format!(
                "Accepted: {} ({:.1}%)",
                self.accepted,
                self.acceptance_rate() * 100.0
            ),
            format!("Rejected (ordering): {}", self.rejected_order),
            format!("Rejected (likelihood): {}", self.rejected_likelihood),
            format!("Runtime: {:.2}s", self.elapsed_secs),
        ]
        .join("\n")
    }
}

/// What happened to a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalOutcome {
    /// Moved to the proposed date
    Accepted,
    /// Outside the window its neighbours allow
    OrderViolation,
    /// Lost the Metropolis draw
    Likelihood,
}
