//! Configuration for sampling runs
//!
//! Defines the target sample count, burn-in, proposal width and how the
//! sampling bounds are chosen.

use serde::{Deserialize, Serialize};

/// Configuration for the constraint sampler
///
/// # Examples
///
/// ```
/// use strata_sampler::SamplerConfig;
///
/// // Default configuration (balanced)
/// let config = SamplerConfig::default();
/// assert_eq!(config.burn_in, 10_000);
///
/// // Short runs for checking a model
/// let config = SamplerConfig::quick();
/// assert_eq!(config.min_accepted_samples, 5_000);
///
/// // Long runs for publication
/// let config = SamplerConfig::thorough();
/// assert_eq!(config.min_accepted_samples, 200_000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Accepted moves every node must reach before the run stops
    /// Default: 50,000
    pub min_accepted_samples: usize,

    /// Sweeps dropped from the start of the chain before summarising
    /// Default: 10,000
    pub burn_in: usize,

    /// Half-width of the uniform random-walk proposal, in years
    /// Default: one hundredth of the sampling span, at least one year
    #[serde(default)]
    pub step_width: Option<f64>,

    /// Fixed sampling bounds `[A, P]` in calendar years
    /// Default: derived from the measurements
    #[serde(default)]
    pub bounds: Option<[f64; 2]>,

    /// Standard deviations of each measurement covered by derived bounds
    /// Default: 4.0
    #[serde(default = "default_bound_sigmas")]
    pub bound_sigmas: f64,

    /// Years added on both sides of derived bounds
    /// Default: 500
    #[serde(default = "default_bound_margin")]
    pub bound_margin: f64,

    /// Sweep cap; a run that has not converged by then fails
    /// Default: 10,000,000
    pub max_sweeps: usize,

    /// Report progress every this many percent of the target
    /// Default: 1.0
    #[serde(default = "default_progress_interval")]
    pub progress_interval_percent: f64,

    /// RNG seed for reproducible runs
    /// Default: none (seeded from entropy)
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_bound_sigmas() -> f64 {
    4.0
}

fn default_bound_margin() -> f64 {
    500.0
}

fn default_progress_interval() -> f64 {
    1.0
}

impl Default for SamplerConfig {
    /// Balanced configuration
    ///
    /// - 50,000 accepted samples per node
    /// - 10,000 burn-in sweeps
    /// - Bounds from measurements ± 4σ, widened by 500 years
    fn default() -> Self {
        Self {
            min_accepted_samples: 50_000,
            burn_in: 10_000,
            step_width: None,
            bounds: None,
            bound_sigmas: default_bound_sigmas(),
            bound_margin: default_bound_margin(),
            max_sweeps: 10_000_000,
            progress_interval_percent: default_progress_interval(),
            seed: None,
        }
    }
}

impl SamplerConfig {
    /// Short runs for checking that a model samples at all
    ///
    /// - 5,000 accepted samples per node
    /// - 1,000 burn-in sweeps
    pub fn quick() -> Self {
        Self {
            min_accepted_samples: 5_000,
            burn_in: 1_000,
            max_sweeps: 1_000_000,
            progress_interval_percent: 10.0,
            ..Self::default()
        }
    }

    /// Long runs for final results
    ///
    /// - 200,000 accepted samples per node
    /// - 20,000 burn-in sweeps
    pub fn thorough() -> Self {
        Self {
            min_accepted_samples: 200_000,
            burn_in: 20_000,
            max_sweeps: 50_000_000,
            ..Self::default()
        }
    }

    /// Same configuration with a fixed seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Same configuration with fixed bounds
    pub fn with_bounds(mut self, a: f64, p: f64) -> Self {
        self.bounds = Some([a, p]);
        self
    }

    /// Proposal half-width for a sampling span
    pub fn step_for_span(&self, span: f64) -> f64 {
        self.step_width.unwrap_or_else(|| (span / 100.0).max(1.0))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.min_accepted_samples == 0 {
            return Err("min_accepted_samples must be positive".to_string());
        }
        if self.burn_in >= self.min_accepted_samples {
            return Err(format!(
                "burn_in ({}) must be below min_accepted_samples ({})",
                self.burn_in, self.min_accepted_samples
            ));
        }
        if self.max_sweeps < self.min_accepted_samples {
            return Err(format!(
                "max_sweeps ({}) cannot reach min_accepted_samples ({})",
                self.max_sweeps, self.min_accepted_samples
            ));
        }
        if let Some(w) = self.step_width {
            if !w.is_finite() || w <= 0.0 {
                return Err(format!("step_width must be positive, got {}", w));
            }
        }
        if let Some([a, p]) = self.bounds {
            if !a.is_finite() || !p.is_finite() {
                return Err("bounds must be finite".to_string());
            }
        }
        if !self.bound_sigmas.is_finite() || self.bound_sigmas <= 0.0 {
            return Err("bound_sigmas must be positive".to_string());
        }
        if !self.bound_margin.is_finite() || self.bound_margin < 0.0 {
            return Err("bound_margin must not be negative".to_string());
        }
        if !(self.progress_interval_percent > 0.0 && self.progress_interval_percent <= 100.0) {
            return Err("progress_interval_percent must be in (0, 100]".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
