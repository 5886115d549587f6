//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model could not be built or edited
    #[error("Model error: {0}")]
    Graph(#[from] strata_graph::GraphError),

    /// Calibration curve error
    #[error("Curve error: {0}")]
    Curve(#[from] strata_calibration::CurveError),

    /// Sampling error
    #[error("Sampling error: {0}")]
    Sampler(#[from] strata_sampler::SamplerError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
