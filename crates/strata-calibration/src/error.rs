//! Error types for calibration curves

use thiserror::Error;

/// Errors that can occur while loading or building a curve
#[derive(Error, Debug)]
pub enum CurveError {
    /// No curve with this name is registered or present on disk
    #[error("Calibration curve not found: {0}")]
    ResourceNotFound(String),

    /// Reading the curve file failed
    #[error("I/O error reading curve: {0}")]
    Io(#[from] std::io::Error),

    /// A row of the curve file could not be parsed
    #[error("Parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// What was wrong with the row
        message: String,
    },

    /// The curve table is unusable (too few rows, duplicate years, bad values)
    #[error("Invalid curve: {0}")]
    InvalidCurve(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
