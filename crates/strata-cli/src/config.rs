//! Configuration management for the CLI.
//!
//! Read from `--config`, `$STRATA_CONFIG` or `./strata.toml`:
//!
//! ```toml
//! [settings]
//! color = true
//! format = "table"
//! curve = "intcal20"
//!
//! [curves]
//! directory = "/opt/curves"
//!
//! [sampler]
//! min_accepted_samples = 20000
//! burn_in = 2000
//! max_sweeps = 5000000
//! ```

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use strata_calibration::CurveConfig;
use strata_sampler::SamplerConfig;

/// File looked for in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "strata.toml";

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Where calibration curves live
    #[serde(default)]
    pub curves: CurveConfig,

    /// Sampler settings; presets and defaults apply when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampler: Option<SamplerConfig>,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Curve used when `run` is not given one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curve: Option<String>,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Load configuration from `path`, or from `./strata.toml` if it exists.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file just yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(CliError::Config(format!(
                        "Config file '{}' not found",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let contents = fs::read_to_string(&path)?;
        let config = Self::from_toml(&contents)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.curves.validate().map_err(CliError::Config)?;
        if let Some(sampler) = &config.sampler {
            sampler.validate().map_err(CliError::Config)?;
        }
        Ok(config)
    }

    /// Save configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
            curve: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
