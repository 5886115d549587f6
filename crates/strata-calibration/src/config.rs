//! Configuration for the curve registry

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where calibration curves are read from
///
/// # Examples
///
/// ```
/// use strata_calibration::CurveConfig;
///
/// let config = CurveConfig::from_toml("directory = \"/opt/curves\"").unwrap();
/// assert_eq!(config.extension, "14c");
/// assert_eq!(config.path_for("intcal20").unwrap().to_str(), Some("/opt/curves/intcal20.14c"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveConfig {
    /// Directory holding one file per curve
    /// Default: `curves` (relative to the working directory)
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// File extension of curve files, without the dot
    /// Default: `14c`
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_directory() -> PathBuf {
    PathBuf::from("curves")
}

fn default_extension() -> String {
    "14c".to_string()
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            extension: default_extension(),
        }
    }
}

impl CurveConfig {
    /// Configuration reading from `directory`
    pub fn with_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.extension.is_empty() {
            return Err("extension must not be empty".to_string());
        }
        if self.extension.contains(['/', '\\', '.']) {
            return Err(format!("extension '{}' must be a bare suffix", self.extension));
        }
        Ok(())
    }

    /// File a curve name resolves to
    ///
    /// Returns `None` for names that are empty or would escape the curve
    /// directory.
    pub fn path_for(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return None;
        }
        Some(self.directory.join(format!("{}.{}", name, self.extension)))
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
