//! Serializable results record and its tolerant load path

use crate::{RunMetrics, SamplerError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

const KNOWN_KEYS: &[&str] = &[
    "run_id",
    "contexts",
    "boundaries",
    "phases",
    "context_samples",
    "context_accepted",
    "boundary_samples",
    "boundary_accepted",
    "A",
    "P",
    "burn_in",
    "metrics",
];

/// The shape downstream consumers (density plots, HPD tables) read
///
/// Sample arrays are keyed by node label. `*_samples` hold the value after
/// every sweep and `*_accepted` the accepted moves only; the posterior is
/// `*_samples` with the first `burn_in` entries dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplingRecord {
    /// Run identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,

    /// Context labels
    pub contexts: Vec<String>,

    /// Boundary labels
    #[serde(default)]
    pub boundaries: Vec<String>,

    /// Phase labels, oldest first
    #[serde(default)]
    pub phases: Vec<String>,

    /// Every-sweep samples per context
    #[serde(default)]
    pub context_samples: BTreeMap<String, Vec<f64>>,

    /// Accepted samples per context
    #[serde(default)]
    pub context_accepted: BTreeMap<String, Vec<f64>>,

    /// Every-sweep samples per boundary
    #[serde(default)]
    pub boundary_samples: BTreeMap<String, Vec<f64>>,

    /// Accepted samples per boundary
    #[serde(default)]
    pub boundary_accepted: BTreeMap<String, Vec<f64>>,

    /// Lower sampling bound
    #[serde(rename = "A")]
    pub a: f64,

    /// Upper sampling bound
    #[serde(rename = "P")]
    pub p: f64,

    /// Sweeps to drop before summarising
    #[serde(default)]
    pub burn_in: usize,

    /// Run counters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<RunMetrics>,
}

impl SamplingRecord {
    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, SamplerError> {
        serde_json::to_string_pretty(self).map_err(|e| SamplerError::Record(e.to_string()))
    }

    /// Parse a record, tolerating unknown and missing non-critical keys
    ///
    /// Returns the record and one diagnostic per key that was ignored or
    /// defaulted. Diagnostics are also logged as warnings.
    ///
    /// # Errors
    ///
    /// `SamplerError::Record` if the text is not a JSON object or one of
    /// `contexts`, `A`, `P` is missing or unreadable.
    pub fn from_json(json: &str) -> Result<(Self, Vec<String>), SamplerError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| SamplerError::Record(e.to_string()))?;
        let Value::Object(object) = value else {
            return Err(SamplerError::Record("record is not a JSON object".to_string()));
        };

        let mut diagnostics = Vec::new();
        for key in object.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                diagnostics.push(format!("unknown key '{}' ignored", key));
            }
        }

        let record = Self {
            contexts: required(&object, "contexts")?,
            a: required(&object, "A")?,
            p: required(&object, "P")?,
            run_id: optional(&object, "run_id", &mut diagnostics),
            boundaries: optional(&object, "boundaries", &mut diagnostics),
            phases: optional(&object, "phases", &mut diagnostics),
            context_samples: optional(&object, "context_samples", &mut diagnostics),
            context_accepted: optional(&object, "context_accepted", &mut diagnostics),
            boundary_samples: optional(&object, "boundary_samples", &mut diagnostics),
            boundary_accepted: optional(&object, "boundary_accepted", &mut diagnostics),
            burn_in: optional(&object, "burn_in", &mut diagnostics),
            metrics: optional(&object, "metrics", &mut diagnostics),
        };

        for label in &record.contexts {
            if !record.context_samples.contains_key(label) {
                diagnostics.push(format!("no samples for context '{}'", label));
            }
        }

        for diagnostic in &diagnostics {
            tracing::warn!("Results record: {}", diagnostic);
        }
        Ok((record, diagnostics))
    }
}

fn required<T: DeserializeOwned>(object: &Map<String, Value>, key: &str) -> Result<T, SamplerError> {
    let value = object
        .get(key)
        .ok_or_else(|| SamplerError::Record(format!("missing required key '{}'", key)))?;
    serde_json::from_value(value.clone())
        .map_err(|e| SamplerError::Record(format!("key '{}': {}", key, e)))
}

fn optional<T: DeserializeOwned + Default>(
    object: &Map<String, Value>,
    key: &str,
    diagnostics: &mut Vec<String>,
) -> T {
    match object.get(key) {
        None => {
            diagnostics.push(format!("missing key '{}', using default", key));
            T::default()
        }
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            diagnostics.push(format!("key '{}' unreadable ({}), using default", key, e));
            T::default()
        }),
    }
}
