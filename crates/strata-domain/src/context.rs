//! Context module - the leaf unit of stratigraphy

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a context's stratigraphic position is interpreted
///
/// - Normal: the recorded position is trusted
/// - Residual: the dated material is older than its deposit; the context is
///   bypassed structurally but still carries its likelihood
/// - Intrusive: the dated material is younger than its deposit; nothing
///   below it constrains it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextKind {
    /// Position trusted
    #[default]
    Normal,

    /// Displaced earlier than its true date
    Residual,

    /// Displaced later than its true date
    Intrusive,
}

impl ContextKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextKind::Normal => "normal",
            ContextKind::Residual => "residual",
            ContextKind::Intrusive => "intrusive",
        }
    }

    /// Parse a kind from a string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "normal" => Some(ContextKind::Normal),
            "residual" => Some(ContextKind::Residual),
            "intrusive" => Some(ContextKind::Intrusive),
            _ => None,
        }
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A radiocarbon determination: conventional age (years BP) and 1-sigma error
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Radiocarbon {
    /// Measured radiocarbon age in 14C years BP
    pub age: f64,

    /// One standard deviation, in 14C years
    pub error: f64,
}

impl Radiocarbon {
    /// Create a new measurement
    ///
    /// Returns `None` unless both values are finite and the error is positive.
    pub fn new(age: f64, error: f64) -> Option<Self> {
        if age.is_finite() && error.is_finite() && error > 0.0 {
            Some(Self { age, error })
        } else {
            None
        }
    }

    /// Check the invariants `new` enforces (for deserialized values)
    pub fn is_valid(&self) -> bool {
        self.age.is_finite() && self.error.is_finite() && self.error > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!(ContextKind::parse("Residual"), Some(ContextKind::Residual));
        assert_eq!(ContextKind::parse("INTRUSIVE"), Some(ContextKind::Intrusive));
        assert_eq!(ContextKind::parse("normal"), Some(ContextKind::Normal));
        assert!(ContextKind::parse("displaced").is_none());
    }

    #[test]
    fn test_kind_serde_lowercase() {
        let json = serde_json::to_string(&ContextKind::Residual).unwrap();
        assert_eq!(json, "\"residual\"");
        let kind: ContextKind = serde_json::from_str("\"intrusive\"").unwrap();
        assert_eq!(kind, ContextKind::Intrusive);
    }

    #[test]
    fn test_radiocarbon_validation() {
        assert!(Radiocarbon::new(3000.0, 30.0).is_some());
        assert!(Radiocarbon::new(3000.0, 0.0).is_none());
        assert!(Radiocarbon::new(f64::NAN, 30.0).is_none());

        let bad = Radiocarbon { age: 100.0, error: -1.0 };
        assert!(!bad.is_valid());
    }
}
