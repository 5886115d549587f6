//! Strata Calibration
//!
//! Radiocarbon calibration curves and the likelihood the sampler evaluates.
//!
//! # Overview
//!
//! A calibration curve maps calendar years to the radiocarbon age (and its
//! error) expected for material of that date. Given a measurement, the
//! curve turns it into a likelihood over calendar years:
//!
//! ```text
//! L(year) = N(measured_age; curve_age(year), measured_error² + curve_error(year)²)
//! ```
//!
//! Calendar years run forward in time (`year = 1950 - calBP`), so an earlier
//! date is numerically smaller.
//!
//! # Example Usage
//!
//! ```
//! use strata_calibration::{CalibrationCurve, CurveRegistry};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // A toy linear curve: age falls by one 14C year per calendar year
//! let curve = CalibrationCurve::from_points(
//!     "linear",
//!     &[(0.0, 1950.0, 10.0), (1000.0, 950.0, 10.0)],
//! )?;
//!
//! let registry = CurveRegistry::in_memory();
//! registry.register(curve);
//!
//! let curve = registry.load("linear")?;
//! let at_match = curve.likelihood(500.0, 1450.0, 25.0);
//! let far_away = curve.likelihood(700.0, 1450.0, 25.0);
//! assert!(at_match > far_away);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! Curves are read lazily from a directory of `.14c` files:
//!
//! ```toml
//! [curves]
//! directory = "curves"
//! extension = "14c"
//! ```

#![warn(missing_docs)]

mod config;
mod curve;
mod error;
mod registry;

pub use config::CurveConfig;
pub use curve::{CalibrationCurve, MIN_DENSITY};
pub use error::CurveError;
pub use registry::CurveRegistry;
