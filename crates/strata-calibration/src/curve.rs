//! Calibration curve table and likelihood evaluation

use crate::CurveError;
use std::f64::consts::PI;

/// Floor applied to every likelihood value
///
/// Proposals far outside any plausible calendar range are routine for the
/// sampler; they get this density instead of an error or a zero that would
/// make likelihood ratios undefined.
pub const MIN_DENSITY: f64 = 1e-300;

/// Calendar year of radiocarbon "present" (0 BP)
const PRESENT_YEAR: f64 = 1950.0;

/// A calibration curve resampled to one row per calendar year
///
/// Row `i` holds the curve for calendar year `first_year + i`. The table is
/// immutable once built and is shared read-only between chains.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationCurve {
    name: String,
    first_year: i32,
    ages: Vec<f64>,
    errors: Vec<f64>,
}

impl CalibrationCurve {
    /// Build a curve from `(calendar_year, radiocarbon_age, error)` points
    ///
    /// Points may come in any order and at any spacing; the curve is
    /// linearly interpolated onto every whole calendar year inside the span.
    ///
    /// # Errors
    ///
    /// `CurveError::InvalidCurve` if fewer than two points are given, a value
    /// is not finite, an error is negative, two points share a year, or the
    /// span contains no whole year.
    pub fn from_points(
        name: impl Into<String>,
        points: &[(f64, f64, f64)],
    ) -> Result<Self, CurveError> {
        let name = name.into();
        if points.len() < 2 {
            return Err(CurveError::InvalidCurve(format!(
                "curve '{}' needs at least two points, got {}",
                name,
                points.len()
            )));
        }

        let mut sorted = points.to_vec();
        for &(year, age, error) in &sorted {
            if !year.is_finite() || !age.is_finite() || !error.is_finite() || error < 0.0 {
                return Err(CurveError::InvalidCurve(format!(
                    "curve '{}' has an invalid point ({}, {}, {})",
                    name, year, age, error
                )));
            }
        }
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        if let Some(pair) = sorted.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(CurveError::InvalidCurve(format!(
                "curve '{}' has two points for year {}",
                name, pair[0].0
            )));
        }

        let first = sorted[0].0.ceil();
        let last = sorted[sorted.len() - 1].0.floor();
        if last < first {
            return Err(CurveError::InvalidCurve(format!(
                "curve '{}' does not span a whole calendar year",
                name
            )));
        }

        let rows = (last - first) as usize + 1;
        let mut ages = Vec::with_capacity(rows);
        let mut errors = Vec::with_capacity(rows);

        let mut segment = 0;
        for i in 0..rows {
            let year = first + i as f64;
            while segment + 2 < sorted.len() && sorted[segment + 1].0 < year {
                segment += 1;
            }
            let (x0, a0, e0) = sorted[segment];
            let (x1, a1, e1) = sorted[segment + 1];
            let t = ((year - x0) / (x1 - x0)).clamp(0.0, 1.0);
            ages.push(a0 + t * (a1 - a0));
            errors.push(e0 + t * (e1 - e0));
        }

        Ok(Self {
            name,
            first_year: first as i32,
            ages,
            errors,
        })
    }

    /// Parse a curve in the IntCal `.14c` text layout
    ///
    /// Lines starting with `#` and blank lines are ignored. Every other line
    /// is `calBP, 14C age, error[, further columns]`.
    pub fn parse_14c(name: impl Into<String>, text: &str) -> Result<Self, CurveError> {
        let mut points = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() < 3 {
                return Err(CurveError::Parse {
                    line: idx + 1,
                    message: format!("expected at least 3 columns, found {}", fields.len()),
                });
            }

            let mut values = [0.0_f64; 3];
            for (slot, field) in values.iter_mut().zip(&fields) {
                *slot = field.parse::<f64>().map_err(|e| CurveError::Parse {
                    line: idx + 1,
                    message: format!("'{}': {}", field, e),
                })?;
            }

            let [cal_bp, age, error] = values;
            points.push((PRESENT_YEAR - cal_bp, age, error));
        }

        Self::from_points(name, &points)
    }

    /// Curve name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Earliest calendar year covered
    pub fn first_year(&self) -> i32 {
        self.first_year
    }

    /// Latest calendar year covered
    pub fn last_year(&self) -> i32 {
        self.first_year + self.ages.len() as i32 - 1
    }

    /// Number of rows (calendar years)
    pub fn len(&self) -> usize {
        self.ages.len()
    }

    /// Whether the table is empty (never true for a constructed curve)
    pub fn is_empty(&self) -> bool {
        self.ages.is_empty()
    }

    /// The calendar-year ↔ (age, error) columns, earliest year first
    pub fn rows(&self) -> impl Iterator<Item = (i32, f64, f64)> + '_ {
        self.ages
            .iter()
            .zip(&self.errors)
            .enumerate()
            .map(move |(i, (&age, &error))| (self.first_year + i as i32, age, error))
    }

    /// Curve age and error at a (possibly fractional) calendar year
    ///
    /// Returns `None` outside the curve span.
    pub fn interpolate(&self, year: f64) -> Option<(f64, f64)> {
        if !year.is_finite() {
            return None;
        }
        let offset = year - self.first_year as f64;
        if offset < 0.0 || offset > (self.ages.len() - 1) as f64 {
            return None;
        }

        let i = offset.floor() as usize;
        if i + 1 >= self.ages.len() {
            return Some((self.ages[i], self.errors[i]));
        }
        let frac = offset - i as f64;
        let age = self.ages[i] + frac * (self.ages[i + 1] - self.ages[i]);
        let error = self.errors[i] + frac * (self.errors[i + 1] - self.errors[i]);
        Some((age, error))
    }

    /// Density of observing `measured_age ± measured_error` at `calendar_year`
    ///
    /// Unnormalized over calendar years. Clamped below at [`MIN_DENSITY`].
    pub fn likelihood(&self, calendar_year: f64, measured_age: f64, measured_error: f64) -> f64 {
        let log_density = self.log_likelihood(calendar_year, measured_age, measured_error);
        if log_density <= MIN_DENSITY.ln() {
            return MIN_DENSITY;
        }
        log_density.exp().max(MIN_DENSITY)
    }

    /// Natural log of [`likelihood`](Self::likelihood)
    pub fn log_likelihood(&self, calendar_year: f64, measured_age: f64, measured_error: f64) -> f64 {
        let floor = MIN_DENSITY.ln();
        let Some((curve_age, curve_error)) = self.interpolate(calendar_year) else {
            return floor;
        };

        let variance = measured_error * measured_error + curve_error * curve_error;
        if variance.is_nan() || variance <= 0.0 || !measured_age.is_finite() {
            return floor;
        }

        let diff = measured_age - curve_age;
        let log_density = -diff * diff / (2.0 * variance) - 0.5 * (2.0 * PI * variance).ln();
        log_density.max(floor)
    }

    /// Calendar interval where the curve is within `sigmas` combined
    /// standard deviations of the measurement
    ///
    /// Returns `None` when no calendar year on the curve is that close.
    pub fn calendar_range_for(&self, measured_age: f64, measured_error: f64, sigmas: f64) -> Option<(f64, f64)> {
        let mut range: Option<(f64, f64)> = None;

        for (year, age, error) in self.rows() {
            let sd = (measured_error * measured_error + error * error).sqrt();
            if (measured_age - age).abs() <= sigmas * sd {
                let year = year as f64;
                range = Some(match range {
                    Some((lo, hi)) => (lo.min(year), hi.max(year)),
                    None => (year, year),
                });
            }
        }

        range
    }
}
