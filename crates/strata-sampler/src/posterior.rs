//! Posterior summaries: moments and highest posterior density regions

use serde::{Deserialize, Serialize};

/// Default probability mass for HPD regions
pub const DEFAULT_HPD_MASS: f64 = 0.95;

/// Summary statistics of one node's posterior samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSummary {
    /// Node label
    pub label: String,

    /// Number of samples summarised
    pub samples: usize,

    /// Sample mean (calendar year)
    pub mean: f64,

    /// Sample median (calendar year)
    pub median: f64,

    /// Sample standard deviation (years)
    pub std_dev: f64,

    /// Probability mass the HPD regions cover
    pub mass: f64,

    /// Disjoint HPD intervals, earliest first
    pub hpd: Vec<(f64, f64)>,
}

impl NodeSummary {
    /// Summarise samples; `None` if there are none
    pub fn from_samples(label: &str, samples: &[f64], mass: f64) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Some(Self {
            label: label.to_string(),
            samples: samples.len(),
            mean,
            median,
            std_dev: variance.sqrt(),
            mass,
            hpd: hpd_regions(&sorted, mass),
        })
    }

    /// Total width of the HPD regions in years
    pub fn hpd_width(&self) -> f64 {
        self.hpd.iter().map(|(lo, hi)| hi - lo).sum()
    }
}

/// Highest posterior density regions from a histogram of the samples
///
/// Bins are one year wide (wider for very long spans, at most 5,000 bins).
/// The densest bins are taken until `mass` of the samples is covered, then
/// adjacent bins are merged into intervals. Several intervals come back for
/// multimodal posteriors.
pub fn hpd_regions(samples: &[f64], mass: f64) -> Vec<(f64, f64)> {
    let finite: Vec<f64> = samples.iter().copied().filter(|x| x.is_finite()).collect();
    if finite.is_empty() {
        return Vec::new();
    }
    let lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = hi - lo;
    if span <= 0.0 {
        return vec![(lo, hi)];
    }

    let width = (span / 5_000.0).max(1.0);
    let bins = (span / width).floor() as usize + 1;
    let mut counts = vec![0usize; bins];
    for x in &finite {
        let i = (((x - lo) / width).floor() as usize).min(bins - 1);
        counts[i] += 1;
    }

    let mut order: Vec<usize> = (0..bins).collect();
    // Densest first; ties go to the earlier bin so results are stable
    order.sort_by(|&a, &b| counts[b].cmp(&counts[a]).then(a.cmp(&b)));

    let needed = (mass.clamp(0.0, 1.0) * finite.len() as f64).ceil() as usize;
    let mut selected = vec![false; bins];
    let mut covered = 0;
    for i in order {
        if covered >= needed || counts[i] == 0 {
            break;
        }
        selected[i] = true;
        covered += counts[i];
    }

    let mut regions = Vec::new();
    let mut start: Option<usize> = None;
    for i in 0..=bins {
        let inside = i < bins && selected[i];
        match (inside, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                let region_lo = lo + s as f64 * width;
                let region_hi = (lo + i as f64 * width).min(hi);
                regions.push((region_lo, region_hi));
                start = None;
            }
            _ => {}
        }
    }
    regions
}
