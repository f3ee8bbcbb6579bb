//! Binning: probability distributions, count histograms, log bin edges.

use crate::error::AnalysisError;
use cwn_core::config::BinType;
use serde::{Deserialize, Serialize};

/// A probability distribution over bins.
///
/// `density` sums to 1 for non-empty input. Empty input gives the degenerate
/// `([], [])` distribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub bin_centers: Vec<f64>,
    pub density: Vec<f64>,
}

impl Distribution {
    /// The degenerate distribution of an empty sample.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.bin_centers.is_empty()
    }
}

/// Raw counts over explicit bin edges (`counts.len() + 1 == bin_edges.len()`
/// unless both are empty).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub bin_edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn bin_centers(&self) -> Vec<f64> {
        self.bin_edges
            .windows(2)
            .map(|w| 0.5 * (w[0] + w[1]))
            .collect()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// `nbins + 1` equal-width edges over `[min, max]`.
///
/// When `min == max` the range is widened to `[min - 0.5, max + 0.5]`.
pub fn linear_edges(min: f64, max: f64, nbins: usize) -> Vec<f64> {
    let (lo, hi) = if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    };
    let width = hi - lo;
    let mut edges: Vec<f64> = (0..nbins)
        .map(|i| lo + width * i as f64 / nbins as f64)
        .collect();
    edges.push(hi);
    edges
}

/// Logarithmic bin edges from `min_value` up to (at least) `max_value`.
///
/// The multiplier is `exp(ln(max / min) / nbins)`; edges are produced by
/// repeated multiplication starting at `min_value` until an edge meets or
/// exceeds `max_value`. The last edge may overshoot `max_value`, and rounding
/// can make the edge count differ from `nbins + 1`.
pub fn log_bins(
    min_value: f64,
    max_value: f64,
    nbins: usize,
) -> Result<Vec<f64>, AnalysisError> {
    if nbins == 0 {
        return Err(AnalysisError::InvalidBinCount);
    }
    let invalid = AnalysisError::InvalidRange {
        min: min_value,
        max: max_value,
    };
    if !min_value.is_finite() || !max_value.is_finite() || min_value <= 0.0 || max_value <= 0.0 {
        return Err(invalid);
    }
    let multiplier = ((max_value / min_value).ln() / nbins as f64).exp();
    // A multiplier of 1 would never reach max_value.
    if !multiplier.is_finite() || (min_value < max_value && multiplier <= 1.0) {
        return Err(invalid);
    }

    let mut edges = vec![min_value];
    let mut edge = min_value;
    while edge < max_value {
        edge *= multiplier;
        edges.push(edge);
    }
    Ok(edges)
}

/// Index of the bin holding `value`. Bins are half-open except the last,
/// which is closed on the right.
fn bin_index(value: f64, edges: &[f64]) -> Option<usize> {
    let nbins = edges.len().checked_sub(1)?;
    if nbins == 0 || value < edges[0] || value > edges[nbins] {
        return None;
    }
    if value == edges[nbins] {
        return Some(nbins - 1);
    }
    Some(edges.partition_point(|e| *e <= value) - 1)
}

fn bounds(data: &[f64]) -> Result<(f64, f64), AnalysisError> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in data {
        if !v.is_finite() {
            return Err(AnalysisError::InvalidRange { min: v, max: v });
        }
        min = min.min(v);
        max = max.max(v);
    }
    Ok((min, max))
}

fn count_into(data: &[f64], edges: &[f64]) -> Vec<usize> {
    let mut counts = vec![0usize; edges.len().saturating_sub(1)];
    for &v in data {
        if let Some(i) = bin_index(v, edges) {
            counts[i] += 1;
        }
    }
    counts
}

/// Probability distribution of `data` over `nbins` equal-width bins.
///
/// Always returns exactly `nbins` bins for non-empty data.
pub fn linear_distribution(data: &[f64], nbins: usize) -> Result<Distribution, AnalysisError> {
    if nbins == 0 {
        return Err(AnalysisError::InvalidBinCount);
    }
    if data.is_empty() {
        return Ok(Distribution::empty());
    }
    let (min, max) = bounds(data)?;
    let edges = linear_edges(min, max, nbins);
    let counts = count_into(data, &edges);
    let total = counts.iter().sum::<usize>() as f64;

    Ok(Distribution {
        bin_centers: edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect(),
        density: counts.iter().map(|&c| c as f64 / total).collect(),
    })
}

/// Count histogram of `values` with linear or logarithmic bins.
///
/// Log bins require strictly positive values. Empty input gives an empty
/// histogram.
pub fn histogram(
    values: &[f64],
    bin_type: BinType,
    nbins: usize,
) -> Result<Histogram, AnalysisError> {
    if nbins == 0 {
        return Err(AnalysisError::InvalidBinCount);
    }
    if values.is_empty() {
        return Ok(Histogram::default());
    }
    let (min, max) = bounds(values)?;
    let bin_edges = match bin_type {
        BinType::Linear => linear_edges(min, max, nbins),
        BinType::Log => {
            let edges = log_bins(min, max, nbins)?;
            if edges.len() < 2 {
                // All values equal: one zero-width bin.
                vec![min, max]
            } else {
                edges
            }
        }
    };
    let counts = count_into(values, &bin_edges);
    Ok(Histogram { bin_edges, counts })
}
