//! One-dimensional histogram used by every comparison stage.

use aqc_core::{CheckRange, Error, Result};
use serde::Serialize;

/// A 1D histogram with per-bin content and error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// Histogram name (carries the extraction tag).
    pub name: String,
    /// Histogram title.
    pub title: String,
    /// Number of bins (excluding under/overflow).
    pub n_bins: usize,
    /// Lower edge of first bin.
    pub x_min: f64,
    /// Upper edge of last bin.
    pub x_max: f64,
    /// Bin edges (length = n_bins + 1).
    pub bin_edges: Vec<f64>,
    /// Bin contents (length = n_bins).
    pub bin_content: Vec<f64>,
    /// Bin errors (length = n_bins).
    pub bin_error: Vec<f64>,
    /// Total number of entries.
    pub entries: f64,
}

impl Histogram {
    /// Build a histogram from explicit edges, contents and errors.
    ///
    /// Fails with [`Error::Extraction`] if the arrays are inconsistent, the edges
    /// are not strictly increasing, or any value is not finite.
    pub fn from_parts(
        name: impl Into<String>,
        bin_edges: Vec<f64>,
        bin_content: Vec<f64>,
        bin_error: Vec<f64>,
    ) -> Result<Self> {
        let name = name.into();
        let n_bins = bin_content.len();
        validate_edges(&name, &bin_edges, n_bins)?;
        if bin_error.len() != n_bins {
            return Err(Error::Extraction(format!(
                "'{name}': {} errors for {n_bins} bins",
                bin_error.len()
            )));
        }
        if let Some(i) = bin_content.iter().chain(&bin_error).position(|v| !v.is_finite()) {
            return Err(Error::Extraction(format!("'{name}': non-finite value at index {i}")));
        }
        let entries = bin_content.iter().sum();
        Ok(Self {
            name,
            title: String::new(),
            n_bins,
            x_min: bin_edges[0],
            x_max: bin_edges[n_bins],
            bin_edges,
            bin_content,
            bin_error,
            entries,
        })
    }

    /// Build a histogram with `n_bins` equal-width bins over `[x_min, x_max]`.
    pub fn uniform(
        name: impl Into<String>,
        x_min: f64,
        x_max: f64,
        bin_content: Vec<f64>,
        bin_error: Vec<f64>,
    ) -> Result<Self> {
        let edges = uniform_edges(bin_content.len(), x_min, x_max);
        Self::from_parts(name, edges, bin_content, bin_error)
    }

    /// Center of bin `i`.
    pub fn bin_center(&self, i: usize) -> f64 {
        0.5 * (self.bin_edges[i] + self.bin_edges[i + 1])
    }

    /// Width of bin `i`.
    pub fn bin_width(&self, i: usize) -> f64 {
        self.bin_edges[i + 1] - self.bin_edges[i]
    }

    /// Bin index containing `x`, or `None` for underflow/overflow.
    pub fn find_bin(&self, x: f64) -> Option<usize> {
        find_bin(&self.bin_edges, x)
    }

    /// Bin index containing `x`, clamping underflow to the first bin and
    /// overflow to the last bin.
    pub fn find_bin_clamped(&self, x: f64) -> usize {
        if x < self.x_min {
            return 0;
        }
        self.find_bin(x).unwrap_or(self.n_bins - 1)
    }

    /// Sum of all bin contents.
    pub fn integral(&self) -> f64 {
        self.bin_content.iter().sum()
    }

    /// Sum of the contents of the bins containing `range.min` through `range.max`
    /// (inclusive). A degenerate range covers the full axis.
    ///
    /// Bounds that fall outside a partly overlapping range are clamped to the
    /// first or last bin. A range entirely outside the axis holds no content.
    pub fn integral_in(&self, range: CheckRange) -> f64 {
        if range.is_full_axis() {
            return self.integral();
        }
        if range.max < self.x_min || range.min >= self.x_max {
            return 0.0;
        }
        let lo = self.find_bin_clamped(range.min);
        let hi = self.find_bin_clamped(range.max);
        if lo > hi {
            return 0.0;
        }
        self.bin_content[lo..=hi].iter().sum()
    }

    /// Multiply contents and errors by `factor` (relative errors are preserved).
    pub fn scale(&mut self, factor: f64) {
        for c in &mut self.bin_content {
            *c *= factor;
        }
        for e in &mut self.bin_error {
            *e *= factor.abs();
        }
    }

    /// True if `other` has the same bin count and (within tolerance) the same edges.
    pub fn same_binning(&self, other: &Histogram) -> bool {
        self.n_bins == other.n_bins
            && self.bin_edges.iter().zip(&other.bin_edges).all(|(&a, &b)| edges_close(a, b))
    }
}

const EDGE_RTOL: f64 = 1e-10;

fn edges_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= EDGE_RTOL * a.abs().max(b.abs()).max(1.0)
}

/// Equal-width edges for `n_bins` bins over `[x_min, x_max]`.
pub(crate) fn uniform_edges(n_bins: usize, x_min: f64, x_max: f64) -> Vec<f64> {
    let width = (x_max - x_min) / n_bins.max(1) as f64;
    (0..=n_bins)
        .map(|i| if i == n_bins { x_max } else { x_min + i as f64 * width })
        .collect()
}

/// Check that `edges` describe `n_bins` contiguous, strictly increasing bins.
pub(crate) fn validate_edges(name: &str, edges: &[f64], n_bins: usize) -> Result<()> {
    if n_bins == 0 {
        return Err(Error::Extraction(format!("'{name}': histogram has no bins")));
    }
    if edges.len() != n_bins + 1 {
        return Err(Error::Extraction(format!(
            "'{name}': {} edges for {n_bins} bins",
            edges.len()
        )));
    }
    if edges.iter().any(|e| !e.is_finite()) {
        return Err(Error::Extraction(format!("'{name}': non-finite bin edge")));
    }
    if let Some(i) = edges.windows(2).position(|w| w[1] <= w[0]) {
        return Err(Error::Extraction(format!(
            "'{name}': bin edges not increasing at index {i} ({} >= {})",
            edges[i],
            edges[i + 1]
        )));
    }
    Ok(())
}

/// Find the bin index for a value given sorted bin edges.
///
/// Returns `None` for underflow/overflow.
fn find_bin(edges: &[f64], val: f64) -> Option<usize> {
    if edges.len() < 2 || val.is_nan() || val < edges[0] || val >= edges[edges.len() - 1] {
        return None;
    }
    match edges.binary_search_by(|e| e.total_cmp(&val)) {
        Ok(i) => Some(i),
        Err(i) => Some(i - 1),
    }
}
