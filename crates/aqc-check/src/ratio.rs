//! Bin-wise ratio of current over reference and the bad-bin check.
//!
//! For each bin with non-zero reference content:
//!
//! ```text
//! r   = c1 / c2
//! σr² = (e1²·c2² + e2²·c1²) / c2⁴
//! bad ⇔ |r − 1| > threshold + σr · nsigma
//! ```
//!
//! Bins with zero reference content have no defined ratio and are left out of
//! the check.

use aqc_core::{ComparisonSpec, Error, Result};
use aqc_hist::Histogram;
use serde::Serialize;

/// Per-bin result of the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BinVerdict {
    /// Bin center lies outside the check range.
    OutsideRange,
    /// Reference content is zero; ratio undefined, bin not checked.
    Undefined,
    /// Deviation within the envelope.
    Good,
    /// Deviation beyond the envelope.
    Bad,
}

/// Result of comparing one run against its reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonOutcome {
    /// Ratio histogram (current / reference) with propagated errors.
    pub ratio: Histogram,
    /// Per-bin verdicts, aligned with `ratio` bins.
    pub verdicts: Vec<BinVerdict>,
    /// Bins that entered the check.
    pub checked_bins: usize,
    /// Checked bins beyond the envelope.
    pub bad_bins: usize,
    /// In-range bins skipped because the reference was empty.
    pub undefined_bins: usize,
    /// `bad_bins / checked_bins`, or 0 when nothing was checked.
    pub bad_fraction: f64,
    /// True if `bad_fraction` exceeds the configured maximum.
    pub flagged: bool,
}

/// Divide `current` by `reference` bin by bin.
///
/// Returns the ratio histogram and, per bin, whether the ratio is defined.
pub fn ratio(current: &Histogram, reference: &Histogram) -> Result<(Histogram, Vec<bool>)> {
    check_alignment(current, reference)?;

    let n = current.n_bins;
    let mut content = Vec::with_capacity(n);
    let mut error = Vec::with_capacity(n);
    let mut defined = Vec::with_capacity(n);
    for i in 0..n {
        let (c1, e1) = (current.bin_content[i], current.bin_error[i]);
        let (c2, e2) = (reference.bin_content[i], reference.bin_error[i]);
        if c2 == 0.0 {
            content.push(0.0);
            error.push(0.0);
            defined.push(false);
            continue;
        }
        let c2sq = c2 * c2;
        let var = (e1 * e1 * c2sq + e2 * e2 * c1 * c1) / (c2sq * c2sq);
        content.push(c1 / c2);
        error.push(var.sqrt());
        defined.push(true);
    }

    let ratio = Histogram {
        name: format!("{}_ratio", current.name),
        title: current.title.clone(),
        n_bins: n,
        x_min: current.x_min,
        x_max: current.x_max,
        bin_edges: current.bin_edges.clone(),
        bin_content: content,
        bin_error: error,
        entries: current.entries,
    };
    Ok((ratio, defined))
}

/// Compare `current` against `reference` under `spec`.
///
/// Both histograms must already be extracted and transformed identically.
/// This function is pure: the same inputs always give the same outcome.
pub fn compare(
    current: &Histogram,
    reference: &Histogram,
    spec: &ComparisonSpec,
) -> Result<ComparisonOutcome> {
    let (ratio, defined) = ratio(current, reference)?;

    let mut verdicts = Vec::with_capacity(ratio.n_bins);
    let (mut checked_bins, mut bad_bins, mut undefined_bins) = (0usize, 0usize, 0usize);
    for (i, &is_defined) in defined.iter().enumerate() {
        let verdict = if !spec.check_range.contains(ratio.bin_center(i)) {
            BinVerdict::OutsideRange
        } else if !is_defined {
            undefined_bins += 1;
            BinVerdict::Undefined
        } else {
            checked_bins += 1;
            let deviation = (ratio.bin_content[i] - 1.0).abs();
            let envelope = spec.threshold + ratio.bin_error[i] * spec.deviation_nsigma;
            if deviation > envelope {
                bad_bins += 1;
                BinVerdict::Bad
            } else {
                BinVerdict::Good
            }
        };
        verdicts.push(verdict);
    }

    let bad_fraction =
        if checked_bins > 0 { bad_bins as f64 / checked_bins as f64 } else { 0.0 };
    let flagged = bad_fraction > spec.max_bad_bin_fraction;

    Ok(ComparisonOutcome {
        ratio,
        verdicts,
        checked_bins,
        bad_bins,
        undefined_bins,
        bad_fraction,
        flagged,
    })
}

fn check_alignment(current: &Histogram, reference: &Histogram) -> Result<()> {
    if current.n_bins != reference.n_bins {
        return Err(Error::Alignment(format!(
            "'{}' has {} bins, reference '{}' has {}",
            current.name, current.n_bins, reference.name, reference.n_bins
        )));
    }
    if !current.same_binning(reference) {
        return Err(Error::Alignment(format!(
            "'{}' and reference '{}' have different bin edges ([{}, {}] vs [{}, {}])",
            current.name,
            reference.name,
            current.x_min,
            current.x_max,
            reference.x_min,
            reference.x_max
        )));
    }
    Ok(())
}
