//! Rebinning and normalization applied identically to current and reference.

use aqc_core::{CheckRange, ComparisonSpec, Error, Result};

use crate::histogram::Histogram;

/// Merge each consecutive group of `factor` bins into one.
///
/// Contents are summed and errors are combined in quadrature. When the bin
/// count is not a multiple of `factor`, the trailing remainder is merged into
/// the last group, so no content is ever dropped. A factor larger than the bin
/// count collapses the histogram into a single bin.
pub fn rebin(h: Histogram, factor: u32) -> Result<Histogram> {
    if factor < 1 {
        return Err(Error::Config(format!("rebin factor must be >= 1, got {factor}")));
    }
    let factor = factor as usize;
    if factor == 1 {
        return Ok(h);
    }

    let n_groups = (h.n_bins / factor).max(1);
    let mut edges = Vec::with_capacity(n_groups + 1);
    let mut content = Vec::with_capacity(n_groups);
    let mut err2 = Vec::with_capacity(n_groups);
    for g in 0..n_groups {
        let lo = g * factor;
        let hi = if g + 1 == n_groups { h.n_bins } else { lo + factor };
        edges.push(h.bin_edges[lo]);
        content.push(h.bin_content[lo..hi].iter().sum::<f64>());
        err2.push(h.bin_error[lo..hi].iter().map(|e| e * e).sum::<f64>());
    }
    edges.push(h.x_max);

    if h.n_bins % factor != 0 {
        tracing::debug!(
            name = %h.name,
            n_bins = h.n_bins,
            factor,
            "bin count not divisible by rebin factor; remainder merged into last bin"
        );
    }

    Ok(Histogram {
        n_bins: n_groups,
        bin_edges: edges,
        bin_content: content,
        bin_error: err2.into_iter().map(f64::sqrt).collect(),
        ..h
    })
}

/// Factor that scales the integral over `range` (or the full axis) to one.
///
/// Returns 1 when the integral is zero.
pub fn normalization_factor(h: &Histogram, range: CheckRange) -> f64 {
    let integral = h.integral_in(range);
    if integral == 0.0 {
        tracing::debug!(name = %h.name, "zero integral; normalization skipped");
        1.0
    } else {
        1.0 / integral
    }
}

/// Scale `h` to unit integral over `range` (or the full axis).
pub fn normalize(mut h: Histogram, range: CheckRange) -> Histogram {
    let factor = normalization_factor(&h, range);
    h.scale(factor);
    h
}

/// Apply the rebinning and normalization requested by `spec`.
pub fn apply(h: Histogram, spec: &ComparisonSpec) -> Result<Histogram> {
    let h = if spec.rebin_factor > 1 { rebin(h, spec.rebin_factor)? } else { h };
    Ok(if spec.normalize { normalize(h, spec.check_range) } else { h })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn hist(content: Vec<f64>) -> Histogram {
        let n = content.len();
        let errors = content.iter().map(|c: &f64| c.abs().sqrt()).collect();
        Histogram::uniform("h", 0.0, n as f64, content, errors).unwrap()
    }

    #[test]
    fn rebin_by_one_is_identity() {
        let h = hist(vec![1.0, 2.0, 3.0]);
        assert_eq!(rebin(h.clone(), 1).unwrap(), h);
    }

    #[test]
    fn rebin_by_zero_is_config_error() {
        let err = rebin(hist(vec![1.0]), 0).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{err}");
    }

    #[test]
    fn rebin_even_partition() {
        let mut h = hist(vec![1.0, 2.0, 3.0, 4.0]);
        h.bin_error = vec![3.0, 4.0, 1.0, 1.0];
        let r = rebin(h, 2).unwrap();
        assert_eq!(r.n_bins, 2);
        assert_eq!(r.bin_edges, vec![0.0, 2.0, 4.0]);
        assert_eq!(r.bin_content, vec![3.0, 7.0]);
        assert_relative_eq!(r.bin_error[0], 5.0);
        assert_relative_eq!(r.bin_error[1], 2.0_f64.sqrt());
    }

    #[test]
    fn rebin_merges_remainder_into_last_group() {
        let r = rebin(hist(vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]), 3).unwrap();
        assert_eq!(r.n_bins, 2);
        assert_eq!(r.bin_edges, vec![0.0, 3.0, 7.0]);
        assert_eq!(r.bin_content, vec![3.0, 4.0]);
        assert_eq!(r.x_max, 7.0);
    }

    #[test]
    fn rebin_larger_than_bin_count_collapses() {
        let r = rebin(hist(vec![1.0, 2.0]), 5).unwrap();
        assert_eq!(r.n_bins, 1);
        assert_eq!(r.bin_edges, vec![0.0, 2.0]);
        assert_eq!(r.bin_content, vec![3.0]);
    }

    #[test]
    fn normalize_full_axis() {
        let h = normalize(hist(vec![1.0, 3.0]), CheckRange::full());
        assert_relative_eq!(h.integral(), 1.0);
        assert_relative_eq!(h.bin_content[1], 0.75);
        assert_relative_eq!(h.bin_error[1], 3.0_f64.sqrt() / 4.0);
    }

    #[test]
    fn normalize_over_sub_range() {
        let range = CheckRange::new(1.5, 2.5);
        let h = normalize(hist(vec![10.0, 2.0, 2.0, 10.0]), range);
        assert_relative_eq!(h.integral_in(range), 1.0);
        assert_relative_eq!(h.bin_content[0], 2.5);
    }

    #[test]
    fn zero_integral_is_a_no_op() {
        let h = hist(vec![0.0, 0.0, 5.0]);
        assert_eq!(normalization_factor(&h, CheckRange::new(0.1, 1.9)), 1.0);
        let n = normalize(h.clone(), CheckRange::new(0.1, 1.9));
        assert_eq!(n, h);
    }

    #[test]
    fn range_outside_axis_leaves_histogram_unscaled() {
        let h = hist(vec![1.0, 2.0, 3.0, 4.0]);
        for range in [CheckRange::new(10.0, 20.0), CheckRange::new(-20.0, -10.0)] {
            assert_eq!(normalization_factor(&h, range), 1.0, "{range:?}");
            assert_eq!(normalize(h.clone(), range), h);
        }
    }

    #[test]
    fn apply_follows_spec() {
        let spec = ComparisonSpec { rebin_factor: 2, normalize: false, ..Default::default() };
        let h = apply(hist(vec![1.0, 2.0, 3.0, 4.0]), &spec).unwrap();
        assert_eq!(h.bin_content, vec![3.0, 7.0]);

        let spec = ComparisonSpec { rebin_factor: 2, ..Default::default() };
        let h = apply(hist(vec![1.0, 2.0, 3.0, 4.0]), &spec).unwrap();
        assert_relative_eq!(h.bin_content[0], 0.3);
        assert_relative_eq!(h.integral(), 1.0);
    }

    proptest! {
        #[test]
        fn rebin_conserves_content(
            content in proptest::collection::vec(0.0f64..1e4, 1..64),
            factor in 1u32..9,
        ) {
            let total: f64 = content.iter().sum();
            let r = rebin(hist(content), factor).unwrap();
            let rebinned: f64 = r.bin_content.iter().sum();
            prop_assert!((rebinned - total).abs() <= 1e-9 * total.max(1.0));
            prop_assert_eq!(r.bin_edges.len(), r.n_bins + 1);
        }

        #[test]
        fn rebin_keeps_axis_range(
            content in proptest::collection::vec(0.0f64..1e4, 1..64),
            factor in 1u32..9,
        ) {
            let h = hist(content);
            let (lo, hi) = (h.x_min, h.x_max);
            let r = rebin(h, factor).unwrap();
            prop_assert_eq!(r.bin_edges[0], lo);
            prop_assert_eq!(r.bin_edges[r.n_bins], hi);
        }

        #[test]
        fn normalization_is_unit_and_idempotent(
            content in proptest::collection::vec(0.0f64..1e4, 1..64),
            a in 0.0f64..64.0,
            b in 0.0f64..64.0,
        ) {
            let h = hist(content);
            let range = if a == b { CheckRange::full() } else { CheckRange::new(a.min(b), a.max(b)) };
            prop_assume!(h.integral_in(range) > 1e-6);

            let once = normalize(h, range);
            prop_assert!((once.integral_in(range) - 1.0).abs() < 1e-9);

            let twice = normalize(once.clone(), range);
            for (x, y) in once.bin_content.iter().zip(&twice.bin_content) {
                prop_assert!((x - y).abs() <= 1e-9 * x.abs().max(1e-12));
            }
        }
    }
}
