//! Reduction of a [`SourceDistribution`] to a comparable 1D [`Histogram`].
//!
//! | Shape      | Projection  | Result                                      |
//! |------------|-------------|---------------------------------------------|
//! | `Profile`  | (ignored)   | mean and its error per X bin                |
//! | `TwoD`     | `X` / `Y`   | marginal sum over the other axis            |
//! | `OneD`     | `None`      | verbatim copy                               |
//!
//! Any other combination is an [`Error::Extraction`].

use aqc_core::{Error, Projection, Result};

use crate::histogram::{Histogram, validate_edges};
use crate::monitor::{Hist1D, Hist2D, Profile1D, ProfileErrorMode, SourceDistribution};

/// Extract a 1D histogram from `source`.
///
/// `tag` is appended to the result name so that several extractions of the
/// same object (current, reference, ratio) stay distinguishable.
pub fn extract(source: &SourceDistribution, projection: Projection, tag: &str) -> Result<Histogram> {
    match source {
        SourceDistribution::Profile(p) => {
            if projection != Projection::None {
                tracing::debug!(
                    name = %p.name,
                    projection = projection.as_str(),
                    "projection ignored for profile source"
                );
            }
            extract_profile(p, tag)
        }
        SourceDistribution::TwoD(h) => match projection {
            Projection::X => project_x(h, tag),
            Projection::Y => project_y(h, tag),
            Projection::None => Err(Error::Extraction(format!(
                "'{}': 2D source requires an 'x' or 'y' projection",
                h.name
            ))),
        },
        SourceDistribution::OneD(h) => match projection {
            Projection::None => copy_1d(h, tag),
            axis => Err(Error::Extraction(format!(
                "'{}': cannot project a 1D source along '{}'",
                h.name,
                axis.as_str()
            ))),
        },
    }
}

fn copy_1d(h: &Hist1D, tag: &str) -> Result<Histogram> {
    let n_bins = h.content.len();
    validate_edges(&h.name, &h.edges, n_bins)?;
    let errors = match &h.sumw2 {
        Some(sumw2) => {
            check_len(&h.name, "sumw2", sumw2.len(), n_bins)?;
            sumw2.iter().map(|w2| w2.abs().sqrt()).collect()
        }
        None => h.content.iter().map(|c| c.abs().sqrt()).collect(),
    };
    let mut out =
        Histogram::from_parts(format!("{}{tag}", h.name), h.edges.clone(), h.content.clone(), errors)?;
    out.title = h.title.clone();
    out.entries = h.entries;
    Ok(out)
}

fn project_x(h: &Hist2D, tag: &str) -> Result<Histogram> {
    let (nx, ny) = check_2d(h)?;
    let mut content = vec![0.0; nx];
    let mut err2 = vec![0.0; nx];
    for iy in 0..ny {
        for ix in 0..nx {
            let cell = iy * nx + ix;
            content[ix] += h.content[cell];
            err2[ix] += cell_err2(h, cell);
        }
    }
    finish_projection(h, "_px", tag, h.x_edges.clone(), content, err2)
}

fn project_y(h: &Hist2D, tag: &str) -> Result<Histogram> {
    let (nx, ny) = check_2d(h)?;
    let mut content = vec![0.0; ny];
    let mut err2 = vec![0.0; ny];
    for iy in 0..ny {
        for ix in 0..nx {
            let cell = iy * nx + ix;
            content[iy] += h.content[cell];
            err2[iy] += cell_err2(h, cell);
        }
    }
    finish_projection(h, "_py", tag, h.y_edges.clone(), content, err2)
}

fn check_2d(h: &Hist2D) -> Result<(usize, usize)> {
    let (nx, ny) = (h.nx(), h.ny());
    validate_edges(&h.name, &h.x_edges, nx)?;
    validate_edges(&h.name, &h.y_edges, ny)?;
    check_len(&h.name, "content", h.content.len(), nx * ny)?;
    if let Some(sumw2) = &h.sumw2 {
        check_len(&h.name, "sumw2", sumw2.len(), nx * ny)?;
    }
    Ok((nx, ny))
}

/// Squared error of one cell: stored sumw2, or Poisson if unweighted.
fn cell_err2(h: &Hist2D, cell: usize) -> f64 {
    match &h.sumw2 {
        Some(sumw2) => sumw2[cell].abs(),
        None => h.content[cell].abs(),
    }
}

fn finish_projection(
    h: &Hist2D,
    suffix: &str,
    tag: &str,
    edges: Vec<f64>,
    content: Vec<f64>,
    err2: Vec<f64>,
) -> Result<Histogram> {
    let errors = err2.into_iter().map(f64::sqrt).collect();
    let mut out = Histogram::from_parts(format!("{}{suffix}{tag}", h.name), edges, content, errors)?;
    out.title = h.title.clone();
    out.entries = h.entries;
    Ok(out)
}

fn extract_profile(p: &Profile1D, tag: &str) -> Result<Histogram> {
    let n_bins = p.edges.len().saturating_sub(1);
    validate_edges(&p.name, &p.edges, n_bins)?;
    check_len(&p.name, "sum_wy", p.sum_wy.len(), n_bins)?;
    check_len(&p.name, "sum_wy2", p.sum_wy2.len(), n_bins)?;
    check_len(&p.name, "sum_w", p.sum_w.len(), n_bins)?;
    if let Some(sum_w2) = &p.sum_w2 {
        check_len(&p.name, "sum_w2", sum_w2.len(), n_bins)?;
    }

    let mut content = Vec::with_capacity(n_bins);
    let mut errors = Vec::with_capacity(n_bins);
    for i in 0..n_bins {
        let (mean, error) = profile_bin(p, i);
        content.push(mean);
        errors.push(error);
    }

    let mut out =
        Histogram::from_parts(format!("{}_profile_px{tag}", p.name), p.edges.clone(), content, errors)?;
    out.title = p.title.clone();
    out.entries = p.sum_w.iter().sum();
    Ok(out)
}

/// Mean and error of profile bin `i`.
fn profile_bin(p: &Profile1D, i: usize) -> (f64, f64) {
    let sum_w = p.sum_w[i];
    if sum_w == 0.0 {
        return (0.0, 0.0);
    }
    let mean = p.sum_wy[i] / sum_w;
    let spread = (p.sum_wy2[i] / sum_w - mean * mean).abs().sqrt();
    let error = match p.error_mode {
        ProfileErrorMode::Spread => spread,
        ProfileErrorMode::Mean => {
            let n_eff = match &p.sum_w2 {
                Some(sum_w2) if sum_w2[i] > 0.0 => sum_w * sum_w / sum_w2[i],
                _ => sum_w.abs(),
            };
            if n_eff > 0.0 { spread / n_eff.sqrt() } else { 0.0 }
        }
    };
    (mean, error)
}

fn check_len(name: &str, what: &str, got: usize, want: usize) -> Result<()> {
    if got != want {
        return Err(Error::Extraction(format!("'{name}': {what} has {got} values, expected {want}")));
    }
    Ok(())
}
