//! Common data types for AQC run comparison

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Integer identifier of a data-taking run.
pub type RunId = i64;

/// Time span over which a monitor object is valid (milliseconds since epoch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidityInterval {
    /// Start of validity
    pub min: u64,
    /// End of validity
    pub max: u64,
}

impl ValidityInterval {
    /// Create a new validity interval
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }
}

/// Axis onto which a two-dimensional distribution is projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    /// Use the distribution as-is.
    #[default]
    None,
    /// Sum over Y, keep the X axis.
    X,
    /// Sum over X, keep the Y axis.
    Y,
}

impl Projection {
    /// Parse the config-file spelling (`""`, `"x"`, `"y"`).
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Projection::None),
            "x" => Ok(Projection::X),
            "y" => Ok(Projection::Y),
            other => Err(Error::Config(format!("unknown projection axis: '{other}'"))),
        }
    }

    /// Short label used in output names (`""`, `"x"`, `"y"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Projection::None => "",
            Projection::X => "x",
            Projection::Y => "y",
        }
    }
}

/// Axis interval restricting the bad-bin check and normalization.
///
/// Equal bounds mean "use the full axis".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CheckRange {
    /// Lower bound (inclusive)
    pub min: f64,
    /// Upper bound (inclusive)
    pub max: f64,
}

impl CheckRange {
    /// Create a new check range
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// The degenerate range that selects the full axis.
    pub fn full() -> Self {
        Self { min: 0.0, max: 0.0 }
    }

    /// True if the range selects the full axis.
    pub fn is_full_axis(&self) -> bool {
        self.min == self.max
    }

    /// True if `x` lies inside the range. Always true for the full axis.
    pub fn contains(&self, x: f64) -> bool {
        self.is_full_axis() || (x >= self.min && x <= self.max)
    }
}

/// Configuration of one ratio comparison, applied to every run of a plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSpec {
    /// Projection applied to two-dimensional sources.
    pub projection: Projection,
    /// Number of consecutive bins merged into one (>= 1).
    pub rebin_factor: u32,
    /// Normalize both histograms to unit integral over `check_range`.
    pub normalize: bool,
    /// Range used for normalization and for the bad-bin check.
    pub check_range: CheckRange,
    /// Fixed tolerance on `|ratio - 1|`.
    pub threshold: f64,
    /// Multiplier applied to the ratio bin error and added to `threshold`.
    pub deviation_nsigma: f64,
    /// Maximum tolerated fraction of bad bins before a run is flagged.
    pub max_bad_bin_fraction: f64,
}

impl Default for ComparisonSpec {
    fn default() -> Self {
        Self {
            projection: Projection::None,
            rebin_factor: 1,
            normalize: true,
            check_range: CheckRange::full(),
            threshold: 0.1,
            deviation_nsigma: 2.0,
            max_bad_bin_fraction: 0.1,
        }
    }
}

impl ComparisonSpec {
    /// Validate every field, returning [`Error::Config`] on the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.rebin_factor < 1 {
            return Err(Error::Config(format!(
                "rebin factor must be >= 1, got {}",
                self.rebin_factor
            )));
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(Error::Config(format!(
                "check threshold must be finite and >= 0, got {}",
                self.threshold
            )));
        }
        if !self.deviation_nsigma.is_finite() || self.deviation_nsigma < 0.0 {
            return Err(Error::Config(format!(
                "deviation nsigma must be finite and >= 0, got {}",
                self.deviation_nsigma
            )));
        }
        if !(0.0..=1.0).contains(&self.max_bad_bin_fraction) {
            return Err(Error::Config(format!(
                "max bad-bin fraction must be in [0, 1], got {}",
                self.max_bad_bin_fraction
            )));
        }
        let CheckRange { min, max } = self.check_range;
        if !min.is_finite() || !max.is_finite() {
            return Err(Error::Config(format!("check range bounds must be finite, got [{min}, {max}]")));
        }
        if min > max {
            return Err(Error::Config(format!("check range is inverted: [{min}, {max}]")));
        }
        Ok(())
    }
}
