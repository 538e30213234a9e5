//! Raw monitoring objects as delivered by the storage layer.
//!
//! A [`MonitorObject`] wraps one [`SourceDistribution`] together with the run it
//! belongs to and its validity interval. The source shape is a closed set of
//! variants, so extraction dispatches on it without any runtime type probing.

use aqc_core::{RunId, ValidityInterval};
use serde::{Deserialize, Serialize};

/// Plain 1D histogram as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hist1D {
    /// Object name.
    pub name: String,
    /// Object title.
    #[serde(default)]
    pub title: String,
    /// Bin edges (length = n_bins + 1).
    pub edges: Vec<f64>,
    /// Bin contents.
    pub content: Vec<f64>,
    /// Sum of weights squared per bin, if stored.
    #[serde(default)]
    pub sumw2: Option<Vec<f64>>,
    /// Total number of entries.
    #[serde(default)]
    pub entries: f64,
}

/// 2D histogram as stored, cells in row-major order `content[iy * nx + ix]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hist2D {
    /// Object name.
    pub name: String,
    /// Object title.
    #[serde(default)]
    pub title: String,
    /// X bin edges (length = nx + 1).
    pub x_edges: Vec<f64>,
    /// Y bin edges (length = ny + 1).
    pub y_edges: Vec<f64>,
    /// Cell contents (length = nx * ny).
    pub content: Vec<f64>,
    /// Sum of weights squared per cell, if stored.
    #[serde(default)]
    pub sumw2: Option<Vec<f64>>,
    /// Total number of entries.
    #[serde(default)]
    pub entries: f64,
}

impl Hist2D {
    /// Number of X bins.
    pub fn nx(&self) -> usize {
        self.x_edges.len().saturating_sub(1)
    }

    /// Number of Y bins.
    pub fn ny(&self) -> usize {
        self.y_edges.len().saturating_sub(1)
    }
}

/// How a profile bin error is derived from the stored moments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileErrorMode {
    /// Standard error of the mean (spread / sqrt(effective entries)).
    #[default]
    Mean,
    /// Spread of the values in the bin.
    Spread,
}

/// Profile histogram: per-bin weighted moments of a Y value along X.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile1D {
    /// Object name.
    pub name: String,
    /// Object title.
    #[serde(default)]
    pub title: String,
    /// Bin edges (length = n_bins + 1).
    pub edges: Vec<f64>,
    /// Σ w·y per bin.
    pub sum_wy: Vec<f64>,
    /// Σ w·y² per bin.
    pub sum_wy2: Vec<f64>,
    /// Σ w per bin.
    pub sum_w: Vec<f64>,
    /// Σ w² per bin, if weights were used.
    #[serde(default)]
    pub sum_w2: Option<Vec<f64>>,
    /// Error convention.
    #[serde(default)]
    pub error_mode: ProfileErrorMode,
}

/// Raw distribution held by a monitor object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SourceDistribution {
    /// One-dimensional histogram.
    #[serde(rename = "TH1")]
    OneD(Hist1D),
    /// Two-dimensional histogram, reduced by projection.
    #[serde(rename = "TH2")]
    TwoD(Hist2D),
    /// Profile histogram, reduced to mean and error per bin.
    #[serde(rename = "TProfile")]
    Profile(Profile1D),
}

impl SourceDistribution {
    /// Name of the stored object.
    pub fn name(&self) -> &str {
        match self {
            SourceDistribution::OneD(h) => &h.name,
            SourceDistribution::TwoD(h) => &h.name,
            SourceDistribution::Profile(p) => &p.name,
        }
    }

    /// Short shape label, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceDistribution::OneD(_) => "TH1",
            SourceDistribution::TwoD(_) => "TH2",
            SourceDistribution::Profile(_) => "TProfile",
        }
    }
}

/// A histogram tagged with its run and validity interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorObject {
    /// Object name inside its collection.
    pub name: String,
    /// Run the object was recorded in.
    pub run_id: RunId,
    /// Validity interval of the snapshot.
    #[serde(default)]
    pub validity: ValidityInterval,
    /// Stored distribution.
    pub object: SourceDistribution,
}

/// Location of a monitor object: `<top>/<detector>/<task>/<object>`.
///
/// The object component may itself contain `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlotPath {
    /// Top-level directory (e.g. `int`).
    pub top: String,
    /// Detector directory.
    pub detector: String,
    /// Task collection.
    pub task: String,
    /// Object name within the collection.
    pub object: String,
}

impl PlotPath {
    /// Build the path of a plot in the integrated (`int`) area.
    pub fn integrated(detector: &str, task: &str, plot: &str) -> Self {
        Self {
            top: "int".to_string(),
            detector: detector.to_string(),
            task: task.to_string(),
            object: plot.to_string(),
        }
    }
}

impl std::fmt::Display for PlotPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}/{}", self.top, self.detector, self.task, self.object)
    }
}

/// Storage collaborator that resolves plot paths to monitor objects.
///
/// Load failures yield `None`; implementations never return a partially
/// decoded object.
pub trait MonitorSource {
    /// Look up the object at `path`.
    fn monitor_object(&self, path: &PlotPath) -> Option<MonitorObject>;

    /// Human-readable origin (file path, URL), used in diagnostics.
    fn origin(&self) -> &str;
}
