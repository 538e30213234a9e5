//! Runs and plots configuration files.
//!
//! Both files are JSON, or YAML when the extension is `.yaml` / `.yml`.

use aqc_core::{CheckRange, ComparisonSpec, Error, Projection, RunId};
use aqc_hist::PlotPath;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Description of one set of runs (current or reference).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunsConfig {
    /// Reconstruction type (e.g. `async`).
    #[serde(rename = "type")]
    pub reco_type: String,
    /// Data-taking year.
    pub year: String,
    /// Period name.
    pub period: String,
    /// Reconstruction pass.
    pub pass: String,
    /// Beam type (`pp`, `PbPb`, ...).
    pub beam_type: String,
    /// Runs to compare. Only read from the current-runs file.
    #[serde(default)]
    pub runs: Vec<RunId>,
    /// Snapshot file names inside each run directory.
    #[serde(default = "default_root_files")]
    pub root_files: Vec<String>,
}

fn default_root_files() -> Vec<String> {
    vec!["QC_fullrun.json".to_string()]
}

impl RunsConfig {
    /// Candidate snapshot files for `run`: `<input_dir>/<year>/<period>/<pass>/<run>/<file>`.
    pub fn input_files(&self, input_dir: &Path, run: RunId) -> Vec<PathBuf> {
        let run_dir =
            input_dir.join(&self.year).join(&self.period).join(&self.pass).join(run.to_string());
        self.root_files.iter().map(|f| run_dir.join(f)).collect()
    }
}

/// Top-level plots file.
#[derive(Debug, Clone, Deserialize)]
pub struct PlotsConfig {
    /// Session identifier, echoed in the report.
    pub id: String,
    /// Plots to compare.
    #[serde(default)]
    pub plots: Option<Vec<PlotConfig>>,
}

/// One monitored plot and its check parameters.
///
/// Rendering-only keys (`drawOptions`, `logx`, `logy`) may be present and are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotConfig {
    /// Detector directory.
    pub detector: String,
    /// Task collection.
    pub task: String,
    /// Plot name inside the task (may contain `/`).
    pub name: String,
    /// Free-form label.
    #[serde(default)]
    pub label: String,
    /// `""`, `"x"` or `"y"`.
    #[serde(default)]
    pub projection: String,
    /// Lower bound of the check range. Equal bounds select the full axis.
    #[serde(default)]
    pub check_range_min: f64,
    /// Upper bound of the check range.
    #[serde(default)]
    pub check_range_max: f64,
    /// Fixed tolerance on `|ratio - 1|`.
    #[serde(default = "default_threshold")]
    pub check_threshold: f64,
    /// Multiplier on the ratio error added to the tolerance.
    #[serde(default = "default_nsigma")]
    pub check_deviation_nsigma: f64,
    /// Bad-bin fraction above which a run is flagged.
    #[serde(default = "default_max_bad_frac")]
    pub max_bad_bins_frac: f64,
    /// Rebin factor, must be >= 1.
    #[serde(default = "default_rebin")]
    pub rebin: i64,
    /// Normalize current and reference before the ratio.
    #[serde(default = "default_normalize")]
    pub normalize: bool,
}

fn default_threshold() -> f64 {
    0.1
}

fn default_nsigma() -> f64 {
    2.0
}

fn default_max_bad_frac() -> f64 {
    0.1
}

fn default_rebin() -> i64 {
    1
}

fn default_normalize() -> bool {
    true
}

impl PlotConfig {
    /// Location of the plot's monitor objects.
    pub fn path(&self) -> PlotPath {
        PlotPath::integrated(&self.detector, &self.task, &self.name)
    }

    /// `detector/task/name`, for logs and reports.
    pub fn display_name(&self) -> String {
        format!("{}/{}/{}", self.detector, self.task, self.name)
    }

    /// Convert to a validated [`ComparisonSpec`].
    pub fn to_spec(&self) -> aqc_core::Result<ComparisonSpec> {
        let rebin_factor = u32::try_from(self.rebin).ok().filter(|&r| r >= 1).ok_or_else(|| {
            Error::Config(format!("{}: rebin must be a positive integer, got {}", self.display_name(), self.rebin))
        })?;
        let spec = ComparisonSpec {
            projection: Projection::parse(&self.projection)?,
            rebin_factor,
            normalize: self.normalize,
            check_range: CheckRange::new(self.check_range_min, self.check_range_max),
            threshold: self.check_threshold,
            deviation_nsigma: self.check_deviation_nsigma,
            max_bad_bin_fraction: self.max_bad_bins_frac,
        };
        spec.validate().map_err(|e| Error::Config(format!("{}: {e}", self.display_name())))?;
        Ok(spec)
    }
}

/// Read a JSON or YAML config file, by extension.
pub fn read_config<T: DeserializeOwned>(path: &Path) -> aqc_core::Result<T> {
    let bytes = std::fs::read(path)?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
    let cfg = if ext == "yaml" || ext == "yml" {
        serde_yaml_ng::from_slice(&bytes)?
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok(cfg)
}
