//! JSON monitoring snapshots: the storage side of a comparison.
//!
//! A snapshot file holds the monitor objects of one run, nested by directory:
//!
//! ```text
//! { "int": { "<detector>": { "<task>": [ MonitorObject, ... ] } } }
//! ```

use aqc_check::RunMap;
use aqc_core::RunId;
use aqc_hist::{MonitorObject, MonitorSource, PlotPath};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::RunsConfig;

type Collections = BTreeMap<String, Vec<MonitorObject>>;

/// One parsed snapshot file.
#[derive(Debug, Clone)]
pub struct QcFile {
    origin: String,
    tree: BTreeMap<String, BTreeMap<String, Collections>>,
}

impl QcFile {
    /// Parse a snapshot file.
    pub fn open(path: &Path) -> aqc_core::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&path.display().to_string(), &json)
    }

    /// Parse a snapshot from an in-memory JSON string.
    pub fn from_json(origin: &str, json: &str) -> aqc_core::Result<Self> {
        let tree = serde_json::from_str(json)?;
        Ok(Self { origin: origin.to_string(), tree })
    }
}

impl MonitorSource for QcFile {
    fn monitor_object(&self, path: &PlotPath) -> Option<MonitorObject> {
        let Some(top) = self.tree.get(&path.top) else {
            tracing::info!(dir = %path.top, file = %self.origin, "directory not found");
            return None;
        };
        let Some(detector) = top.get(&path.detector) else {
            tracing::info!(dir = %path.detector, file = %self.origin, "directory not found");
            return None;
        };
        let Some(collection) = detector.get(&path.task) else {
            tracing::info!(collection = %path.task, file = %self.origin, "collection not found");
            return None;
        };
        collection.iter().find(|mo| mo.name == path.object).cloned()
    }

    fn origin(&self) -> &str {
        &self.origin
    }
}

/// Open every snapshot file listed for `runs`. Missing or unreadable files are
/// logged and skipped.
pub fn open_run_files(cfg: &RunsConfig, input_dir: &Path, runs: &[RunId]) -> Vec<QcFile> {
    let mut files = Vec::new();
    for &run in runs {
        for path in cfg.input_files(input_dir, run) {
            if !path.exists() {
                tracing::info!(run, path = %path.display(), "input file not found");
                continue;
            }
            match QcFile::open(&path) {
                Ok(f) => {
                    tracing::debug!(run, path = %path.display(), "input file added");
                    files.push(f);
                }
                Err(e) => tracing::warn!(run, path = %path.display(), error = %e, "input file unreadable"),
            }
        }
    }
    files
}

/// Collect the objects at `path` from all sources, keyed by their own run id.
///
/// Later sources override earlier ones for the same run.
pub fn load_plot<S: MonitorSource>(sources: &[S], path: &PlotPath) -> RunMap {
    let mut map = RunMap::new();
    for src in sources {
        match src.monitor_object(path) {
            Some(mo) => {
                tracing::debug!(
                    plot = %path,
                    file = src.origin(),
                    run = mo.run_id,
                    object = mo.object.name(),
                    kind = mo.object.kind(),
                    "loaded monitor object"
                );
                map.insert(mo.run_id, mo);
            }
            None => tracing::info!(plot = %path, file = src.origin(), "failed to load monitor object"),
        }
    }
    map
}
