//! JSON report of a `compare` invocation.
//!
//! One [`PlotReport`] per configured plot, plus the union of bad runs.

use aqc_check::{BinVerdict, SessionReport, SkippedRun};
use aqc_core::RunId;
use aqc_hist::Histogram;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::config::PlotConfig;

#[derive(Debug, Clone, Serialize)]
pub struct CompareReport {
    pub tool: String,
    pub tool_version: String,
    pub id: String,
    /// Union of the bad runs of every plot.
    pub bad_runs: BTreeSet<RunId>,
    pub plots: Vec<PlotReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlotReport {
    pub detector: String,
    pub task: String,
    pub plot: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub projection: String,
    pub bad_runs: BTreeSet<RunId>,
    pub runs: Vec<RunSummary>,
    pub skipped: Vec<SkippedRun>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run: RunId,
    pub checked_bins: usize,
    pub bad_bins: usize,
    pub undefined_bins: usize,
    pub bad_fraction: f64,
    pub flagged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio: Option<Histogram>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdicts: Option<Vec<BinVerdict>>,
}

impl CompareReport {
    pub fn new(id: &str) -> Self {
        Self {
            tool: "aqc".to_string(),
            tool_version: aqc_core::VERSION.to_string(),
            id: id.to_string(),
            bad_runs: BTreeSet::new(),
            plots: Vec::new(),
        }
    }

    pub fn push(&mut self, plot: PlotReport) {
        self.bad_runs.extend(plot.bad_runs.iter().copied());
        self.plots.push(plot);
    }
}

impl PlotReport {
    pub fn from_session(plot: &PlotConfig, session: SessionReport, include_ratios: bool) -> Self {
        let runs = session
            .outcomes
            .into_iter()
            .map(|(run, out)| RunSummary {
                run,
                checked_bins: out.checked_bins,
                bad_bins: out.bad_bins,
                undefined_bins: out.undefined_bins,
                bad_fraction: out.bad_fraction,
                flagged: out.flagged,
                ratio: include_ratios.then_some(out.ratio),
                verdicts: include_ratios.then_some(out.verdicts),
            })
            .collect();
        Self {
            detector: plot.detector.clone(),
            task: plot.task.clone(),
            plot: plot.name.clone(),
            label: plot.label.clone(),
            projection: plot.projection.clone(),
            bad_runs: session.flagged,
            runs,
            skipped: session.skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plot(name: &str) -> PlotConfig {
        serde_json::from_str(&format!(r#"{{ "detector": "MCH", "task": "Digits", "name": "{name}" }}"#))
            .unwrap()
    }

    #[test]
    fn bad_runs_are_merged_across_plots() {
        let mut report = CompareReport::new("s1");
        for (name, flagged) in [("a", [1, 3]), ("b", [3, 5])] {
            let session = SessionReport { flagged: flagged.into_iter().collect(), ..Default::default() };
            report.push(PlotReport::from_session(&plot(name), session, false));
        }
        assert_eq!(report.bad_runs, BTreeSet::from([1, 3, 5]));
        assert_eq!(report.tool_version, aqc_core::VERSION);
        assert_eq!(report.plots.len(), 2);
    }
}
