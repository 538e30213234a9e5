//! Comparison of every run of one plot against its reference.

use std::collections::{BTreeMap, BTreeSet};

use aqc_core::{ComparisonSpec, Error, Result, RunId};
use aqc_hist::{MonitorObject, extract, transform};
use rayon::prelude::*;
use serde::Serialize;

use crate::diagnostics::{DiagnosticSink, SkipReason, SkippedRun, TracingDiagnostics};
use crate::ratio::{ComparisonOutcome, compare};

/// Monitor objects of one plot, keyed by run.
pub type RunMap = BTreeMap<RunId, MonitorObject>;

/// How runs are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    /// One run after the other on the calling thread.
    #[default]
    Sequential,
    /// Runs distributed over the rayon pool. Results are identical to sequential.
    Parallel,
}

/// Everything a session produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionReport {
    /// Outcome per compared run.
    pub outcomes: BTreeMap<RunId, ComparisonOutcome>,
    /// Runs whose bad-bin fraction exceeded the maximum.
    pub flagged: BTreeSet<RunId>,
    /// Runs that could not be compared, in ascending run order.
    pub skipped: Vec<SkippedRun>,
}

/// Applies one [`ComparisonSpec`] to every current run.
pub struct RunComparisonSession {
    spec: ComparisonSpec,
    target_run: Option<RunId>,
    execution: Execution,
    diagnostics: Box<dyn DiagnosticSink>,
}

impl std::fmt::Debug for RunComparisonSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunComparisonSession")
            .field("spec", &self.spec)
            .field("target_run", &self.target_run)
            .field("execution", &self.execution)
            .finish_non_exhaustive()
    }
}

impl RunComparisonSession {
    /// Create a session. Fails with [`Error::Config`] if `spec` is invalid, before
    /// any run is touched.
    pub fn new(spec: ComparisonSpec) -> Result<Self> {
        spec.validate()?;
        Ok(Self {
            spec,
            target_run: None,
            execution: Execution::Sequential,
            diagnostics: Box::new(TracingDiagnostics),
        })
    }

    /// Only compare `run`; other runs are ignored without diagnostics.
    pub fn with_target_run(mut self, run: RunId) -> Self {
        self.target_run = Some(run);
        self
    }

    /// Select sequential or parallel scheduling.
    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    /// Replace the default `tracing` diagnostics.
    pub fn with_diagnostics(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.diagnostics = Box::new(sink);
        self
    }

    /// Compare all runs and return the flagged set.
    pub fn run(&self, current: &RunMap, reference: &RunMap) -> BTreeSet<RunId> {
        self.run_detailed(current, reference).flagged
    }

    /// Compare all runs and return outcomes, flagged runs and skips.
    pub fn run_detailed(&self, current: &RunMap, reference: &RunMap) -> SessionReport {
        let selected: Vec<(RunId, &MonitorObject)> = current
            .iter()
            .filter(|(run, _)| self.target_run.is_none_or(|t| t == **run))
            .map(|(&run, mo)| (run, mo))
            .collect();

        let compare_one = |&(run, mo): &(RunId, &MonitorObject)| {
            let result = match reference.get(&run) {
                Some(mo_ref) => self.compare_run(run, mo, mo_ref),
                None => Err(SkipReason::MissingReference),
            };
            (run, result)
        };
        let results: Vec<(RunId, std::result::Result<ComparisonOutcome, SkipReason>)> =
            match self.execution {
                Execution::Sequential => selected.iter().map(compare_one).collect(),
                Execution::Parallel => selected.par_iter().map(compare_one).collect(),
            };

        let mut report = SessionReport::default();
        for (run, result) in results {
            match result {
                Ok(outcome) => {
                    self.diagnostics.outcome(run, &outcome);
                    if outcome.flagged {
                        report.flagged.insert(run);
                    }
                    report.outcomes.insert(run, outcome);
                }
                Err(reason) => {
                    self.diagnostics.run_skipped(run, &reason);
                    report.skipped.push(SkippedRun { run, reason });
                }
            }
        }

        tracing::info!(
            compared = report.outcomes.len(),
            flagged = report.flagged.len(),
            skipped = report.skipped.len(),
            "session complete"
        );
        report
    }

    fn compare_run(
        &self,
        run: RunId,
        current: &MonitorObject,
        reference: &MonitorObject,
    ) -> std::result::Result<ComparisonOutcome, SkipReason> {
        let prepare = |mo: &MonitorObject, tag: String| -> Result<aqc_hist::Histogram> {
            let h = extract(&mo.object, self.spec.projection, &tag)?;
            transform::apply(h, &self.spec)
        };
        let h_cur = prepare(current, format!("_comp_{run}")).map_err(skip_reason)?;
        let h_ref = prepare(reference, format!("_comp_ref_{run}")).map_err(skip_reason)?;
        compare(&h_cur, &h_ref, &self.spec).map_err(skip_reason)
    }
}

fn skip_reason(err: Error) -> SkipReason {
    match err {
        Error::Alignment(msg) => SkipReason::Alignment(msg),
        Error::Extraction(msg) => SkipReason::Extraction(msg),
        other => SkipReason::Extraction(other.to_string()),
    }
}
