//! Observable per-run events of a comparison session.
//!
//! Skipped runs never abort a session, but they must not disappear silently
//! either: every skip and every outcome is reported to a [`DiagnosticSink`].

use aqc_core::RunId;
use serde::Serialize;

use crate::ratio::ComparisonOutcome;

/// Why a run was not compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// No reference object for this run.
    MissingReference,
    /// Current or reference object could not be reduced to a 1D histogram.
    Extraction(String),
    /// Current and reference binnings differ after transformation.
    Alignment(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingReference => write!(f, "reference object not found"),
            SkipReason::Extraction(msg) => write!(f, "extraction failed: {msg}"),
            SkipReason::Alignment(msg) => write!(f, "binning mismatch: {msg}"),
        }
    }
}

/// A run left out of the comparison, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRun {
    /// Run identifier.
    pub run: RunId,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Receiver of per-run session events.
///
/// Events arrive in ascending run order.
pub trait DiagnosticSink: Send + Sync {
    /// A run was skipped.
    fn run_skipped(&self, run: RunId, reason: &SkipReason);

    /// A run was compared. Default: ignore.
    fn outcome(&self, _run: RunId, _outcome: &ComparisonOutcome) {}
}

/// Sink that reports through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn run_skipped(&self, run: RunId, reason: &SkipReason) {
        tracing::warn!(run, %reason, "run skipped");
    }

    fn outcome(&self, run: RunId, outcome: &ComparisonOutcome) {
        tracing::debug!(
            run,
            checked = outcome.checked_bins,
            bad = outcome.bad_bins,
            bad_fraction = outcome.bad_fraction,
            flagged = outcome.flagged,
            "run compared"
        );
    }
}
