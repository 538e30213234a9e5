//! # aqc-check
//!
//! Ratio-based quality check of monitoring histograms against a reference
//! dataset.
//!
//! [`compare`] divides a current histogram by its reference with error
//! propagation and counts bins outside the `threshold + nσ·error` envelope.
//! [`RunComparisonSession`] applies one [`aqc_core::ComparisonSpec`] to every
//! run of a plot and collects the flagged runs.
//!
//! ## Example
//!
//! ```
//! use aqc_core::ComparisonSpec;
//! use aqc_check::compare;
//! use aqc_hist::Histogram;
//!
//! let cur = Histogram::uniform("cur", 0.0, 4.0, vec![10.0; 4], vec![1.0; 4]).unwrap();
//! let reference =
//!     Histogram::uniform("ref", 0.0, 4.0, vec![10.0, 10.0, 10.0, 20.0], vec![1.0; 4]).unwrap();
//! let spec = ComparisonSpec { normalize: false, ..Default::default() };
//!
//! let out = compare(&cur, &reference, &spec).unwrap();
//! assert_eq!(out.bad_bins, 1);
//! assert!(out.flagged);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod diagnostics;
pub mod ratio;
pub mod session;

pub use diagnostics::{DiagnosticSink, SkipReason, SkippedRun, TracingDiagnostics};
pub use ratio::{BinVerdict, ComparisonOutcome, compare};
pub use session::{Execution, RunComparisonSession, RunMap, SessionReport};
