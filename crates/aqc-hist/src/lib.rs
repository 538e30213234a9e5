//! # aqc-hist
//!
//! Histogram model for AQC run comparison.
//!
//! Turns raw monitoring objects (1D, 2D or profile histograms) into comparable
//! one-dimensional [`Histogram`]s, and applies the rebinning and normalization a
//! comparison asks for.
//!
//! ## Example
//!
//! ```
//! use aqc_core::{ComparisonSpec, Projection};
//! use aqc_hist::{Hist2D, SourceDistribution, extract, transform};
//!
//! let src = SourceDistribution::TwoD(Hist2D {
//!     name: "hits".into(),
//!     title: String::new(),
//!     x_edges: vec![0.0, 1.0, 2.0],
//!     y_edges: vec![0.0, 1.0, 2.0],
//!     content: vec![1.0, 2.0, 3.0, 4.0],
//!     sumw2: None,
//!     entries: 10.0,
//! });
//! let h = extract(&src, Projection::X, "_comp_1").unwrap();
//! assert_eq!(h.bin_content, vec![4.0, 6.0]);
//!
//! let h = transform::apply(h, &ComparisonSpec::default()).unwrap();
//! assert!((h.integral() - 1.0).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod extract;
pub mod histogram;
pub mod monitor;
pub mod transform;

pub use extract::extract;
pub use histogram::Histogram;
pub use monitor::{
    Hist1D, Hist2D, MonitorObject, MonitorSource, PlotPath, Profile1D, ProfileErrorMode,
    SourceDistribution,
};
pub use transform::{normalization_factor, normalize, rebin};
