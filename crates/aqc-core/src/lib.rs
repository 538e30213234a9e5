//! # aqc-core
//!
//! Core types, configuration values and error handling for AQC run comparison.
//!
//! This crate provides:
//! - The error taxonomy shared by every stage (extraction, configuration, alignment)
//! - [`ComparisonSpec`] and its building blocks ([`Projection`], [`CheckRange`])
//! - Run identity types ([`RunId`], [`ValidityInterval`])

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{CheckRange, ComparisonSpec, Projection, RunId, ValidityInterval};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
