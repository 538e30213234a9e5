//! Error types for AQC run comparison

use thiserror::Error;

/// AQC error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// A source distribution cannot yield a 1-D histogram
    /// (unsupported shape, invalid projection axis, malformed bins).
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Invalid comparison configuration (rebin factor, tolerances, ranges).
    #[error("configuration error: {0}")]
    Config(String),

    /// Current and reference bin layouts do not match.
    #[error("alignment error: {0}")]
    Alignment(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
