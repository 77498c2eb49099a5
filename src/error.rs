//! Error taxonomy.
//!
//! Per spec: configuration and grid-axis problems are fatal to the run
//! (`Error`/`ConfigError`/`GridError`), while per-column data absence and
//! fit degeneracy are never raised — they are folded into a
//! [`crate::result::JetResult`] sentinel instead.

use thiserror::Error;

/// Top level error returned by the parts of the crate that *can* fail:
/// configuration construction and grid loading.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid grid: {0}")]
    Grid(#[from] GridError),
}

/// Configuration inconsistency, detected eagerly before any computation.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("theta_s ({theta_s}) must be strictly less than theta_e ({theta_e})")]
    ThetaDomainInverted { theta_s: f64, theta_e: f64 },
    #[error("min_lat ({min_lat}) must be strictly less than max_lat ({max_lat})")]
    LatitudeBandInverted { min_lat: f64, max_lat: f64 },
    #[error("unknown polynomial basis {0:?}")]
    UnknownBasis(String),
    #[error("fit_deg must be at least 1, got {0}")]
    DegreeTooLow(usize),
    #[error("pv_value must be strictly positive, got {0}")]
    NonPositivePvValue(f64),
    #[cfg(feature = "config")]
    #[error("failed to parse configuration: {0}")]
    Toml(String),
}

/// Grid / axis invariant violation, detected at load time.
#[derive(Debug, Clone, Error)]
pub enum GridError {
    #[error("{axis} axis is not strictly monotonic")]
    NotMonotonic { axis: &'static str },
    #[error("{axis} axis is empty")]
    EmptyAxis { axis: &'static str },
    #[error("dimension mismatch: {field} has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        field: &'static str,
        found: Vec<usize>,
        expected: Vec<usize>,
    },
    #[error("theta axis must be strictly ascending")]
    ThetaNotAscending,
}
