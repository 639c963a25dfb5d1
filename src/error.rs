//! Error types for the fatigue simulation core.

use thiserror::Error;

use crate::models::MonthlyAnalysis;

/// Result type for fatigue-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can abort an analysis.
///
/// Non-fatal conditions (sleep truncation, compliance findings) are not
/// errors: they are collected into the analysis result as diagnostics and
/// per-rest-period findings.
#[derive(Error, Debug)]
pub enum Error {
    /// Roster failed structural validation (inverted intervals, overlapping
    /// duties, missing segments, unresolved timezones).
    #[error("roster validation failed: {0}")]
    RosterValidation(String),

    /// An airport referenced by the roster has no usable timezone.
    #[error("unknown or unresolvable timezone for airport {code}: {detail}")]
    UnresolvedTimezone { code: String, detail: String },

    /// The requested integration stride is unusable.
    #[error("invalid integration stride: {0}")]
    InvalidStride(String),

    /// Cancellation token tripped mid-simulation. Carries whatever was
    /// completed before the abort, so callers can still inspect partial
    /// results.
    #[error("analysis cancelled after {completed_duties} completed duties")]
    Cancelled {
        completed_duties: usize,
        partial: Option<Box<MonthlyAnalysis>>,
    },

    /// A NaN or infinity surfaced in the performance integration. This is
    /// unreachable with a sane parameter bundle and indicates a
    /// configuration bug.
    #[error("numeric instability in {context}: {detail}")]
    NumericInstability { context: String, detail: String },
}

impl Error {
    /// Shorthand for a roster validation failure.
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::RosterValidation(msg.into())
    }
}
