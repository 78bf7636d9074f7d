use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by the matching engine.
///
/// Only input-contract violations live here. Degraded data (missing
/// coordinates, missing salary, empty skill requirements) always resolves to
/// a zero or neutral dimension score and never produces an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error("Invalid range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid weight configuration: {0}")]
    InvalidWeightConfiguration(String),

    #[error("Invalid scoring parameter: {0}")]
    InvalidScoringParameter(String),

    #[error("Invalid threshold {0}: must be within [0, 1]")]
    InvalidThreshold(f64),

    #[error("Invalid recurrence rule: {0}")]
    InvalidRecurrenceRule(String),

    #[error("Invalid availability {id}: {reason}")]
    InvalidAvailability { id: String, reason: String },

    #[error("Unsupported recurrence pattern CUSTOM: expand it into a concrete rule before matching")]
    UnsupportedRecurrence,

    #[error("Job {0} is closed")]
    JobClosed(String),
}

pub type Result<T> = std::result::Result<T, MatchError>;
