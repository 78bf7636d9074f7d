//! staffmatch - worker/job matching and availability conflict engine
//!
//! Scores workers against job postings on skill, experience, location,
//! salary and availability, and answers whether a worker's declared
//! availability conflicts with a proposed schedule.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{has_conflict, occurs_within, score_match, MatchBatch, Matcher, ScoringParams};
pub use crate::error::MatchError;
pub use crate::models::{Availability, JobPosting, MatchResult, RecurrenceRule, ScoringWeights, WeightProfile, WorkerProfile};
