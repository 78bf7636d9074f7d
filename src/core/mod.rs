// Core algorithm exports
pub mod availability;
pub mod distance;
pub mod filters;
pub mod matcher;
pub mod recurrence;
pub mod scoring;

pub use availability::{availability_score, declares_free_in, expire_as_of, has_conflict, has_conflict_in};
pub use distance::{calculate_bounding_box, distance_km, haversine_distance, is_within_bounding_box};
pub use filters::{apply_pool_filter, is_job_open, matches_pool_filter};
pub use matcher::{score_match, MatchBatch, Matcher, SkippedWorker, DEFAULT_THRESHOLD};
pub use recurrence::{occurs_within, validate_rule};
pub use scoring::{aggregate, score_profile, ScoringParams};
