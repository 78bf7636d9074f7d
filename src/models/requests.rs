use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{Availability, JobPosting, ScheduleWindow, WeightProfile, WorkerPoolFilter, WorkerProfile};

/// Request to run matching for a stored job
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FindMatchesRequest {
    #[serde(default)]
    pub filter: WorkerPoolFilter,
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default)]
    pub threshold: Option<f64>,
}

/// Request to score a single inline (job, worker) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreMatchRequest {
    pub job: JobPosting,
    pub worker: WorkerProfile,
    /// Overrides the configured profile for this call only
    #[serde(default)]
    pub profile: Option<WeightProfile>,
}

/// Request to check a proposed window against availability entries
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConflictCheckRequest {
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub availability: Vec<Availability>,
    pub window: ScheduleWindow,
}
