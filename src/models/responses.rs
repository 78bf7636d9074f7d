use serde::{Deserialize, Serialize};

use crate::models::domain::MatchResult;

/// Response for the job matching endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindMatchesResponse {
    pub job_id: String,
    pub run_id: String,
    pub matches: Vec<MatchResult>,
    pub skipped: Vec<SkippedResponse>,
    pub total_candidates: usize,
    pub cancelled: bool,
}

/// Worker left out of a batch because its data could not be evaluated
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedResponse {
    pub worker_id: String,
    pub reason: String,
}

/// Conflict check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictCheckResponse {
    pub has_conflict: bool,
    pub declared_free: bool,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
