use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Availability, JobPosting, MatchResult, WorkerPoolFilter, WorkerProfile};

/// Errors that can occur when reading or writing matching data
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Repository unavailable: {0}")]
    Unavailable(String),
}

/// Source of job/worker snapshots and sink for match records
///
/// Deduplication of saved matches (one row per job and worker) is the
/// implementation's responsibility.
#[async_trait]
pub trait MatchRepository: Send + Sync {
    async fn get_job(&self, job_id: &str) -> Result<JobPosting, RepositoryError>;

    async fn get_worker_pool(&self, filter: &WorkerPoolFilter) -> Result<Vec<WorkerProfile>, RepositoryError>;

    async fn get_availability(&self, worker_id: &str) -> Result<Vec<Availability>, RepositoryError>;

    async fn save_match(&self, result: &MatchResult) -> Result<(), RepositoryError>;
}
