use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::core::apply_pool_filter;
use crate::models::{Availability, JobPosting, MatchResult, WorkerPoolFilter, WorkerProfile};
use crate::services::repository::{MatchRepository, RepositoryError};

/// In-process repository for tests and local runs
///
/// Saved matches are keyed by (job_id, worker_id), mirroring the unique
/// constraint of the PostgreSQL table.
#[derive(Default)]
pub struct InMemoryRepository {
    jobs: RwLock<HashMap<String, JobPosting>>,
    workers: RwLock<Vec<WorkerProfile>>,
    availability: RwLock<HashMap<String, Vec<Availability>>>,
    matches: RwLock<HashMap<(String, String), MatchResult>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_job(&self, job: JobPosting) {
        self.jobs.write().await.insert(job.job_id.clone(), job);
    }

    pub async fn insert_worker(&self, worker: WorkerProfile) {
        let mut workers = self.workers.write().await;
        workers.retain(|w| w.worker_id != worker.worker_id);
        workers.push(worker);
    }

    pub async fn insert_availability(&self, entry: Availability) {
        self.availability
            .write()
            .await
            .entry(entry.worker_id.clone())
            .or_default()
            .push(entry);
    }

    /// Saved matches for a job, best first
    pub async fn saved_matches(&self, job_id: &str) -> Vec<MatchResult> {
        let mut saved: Vec<MatchResult> = self
            .matches
            .read()
            .await
            .values()
            .filter(|m| m.job_id == job_id)
            .cloned()
            .collect();
        saved.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.worker_id.cmp(&b.worker_id))
        });
        saved
    }
}

#[async_trait]
impl MatchRepository for InMemoryRepository {
    async fn get_job(&self, job_id: &str) -> Result<JobPosting, RepositoryError> {
        self.jobs
            .read()
            .await
            .get(job_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("job {}", job_id)))
    }

    async fn get_worker_pool(&self, filter: &WorkerPoolFilter) -> Result<Vec<WorkerProfile>, RepositoryError> {
        let workers = self.workers.read().await.clone();
        Ok(apply_pool_filter(workers, filter))
    }

    async fn get_availability(&self, worker_id: &str) -> Result<Vec<Availability>, RepositoryError> {
        Ok(self
            .availability
            .read()
            .await
            .get(worker_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_match(&self, result: &MatchResult) -> Result<(), RepositoryError> {
        self.matches
            .write()
            .await
            .insert((result.job_id.clone(), result.worker_id.clone()), result.clone());
        Ok(())
    }
}
