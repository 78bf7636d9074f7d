use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures::future::{join_all, try_join_all};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::core::{expire_as_of, MatchBatch, Matcher};
use crate::error::MatchError;
use crate::models::{MatchResult, WorkerPoolFilter, WorkerProfile};
use crate::services::notifier::MatchNotifier;
use crate::services::repository::{MatchRepository, RepositoryError};

/// Errors surfaced by a matching run
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Matching error: {0}")]
    Match(#[from] MatchError),

    #[error("Scoring task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Outcome of one repository-backed matching run
#[derive(Debug)]
pub struct MatchRun {
    pub run_id: Uuid,
    pub job_id: String,
    pub batch: MatchBatch,
    /// Matches written to the repository
    pub persisted: usize,
    /// Matches whose notification was delivered
    pub notified: usize,
    /// Workers whose match could not be saved; they were not notified
    pub unsaved: Vec<String>,
}

/// Runs the full pipeline for a job: load, expire, score, persist, notify
pub struct MatchingService {
    repository: Arc<dyn MatchRepository>,
    notifier: Arc<dyn MatchNotifier>,
    matcher: Matcher,
}

impl MatchingService {
    pub fn new(repository: Arc<dyn MatchRepository>, notifier: Arc<dyn MatchNotifier>, matcher: Matcher) -> Self {
        Self {
            repository,
            notifier,
            matcher,
        }
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Match a stored job against the filtered worker pool
    ///
    /// A cancelled run returns the partial batch without persisting or
    /// notifying anything. Every qualifying match is saved independently;
    /// a failed save is logged, listed in `unsaved` and skips that worker's
    /// notification. The run only fails on saves when none succeeded.
    /// Notification failures are logged and leave the match PENDING.
    pub async fn run_for_job(
        &self,
        job_id: &str,
        filter: &WorkerPoolFilter,
        threshold: Option<f64>,
        cancel: CancellationToken,
    ) -> Result<MatchRun, ServiceError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("match_run", %run_id, job_id);

        self.run(run_id, job_id, filter, threshold, cancel, Utc::now().date_naive())
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        run_id: Uuid,
        job_id: &str,
        filter: &WorkerPoolFilter,
        threshold: Option<f64>,
        cancel: CancellationToken,
        today: NaiveDate,
    ) -> Result<MatchRun, ServiceError> {
        let threshold = threshold.unwrap_or_else(|| self.matcher.threshold());

        let job = self.repository.get_job(job_id).await?;
        if !job.is_open() {
            return Err(MatchError::JobClosed(job.job_id).into());
        }

        let pool = self.repository.get_worker_pool(filter).await?;
        tracing::info!("Loaded {} candidate workers", pool.len());

        let pool = try_join_all(pool.into_iter().map(|worker| self.load_availability(worker, today))).await?;

        let matcher = self.matcher.clone();
        let token = cancel.clone();
        let batch = tokio::task::spawn_blocking(move || matcher.find_matches(&job, &pool, threshold, &token)).await??;

        if batch.cancelled {
            tracing::warn!(
                "Run cancelled after {} of {} workers; nothing persisted",
                batch.evaluated,
                batch.total_candidates
            );
            return Ok(MatchRun {
                run_id,
                job_id: job_id.to_string(),
                batch,
                persisted: 0,
                notified: 0,
                unsaved: Vec::new(),
            });
        }

        let mut saved = Vec::with_capacity(batch.matches.len());
        let mut unsaved = Vec::new();
        let mut first_error = None;
        for result in &batch.matches {
            match self.repository.save_match(result).await {
                Ok(()) => saved.push(result),
                Err(e) => {
                    tracing::warn!("Failed to save match {} -> {}: {}", result.job_id, result.worker_id, e);
                    unsaved.push(result.worker_id.clone());
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        if let Some(e) = first_error.filter(|_| saved.is_empty()) {
            return Err(e.into());
        }
        let persisted = saved.len();

        let notified = join_all(saved.into_iter().map(|result| self.notify(result)))
            .await
            .into_iter()
            .filter(|delivered| *delivered)
            .count();

        tracing::info!("Persisted {} matches, notified {}", persisted, notified);

        Ok(MatchRun {
            run_id,
            job_id: job_id.to_string(),
            batch,
            persisted,
            notified,
            unsaved,
        })
    }

    /// Attach the worker's stored availability, with stale entries expired
    async fn load_availability(&self, mut worker: WorkerProfile, today: NaiveDate) -> Result<WorkerProfile, RepositoryError> {
        let stored = self.repository.get_availability(&worker.worker_id).await?;
        if !stored.is_empty() {
            worker.availability = stored;
        }
        worker.availability = worker
            .availability
            .iter()
            .map(|entry| expire_as_of(entry, today))
            .collect();
        Ok(worker)
    }

    /// Deliver one notification; returns whether it was delivered
    async fn notify(&self, result: &MatchResult) -> bool {
        if let Err(e) = self
            .notifier
            .notify(&result.worker_id, &result.job_id, result.score)
            .await
        {
            tracing::warn!("Failed to notify worker {}: {}", result.worker_id, e);
            return false;
        }

        let notified = result.clone().mark_notified();
        if let Err(e) = self.repository.save_match(&notified).await {
            tracing::warn!("Failed to mark match {} -> {} notified: {}", result.job_id, result.worker_id, e);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Availability, AvailabilityStatus, AvailabilityType, JobPosting, JobStatus, ScheduleWindow};
    use crate::services::memory::InMemoryRepository;
    use crate::services::notifier::LogNotifier;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_job() -> JobPosting {
        JobPosting {
            job_id: "j1".to_string(),
            required_skills: vec!["forklift".to_string()],
            required_experience_years: 1.0,
            location: None,
            salary: None,
            status: JobStatus::Active,
            schedule: Some(ScheduleWindow::new(date(2030, 3, 4), date(2030, 3, 8))),
        }
    }

    fn create_worker(id: &str) -> WorkerProfile {
        WorkerProfile {
            worker_id: id.to_string(),
            skills: vec!["forklift".to_string()],
            experience_years: 2.0,
            preferred_location: None,
            salary_expectation: None,
            availability: vec![],
        }
    }

    #[tokio::test]
    async fn test_stale_entries_are_expired_before_scoring() {
        let repo = Arc::new(InMemoryRepository::new());
        repo.insert_availability(Availability::fixed(
            "a1",
            "w1",
            AvailabilityType::Unavailable,
            date(2020, 1, 1),
            Some(date(2020, 1, 31)),
        ))
        .await;

        let service = MatchingService::new(repo, Arc::new(LogNotifier), Matcher::with_default_weights());
        let worker = service.load_availability(create_worker("w1"), date(2024, 6, 1)).await.unwrap();

        assert_eq!(worker.availability.len(), 1);
        assert_eq!(worker.availability[0].status, AvailabilityStatus::Expired);
    }

    #[tokio::test]
    async fn test_cancelled_run_persists_nothing() {
        let repo = Arc::new(InMemoryRepository::new());
        repo.insert_job(create_job()).await;
        repo.insert_worker(create_worker("w1")).await;

        let service = MatchingService::new(repo.clone(), Arc::new(LogNotifier), Matcher::with_default_weights());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let run = service
            .run_for_job("j1", &WorkerPoolFilter::default(), Some(0.0), cancel)
            .await
            .unwrap();

        assert!(run.batch.cancelled);
        assert_eq!(run.persisted, 0);
        assert!(repo.saved_matches("j1").await.is_empty());
    }
}
