// Matching service tests against the in-memory repository

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use staffmatch::core::Matcher;
use staffmatch::models::{
    Availability, AvailabilityType, Coordinate, JobPosting, JobStatus, MatchStatus, ScheduleWindow, WorkerPoolFilter,
    WorkerProfile,
};
use staffmatch::services::{
    InMemoryRepository, MatchNotifier, MatchRepository, MatchingService, NotifyError, RepositoryError, ServiceError,
};
use staffmatch::MatchError;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Records every delivered notification; fails for the listed workers
#[derive(Default)]
struct RecordingNotifier {
    failing: Vec<String>,
    delivered: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl MatchNotifier for RecordingNotifier {
    async fn notify(&self, worker_id: &str, job_id: &str, _score: f64) -> Result<(), NotifyError> {
        if self.failing.iter().any(|id| id == worker_id) {
            return Err(NotifyError::Unavailable("push gateway down".to_string()));
        }
        self.delivered
            .lock()
            .unwrap()
            .push((worker_id.to_string(), job_id.to_string()));
        Ok(())
    }
}

/// Repository whose availability reads always fail
struct BrokenAvailabilityRepository {
    inner: InMemoryRepository,
}

#[async_trait]
impl MatchRepository for BrokenAvailabilityRepository {
    async fn get_job(&self, job_id: &str) -> Result<JobPosting, RepositoryError> {
        self.inner.get_job(job_id).await
    }

    async fn get_worker_pool(&self, filter: &WorkerPoolFilter) -> Result<Vec<WorkerProfile>, RepositoryError> {
        self.inner.get_worker_pool(filter).await
    }

    async fn get_availability(&self, _worker_id: &str) -> Result<Vec<Availability>, RepositoryError> {
        Err(RepositoryError::Unavailable("availability store offline".to_string()))
    }

    async fn save_match(&self, result: &staffmatch::MatchResult) -> Result<(), RepositoryError> {
        self.inner.save_match(result).await
    }
}

/// Repository that refuses to save matches for the listed workers
struct FlakySaveRepository {
    inner: InMemoryRepository,
    rejected: Vec<String>,
}

#[async_trait]
impl MatchRepository for FlakySaveRepository {
    async fn get_job(&self, job_id: &str) -> Result<JobPosting, RepositoryError> {
        self.inner.get_job(job_id).await
    }

    async fn get_worker_pool(&self, filter: &WorkerPoolFilter) -> Result<Vec<WorkerProfile>, RepositoryError> {
        self.inner.get_worker_pool(filter).await
    }

    async fn get_availability(&self, worker_id: &str) -> Result<Vec<Availability>, RepositoryError> {
        self.inner.get_availability(worker_id).await
    }

    async fn save_match(&self, result: &staffmatch::MatchResult) -> Result<(), RepositoryError> {
        if self.rejected.iter().any(|id| *id == result.worker_id) {
            return Err(RepositoryError::Unavailable("write timed out".to_string()));
        }
        self.inner.save_match(result).await
    }
}

async fn flaky_repository(rejected: &[&str]) -> Arc<FlakySaveRepository> {
    let inner = InMemoryRepository::new();
    inner.insert_job(create_job("job-1")).await;
    for id in ["w1", "w2"] {
        inner.insert_worker(create_worker(id)).await;
        inner.insert_availability(free_next_week(id)).await;
    }
    Arc::new(FlakySaveRepository {
        inner,
        rejected: rejected.iter().map(|id| id.to_string()).collect(),
    })
}

fn next_week() -> (NaiveDate, NaiveDate) {
    let start = Utc::now().date_naive() + Duration::days(7);
    (start, start + Duration::days(4))
}

fn create_job(job_id: &str) -> JobPosting {
    let (start, end) = next_week();
    JobPosting {
        job_id: job_id.to_string(),
        required_skills: vec!["forklift".to_string(), "safety".to_string()],
        required_experience_years: 2.0,
        location: Some(Coordinate::new(52.52, 13.405)),
        salary: None,
        status: JobStatus::Active,
        schedule: Some(ScheduleWindow::new(start, end)),
    }
}

fn create_worker(id: &str) -> WorkerProfile {
    WorkerProfile {
        worker_id: id.to_string(),
        skills: vec!["Forklift".to_string(), "Safety".to_string()],
        experience_years: 4.0,
        preferred_location: Some(Coordinate::new(52.53, 13.41)),
        salary_expectation: None,
        availability: vec![],
    }
}

fn free_next_week(worker_id: &str) -> Availability {
    let (start, end) = next_week();
    Availability::fixed(
        &format!("{}-free", worker_id),
        worker_id,
        AvailabilityType::Available,
        start - Duration::days(1),
        Some(end + Duration::days(1)),
    )
}

async fn seeded_repository() -> Arc<InMemoryRepository> {
    let repo = Arc::new(InMemoryRepository::new());
    repo.insert_job(create_job("job-1")).await;
    for id in ["w1", "w2", "w3"] {
        repo.insert_worker(create_worker(id)).await;
    }
    repo.insert_availability(free_next_week("w1")).await;
    repo.insert_availability(free_next_week("w2")).await;
    // w3 never declared availability
    repo
}

fn matcher() -> Matcher {
    // No salary data on either side, so the best reachable score is 0.85
    Matcher::with_default_weights().with_threshold(0.6).unwrap()
}

#[tokio::test]
async fn test_run_persists_and_notifies() {
    let repo = seeded_repository().await;
    let notifier = Arc::new(RecordingNotifier::default());
    let service = MatchingService::new(repo.clone(), notifier.clone(), matcher());

    let run = service
        .run_for_job("job-1", &WorkerPoolFilter::default(), None, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(run.job_id, "job-1");
    assert_eq!(run.batch.total_candidates, 3);
    assert_eq!(run.persisted, 2);
    assert_eq!(run.notified, 2);

    let saved = repo.saved_matches("job-1").await;
    assert_eq!(saved.len(), 2);
    assert!(saved.iter().all(|m| m.status == MatchStatus::Notified));
    assert!(saved.iter().all(|m| m.worker_id != "w3"));
    assert_eq!(notifier.delivered.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_notification_leaves_match_pending() {
    let repo = seeded_repository().await;
    let notifier = Arc::new(RecordingNotifier {
        failing: vec!["w2".to_string()],
        ..Default::default()
    });
    let service = MatchingService::new(repo.clone(), notifier, matcher());

    let run = service
        .run_for_job("job-1", &WorkerPoolFilter::default(), None, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(run.persisted, 2);
    assert_eq!(run.notified, 1);

    let saved = repo.saved_matches("job-1").await;
    let w2 = saved.iter().find(|m| m.worker_id == "w2").unwrap();
    assert_eq!(w2.status, MatchStatus::Pending);
    let w1 = saved.iter().find(|m| m.worker_id == "w1").unwrap();
    assert_eq!(w1.status, MatchStatus::Notified);
}

#[tokio::test]
async fn test_filter_and_threshold_override() {
    let repo = seeded_repository().await;
    let service = MatchingService::new(repo.clone(), Arc::new(RecordingNotifier::default()), matcher());

    let filter = WorkerPoolFilter {
        exclude_worker_ids: vec!["w1".to_string()],
        ..Default::default()
    };
    let run = service
        .run_for_job("job-1", &filter, Some(0.95), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(run.batch.total_candidates, 2);
    assert!(run.batch.matches.is_empty());
    assert!(repo.saved_matches("job-1").await.is_empty());
}

#[tokio::test]
async fn test_missing_job_surfaces_not_found() {
    let repo = seeded_repository().await;
    let service = MatchingService::new(repo, Arc::new(RecordingNotifier::default()), matcher());

    let result = service
        .run_for_job("job-404", &WorkerPoolFilter::default(), None, CancellationToken::new())
        .await;

    assert!(matches!(result, Err(ServiceError::Repository(RepositoryError::NotFound(_)))));
}

#[tokio::test]
async fn test_closed_job_rejected() {
    let repo = seeded_repository().await;
    let mut job = create_job("job-closed");
    job.status = JobStatus::Closed;
    repo.insert_job(job).await;
    let service = MatchingService::new(repo, Arc::new(RecordingNotifier::default()), matcher());

    let result = service
        .run_for_job("job-closed", &WorkerPoolFilter::default(), None, CancellationToken::new())
        .await;

    assert!(matches!(result, Err(ServiceError::Match(MatchError::JobClosed(_)))));
}

#[tokio::test]
async fn test_availability_read_failure_surfaces() {
    let inner = InMemoryRepository::new();
    inner.insert_job(create_job("job-1")).await;
    inner.insert_worker(create_worker("w1")).await;
    let repo = Arc::new(BrokenAvailabilityRepository { inner });
    let service = MatchingService::new(repo, Arc::new(RecordingNotifier::default()), matcher());

    let result = service
        .run_for_job("job-1", &WorkerPoolFilter::default(), None, CancellationToken::new())
        .await;

    assert!(matches!(result, Err(ServiceError::Repository(RepositoryError::Unavailable(_)))));
}

#[tokio::test]
async fn test_failed_save_does_not_block_other_matches() {
    let repo = flaky_repository(&["w1"]).await;
    let notifier = Arc::new(RecordingNotifier::default());
    let service = MatchingService::new(repo.clone(), notifier.clone(), matcher());

    let run = service
        .run_for_job("job-1", &WorkerPoolFilter::default(), None, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(run.batch.matches.len(), 2);
    assert_eq!(run.persisted, 1);
    assert_eq!(run.unsaved, vec!["w1".to_string()]);
    assert_eq!(run.notified, 1);

    let saved = repo.inner.saved_matches("job-1").await;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].worker_id, "w2");
    assert_eq!(saved[0].status, MatchStatus::Notified);
    assert_eq!(
        *notifier.delivered.lock().unwrap(),
        vec![("w2".to_string(), "job-1".to_string())]
    );
}

#[tokio::test]
async fn test_run_fails_when_no_match_can_be_saved() {
    let repo = flaky_repository(&["w1", "w2"]).await;
    let notifier = Arc::new(RecordingNotifier::default());
    let service = MatchingService::new(repo, notifier.clone(), matcher());

    let result = service
        .run_for_job("job-1", &WorkerPoolFilter::default(), None, CancellationToken::new())
        .await;

    assert!(matches!(result, Err(ServiceError::Repository(RepositoryError::Unavailable(_)))));
    assert!(notifier.delivered.lock().unwrap().is_empty());
}
