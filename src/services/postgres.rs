use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::time::Duration;

use crate::core::apply_pool_filter;
use crate::models::{Availability, AvailabilityStatus, JobPosting, MatchResult, MatchStatus, WorkerPoolFilter, WorkerProfile};
use crate::services::repository::{MatchRepository, RepositoryError};

/// PostgreSQL-backed repository for matching data
///
/// Jobs, workers and availability entries are stored as JSONB snapshots
/// keyed by id; match results are upserted on (job_id, worker_id) so a
/// repeated evaluation overwrites the previous record.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Create a new repository from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new repository from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, RepositoryError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Insert or replace a job posting snapshot
    pub async fn upsert_job(&self, job: &JobPosting) -> Result<(), RepositoryError> {
        let query = r#"
            INSERT INTO job_postings (job_id, status, data, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (job_id)
            DO UPDATE SET
                status = EXCLUDED.status,
                data = EXCLUDED.data,
                updated_at = EXCLUDED.updated_at
        "#;

        let status = if job.is_open() { "active" } else { "closed" };
        sqlx::query(query)
            .bind(&job.job_id)
            .bind(status)
            .bind(Json(job))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert or replace a worker profile snapshot
    pub async fn upsert_worker(&self, worker: &WorkerProfile) -> Result<(), RepositoryError> {
        let query = r#"
            INSERT INTO worker_profiles (worker_id, data, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (worker_id)
            DO UPDATE SET
                data = EXCLUDED.data,
                updated_at = EXCLUDED.updated_at
        "#;

        sqlx::query(query)
            .bind(&worker.worker_id)
            .bind(Json(worker))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert or replace an availability entry
    ///
    /// Entries are never deleted; deactivation and expiry are status changes.
    pub async fn upsert_availability(&self, entry: &Availability) -> Result<(), RepositoryError> {
        let query = r#"
            INSERT INTO availabilities (id, worker_id, status, data, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (id)
            DO UPDATE SET
                status = EXCLUDED.status,
                data = EXCLUDED.data,
                updated_at = EXCLUDED.updated_at
        "#;

        sqlx::query(query)
            .bind(&entry.id)
            .bind(&entry.worker_id)
            .bind(availability_status_label(entry.status))
            .bind(Json(entry))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, RepositoryError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn availability_status_label(status: AvailabilityStatus) -> &'static str {
    match status {
        AvailabilityStatus::Active => "active",
        AvailabilityStatus::Inactive => "inactive",
        AvailabilityStatus::Expired => "expired",
    }
}

fn status_label(status: MatchStatus) -> &'static str {
    match status {
        MatchStatus::Pending => "pending",
        MatchStatus::Notified => "notified",
    }
}

#[async_trait]
impl MatchRepository for PostgresRepository {
    async fn get_job(&self, job_id: &str) -> Result<JobPosting, RepositoryError> {
        let row = sqlx::query("SELECT data FROM job_postings WHERE job_id = $1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("job {}", job_id)))?;

        let Json(job): Json<JobPosting> = row.try_get("data")?;
        Ok(job)
    }

    async fn get_worker_pool(&self, filter: &WorkerPoolFilter) -> Result<Vec<WorkerProfile>, RepositoryError> {
        let query = r#"
            SELECT data
            FROM worker_profiles
            WHERE NOT (worker_id = ANY($1))
            ORDER BY worker_id
        "#;

        let rows = sqlx::query(query)
            .bind(&filter.exclude_worker_ids)
            .fetch_all(&self.pool)
            .await?;

        let workers = rows
            .iter()
            .map(|row| row.try_get::<Json<WorkerProfile>, _>("data").map(|json| json.0))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Loaded {} worker profiles before filtering", workers.len());

        Ok(apply_pool_filter(workers, filter))
    }

    async fn get_availability(&self, worker_id: &str) -> Result<Vec<Availability>, RepositoryError> {
        let rows = sqlx::query("SELECT data FROM availabilities WHERE worker_id = $1 ORDER BY id")
            .bind(worker_id)
            .fetch_all(&self.pool)
            .await?;

        let entries = rows
            .iter()
            .map(|row| row.try_get::<Json<Availability>, _>("data").map(|json| json.0))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Uses INSERT ... ON CONFLICT so a re-run overwrites the previous score.
    async fn save_match(&self, result: &MatchResult) -> Result<(), RepositoryError> {
        let query = r#"
            INSERT INTO match_results (job_id, worker_id, score, breakdown, matched_skills, status, evaluated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (job_id, worker_id)
            DO UPDATE SET
                score = EXCLUDED.score,
                breakdown = EXCLUDED.breakdown,
                matched_skills = EXCLUDED.matched_skills,
                status = EXCLUDED.status,
                evaluated_at = EXCLUDED.evaluated_at
        "#;

        sqlx::query(query)
            .bind(&result.job_id)
            .bind(&result.worker_id)
            .bind(result.score)
            .bind(Json(&result.breakdown))
            .bind(Json(&result.matched_skills))
            .bind(status_label(result.status))
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "Saved match: {} -> {} ({:.3}, {:?})",
            result.job_id,
            result.worker_id,
            result.score,
            result.status
        );

        Ok(())
    }
}
