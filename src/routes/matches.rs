use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use validator::Validate;

use crate::core::availability::validate_availability;
use crate::core::{declares_free_in, has_conflict_in, score_match};
use crate::error::MatchError;
use crate::models::{
    ConflictCheckRequest, ConflictCheckResponse, ErrorResponse, FindMatchesRequest, FindMatchesResponse,
    HealthResponse, ScoreMatchRequest, SkippedResponse,
};
use crate::services::{MatchingService, PostgresRepository, RepositoryError, ServiceError};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MatchingService>,
    /// Checked by the health endpoint when the service runs on PostgreSQL
    pub postgres: Option<Arc<PostgresRepository>>,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/score", web::post().to(score))
        .route("/availability/conflicts", web::post().to(check_conflicts))
        .route("/jobs/{job_id}/matches", web::post().to(find_job_matches));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = match &state.postgres {
        Some(postgres) => postgres.health_check().await.unwrap_or(false),
        None => true,
    };

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Score one inline (job, worker) pair
///
/// POST /api/v1/matches/score
///
/// Request body:
/// ```json
/// {
///   "job": { "jobId": "string", "requiredSkills": ["string"], ... },
///   "worker": { "workerId": "string", "skills": ["string"], ... },
///   "profile": { "profile": "four_dimension" }
/// }
/// ```
async fn score(state: web::Data<AppState>, req: web::Json<ScoreMatchRequest>) -> impl Responder {
    let matcher = state.service.matcher();
    let profile = req.profile.unwrap_or(*matcher.profile());

    match score_match(&req.job, &req.worker, &profile, matcher.params()) {
        Ok(result) => {
            tracing::debug!("Scored {} -> {}: {:.3}", result.job_id, result.worker_id, result.score);
            HttpResponse::Ok().json(result)
        }
        Err(e) => match_error_response(&e),
    }
}

/// Check a proposed window against a worker's availability entries
///
/// POST /api/v1/availability/conflicts
async fn check_conflicts(req: web::Json<ConflictCheckRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors.to_string());
    }
    if let Some(e) = req.availability.iter().find_map(|entry| validate_availability(entry).err()) {
        return match_error_response(&e);
    }

    let result = has_conflict_in(&req.availability, &req.window)
        .and_then(|has_conflict| Ok((has_conflict, declares_free_in(&req.availability, &req.window)?)));

    match result {
        Ok((has_conflict, declared_free)) => HttpResponse::Ok().json(ConflictCheckResponse {
            has_conflict,
            declared_free,
        }),
        Err(e) => match_error_response(&e),
    }
}

/// Run matching for a stored job
///
/// POST /api/v1/jobs/{job_id}/matches
///
/// Request body:
/// ```json
/// {
///   "filter": { "excludeWorkerIds": ["string"], "anyOfSkills": ["string"], "limit": 500 },
///   "threshold": 0.7
/// }
/// ```
///
/// The run is cancelled if the client goes away before it completes.
async fn find_job_matches(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<FindMatchesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors.to_string());
    }

    let job_id = path.into_inner();
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    tracing::info!("Finding matches for job: {}", job_id);

    match state
        .service
        .run_for_job(&job_id, &req.filter, req.threshold, cancel)
        .await
    {
        Ok(run) => HttpResponse::Ok().json(FindMatchesResponse {
            job_id: run.job_id,
            run_id: run.run_id.to_string(),
            skipped: run
                .batch
                .skipped
                .iter()
                .map(|s| SkippedResponse {
                    worker_id: s.worker_id.clone(),
                    reason: s.error.to_string(),
                })
                .collect(),
            matches: run.batch.matches,
            total_candidates: run.batch.total_candidates,
            cancelled: run.batch.cancelled,
        }),
        Err(e) => service_error_response(&e),
    }
}

fn validation_error(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message,
        status_code: 400,
    })
}

fn match_error_response(e: &MatchError) -> HttpResponse {
    match e {
        MatchError::JobClosed(_) => HttpResponse::Conflict().json(ErrorResponse {
            error: "Job closed".to_string(),
            message: e.to_string(),
            status_code: 409,
        }),
        _ => HttpResponse::BadRequest().json(ErrorResponse {
            error: "Invalid input".to_string(),
            message: e.to_string(),
            status_code: 400,
        }),
    }
}

fn service_error_response(e: &ServiceError) -> HttpResponse {
    match e {
        ServiceError::Match(e) => match_error_response(e),
        ServiceError::Repository(RepositoryError::NotFound(what)) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Not found".to_string(),
            message: format!("{} does not exist", what),
            status_code: 404,
        }),
        _ => {
            tracing::error!("Matching run failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Matching run failed".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}
