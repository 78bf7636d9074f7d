use std::cmp::Ordering;

use tokio_util::sync::CancellationToken;

use crate::core::{
    availability::availability_score,
    filters::is_job_open,
    scoring::{aggregate, score_profile, ScoringParams},
};
use crate::error::{MatchError, Result};
use crate::models::{JobPosting, MatchResult, MatchStatus, ScoringWeights, WeightProfile, WorkerProfile};

/// Default acceptance threshold for `find_matches`
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Worker whose evaluation failed and was left out of a batch
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedWorker {
    pub worker_id: String,
    pub error: MatchError,
}

/// Result of matching one job against a worker pool
#[derive(Debug, Default)]
pub struct MatchBatch {
    /// Matches at or above the threshold, best first
    pub matches: Vec<MatchResult>,
    pub skipped: Vec<SkippedWorker>,
    pub total_candidates: usize,
    pub evaluated: usize,
    /// Set when the batch stopped early on cancellation
    pub cancelled: bool,
}

enum Evaluation {
    Scored(MatchResult),
    Skipped(SkippedWorker),
}

/// Score one (job, worker) pair under an explicit weight profile
///
/// The availability dimension is only evaluated when the profile gives it
/// weight; under a gating profile a zero availability score forces the
/// aggregate to zero.
pub fn score_match(
    job: &JobPosting,
    worker: &WorkerProfile,
    profile: &WeightProfile,
    params: &ScoringParams,
) -> Result<MatchResult> {
    let weights = profile.weights();
    weights.validate()?;

    let profile_scores = score_profile(job, worker, params);
    let availability = if weights.availability > 0.0 {
        availability_score(&worker.availability, job.schedule.as_ref())?
    } else {
        0.0
    };

    let (breakdown, matched_skills) = profile_scores.with_availability(availability);
    let mut score = aggregate(&breakdown, &weights);
    if profile.gates_on_availability() && availability == 0.0 {
        score = 0.0;
    }

    Ok(MatchResult {
        job_id: job.job_id.clone(),
        worker_id: worker.worker_id.clone(),
        score,
        breakdown,
        matched_skills,
        status: MatchStatus::Pending,
    })
}

/// Main matching orchestrator
///
/// Holds a validated weight profile and scoring tolerances. Scoring is pure,
/// so one `Matcher` can be shared freely across threads.
#[derive(Debug, Clone)]
pub struct Matcher {
    profile: WeightProfile,
    params: ScoringParams,
    threshold: f64,
    max_workers: usize,
}

impl Matcher {
    pub fn new(profile: WeightProfile, params: ScoringParams) -> Result<Self> {
        profile.weights().validate()?;
        params.validate()?;

        Ok(Self {
            profile,
            params,
            threshold: DEFAULT_THRESHOLD,
            max_workers: default_parallelism(),
        })
    }

    pub fn with_default_weights() -> Self {
        Self {
            profile: WeightProfile::default(),
            params: ScoringParams::default(),
            threshold: DEFAULT_THRESHOLD,
            max_workers: default_parallelism(),
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Result<Self> {
        validate_threshold(threshold)?;
        self.threshold = threshold;
        Ok(self)
    }

    /// Cap on scoring threads used by `find_matches`
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn profile(&self) -> &WeightProfile {
        &self.profile
    }

    pub fn weights(&self) -> ScoringWeights {
        self.profile.weights()
    }

    pub fn params(&self) -> &ScoringParams {
        &self.params
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn score_match(&self, job: &JobPosting, worker: &WorkerProfile) -> Result<MatchResult> {
        score_match(job, worker, &self.profile, &self.params)
    }

    /// Find matches for a job across a worker pool
    ///
    /// Every worker is scored independently, in parallel chunks. A worker
    /// whose data cannot be evaluated is recorded in `skipped` and does not
    /// abort the batch. `cancel` is checked once per worker.
    ///
    /// # Returns
    /// MatchBatch with matches at or above `threshold`, sorted by score
    /// (descending) and then worker id
    pub fn find_matches(
        &self,
        job: &JobPosting,
        pool: &[WorkerProfile],
        threshold: f64,
        cancel: &CancellationToken,
    ) -> Result<MatchBatch> {
        validate_threshold(threshold)?;
        if !is_job_open(job) {
            return Err(MatchError::JobClosed(job.job_id.clone()));
        }

        let total_candidates = pool.len();
        if pool.is_empty() {
            return Ok(MatchBatch::default());
        }

        let threads = self.max_workers.clamp(1, pool.len());
        let chunk_size = pool.len().div_ceil(threads);

        let evaluations: Vec<Evaluation> = std::thread::scope(|scope| {
            let handles: Vec<_> = pool
                .chunks(chunk_size)
                .map(|chunk| scope.spawn(move || self.evaluate_chunk(job, chunk, cancel)))
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| handle.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect()
        });

        let evaluated = evaluations.len();
        let mut matches = Vec::new();
        let mut skipped = Vec::new();
        for evaluation in evaluations {
            match evaluation {
                Evaluation::Scored(result) if result.score >= threshold => matches.push(result),
                Evaluation::Scored(_) => {}
                Evaluation::Skipped(worker) => skipped.push(worker),
            }
        }

        // Sort by score (descending) and then by worker id for determinism
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.worker_id.cmp(&b.worker_id))
        });

        let cancelled = evaluated < total_candidates;
        tracing::info!(
            job_id = %job.job_id,
            total_candidates,
            evaluated,
            matched = matches.len(),
            skipped = skipped.len(),
            cancelled,
            "Scored worker pool"
        );

        Ok(MatchBatch {
            matches,
            skipped,
            total_candidates,
            evaluated,
            cancelled,
        })
    }

    fn evaluate_chunk(&self, job: &JobPosting, chunk: &[WorkerProfile], cancel: &CancellationToken) -> Vec<Evaluation> {
        let mut evaluations = Vec::with_capacity(chunk.len());

        for worker in chunk {
            if cancel.is_cancelled() {
                break;
            }

            match self.score_match(job, worker) {
                Ok(result) => {
                    tracing::debug!(worker_id = %worker.worker_id, score = result.score, "Scored worker");
                    evaluations.push(Evaluation::Scored(result));
                }
                Err(error) => {
                    tracing::warn!(worker_id = %worker.worker_id, %error, "Skipping worker");
                    evaluations.push(Evaluation::Skipped(SkippedWorker {
                        worker_id: worker.worker_id.clone(),
                        error,
                    }));
                }
            }
        }

        evaluations
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

fn validate_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(MatchError::InvalidThreshold(threshold));
    }
    Ok(())
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}
