use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::distance::distance_km;
use crate::error::MatchError;
use crate::models::{Coordinate, JobPosting, SalaryExpectation, SalaryRange, ScoreBreakdown, ScoringWeights, WorkerProfile};

/// Tolerances used by the continuous dimension scorers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringParams {
    /// Radius beyond which location scores zero
    pub max_distance_km: f64,
    /// Relative salary gap (percent of the job maximum) at which salary scores zero
    pub max_salary_diff_percent: f64,
}

impl ScoringParams {
    pub fn validate(&self) -> Result<(), MatchError> {
        if !self.max_distance_km.is_finite() || self.max_distance_km <= 0.0 {
            return Err(MatchError::InvalidScoringParameter(format!(
                "max_distance_km must be positive, got {}",
                self.max_distance_km
            )));
        }
        if !self.max_salary_diff_percent.is_finite() || self.max_salary_diff_percent <= 0.0 {
            return Err(MatchError::InvalidScoringParameter(format!(
                "max_salary_diff_percent must be positive, got {}",
                self.max_salary_diff_percent
            )));
        }
        Ok(())
    }
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            max_distance_km: 50.0,
            max_salary_diff_percent: 20.0,
        }
    }
}

/// Dimension scores other than availability, plus the skills both sides share
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileScores {
    pub skill: f64,
    pub experience: f64,
    pub location: f64,
    pub salary: f64,
    pub distance_km: f64,
    pub matched_skills: Vec<String>,
}

impl ProfileScores {
    pub fn with_availability(self, availability: f64) -> (ScoreBreakdown, Vec<String>) {
        let breakdown = ScoreBreakdown {
            skill: self.skill,
            experience: self.experience,
            location: self.location,
            salary: self.salary,
            availability,
            distance_km: self.distance_km.is_finite().then_some(self.distance_km),
        };
        (breakdown, self.matched_skills)
    }
}

/// Score every profile-driven dimension of a (job, worker) pair
///
/// # Scoring dimensions
/// - skill: share of the job's required skills the worker has
/// - experience: worker years relative to the requirement, capped at 1
/// - location: linear falloff to zero at `max_distance_km`
/// - salary: linear falloff of the gap to the job maximum
pub fn score_profile(job: &JobPosting, worker: &WorkerProfile, params: &ScoringParams) -> ProfileScores {
    let (skill, matched_skills) = skill_score(&worker.skills, &job.required_skills);
    let experience = experience_score(worker.experience_years, job.required_experience_years);
    let (location, distance_km) = location_score_between(
        worker.preferred_location.as_ref(),
        job.location.as_ref(),
        params.max_distance_km,
    );
    let salary = salary_score(
        worker.salary_expectation.as_ref(),
        job.salary.as_ref(),
        params.max_salary_diff_percent,
    );

    ProfileScores {
        skill,
        experience,
        location,
        salary,
        distance_km,
        matched_skills,
    }
}

/// Weighted sum of the five dimension scores, clamped to [0, 1]
#[inline]
pub fn aggregate(breakdown: &ScoreBreakdown, weights: &ScoringWeights) -> f64 {
    let total = breakdown.skill * weights.skill
        + breakdown.experience * weights.experience
        + breakdown.location * weights.location
        + breakdown.salary * weights.salary
        + breakdown.availability * weights.availability;

    total.clamp(0.0, 1.0)
}

fn normalize_skill(skill: &str) -> String {
    skill.trim().to_lowercase()
}

/// Share of required skills covered by the worker (0-1)
///
/// A job with no required skills scores 0. Tags compare trimmed and
/// case-insensitively; matched skills keep the job's spelling.
pub fn skill_score(worker_skills: &[String], job_skills: &[String]) -> (f64, Vec<String>) {
    let worker: HashSet<String> = worker_skills.iter().map(|s| normalize_skill(s)).collect();

    let mut seen = HashSet::new();
    let mut required = 0usize;
    let mut matched = Vec::new();
    for skill in job_skills {
        let key = normalize_skill(skill);
        if key.is_empty() || !seen.insert(key.clone()) {
            continue;
        }
        required += 1;
        if worker.contains(&key) {
            matched.push(skill.trim().to_string());
        }
    }

    if required == 0 {
        return (0.0, matched);
    }

    (matched.len() as f64 / required as f64, matched)
}

/// Experience sufficiency (0-1); no requirement scores 1
#[inline]
pub fn experience_score(worker_years: f64, required_years: f64) -> f64 {
    if !required_years.is_finite() || required_years <= 0.0 {
        return 1.0;
    }
    if !worker_years.is_finite() || worker_years <= 0.0 {
        return 0.0;
    }

    (worker_years / required_years).min(1.0)
}

/// Salary compatibility (0-1) from the relative gap to the job maximum
///
/// `max(0, 1 - |expected - max| / max / (tolerance / 100))`. Absent or
/// non-positive figures and mismatched currencies score 0.
pub fn salary_score(
    expectation: Option<&SalaryExpectation>,
    range: Option<&SalaryRange>,
    max_allowed_diff_percent: f64,
) -> f64 {
    let (Some(expectation), Some(range)) = (expectation, range) else {
        return 0.0;
    };
    let Some(job_max) = range.max else {
        return 0.0;
    };
    let expected = expectation.amount;

    if !expected.is_finite() || !job_max.is_finite() || expected <= 0.0 || job_max <= 0.0 {
        return 0.0;
    }
    if !expectation.currency.trim().eq_ignore_ascii_case(range.currency.trim()) {
        return 0.0;
    }

    let relative_gap = (expected - job_max).abs() / job_max;
    (1.0 - relative_gap / (max_allowed_diff_percent / 100.0)).max(0.0)
}

/// Location proximity (0-1) for a known distance
#[inline]
pub fn location_score(distance_km: f64, max_distance_km: f64) -> f64 {
    if !distance_km.is_finite() || distance_km >= max_distance_km {
        return 0.0;
    }

    (1.0 - distance_km / max_distance_km).max(0.0)
}

/// Location proximity between two optional points, with the distance used
pub fn location_score_between(
    worker: Option<&Coordinate>,
    job: Option<&Coordinate>,
    max_distance_km: f64,
) -> (f64, f64) {
    let distance = distance_km(worker, job);
    (location_score(distance, max_distance_km), distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobStatus;

    fn skills(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|s| s.to_string()).collect()
    }

    fn salary(amount: f64) -> SalaryExpectation {
        SalaryExpectation {
            amount,
            currency: "USD".to_string(),
        }
    }

    fn range(max: f64) -> SalaryRange {
        SalaryRange {
            min: None,
            max: Some(max),
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn test_skill_score_full_overlap() {
        let (score, matched) = skill_score(&skills(&["A", "B", "C"]), &skills(&["A", "B"]));
        assert_eq!(score, 1.0);
        assert_eq!(matched, vec!["A", "B"]);
    }

    #[test]
    fn test_skill_score_partial_and_case_insensitive() {
        let (score, matched) = skill_score(&skills(&["rust ", "Go"]), &skills(&["Rust", "Python", "SQL", "go"]));
        assert_eq!(score, 0.5);
        assert_eq!(matched, vec!["Rust", "go"]);
    }

    #[test]
    fn test_skill_score_no_requirements_is_zero() {
        let (score, matched) = skill_score(&skills(&["A"]), &[]);
        assert_eq!(score, 0.0);
        assert!(matched.is_empty());
    }

    #[test]
    fn test_skill_score_ignores_duplicate_requirements() {
        let (score, _) = skill_score(&skills(&["A"]), &skills(&["A", "a", "B"]));
        assert_eq!(score, 0.5);
    }

    #[test]
    fn test_experience_score() {
        assert_eq!(experience_score(3.0, 2.0), 1.0);
        assert_eq!(experience_score(1.0, 4.0), 0.25);
        assert_eq!(experience_score(0.0, 0.0), 1.0);
        assert_eq!(experience_score(-2.0, 3.0), 0.0);
    }

    #[test]
    fn test_salary_score_within_tolerance() {
        let score = salary_score(Some(&salary(95.0)), Some(&range(100.0)), 20.0);
        assert!((score - 0.75).abs() < 1e-9, "got {}", score);

        let exact = salary_score(Some(&salary(100.0)), Some(&range(100.0)), 20.0);
        assert_eq!(exact, 1.0);
    }

    #[test]
    fn test_salary_score_outside_tolerance_is_zero() {
        assert_eq!(salary_score(Some(&salary(150.0)), Some(&range(100.0)), 20.0), 0.0);
        assert_eq!(salary_score(Some(&salary(50.0)), Some(&range(100.0)), 20.0), 0.0);
    }

    #[test]
    fn test_salary_score_degraded_data() {
        assert_eq!(salary_score(None, Some(&range(100.0)), 20.0), 0.0);
        assert_eq!(salary_score(Some(&salary(100.0)), None, 20.0), 0.0);
        assert_eq!(salary_score(Some(&salary(0.0)), Some(&range(100.0)), 20.0), 0.0);
        assert_eq!(salary_score(Some(&salary(100.0)), Some(&range(-5.0)), 20.0), 0.0);

        let no_max = SalaryRange {
            min: Some(80.0),
            max: None,
            currency: "USD".to_string(),
        };
        assert_eq!(salary_score(Some(&salary(100.0)), Some(&no_max), 20.0), 0.0);
    }

    #[test]
    fn test_salary_score_currency_mismatch() {
        let eur = SalaryExpectation {
            amount: 100.0,
            currency: "EUR".to_string(),
        };
        assert_eq!(salary_score(Some(&eur), Some(&range(100.0)), 20.0), 0.0);
    }

    #[test]
    fn test_location_score_boundaries() {
        assert_eq!(location_score(0.0, 50.0), 1.0);
        assert_eq!(location_score(50.0, 50.0), 0.0);
        assert_eq!(location_score(25.0, 50.0), 0.5);
        assert_eq!(location_score(f64::INFINITY, 50.0), 0.0);
    }

    #[test]
    fn test_location_score_between_same_point() {
        let a = Coordinate::new(0.0, 0.0);
        let (score, distance) = location_score_between(Some(&a), Some(&a), 50.0);
        assert_eq!(score, 1.0);
        assert_eq!(distance, 0.0);
    }

    #[test]
    fn test_location_score_between_far_away() {
        let job = Coordinate::new(40.7128, -74.0060);
        let far = Coordinate::new(34.0522, -118.2437);
        let (score, distance) = location_score_between(Some(&far), Some(&job), 50.0);
        assert_eq!(score, 0.0);
        assert!(distance > 3000.0);
    }

    #[test]
    fn test_score_profile_end_to_end_dimensions() {
        let job = JobPosting {
            job_id: "job-1".to_string(),
            required_skills: skills(&["A", "B"]),
            required_experience_years: 2.0,
            location: Some(Coordinate::new(0.0, 0.0)),
            salary: Some(range(100.0)),
            status: JobStatus::Active,
            schedule: None,
        };
        let worker = WorkerProfile {
            worker_id: "w-1".to_string(),
            skills: skills(&["A", "B", "C"]),
            experience_years: 3.0,
            preferred_location: Some(Coordinate::new(0.0, 0.01)),
            salary_expectation: Some(salary(95.0)),
            availability: vec![],
        };

        let scores = score_profile(&job, &worker, &ScoringParams::default());
        assert_eq!(scores.skill, 1.0);
        assert_eq!(scores.experience, 1.0);
        assert!((scores.location - 0.978).abs() < 0.005, "got {}", scores.location);
        assert!((scores.salary - 0.75).abs() < 1e-9);
        assert!((scores.distance_km - 1.112).abs() < 0.01);
    }

    #[test]
    fn test_aggregate_is_clamped() {
        let breakdown = ScoreBreakdown {
            skill: 1.0,
            experience: 1.0,
            location: 1.0,
            salary: 1.0,
            availability: 1.0,
            distance_km: Some(0.0),
        };
        let score = aggregate(&breakdown, &ScoringWeights::default());
        assert!(score <= 1.0);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_location_score_between_missing_coordinate() {
        let job = Coordinate::new(0.0, 0.0);
        let (score, distance) = location_score_between(None, Some(&job), 50.0);
        assert_eq!(score, 0.0);
        assert!(distance.is_infinite());
    }

    #[test]
    fn test_params_validation() {
        assert!(ScoringParams::default().validate().is_ok());
        let bad = ScoringParams {
            max_distance_km: 0.0,
            ..ScoringParams::default()
        };
        assert!(bad.validate().is_err());
    }
}
