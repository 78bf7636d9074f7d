use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::MatchError;

/// Geographic point in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Finite and inside the WGS84 degree ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Worker's expected salary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryExpectation {
    pub amount: f64,
    pub currency: String,
}

/// Salary range offered by a job posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    pub currency: String,
}

/// Worker profile as seen by the matching engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerProfile {
    pub worker_id: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience_years: f64,
    #[serde(default)]
    pub preferred_location: Option<Coordinate>,
    #[serde(default)]
    pub salary_expectation: Option<SalaryExpectation>,
    #[serde(default)]
    pub availability: Vec<Availability>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Active,
    Closed,
}

/// Job posting, read-only input to the matching engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub job_id: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub required_experience_years: f64,
    #[serde(default)]
    pub location: Option<Coordinate>,
    #[serde(default)]
    pub salary: Option<SalaryRange>,
    pub status: JobStatus,
    /// Dates (and optionally daily hours) the job needs the worker for
    #[serde(default)]
    pub schedule: Option<ScheduleWindow>,
}

impl JobPosting {
    pub fn is_open(&self) -> bool {
        self.status == JobStatus::Active
    }
}

/// Time-of-day slot, `start < end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeSlot {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }

    /// Half-open overlap: touching slots do not overlap
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A proposed commitment: inclusive date range with optional daily hours
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub hours: Option<TimeSlot>,
}

impl ScheduleWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end, hours: None }
    }

    pub fn with_hours(mut self, hours: TimeSlot) -> Self {
        self.hours = Some(hours);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityType {
    Available,
    Unavailable,
    Preferred,
    Tentative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityStatus {
    Active,
    Inactive,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Custom,
}

/// Repeating-date rule attached to a recurring availability entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    pub pattern: RecurrencePattern,
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default)]
    pub days_of_week: Vec<Weekday>,
    #[serde(default)]
    pub day_of_month: Option<u32>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Alternative to `end_date`: stop after this many occurrences
    #[serde(default)]
    pub occurrences: Option<u32>,
    #[serde(default)]
    pub exceptions: BTreeSet<NaiveDate>,
}

fn default_interval() -> u32 {
    1
}

impl RecurrenceRule {
    pub fn new(pattern: RecurrencePattern, start_date: NaiveDate) -> Self {
        Self {
            pattern,
            interval: 1,
            days_of_week: Vec::new(),
            day_of_month: None,
            start_date,
            end_date: None,
            occurrences: None,
            exceptions: BTreeSet::new(),
        }
    }

    pub fn weekly(start_date: NaiveDate, days: &[Weekday]) -> Self {
        Self {
            days_of_week: days.to_vec(),
            ..Self::new(RecurrencePattern::Weekly, start_date)
        }
    }

    pub fn until(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn times(mut self, occurrences: u32) -> Self {
        self.occurrences = Some(occurrences);
        self
    }

    pub fn except(mut self, date: NaiveDate) -> Self {
        self.exceptions.insert(date);
        self
    }
}

/// Declared availability or commitment window belonging to one worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub id: String,
    pub worker_id: String,
    #[serde(rename = "type")]
    pub kind: AvailabilityType,
    pub status: AvailabilityStatus,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub time_slots: Vec<TimeSlot>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence: Option<RecurrenceRule>,
    #[serde(default)]
    pub exceptions: BTreeSet<NaiveDate>,
}

impl Availability {
    /// Active one-off entry spanning `start_date..=end_date` (open-ended when `None`)
    pub fn fixed(
        id: &str,
        worker_id: &str,
        kind: AvailabilityType,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            id: id.to_string(),
            worker_id: worker_id.to_string(),
            kind,
            status: AvailabilityStatus::Active,
            start_date,
            end_date,
            time_slots: Vec::new(),
            is_recurring: false,
            recurrence: None,
            exceptions: BTreeSet::new(),
        }
    }

    /// Active recurring entry driven by `rule`
    pub fn recurring(id: &str, worker_id: &str, kind: AvailabilityType, rule: RecurrenceRule) -> Self {
        Self {
            start_date: rule.start_date,
            end_date: rule.end_date,
            is_recurring: true,
            recurrence: Some(rule),
            ..Self::fixed(id, worker_id, kind, NaiveDate::MIN, None)
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AvailabilityStatus::Active
    }

    /// AVAILABLE and PREFERRED declare the worker free
    pub fn declares_free(&self) -> bool {
        matches!(self.kind, AvailabilityType::Available | AvailabilityType::Preferred)
    }

    pub fn is_blocking(&self) -> bool {
        self.kind == AvailabilityType::Unavailable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Pending,
    Notified,
}

/// Per-dimension scores behind an aggregate, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub skill: f64,
    pub experience: f64,
    pub location: f64,
    pub salary: f64,
    pub availability: f64,
    /// `None` when either side has no usable coordinate
    pub distance_km: Option<f64>,
}

/// Scored (job, worker) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub job_id: String,
    pub worker_id: String,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    pub matched_skills: Vec<String>,
    pub status: MatchStatus,
}

impl MatchResult {
    pub fn mark_notified(mut self) -> Self {
        self.status = MatchStatus::Notified;
        self
    }
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoFence {
    pub center: Coordinate,
    pub radius_km: f64,
}

/// Criteria used to pull a candidate worker pool from the repository
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerPoolFilter {
    #[serde(default)]
    pub exclude_worker_ids: Vec<String>,
    /// Keep workers with at least one of these skills; empty keeps everyone
    #[serde(default)]
    pub any_of_skills: Vec<String>,
    #[serde(default)]
    pub within: Option<GeoFence>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Scoring weights, one per dimension; must sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub skill: f64,
    pub experience: f64,
    pub location: f64,
    pub salary: f64,
    pub availability: f64,
}

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.skill + self.experience + self.location + self.salary + self.availability
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        let all = [
            ("skill", self.skill),
            ("experience", self.experience),
            ("location", self.location),
            ("salary", self.salary),
            ("availability", self.availability),
        ];
        for (name, weight) in all {
            if !weight.is_finite() || weight < 0.0 {
                return Err(MatchError::InvalidWeightConfiguration(format!(
                    "{} weight must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(MatchError::InvalidWeightConfiguration(format!(
                "weights must sum to 1.0, got {}",
                sum
            )));
        }
        Ok(())
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        WeightProfile::WithAvailability.weights()
    }
}

/// Named weight profile chosen explicitly by the caller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "profile", content = "weights")]
pub enum WeightProfile {
    /// skill 0.3, experience 0.2, location 0.2, salary 0.15, availability 0.15;
    /// a zero availability score gates the aggregate to zero
    WithAvailability,
    /// skill, experience, location and salary at 0.25 each; availability unused
    FourDimension,
    Custom(ScoringWeights),
}

impl WeightProfile {
    pub fn weights(&self) -> ScoringWeights {
        match self {
            WeightProfile::WithAvailability => ScoringWeights {
                skill: 0.30,
                experience: 0.20,
                location: 0.20,
                salary: 0.15,
                availability: 0.15,
            },
            WeightProfile::FourDimension => ScoringWeights {
                skill: 0.25,
                experience: 0.25,
                location: 0.25,
                salary: 0.25,
                availability: 0.0,
            },
            WeightProfile::Custom(weights) => *weights,
        }
    }

    /// Whether availability acts as a hard constraint
    pub fn gates_on_availability(&self) -> bool {
        self.weights().availability > 0.0
    }
}

impl Default for WeightProfile {
    fn default() -> Self {
        WeightProfile::WithAvailability
    }
}
