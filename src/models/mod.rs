// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Availability, AvailabilityStatus, AvailabilityType, BoundingBox, Coordinate, GeoFence, JobPosting,
    JobStatus, MatchResult, MatchStatus, RecurrencePattern, RecurrenceRule, SalaryExpectation, SalaryRange,
    ScheduleWindow, ScoreBreakdown, ScoringWeights, TimeSlot, WeightProfile, WorkerPoolFilter, WorkerProfile,
};
pub use requests::{ConflictCheckRequest, FindMatchesRequest, ScoreMatchRequest};
pub use responses::{ConflictCheckResponse, ErrorResponse, FindMatchesResponse, HealthResponse, SkippedResponse};
