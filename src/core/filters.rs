use crate::core::distance::{calculate_bounding_box, haversine_distance, is_within_bounding_box};
use crate::models::{GeoFence, JobPosting, WorkerPoolFilter, WorkerProfile};

/// Only active postings are matched
#[inline]
pub fn is_job_open(job: &JobPosting) -> bool {
    job.is_open()
}

/// Check if a worker passes the pool filter
///
/// This is the cheap pre-filter applied before any scoring: excluded ids,
/// an any-of skill requirement, and an optional geofence.
pub fn matches_pool_filter(worker: &WorkerProfile, filter: &WorkerPoolFilter) -> bool {
    if filter.exclude_worker_ids.contains(&worker.worker_id) {
        return false;
    }

    if !filter.any_of_skills.is_empty() {
        let has_any = filter.any_of_skills.iter().any(|wanted| {
            worker
                .skills
                .iter()
                .any(|skill| skill.trim().eq_ignore_ascii_case(wanted.trim()))
        });
        if !has_any {
            return false;
        }
    }

    match &filter.within {
        Some(fence) => is_within_fence(worker, fence),
        None => true,
    }
}

/// Bounding-box check first, then exact Haversine distance
fn is_within_fence(worker: &WorkerProfile, fence: &GeoFence) -> bool {
    let Some(location) = worker.preferred_location.filter(|l| l.is_valid()) else {
        return false;
    };
    if !fence.center.is_valid() {
        return false;
    }

    let bbox = calculate_bounding_box(fence.center.latitude, fence.center.longitude, fence.radius_km);
    if !is_within_bounding_box(location.latitude, location.longitude, &bbox) {
        return false;
    }

    haversine_distance(
        fence.center.latitude,
        fence.center.longitude,
        location.latitude,
        location.longitude,
    ) <= fence.radius_km
}

/// Filter a worker pool, preserving order and honouring `limit`
pub fn apply_pool_filter(workers: Vec<WorkerProfile>, filter: &WorkerPoolFilter) -> Vec<WorkerProfile> {
    let limit = filter.limit.unwrap_or(usize::MAX);

    workers
        .into_iter()
        .filter(|worker| matches_pool_filter(worker, filter))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, JobStatus};

    fn create_test_worker(id: &str, skills: &[&str], location: Option<(f64, f64)>) -> WorkerProfile {
        WorkerProfile {
            worker_id: id.to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            experience_years: 2.0,
            preferred_location: location.map(|(lat, lon)| Coordinate::new(lat, lon)),
            salary_expectation: None,
            availability: vec![],
        }
    }

    fn nyc_fence(radius_km: f64) -> GeoFence {
        GeoFence {
            center: Coordinate::new(40.7128, -74.0060),
            radius_km,
        }
    }

    #[test]
    fn test_empty_filter_keeps_everyone() {
        let worker = create_test_worker("w1", &[], None);
        assert!(matches_pool_filter(&worker, &WorkerPoolFilter::default()));
    }

    #[test]
    fn test_excluded_worker_filtered() {
        let worker = create_test_worker("w1", &["forklift"], None);
        let filter = WorkerPoolFilter {
            exclude_worker_ids: vec!["w1".to_string()],
            ..Default::default()
        };
        assert!(!matches_pool_filter(&worker, &filter));
    }

    #[test]
    fn test_any_of_skills() {
        let worker = create_test_worker("w1", &["Forklift", "welding"], None);
        let filter = WorkerPoolFilter {
            any_of_skills: vec!["forklift".to_string(), "driving".to_string()],
            ..Default::default()
        };
        assert!(matches_pool_filter(&worker, &filter));

        let other = create_test_worker("w2", &["cooking"], None);
        assert!(!matches_pool_filter(&other, &filter));
    }

    #[test]
    fn test_geofence() {
        let filter = WorkerPoolFilter {
            within: Some(nyc_fence(10.0)),
            ..Default::default()
        };

        let near = create_test_worker("near", &[], Some((40.72, -74.01)));
        let far = create_test_worker("far", &[], Some((41.5, -74.0)));
        let nowhere = create_test_worker("nowhere", &[], None);

        assert!(matches_pool_filter(&near, &filter));
        assert!(!matches_pool_filter(&far, &filter));
        assert!(!matches_pool_filter(&nowhere, &filter));
    }

    #[test]
    fn test_geofence_across_antimeridian() {
        let filter = WorkerPoolFilter {
            within: Some(GeoFence {
                center: Coordinate::new(0.0, 179.9),
                radius_km: 50.0,
            }),
            ..Default::default()
        };

        // ~16.7 km away on the other side of the date line
        let across = create_test_worker("across", &[], Some((0.0, -179.95)));
        let far = create_test_worker("far", &[], Some((0.0, -179.0)));

        assert!(matches_pool_filter(&across, &filter));
        assert!(!matches_pool_filter(&far, &filter));
    }

    #[test]
    fn test_geofence_near_pole() {
        let filter = WorkerPoolFilter {
            within: Some(GeoFence {
                center: Coordinate::new(89.5, 0.0),
                radius_km: 100.0,
            }),
            ..Default::default()
        };

        // ~89 km away across the pole, longitudes 170 degrees apart
        let across_pole = create_test_worker("across-pole", &[], Some((89.7, 170.0)));
        let too_far = create_test_worker("too-far", &[], Some((88.0, 170.0)));

        assert!(matches_pool_filter(&across_pole, &filter));
        assert!(!matches_pool_filter(&too_far, &filter));
    }

    #[test]
    fn test_apply_pool_filter_limit() {
        let workers: Vec<WorkerProfile> = (0..10)
            .map(|i| create_test_worker(&format!("w{}", i), &["forklift"], None))
            .collect();
        let filter = WorkerPoolFilter {
            limit: Some(3),
            ..Default::default()
        };

        let pool = apply_pool_filter(workers, &filter);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool[0].worker_id, "w0");
    }

    #[test]
    fn test_closed_job_is_not_open() {
        let job = JobPosting {
            job_id: "j1".to_string(),
            required_skills: vec![],
            required_experience_years: 0.0,
            location: None,
            salary: None,
            status: JobStatus::Closed,
            schedule: None,
        };
        assert!(!is_job_open(&job));
    }
}
