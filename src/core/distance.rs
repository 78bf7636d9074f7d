use crate::models::{BoundingBox, Coordinate};

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in kilometers
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Great-circle distance between two optional coordinates
///
/// A missing or malformed coordinate on either side yields
/// `f64::INFINITY`, so proximity scoring degrades to zero instead of
/// pretending the two points coincide.
pub fn distance_km(a: Option<&Coordinate>, b: Option<&Coordinate>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) if a.is_valid() && b.is_valid() => {
            haversine_distance(a.latitude, a.longitude, b.latitude, b.longitude)
        }
        _ => f64::INFINITY,
    }
}

/// Calculate a bounding box around a center point
///
/// This is much faster than Haversine for pre-filtering.
/// 1° latitude ≈ 111km, 1° longitude ≈ 111km * cos(latitude)
pub fn calculate_bounding_box(lat: f64, lon: f64, radius_km: f64) -> BoundingBox {
    // 1 degree latitude is approximately 111 km
    let lat_delta = radius_km / 111.0;

    // 1 degree longitude varies by latitude; unbounded near the poles
    let lon_delta = radius_km / (111.0 * lat.to_radians().cos().abs());

    BoundingBox {
        min_lat: lat - lat_delta,
        max_lat: lat + lat_delta,
        min_lon: lon - lon_delta,
        max_lon: lon + lon_delta,
    }
}

/// Check if a point is within a bounding box
///
/// A box that reaches a pole or spans all longitudes only constrains
/// latitude. A box past ±180° wraps into two longitude ranges.
#[inline]
pub fn is_within_bounding_box(lat: f64, lon: f64, bbox: &BoundingBox) -> bool {
    if lat < bbox.min_lat || lat > bbox.max_lat {
        return false;
    }

    let covers_pole = bbox.min_lat <= -90.0 || bbox.max_lat >= 90.0;
    if covers_pole || !(bbox.max_lon - bbox.min_lon < 360.0) {
        return true;
    }

    if bbox.min_lon < -180.0 {
        lon >= bbox.min_lon + 360.0 || lon <= bbox.max_lon
    } else if bbox.max_lon > 180.0 {
        lon >= bbox.min_lon || lon <= bbox.max_lon - 360.0
    } else {
        lon >= bbox.min_lon && lon <= bbox.max_lon
    }
}
