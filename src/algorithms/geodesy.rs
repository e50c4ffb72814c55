//! Great-circle distance on a spherical Earth

use crate::core::EARTH_RADIUS_M;

/// Haversine distance between two `(latitude, longitude)` pairs in degrees.
///
/// Returns meters. Accurate to well under a meter at the short ranges the
/// update policy cares about.
pub fn haversine_distance_m(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = from;
    let (lat2, lon2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Clamp guards asin against rounding just above 1.0 for antipodal points
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance() {
        assert_eq!(haversine_distance_m((3.4516, -76.532), (3.4516, -76.532)), 0.0);
    }

    #[test]
    fn test_one_degree_latitude() {
        let d = haversine_distance_m((0.0, 0.0), (1.0, 0.0));
        // 1 degree of arc on a 6371 km sphere
        assert!((d - 111_194.9).abs() < 1.0);
    }

    #[test]
    fn test_small_displacement_near_cali() {
        let d = haversine_distance_m((3.4516, -76.5320), (3.4517, -76.5320));
        assert!(d > 11.0 && d < 11.2, "distance was {}", d);
    }

    #[test]
    fn test_symmetric() {
        let a = (48.8566, 2.3522);
        let b = (51.5074, -0.1278);
        let ab = haversine_distance_m(a, b);
        let ba = haversine_distance_m(b, a);
        assert!((ab - ba).abs() < 1e-6);
        assert!((ab - 343_560.0).abs() < 1_000.0);
    }

    #[test]
    fn test_antipodal_points() {
        let d = haversine_distance_m((0.0, 0.0), (0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_M).abs() < 1.0);
    }
}
