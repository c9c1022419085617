//! Great-circle distance on a spherical Earth.

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometers between two WGS84 positions in degrees.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat1 - lat2).to_radians();
    let delta_lng = (lng1 - lng2).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Pruning bound for a k-d tree split at `plane` on one axis: the angular
/// difference along that axis taken as an arc length.
///
/// Not a true lower bound of [`haversine_km`]. A longitude difference shrinks
/// by cos(latitude) on the sphere, so away from the equator this overestimates
/// and the search may prune a subtree holding the true nearest point.
pub fn plane_distance_km(value: f64, plane: f64) -> f64 {
    (value - plane).to_radians().abs() * EARTH_RADIUS_KM
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance() {
        assert_eq!(haversine_km(39.9, 116.4, 39.9, 116.4), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let a = haversine_km(39.9, 116.4, 31.2, 121.5);
        let b = haversine_km(31.2, 121.5, 39.9, 116.4);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_beijing_shanghai() {
        let d = haversine_km(39.9, 116.4, 31.2, 121.5);
        assert!((d - 1071.3).abs() < 0.5, "got {}", d);
    }

    #[test]
    fn test_one_degree_latitude() {
        let d = haversine_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.195).abs() < 0.01, "got {}", d);
        assert!((plane_distance_km(0.0, 1.0) - d).abs() < 1e-9);
    }

    #[test]
    fn test_plane_bound_overestimates_longitude_at_high_latitude() {
        // At 60N one degree of longitude is about half a degree of arc.
        let true_distance = haversine_km(60.0, 10.0, 60.0, 11.0);
        let bound = plane_distance_km(10.0, 11.0);
        assert!(bound > true_distance * 1.9);
    }
}
