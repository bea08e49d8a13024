//! Haversine great-circle distance and candidate selection (spec.md §4.2).

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two lat/lng points, in kilometers.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (lat1, lat2) = (lat1.to_radians(), lat2.to_radians());
    let d_lat = (lat2 - lat1) / 2.0;
    let d_lng = (lng2 - lng1).to_radians() / 2.0;
    let a = d_lat.sin().powi(2) + lat1.cos() * lat2.cos() * d_lng.sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Candidates strictly within `radius_km`, sorted ascending by distance and
/// capped at `max_candidates`.
pub fn nearest_within<T>(
    origin: (f64, f64),
    items: Vec<T>,
    position: impl Fn(&T) -> (f64, f64),
    radius_km: f64,
    max_candidates: usize,
) -> Vec<T> {
    let mut scored: Vec<(f64, T)> = items
        .into_iter()
        .map(|item| {
            let (lat, lng) = position(&item);
            (haversine_km(origin.0, origin.1, lat, lng), item)
        })
        .filter(|(d, _)| *d < radius_km)
        .collect();

    scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(max_candidates);
    scored.into_iter().map(|(_, item)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_identical_points() {
        assert!((haversine_km(1.0, 1.0, 1.0, 1.0)).abs() < 1e-9);
    }

    #[test]
    fn known_distance_approx() {
        // Roughly 1 degree of latitude is ~111 km.
        let d = haversine_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.0).abs() < 1.0);
    }

    #[test]
    fn nearest_within_filters_and_sorts() {
        let points = vec![(1, 0.0, 0.0), (2, 0.2, 0.0), (3, 5.0, 0.0)];
        let result = nearest_within((0.0, 0.0), points, |p| (p.1, p.2), 5.0, 20);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].0, 1);
        assert_eq!(result[1].0, 2);
    }

    #[test]
    fn nearest_within_caps_candidate_count() {
        let points: Vec<(i32, f64, f64)> = (0..30).map(|i| (i, 0.001 * i as f64, 0.0)).collect();
        let result = nearest_within((0.0, 0.0), points, |p| (p.1, p.2), 5.0, 20);
        assert_eq!(result.len(), 20);
    }
}
