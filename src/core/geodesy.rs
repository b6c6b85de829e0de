//! Spherical-earth distance, bearing and envelope math.
//!
//! All functions are pure. Poles and the antimeridian are not treated
//! specially: an envelope computed near longitude ±180 or latitude ±90 may
//! extend past the valid coordinate range and is then only an approximation
//! (see [`Envelope::is_within_globe`]).

use crate::domain::model::{BoundingBox, GeoPoint};
use crate::utils::error::Result;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Degrees of latitude per kilometre used by the envelope approximation.
const DEGREES_PER_KM: f64 = 1.0 / 111.0;

/// Slack added to covering envelopes to absorb rounding at the edge.
const COVERING_PAD_DEGREES: f64 = 1e-9;

/// Great-circle distance via the Haversine formula.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    if a == b {
        return 0.0;
    }

    let lat1 = a.latitude().to_radians();
    let lat2 = b.latitude().to_radians();
    let d_lat = lat2 - lat1;
    let d_lon = (b.longitude() - a.longitude()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // rounding can push h a hair above 1 for antipodal points
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    distance_km(a, b) * 1000.0
}

/// Initial forward azimuth from `from` to `to`, in `[0, 360)`.
pub fn bearing_degrees(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.latitude().to_radians();
    let lat2 = to.latitude().to_radians();
    let d_lon = (to.longitude() - from.longitude()).to_radians();

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
    let mut bearing = y.atan2(x).to_degrees();
    if bearing < 0.0 {
        bearing += 360.0;
    }
    // -1e-15 + 360.0 rounds to 360.0
    if bearing >= 360.0 {
        bearing = 0.0;
    }
    bearing
}

/// Raw rectangular envelope around a centre. Bounds are not clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl Envelope {
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.latitude() >= self.min_lat
            && point.latitude() <= self.max_lat
            && point.longitude() >= self.min_lon
            && point.longitude() <= self.max_lon
    }

    /// False when the envelope reaches past a pole or across the antimeridian,
    /// in which case [`Envelope::contains`] can miss points inside the radius.
    pub fn is_within_globe(&self) -> bool {
        self.min_lat >= -90.0
            && self.max_lat <= 90.0
            && self.min_lon >= -180.0
            && self.max_lon <= 180.0
    }

    /// Clamps the envelope to valid coordinates.
    pub fn to_bounding_box(&self) -> Result<BoundingBox> {
        let north_east = GeoPoint::new(self.max_lat.min(90.0), self.max_lon.min(180.0))?;
        let south_west = GeoPoint::new(self.min_lat.max(-90.0), self.min_lon.max(-180.0))?;
        BoundingBox::new(north_east, south_west)
    }
}

/// Cheap pre-filter envelope: `1/111` degrees per km of latitude, with the
/// longitude span widened by `1 / cos(center latitude)`.
pub fn bounding_box(center: GeoPoint, radius_km: f64) -> Envelope {
    let lat_delta = radius_km * DEGREES_PER_KM;
    let cos_lat = center.latitude().to_radians().cos();
    let lon_delta = if cos_lat.abs() < f64::EPSILON {
        // at a pole every longitude is within reach
        360.0
    } else {
        lat_delta / cos_lat.abs()
    };

    Envelope {
        min_lat: center.latitude() - lat_delta,
        min_lon: center.longitude() - lon_delta,
        max_lat: center.latitude() + lat_delta,
        max_lon: center.longitude() + lon_delta,
    }
}

/// Exact latitude/longitude envelope of the spherical cap of `radius_km`
/// around `center`: every point within the radius lies inside it. Storage
/// backends use this for their pre-filter so no true neighbour is dropped.
pub fn covering_box(center: GeoPoint, radius_km: f64) -> Envelope {
    let angular = radius_km / EARTH_RADIUS_KM;
    let lat = center.latitude().to_radians();
    let lat_delta = angular.to_degrees() + COVERING_PAD_DEGREES;

    let min_lat = center.latitude() - lat_delta;
    let max_lat = center.latitude() + lat_delta;
    let lon_delta = if min_lat <= -90.0 || max_lat >= 90.0 {
        // the cap contains a pole
        360.0
    } else {
        let ratio = (angular.sin() / lat.cos()).min(1.0);
        ratio.asin().to_degrees() + COVERING_PAD_DEGREES
    };

    Envelope {
        min_lat,
        min_lon: center.longitude() - lon_delta,
        max_lat,
        max_lon: center.longitude() + lon_delta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    fn sample_points() -> Vec<GeoPoint> {
        vec![
            p(0.0, 0.0),
            p(-23.5505, -46.6333),
            p(-22.9068, -43.1729),
            p(48.8566, 2.3522),
            p(51.5074, -0.1278),
            p(35.6762, 139.6503),
            p(-33.8688, 151.2093),
            p(89.9, 10.0),
            p(-89.9, -170.0),
            p(0.0, 179.9),
            p(0.0, -179.9),
        ]
    }

    #[test]
    fn test_zero_distance_for_identical_points() {
        for point in sample_points() {
            assert_eq!(distance_km(point, point), 0.0);
        }
        assert_eq!(distance_km(p(0.0, 0.0), p(0.0, 0.0)), 0.0);
    }

    #[test]
    fn test_sao_paulo_to_rio() {
        let d = distance_km(p(-23.5505, -46.6333), p(-22.9068, -43.1729));
        // Haversine on a 6371 km sphere gives ~360.7 km for this pair
        assert!((d - 360.75).abs() < 0.5, "got {}", d);
    }

    #[test]
    fn test_symmetry() {
        let points = sample_points();
        for a in &points {
            for b in &points {
                let ab = distance_km(*a, *b);
                let ba = distance_km(*b, *a);
                let scale = ab.abs().max(1.0);
                assert!((ab - ba).abs() <= 1e-9 * scale, "{} vs {}", ab, ba);
            }
        }
    }

    #[test]
    fn test_triangle_inequality() {
        let points = sample_points();
        for a in &points {
            for b in &points {
                for c in &points {
                    let direct = distance_km(*a, *c);
                    let via = distance_km(*a, *b) + distance_km(*b, *c);
                    assert!(direct <= via + 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_antimeridian_neighbours_are_close() {
        let d = distance_km(p(0.0, 179.9), p(0.0, -179.9));
        assert!((d - 22.24).abs() < 0.1, "got {}", d);
    }

    #[test]
    fn test_distance_meters() {
        let a = p(0.0, 0.0);
        let b = p(0.0, 1.0);
        assert!((distance_meters(a, b) - distance_km(a, b) * 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = p(0.0, 0.0);
        assert!((bearing_degrees(origin, p(1.0, 0.0)) - 0.0).abs() < 1e-9);
        assert!((bearing_degrees(origin, p(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((bearing_degrees(origin, p(-1.0, 0.0)) - 180.0).abs() < 1e-9);
        assert!((bearing_degrees(origin, p(0.0, -1.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_range() {
        let points = sample_points();
        for a in &points {
            for b in &points {
                let bearing = bearing_degrees(*a, *b);
                assert!((0.0..360.0).contains(&bearing), "bearing {}", bearing);
            }
        }
    }

    #[test]
    fn test_bounding_box_covers_radius() {
        let center = p(-23.5505, -46.6333);
        let envelope = bounding_box(center, 10.0);
        assert!(envelope.is_within_globe());
        assert!(envelope.contains(center));
        // points 9.9 km due north and due east stay inside
        assert!(envelope.contains(p(-23.5505 + 9.9 / 111.2, -46.6333)));
        let lon_step = 9.9 / (111.2 * center.latitude().to_radians().cos());
        assert!(envelope.contains(p(-23.5505, -46.6333 + lon_step)));
        assert!(!envelope.contains(p(-23.0, -46.6333)));
    }

    #[test]
    fn test_covering_box_contains_cap_at_high_latitude() {
        let center = p(80.0, 20.0);
        let radius = 1000.0;
        let envelope = covering_box(center, radius);
        // sample the circle boundary just inside the radius
        for step in 0..360 {
            let bearing = (step as f64).to_radians();
            let angular = (radius - 0.01) / EARTH_RADIUS_KM;
            let lat1 = center.latitude().to_radians();
            let lon1 = center.longitude().to_radians();
            let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
            let lon2 = lon1
                + (bearing.sin() * angular.sin() * lat1.cos())
                    .atan2(angular.cos() - lat1.sin() * lat2.sin());
            let point = p(lat2.to_degrees(), lon2.to_degrees());
            assert!(distance_km(center, point) <= radius);
            assert!(envelope.contains(point), "missed {} at bearing {}", point, step);
        }
        // the approximate box is narrower here
        assert!(bounding_box(center, radius).max_lon < envelope.max_lon);
    }

    #[test]
    fn test_covering_box_reaching_pole_leaves_globe() {
        assert!(!covering_box(p(89.0, 0.0), 200.0).is_within_globe());
        assert!(covering_box(p(45.0, 0.0), 200.0).is_within_globe());
    }

    #[test]
    fn test_envelope_to_bounding_box_clamps() {
        let bbox = bounding_box(p(0.0, 179.95), 50.0).to_bounding_box().unwrap();
        assert_eq!(bbox.north_east.longitude(), 180.0);
        assert!(bbox.south_west.longitude() < 179.95);
    }

    #[test]
    fn test_bounding_box_near_antimeridian_leaves_globe() {
        let envelope = bounding_box(p(0.0, 179.95), 50.0);
        assert!(!envelope.is_within_globe());
        assert!(envelope.max_lon > 180.0);
    }
}
