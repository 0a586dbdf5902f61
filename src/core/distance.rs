use std::f64::consts::{FRAC_PI_2, PI};

use geo::{coord, Intersects, Rect};

use crate::models::GeoPoint;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Extra radius added to bounding boxes so rounding never drops a point
const BOX_SLACK_M: f64 = 1.0;

/// Great-circle distance between two points in meters, unrounded
#[inline]
pub fn haversine_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1_rad = a.latitude().to_radians();
    let lat2_rad = b.latitude().to_radians();
    let delta_lat = (b.latitude() - a.latitude()).to_radians();
    let delta_lon = (b.longitude() - a.longitude()).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Float error can push h a hair above 1 for antipodal points
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Great-circle distance in whole meters
///
/// Rounds half away from zero (`f64::round`), so 12.5 m reports as 13.
#[inline]
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> u32 {
    haversine_meters(a, b).round() as u32
}

/// Lat/lon rectangles that cover every point within a radius
///
/// Holds two rectangles when the covered area crosses the antimeridian, and
/// spans all longitudes when it reaches a pole.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    spans: Vec<Rect<f64>>,
}

impl BoundingBox {
    pub fn around(center: GeoPoint, radius_m: u32) -> Self {
        let angular = (radius_m as f64 + BOX_SLACK_M) / EARTH_RADIUS_M;
        if angular >= PI {
            return Self::world();
        }

        let lat = center.latitude().to_radians();
        let min_lat = lat - angular;
        let max_lat = lat + angular;

        if min_lat <= -FRAC_PI_2 || max_lat >= FRAC_PI_2 {
            let min_lat = min_lat.max(-FRAC_PI_2).to_degrees();
            let max_lat = max_lat.min(FRAC_PI_2).to_degrees();
            return Self {
                spans: vec![span(-180.0, 180.0, min_lat, max_lat)],
            };
        }

        let lon_delta = (angular.sin() / lat.cos()).asin().to_degrees();
        let min_lon = center.longitude() - lon_delta;
        let max_lon = center.longitude() + lon_delta;
        let (min_lat, max_lat) = (min_lat.to_degrees(), max_lat.to_degrees());

        let spans = if min_lon < -180.0 {
            vec![
                span(min_lon + 360.0, 180.0, min_lat, max_lat),
                span(-180.0, max_lon, min_lat, max_lat),
            ]
        } else if max_lon > 180.0 {
            vec![
                span(min_lon, 180.0, min_lat, max_lat),
                span(-180.0, max_lon - 360.0, min_lat, max_lat),
            ]
        } else {
            vec![span(min_lon, max_lon, min_lat, max_lat)]
        };

        Self { spans }
    }

    fn world() -> Self {
        Self {
            spans: vec![span(-180.0, 180.0, -90.0, 90.0)],
        }
    }

    /// Inclusive containment check
    #[inline]
    pub fn contains(&self, point: GeoPoint) -> bool {
        let c = coord! { x: point.longitude(), y: point.latitude() };
        self.spans.iter().any(|rect| rect.intersects(&c))
    }

    pub fn spans(&self) -> &[Rect<f64>] {
        &self.spans
    }
}

fn span(min_lon: f64, max_lon: f64, min_lat: f64, max_lat: f64) -> Rect<f64> {
    Rect::new(
        coord! { x: min_lon, y: min_lat },
        coord! { x: max_lon, y: max_lat },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::HaversineDistance;

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    #[test]
    fn test_same_point_is_zero() {
        let kathmandu = point(27.7172, 85.3240);
        assert_eq!(distance_meters(kathmandu, kathmandu), 0);
    }

    #[test]
    fn test_kathmandu_to_pokhara() {
        // Roughly 140 km as the crow flies
        let distance = distance_meters(point(27.7172, 85.3240), point(28.2096, 83.9856));
        assert!((135_000..=150_000).contains(&distance), "got {}", distance);
    }

    #[test]
    fn test_one_km_along_meridian() {
        let delta = (1000.0 / EARTH_RADIUS_M).to_degrees();
        let distance = distance_meters(point(27.7172, 85.3240), point(27.7172 + delta, 85.3240));
        assert!((995..=1005).contains(&distance), "got {}", distance);
    }

    #[test]
    fn test_symmetric() {
        let a = point(27.7172, 85.3240);
        let b = point(-33.8688, 151.2093);
        assert_eq!(distance_meters(a, b), distance_meters(b, a));
    }

    #[test]
    fn test_antipodes_do_not_overflow() {
        let distance = distance_meters(point(0.0, 0.0), point(0.0, 180.0));
        let half_circumference = (PI * EARTH_RADIUS_M).round() as u32;
        assert_eq!(distance, half_circumference);
    }

    #[test]
    fn test_agrees_with_geo_crate() {
        let a = point(27.7172, 85.3240);
        let b = point(27.6710, 85.4298);
        let ours = haversine_meters(a, b);
        let theirs = geo::Point::from(a).haversine_distance(&geo::Point::from(b));
        // geo uses a 6371008.8 m radius
        assert!((ours - theirs).abs() < 5.0, "{} vs {}", ours, theirs);
    }

    #[test]
    fn test_bounding_box_contains_center() {
        let center = point(27.7172, 85.3240);
        let bbox = BoundingBox::around(center, 1000);
        assert_eq!(bbox.spans().len(), 1);
        assert!(bbox.contains(center));
        assert!(!bbox.contains(point(27.80, 85.3240)));
    }

    #[test]
    fn test_bounding_box_wraps_antimeridian() {
        let bbox = BoundingBox::around(point(0.0, 179.999), 5_000);
        assert_eq!(bbox.spans().len(), 2);
        assert!(bbox.contains(point(0.0, -179.99)));
        assert!(!bbox.contains(point(0.0, -170.0)));
    }

    #[test]
    fn test_bounding_box_near_pole_spans_all_longitudes() {
        let bbox = BoundingBox::around(point(89.999, 0.0), 10_000);
        assert!(bbox.contains(point(89.99, 179.0)));
        assert!(bbox.contains(point(89.99, -90.0)));
    }

    #[test]
    fn test_bounding_box_covers_radius_edge() {
        let center = point(45.0, 10.0);
        let radius = 2_000;
        let bbox = BoundingBox::around(center, radius);

        // Walk a ring of points just inside the radius
        for step in 0..72 {
            let bearing = (step as f64 * 5.0).to_radians();
            let target = destination(center, bearing, radius as f64 - 0.4);
            assert!(distance_meters(center, target) <= radius);
            assert!(bbox.contains(target), "bearing {} missed", step * 5);
        }
    }

    fn destination(from: GeoPoint, bearing: f64, meters: f64) -> GeoPoint {
        let delta = meters / EARTH_RADIUS_M;
        let lat1 = from.latitude().to_radians();
        let lon1 = from.longitude().to_radians();
        let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * bearing.cos()).asin();
        let lon2 = lon1
            + (bearing.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());
        point(lat2.to_degrees(), lon2.to_degrees())
    }
}
