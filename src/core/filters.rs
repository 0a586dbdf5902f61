use crate::models::{GeoPoint, Located, ProximityResult};

use super::distance::{distance_meters, BoundingBox};

/// A circular area on the map: reference point plus radius in meters
///
/// Precomputes a bounding box so points far outside the circle never pay
/// for the trigonometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    center: GeoPoint,
    radius_m: u32,
    bbox: BoundingBox,
}

impl Zone {
    pub fn new(center: GeoPoint, radius_m: u32) -> Self {
        Self {
            center,
            radius_m,
            bbox: BoundingBox::around(center, radius_m),
        }
    }

    #[inline]
    pub fn center(&self) -> GeoPoint {
        self.center
    }

    #[inline]
    pub fn radius_m(&self) -> u32 {
        self.radius_m
    }

    /// Distance to `point` if it lies within the zone
    #[inline]
    pub fn locate(&self, point: GeoPoint) -> Option<u32> {
        if !self.bbox.contains(point) {
            return None;
        }

        let distance = distance_meters(self.center, point);
        (distance <= self.radius_m).then_some(distance)
    }

    /// Annotate a record with its distance if it lies within the zone
    pub fn admit<T: Located>(&self, record: T) -> Option<ProximityResult<T>> {
        self.locate(record.location())
            .map(|distance| ProximityResult { record, distance })
    }
}

/// Keep the records within `radius_m` of `reference`, annotated with distance
///
/// Input order is preserved. Calling this again with another reference point
/// over the same records is cheap and side-effect free.
pub fn within_radius<T>(
    reference: GeoPoint,
    records: &[T],
    radius_m: u32,
) -> Vec<ProximityResult<T>>
where
    T: Located + Clone,
{
    let zone = Zone::new(reference, radius_m);

    records
        .iter()
        .filter_map(|record| {
            zone.locate(record.location()).map(|distance| ProximityResult {
                record: record.clone(),
                distance,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::distance::EARTH_RADIUS_M;
    use crate::models::GeotaggedRecord;

    fn record_at(id: i64, lat: f64, lon: f64) -> GeotaggedRecord {
        GeotaggedRecord {
            id: Some(id),
            user_id: format!("user {}", id),
            content: "signal".to_string(),
            location: GeoPoint::new(lat, lon).unwrap(),
            created_at: None,
        }
    }

    fn north_of(lat: f64, meters: f64) -> f64 {
        lat + (meters / EARTH_RADIUS_M).to_degrees()
    }

    #[test]
    fn test_within_radius_keeps_order() {
        let reference = GeoPoint::new(27.7172, 85.3240).unwrap();
        let records = vec![
            record_at(1, 27.7172, 85.3240),
            record_at(2, north_of(27.7172, 500.0), 85.3240),
            record_at(3, north_of(27.7172, 1500.0), 85.3240),
        ];

        let nearby = within_radius(reference, &records, 1000);

        let ids: Vec<_> = nearby.iter().map(|r| r.record.id).collect();
        assert_eq!(ids, vec![Some(1), Some(2)]);
        assert_eq!(nearby[0].distance, 0);
        assert_eq!(nearby[1].distance, 500);
    }

    #[test]
    fn test_empty_input() {
        let reference = GeoPoint::new(0.0, 0.0).unwrap();
        let records: Vec<GeotaggedRecord> = vec![];
        assert!(within_radius(reference, &records, 1000).is_empty());
    }

    #[test]
    fn test_zero_radius_keeps_coincident_only() {
        let reference = GeoPoint::new(27.7172, 85.3240).unwrap();
        let records = vec![
            record_at(1, 27.7172, 85.3240),
            record_at(2, north_of(27.7172, 5.0), 85.3240),
        ];

        let nearby = within_radius(reference, &records, 0);
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].record.id, Some(1));
    }

    #[test]
    fn test_radius_is_inclusive() {
        let reference = GeoPoint::new(27.7172, 85.3240).unwrap();
        let records = vec![record_at(1, north_of(27.7172, 1000.0), 85.3240)];

        let nearby = within_radius(reference, &records, 1000);
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].distance, 1000);
    }

    #[test]
    fn test_zone_admit() {
        let zone = Zone::new(GeoPoint::new(27.7172, 85.3240).unwrap(), 1000);
        assert!(zone.admit(record_at(1, 27.7180, 85.3245)).is_some());
        assert!(zone.admit(record_at(2, 28.2096, 83.9856)).is_none());
    }
}
