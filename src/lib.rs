//! Walls - location-scoped community board and construction estimator
//!
//! This library provides the proximity filtering, live feeds and cost
//! estimation behind the Walls service. Zone messages and task requests are
//! kept only when they fall within a radius of the caller.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    distance_meters, estimate, haversine_meters, normalize_area, within_radius, CoreError,
    Estimator, EstimatorTables, Zone,
};
pub use crate::models::{
    EstimateRequest, EstimateResult, GeoPoint, GeotaggedRecord, ProximityResult, QualityTier,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let kathmandu = GeoPoint::new(27.7172, 85.3240).unwrap();
        assert_eq!(distance_meters(kathmandu, kathmandu), 0);
        assert!(Estimator::new(EstimatorTables::bundled().unwrap())
            .tables()
            .rates
            .contains_key("nepal"));
    }
}
