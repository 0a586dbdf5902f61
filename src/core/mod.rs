// Core algorithm exports
pub mod distance;
pub mod error;
pub mod estimator;
pub mod filters;
pub mod identity;
pub mod units;

pub use distance::{distance_meters, haversine_meters, BoundingBox, EARTH_RADIUS_M};
pub use error::CoreError;
pub use estimator::{estimate, Estimator, EstimatorTables, TablesError};
pub use filters::{within_radius, Zone};
pub use identity::anonymous_handle;
pub use units::{normalize_area, AreaUnit};
