// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    CostBreakdown, EstimateRequest, EstimateResult, GeoPoint, GeotaggedRecord, Located,
    MaterialCoefficient, MaterialCoefficients, MaterialQuantity, ProductMessage, ProximityResult,
    QualityTier, RateTable, RegionRates, TaskRequest, TaskStatus, BOUNTY_OPTIONS,
};
pub use requests::{
    ConfirmationQuery, CreateTaskRequest, EstimateRequestBody, NearbyQuery, PostMessageRequest,
    PostProductMessageRequest,
};
pub use responses::{
    ConfirmationResponse, ErrorResponse, HealthResponse, IdentityResponse, NearbyResponse,
};
