use serde::{Deserialize, Serialize};

use crate::models::domain::ProximityResult;

/// Records near a reference point
#[derive(Debug, Clone, Serialize)]
pub struct NearbyResponse<T> {
    pub results: Vec<ProximityResult<T>>,
    pub radius_meters: u32,
    pub total_results: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>, status_code: u16) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status_code,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityResponse {
    pub handle: String,
}

/// Outcome of waiting on an externally confirmed record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationResponse {
    pub id: String,
    pub confirmed: bool,
}
