use thiserror::Error;

/// Input validation failures raised by the core computations
///
/// Every variant is a rejected single call. Nothing here is retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("Invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Invalid area unit: {0}")]
    InvalidUnit(String),

    #[error("Invalid {field}: {value}")]
    InvalidArea { field: &'static str, value: f64 },

    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    #[error("Unknown quality tier: {0}")]
    UnknownQualityTier(String),

    #[error("No {quality} rate for {district} in {region}")]
    MissingRate {
        region: String,
        district: String,
        quality: String,
    },
}

impl CoreError {
    /// Name of the offending input field, for user-facing messages
    pub fn field(&self) -> &'static str {
        match self {
            CoreError::InvalidCoordinate { .. } => "location",
            CoreError::InvalidUnit(_) => "unit",
            CoreError::InvalidArea { field, .. } => field,
            CoreError::UnknownRegion(_) => "region",
            CoreError::UnknownQualityTier(_) => "quality",
            CoreError::MissingRate { .. } => "quality",
        }
    }
}
