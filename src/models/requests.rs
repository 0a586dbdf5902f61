use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::error::CoreError;
use crate::models::domain::EstimateRequest;

/// Message posted into the zone feed
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PostMessageRequest {
    #[validate(length(min = 1, max = 64))]
    #[serde(alias = "userId")]
    pub user_id: String,
    #[validate(length(min = 1, max = 500))]
    pub content: String,
    #[validate(range(min = -90.0, max = 90.0))]
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    #[serde(alias = "lng")]
    pub longitude: f64,
}

/// Message posted against a barcode; the barcode comes from the path
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PostProductMessageRequest {
    #[validate(length(min = 1, max = 64))]
    #[serde(alias = "userId")]
    pub user_id: String,
    #[validate(length(min = 1, max = 500))]
    pub content: String,
}

/// New bounty request dropped on the map
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
    #[validate(length(min = 1, max = 280))]
    pub description: String,
    #[serde(default = "default_bounty")]
    pub bounty: u32,
}

fn default_bounty() -> u32 {
    50
}

/// Reference point for radius queries and streams
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub radius: Option<u32>,
}

/// Estimate form as submitted; unit and tier arrive as free text
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EstimateRequestBody {
    #[validate(length(min = 1))]
    pub region: String,
    #[validate(length(min = 1))]
    pub district: String,
    pub floors: f64,
    #[serde(alias = "areaPerFloor", alias = "area_per_floor")]
    pub area: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    pub quality: String,
}

fn default_unit() -> String {
    "sq_ft".to_string()
}

impl TryFrom<EstimateRequestBody> for EstimateRequest {
    type Error = CoreError;

    fn try_from(body: EstimateRequestBody) -> Result<Self, Self::Error> {
        Ok(EstimateRequest {
            unit: body.unit.parse()?,
            quality: body.quality.parse()?,
            region: body.region,
            district: body.district,
            floors: body.floors,
            area_per_floor: body.area,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationQuery {
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::units::AreaUnit;
    use crate::models::QualityTier;

    #[test]
    fn test_post_message_validation() {
        let valid = PostMessageRequest {
            user_id: "Silent Wolf".to_string(),
            content: "power is back in Baluwatar".to_string(),
            latitude: 27.73,
            longitude: 85.33,
        };
        assert!(valid.validate().is_ok());

        let mut empty = valid.clone();
        empty.content = String::new();
        assert!(empty.validate().is_err());

        let mut off_map = valid;
        off_map.latitude = 95.0;
        assert!(off_map.validate().is_err());
    }

    #[test]
    fn test_estimate_body_accepts_aliases() {
        let json = r#"{
            "region": "nepal",
            "district": "kathmandu",
            "floors": 2.5,
            "areaPerFloor": 3,
            "unit": "aana",
            "quality": "Premium"
        }"#;

        let body: EstimateRequestBody = serde_json::from_str(json).unwrap();
        let req = EstimateRequest::try_from(body).unwrap();
        assert_eq!(req.unit, AreaUnit::Aana);
        assert_eq!(req.quality, QualityTier::Premium);
        assert_eq!(req.area_per_floor, 3.0);
    }

    #[test]
    fn test_estimate_body_bad_unit() {
        let body = EstimateRequestBody {
            region: "nepal".to_string(),
            district: "kathmandu".to_string(),
            floors: 1.0,
            area: 10.0,
            unit: "bigha".to_string(),
            quality: "basic".to_string(),
        };

        assert_eq!(
            EstimateRequest::try_from(body),
            Err(CoreError::InvalidUnit("bigha".to_string()))
        );
    }
}
