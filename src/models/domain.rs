use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::error::CoreError;
use crate::core::units::AreaUnit;

/// A validated latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawPoint {
    #[serde(alias = "lat")]
    latitude: f64,
    #[serde(alias = "lng")]
    longitude: f64,
}

impl TryFrom<RawPoint> for GeoPoint {
    type Error = CoreError;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        GeoPoint::new(raw.latitude, raw.longitude)
    }
}

impl GeoPoint {
    /// Build a point, rejecting anything outside [-90, 90] x [-180, 180]
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoreError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        if !valid {
            return Err(CoreError::InvalidCoordinate { latitude, longitude });
        }

        Ok(Self { latitude, longitude })
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(point: GeoPoint) -> Self {
        geo::Point::new(point.longitude, point.latitude)
    }
}

/// Anything that sits at a fixed point on the map
pub trait Located {
    fn location(&self) -> GeoPoint;
}

/// A message broadcast into the zone feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeotaggedRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub user_id: String,
    pub content: String,
    #[serde(flatten)]
    pub location: GeoPoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Located for GeotaggedRecord {
    fn location(&self) -> GeoPoint {
        self.location
    }
}

/// A record annotated with its distance from some reference point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProximityResult<T> {
    #[serde(flatten)]
    pub record: T,
    pub distance: u32,
}

/// A message posted against a scanned barcode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub user_id: String,
    pub barcode: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Bounty amounts a task request may offer, in NPR credits
pub const BOUNTY_OPTIONS: [u32; 3] = [50, 100, 500];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Open,
    Claimed,
    Done,
}

/// A geotagged "go and check" request carrying a bounty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TaskRow", into = "TaskRow")]
pub struct TaskRequest {
    pub id: Option<i64>,
    pub location: GeoPoint,
    pub description: String,
    pub bounty: u32,
    pub status: TaskStatus,
    pub created_at: Option<DateTime<Utc>>,
}

/// Row shape of the `requests` table
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TaskRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    lat: f64,
    lng: f64,
    description: String,
    bounty: u32,
    status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<TaskRow> for TaskRequest {
    type Error = CoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            location: GeoPoint::new(row.lat, row.lng)?,
            description: row.description,
            bounty: row.bounty,
            status: row.status,
            created_at: row.created_at,
        })
    }
}

impl From<TaskRequest> for TaskRow {
    fn from(task: TaskRequest) -> Self {
        Self {
            id: task.id,
            lat: task.location.latitude(),
            lng: task.location.longitude(),
            description: task.description,
            bounty: task.bounty,
            status: task.status,
            created_at: task.created_at,
        }
    }
}

impl Located for TaskRequest {
    fn location(&self) -> GeoPoint {
        self.location
    }
}

/// Construction finish grade, used as the last rate-table key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Basic,
    Standard,
    Premium,
    Luxury,
}

impl QualityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Basic => "basic",
            QualityTier::Standard => "standard",
            QualityTier::Premium => "premium",
            QualityTier::Luxury => "luxury",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(QualityTier::Basic),
            "standard" => Ok(QualityTier::Standard),
            "premium" => Ok(QualityTier::Premium),
            "luxury" => Ok(QualityTier::Luxury),
            _ => Err(CoreError::UnknownQualityTier(s.to_string())),
        }
    }
}

/// Input to the construction estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateRequest {
    pub region: String,
    pub district: String,
    pub floors: f64,
    pub area_per_floor: f64,
    pub unit: AreaUnit,
    pub quality: QualityTier,
}

/// Rates for one region, with the district used when a lookup misses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRates {
    pub default_district: String,
    pub districts: BTreeMap<String, BTreeMap<QualityTier, Decimal>>,
}

/// region -> district -> tier -> cost per square foot
pub type RateTable = BTreeMap<String, RegionRates>;

/// category -> fraction of total cost
pub type CostBreakdown = BTreeMap<String, Decimal>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialCoefficient {
    pub per_sq_ft: f64,
    pub unit: String,
}

/// material -> quantity per square foot of built-up area
pub type MaterialCoefficients = BTreeMap<String, MaterialCoefficient>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialQuantity {
    pub quantity: u64,
    pub unit: String,
}

/// Output of the construction estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateResult {
    pub region: String,
    pub district: String,
    pub district_fallback: bool,
    pub quality: QualityTier,
    pub total_area_sq_ft: u64,
    pub rate_per_sq_ft: Decimal,
    pub total_cost: Decimal,
    pub categories: BTreeMap<String, Decimal>,
    pub materials: BTreeMap<String, MaterialQuantity>,
}
