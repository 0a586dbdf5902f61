use std::collections::BTreeMap;
use std::path::Path;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    CostBreakdown, EstimateRequest, EstimateResult, MaterialCoefficients, MaterialQuantity,
    RateTable,
};

use super::error::CoreError;

const BUNDLED_TABLES: &str = include_str!("../../config/estimator.toml");

/// Errors loading estimator reference data
#[derive(Debug, Error)]
pub enum TablesError {
    #[error("Failed to read tables file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse tables: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid tables: {0}")]
    Invalid(String),
}

/// Static reference data the estimator reads from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorTables {
    pub rates: RateTable,
    pub breakdown: CostBreakdown,
    pub materials: MaterialCoefficients,
}

impl EstimatorTables {
    /// Tables shipped with the service
    pub fn bundled() -> Result<Self, TablesError> {
        Self::from_toml_str(BUNDLED_TABLES)
    }

    pub fn from_toml_str(source: &str) -> Result<Self, TablesError> {
        let tables: Self = toml::from_str(source)?;
        tables.validate()?;
        Ok(tables)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, TablesError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Check the invariants the estimator relies on
    pub fn validate(&self) -> Result<(), TablesError> {
        let sum: Decimal = self.breakdown.values().copied().sum();
        if sum != Decimal::ONE {
            return Err(TablesError::Invalid(format!(
                "cost breakdown fractions sum to {}, expected 1",
                sum
            )));
        }

        for (region, rates) in &self.rates {
            if !rates.districts.contains_key(&rates.default_district) {
                return Err(TablesError::Invalid(format!(
                    "default district {} missing from region {}",
                    rates.default_district, region
                )));
            }
        }

        Ok(())
    }
}

/// Construction cost and material estimator over a fixed set of tables
#[derive(Debug, Clone)]
pub struct Estimator {
    tables: EstimatorTables,
}

impl Estimator {
    pub fn new(tables: EstimatorTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &EstimatorTables {
        &self.tables
    }

    pub fn estimate(&self, req: &EstimateRequest) -> Result<EstimateResult, CoreError> {
        estimate(
            req,
            &self.tables.rates,
            &self.tables.breakdown,
            &self.tables.materials,
        )
    }
}

/// Estimate total cost, category costs and material quantities
///
/// # Steps
/// 1. Reject non-positive floors or area
/// 2. Normalize area to square feet, multiply by floors, round
/// 3. Look up the rate, falling back to the region's default district
/// 4. Multiply out cost, split it by category, derive materials
pub fn estimate(
    req: &EstimateRequest,
    rates: &RateTable,
    breakdown: &CostBreakdown,
    materials: &MaterialCoefficients,
) -> Result<EstimateResult, CoreError> {
    require_positive("floors", req.floors)?;
    require_positive("area", req.area_per_floor)?;

    let area_sq_ft = req.unit.to_square_feet(req.area_per_floor);
    let total_area = (req.floors * area_sq_ft).round() as u64;

    let (region, region_rates) = lookup(rates, &req.region)
        .ok_or_else(|| CoreError::UnknownRegion(req.region.clone()))?;

    let (district, district_rates, district_fallback) =
        match lookup(&region_rates.districts, &req.district) {
            Some((district, district_rates)) => (district, district_rates, false),
            None => {
                let default = &region_rates.default_district;
                tracing::warn!(
                    "District {:?} not in region {}, using default {}",
                    req.district,
                    region,
                    default
                );
                let district_rates = region_rates.districts.get(default).ok_or_else(|| {
                    CoreError::MissingRate {
                        region: region.clone(),
                        district: default.clone(),
                        quality: req.quality.to_string(),
                    }
                })?;
                (default, district_rates, true)
            }
        };

    let rate = *district_rates
        .get(&req.quality)
        .ok_or_else(|| CoreError::MissingRate {
            region: region.clone(),
            district: district.clone(),
            quality: req.quality.to_string(),
        })?;

    let total_cost = Decimal::from(total_area) * rate;

    let categories = breakdown
        .iter()
        .map(|(category, fraction)| (category.clone(), round_currency(total_cost * *fraction)))
        .collect();

    let materials = materials
        .iter()
        .map(|(material, coefficient)| {
            let quantity = (total_area as f64 * coefficient.per_sq_ft).round() as u64;
            (
                material.clone(),
                MaterialQuantity {
                    quantity,
                    unit: coefficient.unit.clone(),
                },
            )
        })
        .collect();

    tracing::debug!(
        "Estimated {} sq.ft in {}/{} ({}) at {}: {}",
        total_area,
        region,
        district,
        req.quality,
        rate,
        total_cost
    );

    Ok(EstimateResult {
        region: region.clone(),
        district: district.clone(),
        district_fallback,
        quality: req.quality,
        total_area_sq_ft: total_area,
        rate_per_sq_ft: rate,
        total_cost,
        categories,
        materials,
    })
}

#[inline]
fn require_positive(field: &'static str, value: f64) -> Result<(), CoreError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CoreError::InvalidArea { field, value })
    }
}

#[inline]
fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Exact key match first, then case-insensitive
fn lookup<'a, V>(map: &'a BTreeMap<String, V>, key: &str) -> Option<(&'a String, &'a V)> {
    let key = key.trim();
    map.get_key_value(key).or_else(|| {
        map.iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
    })
}
