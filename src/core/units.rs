use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::CoreError;

/// Square feet in one square meter
pub const SQ_FT_PER_SQ_M: f64 = 10.7639;

/// Square feet in one aana (hill land unit)
pub const SQ_FT_PER_AANA: f64 = 342.25;

/// Square feet in one dhur (Terai land unit)
pub const SQ_FT_PER_DHUR: f64 = 169.31;

/// Units an area per floor may be given in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaUnit {
    SqFt,
    SqM,
    Aana,
    Dhur,
}

impl AreaUnit {
    /// Square feet per one of this unit
    #[inline]
    pub fn sq_ft_factor(&self) -> f64 {
        match self {
            AreaUnit::SqFt => 1.0,
            AreaUnit::SqM => SQ_FT_PER_SQ_M,
            AreaUnit::Aana => SQ_FT_PER_AANA,
            AreaUnit::Dhur => SQ_FT_PER_DHUR,
        }
    }

    #[inline]
    pub fn to_square_feet(&self, value: f64) -> f64 {
        value * self.sq_ft_factor()
    }

    #[inline]
    pub fn from_square_feet(&self, sq_ft: f64) -> f64 {
        sq_ft / self.sq_ft_factor()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AreaUnit::SqFt => "sq_ft",
            AreaUnit::SqM => "sq_m",
            AreaUnit::Aana => "aana",
            AreaUnit::Dhur => "dhur",
        }
    }
}

impl fmt::Display for AreaUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AreaUnit {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sq_ft" | "sqft" | "sq.ft" | "sq ft" | "ft2" => Ok(AreaUnit::SqFt),
            "sq_m" | "sqm" | "sq.m" | "sq m" | "m2" => Ok(AreaUnit::SqM),
            "aana" | "ana" => Ok(AreaUnit::Aana),
            "dhur" => Ok(AreaUnit::Dhur),
            _ => Err(CoreError::InvalidUnit(s.to_string())),
        }
    }
}

/// Convert an area given under a unit tag into square feet
///
/// Fails with `InvalidUnit` for an unrecognized tag and `InvalidArea` for a
/// negative or non-finite value. Zero is accepted here; the estimator
/// rejects it separately.
pub fn normalize_area(value: f64, unit: &str) -> Result<f64, CoreError> {
    let unit: AreaUnit = unit.parse()?;

    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::InvalidArea { field: "area", value });
    }

    Ok(unit.to_square_feet(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_aana() {
        assert_eq!(normalize_area(1.0, "aana").unwrap(), 342.25);
    }

    #[test]
    fn test_normalize_dhur() {
        let sq_ft = normalize_area(4.0, "dhur").unwrap();
        assert!((sq_ft - 677.24).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_square_meters() {
        let sq_ft = normalize_area(100.0, "sq.m").unwrap();
        assert!((sq_ft - 1076.39).abs() < 1e-9);
    }

    #[test]
    fn test_square_feet_is_identity() {
        assert_eq!(normalize_area(1234.5, "sqft").unwrap(), 1234.5);
    }

    #[test]
    fn test_unknown_unit() {
        assert_eq!(
            normalize_area(1.0, "ropani"),
            Err(CoreError::InvalidUnit("ropani".to_string()))
        );
    }

    #[test]
    fn test_negative_area() {
        assert!(matches!(
            normalize_area(-1.0, "sqft"),
            Err(CoreError::InvalidArea { field: "area", .. })
        ));
        assert!(normalize_area(f64::NAN, "sqft").is_err());
    }

    #[test]
    fn test_round_trip() {
        for unit in [AreaUnit::SqFt, AreaUnit::SqM, AreaUnit::Aana, AreaUnit::Dhur] {
            for value in [0.5, 1.0, 4.0, 37.25, 1500.0] {
                let back = unit.from_square_feet(unit.to_square_feet(value));
                assert!((back - value).abs() < 1e-3, "{unit}: {value} -> {back}");
            }
        }
    }
}
