use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum TruckClass {
    /// Gran camión.
    #[default]
    #[serde(rename = "GC")]
    Gc,
    /// Mediano camión.
    #[serde(rename = "MC")]
    Mc,
}

impl TruckClass {
    pub fn code(self) -> &'static str {
        match self {
            TruckClass::Gc => "GC",
            TruckClass::Mc => "MC",
        }
    }

    /// Lenient parse used by record validation: anything unrecognised
    /// becomes the default class.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for TruckClass {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GC" => Ok(TruckClass::Gc),
            "MC" => Ok(TruckClass::Mc),
            other => Err(AppError::Capacity(format!("unknown truck class: {other}"))),
        }
    }
}

impl fmt::Display for TruckClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TruckCapacity {
    pub weight_kg: f64,
    pub volume_m3: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapacityTable {
    pub gc: TruckCapacity,
    pub mc: TruckCapacity,
}

impl CapacityTable {
    pub fn get(&self, class: TruckClass) -> TruckCapacity {
        match class {
            TruckClass::Gc => self.gc,
            TruckClass::Mc => self.mc,
        }
    }
}

impl Default for CapacityTable {
    fn default() -> Self {
        Self {
            gc: TruckCapacity {
                weight_kg: 28_000.0,
                volume_m3: 60.0,
            },
            mc: TruckCapacity {
                weight_kg: 14_000.0,
                volume_m3: 35.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("gc".parse::<TruckClass>().unwrap(), TruckClass::Gc);
        assert_eq!(" Mc ".parse::<TruckClass>().unwrap(), TruckClass::Mc);
    }

    #[test]
    fn unknown_class_is_a_capacity_error() {
        let err = "XL".parse::<TruckClass>().unwrap_err();
        assert!(matches!(err, AppError::Capacity(_)));
        assert_eq!(TruckClass::parse_or_default(Some("XL")), TruckClass::Gc);
        assert_eq!(TruckClass::parse_or_default(None), TruckClass::Gc);
    }
}
