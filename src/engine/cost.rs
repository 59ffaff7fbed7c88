use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::quote::CostBreakdown;
use crate::models::truck::TruckClass;

const BASE_RATE_GC: u64 = 250_000;
const BASE_RATE_MC: u64 = 175_000;
const FUEL_LOAD_KM: f64 = 400.0;
const FUEL_LOAD_PRICE: u64 = 70_000;
const LODGING_PRICE: u64 = 45_000;
const LONG_TRIP_HOURS: f64 = 4.0;
const PER_DIEM_LONG: u64 = 60_000;
const PER_DIEM_SHORT: u64 = 20_000;

/// How tolls are counted along a route.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TollRule {
    /// One 20 000 toll every started 200 km.
    #[default]
    Per200Km,
    /// Older rule: one 10 000 toll per 150 km, rounded to nearest.
    Legacy150Km,
}

impl TollRule {
    pub fn tolls_per_truck(self, distance_km: f64) -> u64 {
        match self {
            TollRule::Per200Km => ((distance_km / 200.0).ceil() as u64).saturating_mul(20_000),
            TollRule::Legacy150Km => ((distance_km / 150.0).round() as u64).saturating_mul(10_000),
        }
    }
}

impl FromStr for TollRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-200km" => Ok(TollRule::Per200Km),
            "legacy-150km" => Ok(TollRule::Legacy150Km),
            other => Err(format!("unknown toll rule {other}, expected per-200km or legacy-150km")),
        }
    }
}

impl fmt::Display for TollRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TollRule::Per200Km => f.write_str("per-200km"),
            TollRule::Legacy150Km => f.write_str("legacy-150km"),
        }
    }
}

/// Quote-time price of a shipment. Every component scales linearly with
/// the number of trucks. Preview and quote generation both go through here.
pub fn estimate_quote_cost(
    distance_km: f64,
    duration_hours: f64,
    truck_class: TruckClass,
    trucks_required: u32,
    toll_rule: TollRule,
) -> CostBreakdown {
    let distance = if distance_km.is_finite() && distance_km > 0.0 { distance_km } else { 1.0 };
    let duration = if duration_hours.is_finite() { duration_hours.max(0.0) } else { 0.0 };
    let trucks = u64::from(trucks_required.max(1));

    let base_rate = match truck_class {
        TruckClass::Gc => BASE_RATE_GC,
        TruckClass::Mc => BASE_RATE_MC,
    };
    let fuel_loads = ((distance / FUEL_LOAD_KM).ceil() as u64).max(1);
    let lodging_required = duration >= LONG_TRIP_HOURS;
    let per_diem_rate = if lodging_required { PER_DIEM_LONG } else { PER_DIEM_SHORT };

    // Saturates instead of wrapping on absurd inputs.
    let base_per_trip = base_rate.saturating_mul(trucks);
    let fuel = fuel_loads.saturating_mul(FUEL_LOAD_PRICE).saturating_mul(trucks);
    let tolls = toll_rule.tolls_per_truck(distance).saturating_mul(trucks);
    let lodging = if lodging_required { LODGING_PRICE.saturating_mul(trucks) } else { 0 };
    let per_diem = per_diem_rate.saturating_mul(trucks);

    CostBreakdown {
        base_per_trip,
        fuel,
        tolls,
        lodging,
        per_diem,
        total: base_per_trip
            .saturating_add(fuel)
            .saturating_add(tolls)
            .saturating_add(lodging)
            .saturating_add(per_diem),
        fuel_loads,
        lodging_required,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn santiago_valparaiso_single_gc() {
        let cost = estimate_quote_cost(460.0, 5.8, TruckClass::Gc, 1, TollRule::Per200Km);
        assert_eq!(cost.base_per_trip, 250_000);
        assert_eq!(cost.fuel, 140_000);
        assert_eq!(cost.tolls, 60_000);
        assert_eq!(cost.lodging, 45_000);
        assert_eq!(cost.per_diem, 60_000);
        assert_eq!(
            cost.total,
            cost.base_per_trip + cost.fuel + cost.tolls + cost.lodging + cost.per_diem
        );
        assert_eq!(cost.total, 555_000);
    }

    #[test]
    fn short_trip_has_no_lodging_and_short_per_diem() {
        let cost = estimate_quote_cost(50.0, 0.6, TruckClass::Mc, 1, TollRule::Per200Km);
        assert!(!cost.lodging_required);
        assert_eq!(cost.lodging, 0);
        assert_eq!(cost.per_diem, 20_000);
        assert_eq!(cost.base_per_trip, 175_000);
        assert_eq!(cost.fuel, 70_000);
    }

    #[test]
    fn every_component_scales_with_truck_count() {
        for distance in [1.0, 199.0, 460.0, 1234.5, 4999.0] {
            for duration in [0.5, 3.9, 4.0, 30.0] {
                for class in [TruckClass::Gc, TruckClass::Mc] {
                    let one = estimate_quote_cost(distance, duration, class, 1, TollRule::Per200Km);
                    for n in 2..=10 {
                        let many = estimate_quote_cost(distance, duration, class, n, TollRule::Per200Km);
                        let n = u64::from(n);
                        assert_eq!(many.base_per_trip, one.base_per_trip * n);
                        assert_eq!(many.fuel, one.fuel * n);
                        assert_eq!(many.tolls, one.tolls * n);
                        assert_eq!(many.lodging, one.lodging * n);
                        assert_eq!(many.per_diem, one.per_diem * n);
                        assert_eq!(many.total, one.total * n);
                    }
                }
            }
        }
    }

    #[test]
    fn zero_distance_is_priced_as_one_km() {
        let zero = estimate_quote_cost(0.0, 1.0, TruckClass::Gc, 1, TollRule::Per200Km);
        let one = estimate_quote_cost(1.0, 1.0, TruckClass::Gc, 1, TollRule::Per200Km);
        assert_eq!(zero, one);
        assert_eq!(zero.tolls, 20_000);
    }

    #[test]
    fn legacy_toll_rule_rounds_per_150_km() {
        let cost = estimate_quote_cost(460.0, 5.8, TruckClass::Gc, 2, TollRule::Legacy150Km);
        assert_eq!(cost.tolls, 3 * 10_000 * 2);
    }

    #[test]
    fn huge_inputs_saturate_instead_of_overflowing() {
        let cost = estimate_quote_cost(1.0e12, 1.0, TruckClass::Gc, 4_000_000_000, TollRule::Per200Km);
        assert_eq!(cost.fuel, u64::MAX);
        assert_eq!(cost.total, u64::MAX);
    }

    #[test]
    fn toll_rule_parses_from_config_value() {
        assert_eq!("legacy-150km".parse::<TollRule>().unwrap(), TollRule::Legacy150Km);
        assert_eq!("PER-200KM".parse::<TollRule>().unwrap(), TollRule::Per200Km);
        assert!("weekly".parse::<TollRule>().is_err());
    }
}
