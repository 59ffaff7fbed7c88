use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::Limits;
use crate::models::truck::{CapacityTable, TruckClass};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LimitingFactor {
    Weight,
    Volume,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapacityPlan {
    pub truck_class: TruckClass,
    pub trucks_required: u32,
    pub valid: bool,
    /// True when the raw requirement exceeded the truck limit.
    pub clamped: bool,
    pub limiting_factor: LimitingFactor,
    pub weight_utilization_pct: u32,
    pub volume_utilization_pct: u32,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoadFit {
    pub fits: bool,
    pub exceeds_weight: bool,
    pub exceeds_volume: bool,
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn trucks_for(amount: f64, capacity: f64) -> u32 {
    if amount > 0.0 && capacity > 0.0 {
        (amount / capacity).ceil().min(u32::MAX as f64) as u32
    } else {
        1
    }
}

fn utilization_pct(amount: f64, trucks: u32, capacity: f64) -> u32 {
    if amount <= 0.0 || capacity <= 0.0 {
        return 0;
    }
    ((amount / (trucks as f64 * capacity)) * 100.0).round() as u32
}

/// Number of trucks of `truck_class` needed to carry the load.
///
/// Unknown classes yield an invalid one-truck plan instead of an error so
/// previews keep working while the operator fixes the form.
pub fn calculate_trucks(
    table: &CapacityTable,
    limits: &Limits,
    truck_class: &str,
    weight_kg: f64,
    volume_m3: f64,
) -> CapacityPlan {
    let class = match truck_class.parse::<TruckClass>() {
        Ok(class) => class,
        Err(err) => {
            warn!(truck_class, "invalid truck class for capacity plan");
            return CapacityPlan {
                truck_class: TruckClass::default(),
                trucks_required: 1,
                valid: false,
                clamped: false,
                limiting_factor: LimitingFactor::None,
                weight_utilization_pct: 0,
                volume_utilization_pct: 0,
                error: Some(err.to_string()),
            };
        }
    };

    let capacity = table.get(class);
    let weight = sanitize(weight_kg);
    let volume = sanitize(volume_m3);
    let (min_trucks, max_trucks) = limits.trucks;

    if weight == 0.0 && volume == 0.0 {
        return CapacityPlan {
            truck_class: class,
            trucks_required: 1.max(min_trucks),
            valid: true,
            clamped: false,
            limiting_factor: LimitingFactor::None,
            weight_utilization_pct: 0,
            volume_utilization_pct: 0,
            error: None,
        };
    }

    let by_weight = trucks_for(weight, capacity.weight_kg);
    let by_volume = trucks_for(volume, capacity.volume_m3);
    let raw = by_weight.max(by_volume).max(1);
    let trucks = raw.clamp(min_trucks, max_trucks);
    let clamped = trucks != raw;
    if clamped {
        warn!(computed = raw, limited = trucks, "truck requirement clamped");
    }

    let weight_ratio = if capacity.weight_kg > 0.0 { weight / capacity.weight_kg } else { 0.0 };
    let volume_ratio = if capacity.volume_m3 > 0.0 { volume / capacity.volume_m3 } else { 0.0 };
    let limiting_factor = if weight_ratio >= volume_ratio {
        LimitingFactor::Weight
    } else {
        LimitingFactor::Volume
    };

    CapacityPlan {
        truck_class: class,
        trucks_required: trucks,
        valid: (min_trucks..=max_trucks).contains(&trucks),
        clamped,
        limiting_factor,
        weight_utilization_pct: utilization_pct(weight, trucks, capacity.weight_kg),
        volume_utilization_pct: utilization_pct(volume, trucks, capacity.volume_m3),
        error: None,
    }
}

/// Whether a load fits in a single truck of the given class.
pub fn check_load_fits(
    table: &CapacityTable,
    class: TruckClass,
    weight_kg: f64,
    volume_m3: f64,
) -> LoadFit {
    let capacity = table.get(class);
    let exceeds_weight = sanitize(weight_kg) > capacity.weight_kg;
    let exceeds_volume = sanitize(volume_m3) > capacity.volume_m3;

    LoadFit {
        fits: !exceeds_weight && !exceeds_volume,
        exceeds_weight,
        exceeds_volume,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(class: &str, weight: f64, volume: f64) -> CapacityPlan {
        calculate_trucks(&CapacityTable::default(), &Limits::default(), class, weight, volume)
    }

    #[test]
    fn empty_load_needs_one_truck() {
        let result = plan("GC", 0.0, 0.0);
        assert_eq!(result.trucks_required, 1);
        assert!(result.valid);
        assert_eq!(result.limiting_factor, LimitingFactor::None);
    }

    #[test]
    fn heavy_load_is_split_by_weight() {
        let result = plan("GC", 70_000.0, 10.0);
        assert_eq!(result.trucks_required, 3);
        assert_eq!(result.limiting_factor, LimitingFactor::Weight);
        assert_eq!(result.weight_utilization_pct, 83);
    }

    #[test]
    fn bulky_load_is_split_by_volume() {
        let result = plan("mc", 1_000.0, 80.0);
        assert_eq!(result.truck_class, TruckClass::Mc);
        assert_eq!(result.trucks_required, 3);
        assert_eq!(result.limiting_factor, LimitingFactor::Volume);
    }

    #[test]
    fn requirement_is_clamped_to_truck_limit() {
        let result = plan("MC", 1_000_000.0, 0.0);
        assert_eq!(result.trucks_required, 10);
        assert!(result.clamped);
        assert!(result.valid);
    }

    #[test]
    fn unknown_class_is_invalid_single_truck() {
        let result = plan("ZZ", 50_000.0, 10.0);
        assert_eq!(result.trucks_required, 1);
        assert!(!result.valid);
        assert!(result.error.is_some());
    }

    #[test]
    fn more_cargo_never_needs_fewer_trucks() {
        let mut previous = 0;
        for step in 0..200 {
            let weight = step as f64 * 1_750.0;
            let trucks = plan("GC", weight, 12.0).trucks_required;
            assert!(trucks >= previous, "weight {weight} dropped to {trucks}");
            previous = trucks;
        }

        let mut previous = 0;
        for step in 0..200 {
            let volume = step as f64 * 4.5;
            let trucks = plan("GC", 9_000.0, volume).trucks_required;
            assert!(trucks >= previous, "volume {volume} dropped to {trucks}");
            previous = trucks;
        }
    }

    #[test]
    fn negative_inputs_count_as_empty() {
        assert_eq!(plan("GC", -5.0, f64::NAN).trucks_required, 1);
    }

    #[test]
    fn load_fit_reports_overflow() {
        let table = CapacityTable::default();
        let fit = check_load_fits(&table, TruckClass::Mc, 15_000.0, 20.0);
        assert!(!fit.fits);
        assert!(fit.exceeds_weight);
        assert!(!fit.exceeds_volume);
        assert!(check_load_fits(&table, TruckClass::Gc, 15_000.0, 20.0).fits);
    }
}
