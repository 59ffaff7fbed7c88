use serde::{Deserialize, Serialize};

use crate::engine::route::round1;
use crate::engine::trips::calculate_cost;
use crate::models::driver::Driver;
use crate::models::trip::{Trip, TripState};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StateCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub cancelled: usize,
}

impl StateCounts {
    fn record(&mut self, state: TripState) {
        match state {
            TripState::Pending => self.pending += 1,
            TripState::InProgress => self.in_progress += 1,
            TripState::Completed => self.completed += 1,
            TripState::Cancelled => self.cancelled += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.completed + self.cancelled
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TripMetrics {
    pub trips: StateCounts,
    pub total_distance_km: f64,
    pub total_hours: f64,
    pub total_weight_kg: f64,
    /// Ledger revenue of completed trips.
    pub revenue: u64,
    /// Completed over completed plus cancelled, in percent.
    pub completion_rate_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverStats {
    pub driver_id: u64,
    pub name: String,
    pub origin_base: String,
    pub trips: StateCounts,
    pub distance_km: f64,
    pub hours: f64,
}

pub fn trip_metrics(trips: &[Trip]) -> TripMetrics {
    let mut metrics = TripMetrics::default();

    for trip in trips {
        metrics.trips.record(trip.state);
        if trip.state == TripState::Cancelled {
            continue;
        }
        metrics.total_distance_km += trip.distance_km;
        metrics.total_hours += trip.duration_hours;
        metrics.total_weight_kg += trip.weight_kg;
        if trip.state == TripState::Completed {
            metrics.revenue += calculate_cost(trip).total;
        }
    }

    let closed = metrics.trips.completed + metrics.trips.cancelled;
    if closed > 0 {
        metrics.completion_rate_pct =
            round1(metrics.trips.completed as f64 * 100.0 / closed as f64);
    }
    metrics.total_distance_km = round1(metrics.total_distance_km);
    metrics.total_hours = round1(metrics.total_hours);
    metrics
}

pub fn driver_stats(drivers: &[Driver], trips: &[Trip]) -> Vec<DriverStats> {
    drivers
        .iter()
        .map(|driver| {
            let mut stats = DriverStats {
                driver_id: driver.id,
                name: driver.name.clone(),
                origin_base: driver.origin_base.clone(),
                trips: StateCounts::default(),
                distance_km: 0.0,
                hours: 0.0,
            };
            for trip in trips.iter().filter(|trip| trip.driver_id == Some(driver.id)) {
                stats.trips.record(trip.state);
                if trip.state != TripState::Cancelled {
                    stats.distance_km += trip.distance_km;
                    stats.hours += trip.duration_hours;
                }
            }
            stats.distance_km = round1(stats.distance_km);
            stats.hours = round1(stats.hours);
            stats
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::driver::{DriverState, LicenseClass};
    use crate::models::truck::TruckClass;

    fn trip(id: u64, driver_id: u64, state: TripState, distance_km: f64) -> Trip {
        Trip {
            id,
            driver_id: Some(driver_id),
            origin: "Santiago".to_string(),
            destination: "Región del Maule".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2025, 11, 21).unwrap(),
            return_date: None,
            state,
            distance_km,
            duration_hours: distance_km / 80.0,
            weight_kg: 1_000.0,
            volume_m3: 5.0,
            trucks_required: 1,
            truck_class: TruckClass::Gc,
            quote_id: None,
            request_id: None,
            started_at: None,
            completed_at: None,
            cancelled_at: None,
            cancel_reason: None,
            quoted_cost: None,
        }
    }

    #[test]
    fn metrics_skip_cancelled_trips() {
        let trips = vec![
            trip(1, 1, TripState::Completed, 100.0),
            trip(2, 1, TripState::Cancelled, 400.0),
            trip(3, 2, TripState::InProgress, 240.0),
            trip(4, 2, TripState::Completed, 80.0),
        ];
        let metrics = trip_metrics(&trips);

        assert_eq!(metrics.trips.total(), 4);
        assert_eq!(metrics.trips.completed, 2);
        assert_eq!(metrics.total_distance_km, 420.0);
        assert_eq!(metrics.total_weight_kg, 3_000.0);
        assert_eq!(metrics.completion_rate_pct, 66.7);
        let expected = calculate_cost(&trips[0]).total + calculate_cost(&trips[3]).total;
        assert_eq!(metrics.revenue, expected);
    }

    #[test]
    fn empty_fleet_has_zero_rate() {
        assert_eq!(trip_metrics(&[]), TripMetrics::default());
    }

    #[test]
    fn stats_group_trips_by_driver() {
        let driver = Driver {
            id: 2,
            name: "María Soto".to_string(),
            license: LicenseClass::A4,
            phone: "+56 9 8200 0002".to_string(),
            origin_base: "Osorno".to_string(),
            truck_class: TruckClass::Mc,
            state: DriverState::Busy,
            blocks: Vec::new(),
        };
        let trips = vec![
            trip(1, 1, TripState::Completed, 100.0),
            trip(3, 2, TripState::InProgress, 240.0),
            trip(4, 2, TripState::Completed, 80.0),
        ];
        let stats = driver_stats(&[driver], &trips);

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].trips.total(), 2);
        assert_eq!(stats[0].distance_km, 320.0);
        assert_eq!(stats[0].hours, 4.0);
    }
}
