use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::truck::TruckClass;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum QuoteState {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CostBreakdown {
    pub base_per_trip: u64,
    pub fuel: u64,
    pub tolls: u64,
    pub lodging: u64,
    pub per_diem: u64,
    pub total: u64,
    pub fuel_loads: u64,
    pub lodging_required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quote {
    pub id: u64,
    pub request_id: Option<u64>,
    pub origin: String,
    pub destination: String,
    pub distance_km: f64,
    pub duration_hours: f64,
    pub truck_class: TruckClass,
    pub weight_kg: f64,
    pub volume_m3: f64,
    pub trucks_required: u32,
    pub cost_breakdown: CostBreakdown,
    pub total_cost: u64,
    pub driver_id: Option<u64>,
    pub event_date: Option<NaiveDate>,
    #[serde(default)]
    pub return_date: Option<NaiveDate>,
    pub state: QuoteState,
    pub created_at: DateTime<Utc>,
}

/// Fields submitted to price a shipment. The cost is always recomputed from
/// these, never taken from the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuoteDraft {
    pub request_id: Option<u64>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub distance_km: Option<f64>,
    pub duration_hours: Option<f64>,
    pub truck_class: Option<String>,
    pub weight_kg: Option<f64>,
    pub volume_m3: Option<f64>,
    pub trucks_required: Option<u32>,
    pub driver_id: Option<u64>,
    pub event_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
}
