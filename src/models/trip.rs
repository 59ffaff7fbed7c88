use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::quote::CostBreakdown;
use crate::models::truck::TruckClass;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TripState {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TripState {
    /// Completed and cancelled trips no longer hold their driver.
    pub fn is_terminal(self) -> bool {
        matches!(self, TripState::Completed | TripState::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trip {
    pub id: u64,
    pub driver_id: Option<u64>,
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub state: TripState,
    pub distance_km: f64,
    pub duration_hours: f64,
    pub weight_kg: f64,
    pub volume_m3: f64,
    pub trucks_required: u32,
    pub truck_class: TruckClass,
    pub quote_id: Option<u64>,
    pub request_id: Option<u64>,
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancel_reason: Option<String>,
    /// Price agreed when the trip came from an approved quote.
    #[serde(default)]
    pub quoted_cost: Option<CostBreakdown>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripInput {
    pub driver_id: Option<i64>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub departure_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub distance_km: Option<f64>,
    pub duration_hours: Option<f64>,
    pub weight_kg: Option<f64>,
    pub volume_m3: Option<f64>,
    pub trucks_required: Option<f64>,
    pub truck_class: Option<String>,
    pub request_id: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripPatch {
    pub driver_id: Option<i64>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub departure_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub distance_km: Option<f64>,
    pub duration_hours: Option<f64>,
    pub weight_kg: Option<f64>,
    pub volume_m3: Option<f64>,
    pub trucks_required: Option<f64>,
    pub truck_class: Option<String>,
}

/// Per-km tariff ledger for a trip, used by financial reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripLedger {
    pub base: u64,
    pub fuel: u64,
    pub tolls: u64,
    pub maintenance: u64,
    pub subtotal: u64,
    pub margin: u64,
    pub tax: u64,
    pub total: u64,
    pub distance_km: f64,
    pub truck_class: TruckClass,
    pub trucks: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripProgress {
    pub fraction: f64,
    pub average_speed_kmh: f64,
    pub distance_done_km: f64,
    pub distance_left_km: f64,
    pub hours_elapsed: f64,
    pub hours_left: f64,
}
