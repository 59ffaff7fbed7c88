use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::truck::TruckClass;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CalendarEventKind {
    Quote,
    Trip,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CalendarEventState {
    Pending,
    Approved,
}

/// Provisional calendar hold shown while a quote is under review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarEvent {
    pub id: u64,
    pub quote_id: Option<u64>,
    pub request_id: Option<u64>,
    pub driver_id: Option<u64>,
    pub date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub origin: String,
    pub destination: String,
    pub truck_class: TruckClass,
    pub description: String,
    pub kind: CalendarEventKind,
    pub state: CalendarEventState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEventDraft {
    pub date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub driver_id: Option<u64>,
}
