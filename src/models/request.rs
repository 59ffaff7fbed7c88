use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RequestState {
    New,
    InProgress,
    Completed,
    Rejected,
}

/// Intake ticket for a shipment nobody has priced or scheduled yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request {
    pub id: u64,
    pub title: String,
    pub origin: String,
    pub destination: String,
    pub requested_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub weight_kg: Option<f64>,
    pub volume_m3: Option<f64>,
    pub state: RequestState,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestInput {
    pub title: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub requested_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub weight_kg: Option<f64>,
    pub volume_m3: Option<f64>,
}
