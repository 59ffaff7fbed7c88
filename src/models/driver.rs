use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::truck::TruckClass;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DriverState {
    #[default]
    Available,
    Busy,
    Inactive,
}

impl DriverState {
    pub fn label(self) -> &'static str {
        match self {
            DriverState::Available => "available",
            DriverState::Busy => "busy",
            DriverState::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LicenseClass {
    A4,
    A5,
}

/// Legacy single-date hold on a driver, kept for reservations made before
/// calendar events existed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverBlock {
    pub date: NaiveDate,
    pub reason: String,
    #[serde(default)]
    pub truck_class: Option<TruckClass>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub volume_m3: Option<f64>,
    #[serde(default)]
    pub trucks_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Driver {
    pub id: u64,
    pub name: String,
    pub license: LicenseClass,
    pub phone: String,
    pub origin_base: String,
    pub truck_class: TruckClass,
    pub state: DriverState,
    #[serde(default)]
    pub blocks: Vec<DriverBlock>,
}

/// Raw driver fields as submitted by a form; everything is optional so
/// validation can report every missing field at once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverInput {
    pub name: Option<String>,
    pub license: Option<String>,
    pub phone: Option<String>,
    pub origin_base: Option<String>,
    pub truck_class: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverPatch {
    pub name: Option<String>,
    pub license: Option<String>,
    pub phone: Option<String>,
    pub origin_base: Option<String>,
    pub truck_class: Option<String>,
    pub state: Option<DriverState>,
}
