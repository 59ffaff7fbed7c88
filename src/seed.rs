use chrono::{DateTime, NaiveDate, Utc};

use crate::models::driver::{Driver, DriverState, LicenseClass};
use crate::models::fleet::Fleet;
use crate::models::request::{Request, RequestState};
use crate::models::trip::{Trip, TripState};
use crate::models::truck::TruckClass;

struct Depot {
    name: &'static str,
    gc_trucks: u64,
    mc_trucks: u64,
}

const DEPOT_FLEET: [Depot; 3] = [
    Depot { name: "Osorno", gc_trucks: 3, mc_trucks: 6 },
    Depot { name: "Santiago", gc_trucks: 5, mc_trucks: 8 },
    Depot { name: "Coquimbo", gc_trucks: 3, mc_trucks: 4 },
];

/// One driver per truck at each depot; GC drivers hold an A5 license.
pub fn demo_drivers() -> Vec<Driver> {
    let mut next = 1;
    let mut drivers = Vec::new();
    for depot in &DEPOT_FLEET {
        for i in 1..=depot.gc_trucks + depot.mc_trucks {
            let heavy = i <= depot.gc_trucks;
            drivers.push(Driver {
                id: next,
                name: format!("Conductor {} {i}", depot.name),
                license: if heavy { LicenseClass::A5 } else { LicenseClass::A4 },
                phone: format!("+56 9 8{i}00{i:02}"),
                origin_base: depot.name.to_string(),
                truck_class: if heavy { TruckClass::Gc } else { TruckClass::Mc },
                state: DriverState::Available,
                blocks: Vec::new(),
            });
            next += 1;
        }
    }
    drivers
}

fn request(
    id: u64,
    title: &str,
    (from, to): (NaiveDate, NaiveDate),
    state: RequestState,
    (origin, destination): (&str, &str),
    (weight_kg, volume_m3): (f64, f64),
) -> Request {
    Request {
        id,
        title: title.to_string(),
        origin: origin.to_string(),
        destination: destination.to_string(),
        requested_date: Some(from),
        return_date: Some(to),
        weight_kg: Some(weight_kg),
        volume_m3: Some(volume_m3),
        state,
    }
}

pub fn demo_requests() -> Vec<Request> {
    let day = |d| NaiveDate::from_ymd_opt(2025, 11, d).unwrap_or_default();
    vec![
        request(1, "Traslado urgente retail", (day(21), day(25)), RequestState::New,
            ("Santiago", "Región de Valparaíso"), (12_000.0, 25.0)),
        request(2, "Carga refrigerada alimentos", (day(22), day(28)), RequestState::New,
            ("Osorno", "Región de Atacama"), (26_000.0, 50.0)),
        request(3, "Despacho cadena logística", (day(22), day(24)), RequestState::InProgress,
            ("Coquimbo", "Región de Coquimbo"), (8_000.0, 18.0)),
        request(4, "Traslado interregional minería", (day(23), day(30)), RequestState::Completed,
            ("Santiago", "Región de Antofagasta"), (30_000.0, 55.0)),
        request(5, "Solicitud interna centros de distribución", (day(24), day(27)), RequestState::InProgress,
            ("Osorno", "Región de Los Lagos"), (6_000.0, 12.0)),
    ]
}

#[allow(clippy::too_many_arguments)]
fn demo_trip(
    id: u64,
    driver_id: u64,
    state: TripState,
    (origin, destination): (&str, &str),
    (distance_km, duration_hours): (f64, f64),
    (weight_kg, volume_m3): (f64, f64),
    truck_class: TruckClass,
    now: DateTime<Utc>,
) -> Trip {
    Trip {
        id,
        driver_id: Some(driver_id),
        origin: origin.to_string(),
        destination: destination.to_string(),
        departure_date: now.date_naive(),
        return_date: None,
        state,
        distance_km,
        duration_hours,
        weight_kg,
        volume_m3,
        trucks_required: 1,
        truck_class,
        quote_id: None,
        request_id: None,
        started_at: Some(now),
        completed_at: None,
        cancelled_at: None,
        cancel_reason: None,
        quoted_cost: None,
    }
}

/// Sample fleet used when `SEED_DEMO_DATA` is set and the store is empty.
/// Drivers with an open sample trip start out Busy.
pub fn demo_fleet(now: DateTime<Utc>) -> Fleet {
    let trips = vec![
        demo_trip(1, 1, TripState::InProgress, ("Osorno", "Región Metropolitana de Santiago"),
            (920.0, 12.0), (18_000.0, 40.0), TruckClass::Gc, now),
        demo_trip(2, 5, TripState::Pending, ("Santiago", "Región de Coquimbo"),
            (470.0, 6.0), (8_000.0, 20.0), TruckClass::Mc, now),
    ];

    let mut drivers = demo_drivers();
    for driver in &mut drivers {
        if trips.iter().any(|trip| trip.driver_id == Some(driver.id)) {
            driver.state = DriverState::Busy;
        }
    }

    Fleet {
        drivers,
        trips,
        requests: demo_requests(),
        quotes: Vec::new(),
        calendar_events: Vec::new(),
    }
}
