use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};

use crate::config::Limits;
use crate::engine::route::round1;
use crate::engine::validation::{bounded, required_text, REQUIRED_FIELD};
use crate::error::{AppError, ValidationErrors};
use crate::models::fleet::next_id;
use crate::models::trip::{Trip, TripInput, TripLedger, TripPatch, TripProgress, TripState};
use crate::models::truck::TruckClass;

/// Per-km tariffs of the trip ledger.
struct Tariff {
    base_km: f64,
    fuel_km: f64,
    toll_km: f64,
    maintenance_km: f64,
}

const TARIFF_GC: Tariff = Tariff {
    base_km: 550.0,
    fuel_km: 450.0,
    toll_km: 120.0,
    maintenance_km: 180.0,
};

const TARIFF_MC: Tariff = Tariff {
    base_km: 380.0,
    fuel_km: 280.0,
    toll_km: 80.0,
    maintenance_km: 120.0,
};

const MARGIN_RATE: f64 = 0.18;
const TAX_RATE: f64 = 0.19;

struct ValidTrip {
    driver_id: u64,
    origin: String,
    destination: String,
    departure_date: NaiveDate,
    return_date: Option<NaiveDate>,
    distance_km: f64,
    duration_hours: f64,
    weight_kg: f64,
    volume_m3: f64,
    trucks_required: u32,
    truck_class: TruckClass,
}

fn validate(limits: &Limits, input: &TripInput, today: NaiveDate) -> Result<ValidTrip, AppError> {
    let mut errors = ValidationErrors::new();

    let driver_id = match input.driver_id {
        None => {
            errors.add("driver_id", REQUIRED_FIELD);
            None
        }
        Some(id) => match u64::try_from(id) {
            Ok(id) => Some(id),
            Err(_) => {
                errors.add("driver_id", "must be a non-negative id");
                None
            }
        },
    };

    let origin = required_text(&mut errors, "origin", input.origin.as_deref());
    let destination = required_text(&mut errors, "destination", input.destination.as_deref());

    let distance_km = round1(bounded(&mut errors, "distance_km", input.distance_km, limits.distance_km, 0.0, "km"));
    let duration_hours = round1(bounded(
        &mut errors,
        "duration_hours",
        input.duration_hours,
        limits.duration_hours,
        1.0,
        "hours",
    ));
    let weight_kg = bounded(&mut errors, "weight_kg", input.weight_kg, limits.weight_kg, 0.0, "kg").round();
    let volume_m3 = round1(bounded(&mut errors, "volume_m3", input.volume_m3, limits.volume_m3, 0.0, "m3"));
    let (min_trucks, max_trucks) = limits.trucks;
    let trucks_required = bounded(
        &mut errors,
        "trucks_required",
        input.trucks_required,
        (f64::from(min_trucks), f64::from(max_trucks)),
        f64::from(min_trucks),
        "trucks",
    )
    .round() as u32;

    let departure_date = input.departure_date.unwrap_or(today);
    if let Some(return_date) = input.return_date {
        if return_date < departure_date {
            errors.add("return_date", "must not be before the departure date");
        }
    }

    if !errors.is_empty() {
        warn!(%errors, "trip validation failed");
        return Err(AppError::Validation(errors));
    }

    match (driver_id, origin, destination) {
        (Some(driver_id), Some(origin), Some(destination)) => Ok(ValidTrip {
            driver_id,
            origin,
            destination,
            departure_date,
            return_date: input.return_date,
            distance_km,
            duration_hours,
            weight_kg,
            volume_m3,
            trucks_required,
            truck_class: TruckClass::parse_or_default(input.truck_class.as_deref()),
        }),
        _ => Err(AppError::Internal("trip validation lost a field".to_string())),
    }
}

/// Registers a trip as Pending with the next dense id, stamped `now`.
pub fn create(
    limits: &Limits,
    input: &TripInput,
    existing: &[Trip],
    now: DateTime<Utc>,
) -> Result<Trip, AppError> {
    let valid = validate(limits, input, now.date_naive())?;
    let id = next_id(existing.iter().map(|trip| trip.id));

    info!(trip_id = id, driver_id = valid.driver_id, "trip created");

    Ok(Trip {
        id,
        driver_id: Some(valid.driver_id),
        origin: valid.origin,
        destination: valid.destination,
        departure_date: valid.departure_date,
        return_date: valid.return_date,
        state: TripState::Pending,
        distance_km: valid.distance_km,
        duration_hours: valid.duration_hours,
        weight_kg: valid.weight_kg,
        volume_m3: valid.volume_m3,
        trucks_required: valid.trucks_required,
        truck_class: valid.truck_class,
        quote_id: None,
        request_id: input.request_id,
        started_at: Some(now),
        completed_at: None,
        cancelled_at: None,
        cancel_reason: None,
        quoted_cost: None,
    })
}

pub fn update(
    limits: &Limits,
    id: u64,
    patch: &TripPatch,
    trips: &[Trip],
) -> Result<Trip, AppError> {
    let existing = trips
        .iter()
        .find(|trip| trip.id == id)
        .ok_or_else(|| AppError::NotFound(format!("trip {id} not found")))?;

    let merged = TripInput {
        driver_id: patch.driver_id.or(existing.driver_id.map(|id| id as i64)),
        origin: patch.origin.clone().or_else(|| Some(existing.origin.clone())),
        destination: patch
            .destination
            .clone()
            .or_else(|| Some(existing.destination.clone())),
        departure_date: patch.departure_date.or(Some(existing.departure_date)),
        return_date: patch.return_date.or(existing.return_date),
        distance_km: patch.distance_km.or(non_zero(existing.distance_km)),
        duration_hours: patch.duration_hours.or(Some(existing.duration_hours)),
        weight_kg: patch.weight_kg.or(non_zero(existing.weight_kg)),
        volume_m3: patch.volume_m3.or(non_zero(existing.volume_m3)),
        trucks_required: patch
            .trucks_required
            .or(Some(f64::from(existing.trucks_required))),
        truck_class: patch
            .truck_class
            .clone()
            .or_else(|| Some(existing.truck_class.code().to_string())),
        request_id: existing.request_id,
    };
    let valid = validate(limits, &merged, existing.departure_date)?;

    info!(trip_id = id, "trip updated");

    Ok(Trip {
        driver_id: Some(valid.driver_id),
        origin: valid.origin,
        destination: valid.destination,
        departure_date: valid.departure_date,
        return_date: valid.return_date,
        distance_km: valid.distance_km,
        duration_hours: valid.duration_hours,
        weight_kg: valid.weight_kg,
        volume_m3: valid.volume_m3,
        trucks_required: valid.trucks_required,
        truck_class: valid.truck_class,
        ..existing.clone()
    })
}

// Zero means "not declared" on stored trips; it must not be re-validated
// against the lower bound.
fn non_zero(value: f64) -> Option<f64> {
    (value != 0.0).then_some(value)
}

fn invalid_transition(trip: &Trip, target: TripState) -> AppError {
    AppError::Conflict(format!(
        "trip {} cannot move from {:?} to {:?}",
        trip.id, trip.state, target
    ))
}

pub fn start_trip(trip: &Trip, now: DateTime<Utc>) -> Result<Trip, AppError> {
    if trip.state != TripState::Pending && trip.state != TripState::InProgress {
        return Err(invalid_transition(trip, TripState::InProgress));
    }
    info!(trip_id = trip.id, "trip started");
    Ok(Trip {
        state: TripState::InProgress,
        started_at: trip.started_at.or(Some(now)),
        ..trip.clone()
    })
}

pub fn complete_trip(trip: &Trip, now: DateTime<Utc>) -> Result<Trip, AppError> {
    if trip.state.is_terminal() {
        return Err(invalid_transition(trip, TripState::Completed));
    }
    info!(trip_id = trip.id, "trip completed");
    Ok(Trip {
        state: TripState::Completed,
        completed_at: Some(now),
        ..trip.clone()
    })
}

pub fn cancel_trip(trip: &Trip, reason: &str, now: DateTime<Utc>) -> Result<Trip, AppError> {
    if trip.state.is_terminal() {
        return Err(invalid_transition(trip, TripState::Cancelled));
    }
    info!(trip_id = trip.id, reason, "trip cancelled");
    Ok(Trip {
        state: TripState::Cancelled,
        cancelled_at: Some(now),
        cancel_reason: Some(reason.to_string()),
        ..trip.clone()
    })
}

/// Per-km ledger cost of a trip, used for financial reporting. Quotes are
/// priced by `engine::cost::estimate_quote_cost` instead.
pub fn calculate_cost(trip: &Trip) -> TripLedger {
    let tariff = match trip.truck_class {
        TruckClass::Gc => &TARIFF_GC,
        TruckClass::Mc => &TARIFF_MC,
    };
    let distance = trip.distance_km.max(0.0);
    let trucks = trip.trucks_required.max(1);
    let scale = distance * f64::from(trucks);

    let base = (tariff.base_km * scale).round() as u64;
    let fuel = (tariff.fuel_km * scale).round() as u64;
    let tolls = (tariff.toll_km * scale).round() as u64;
    let maintenance = (tariff.maintenance_km * scale).round() as u64;

    let subtotal = base + fuel + tolls + maintenance;
    let margin = (subtotal as f64 * MARGIN_RATE).round() as u64;
    let with_margin = subtotal + margin;
    let tax = (with_margin as f64 * TAX_RATE).round() as u64;

    TripLedger {
        base,
        fuel,
        tolls,
        maintenance,
        subtotal,
        margin,
        tax,
        total: with_margin + tax,
        distance_km: distance,
        truck_class: trip.truck_class,
        trucks,
    }
}

/// Live progress estimate from the start stamp and the average speed.
pub fn progress(trip: &Trip, now: DateTime<Utc>) -> TripProgress {
    let total_hours = trip.duration_hours;
    let total_km = trip.distance_km;

    let Some(started_at) = trip.started_at.filter(|_| total_hours > 0.0 && total_km > 0.0) else {
        return TripProgress {
            fraction: 0.0,
            average_speed_kmh: 0.0,
            distance_done_km: 0.0,
            distance_left_km: total_km.max(0.0),
            hours_elapsed: 0.0,
            hours_left: total_hours.max(0.0),
        };
    };

    let elapsed_hours = ((now - started_at).num_milliseconds().max(0) as f64) / 3_600_000.0;
    let capped_hours = elapsed_hours.min(total_hours);
    let average_speed = total_km / total_hours;
    let done_km = (average_speed * capped_hours).min(total_km);

    TripProgress {
        fraction: capped_hours / total_hours,
        average_speed_kmh: round1(average_speed),
        distance_done_km: done_km.floor(),
        distance_left_km: (total_km - done_km).max(0.0).floor(),
        hours_elapsed: (capped_hours * 10.0).floor() / 10.0,
        hours_left: ((total_hours - capped_hours).max(0.0) * 10.0).floor() / 10.0,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn now() -> DateTime<Utc> {
        "2025-11-20T08:00:00Z".parse().unwrap()
    }

    fn valid_input() -> TripInput {
        TripInput {
            driver_id: Some(3),
            origin: Some("Santiago".to_string()),
            destination: Some("Región de Valparaíso".to_string()),
            distance_km: Some(460.04),
            duration_hours: Some(5.75),
            weight_kg: Some(12_000.4),
            volume_m3: Some(25.0),
            trucks_required: Some(1.0),
            truck_class: Some("mc".to_string()),
            ..TripInput::default()
        }
    }

    #[test]
    fn create_defaults_and_rounds() {
        let trip = create(&Limits::default(), &valid_input(), &[], now()).unwrap();
        assert_eq!(trip.id, 1);
        assert_eq!(trip.state, TripState::Pending);
        assert_eq!(trip.departure_date, now().date_naive());
        assert_eq!(trip.started_at, Some(now()));
        assert_eq!(trip.distance_km, 460.0);
        assert_eq!(trip.duration_hours, 5.8);
        assert_eq!(trip.weight_kg, 12_000.0);
        assert_eq!(trip.truck_class, TruckClass::Mc);
    }

    #[test]
    fn absent_optionals_take_defaults() {
        let input = TripInput {
            driver_id: Some(0),
            origin: Some("Osorno".to_string()),
            destination: Some("Región de Los Lagos".to_string()),
            truck_class: Some("HUGE".to_string()),
            ..TripInput::default()
        };
        let trip = create(&Limits::default(), &input, &[], now()).unwrap();
        assert_eq!(trip.driver_id, Some(0));
        assert_eq!(trip.distance_km, 0.0);
        assert_eq!(trip.duration_hours, 1.0);
        assert_eq!(trip.trucks_required, 1);
        assert_eq!(trip.truck_class, TruckClass::Gc);
    }

    #[test]
    fn out_of_range_values_fail() {
        let input = TripInput {
            driver_id: Some(-1),
            distance_km: Some(9_000.0),
            trucks_required: Some(11.0),
            origin: None,
            ..valid_input()
        };
        let Err(AppError::Validation(errors)) = create(&Limits::default(), &input, &[], now()) else {
            panic!("expected validation error");
        };
        assert!(errors.has("driver_id"));
        assert!(errors.has("distance_km"));
        assert!(errors.has("trucks_required"));
        assert!(errors.has("origin"));
    }

    #[test]
    fn update_merges_and_keeps_state() {
        let trip = create(&Limits::default(), &valid_input(), &[], now()).unwrap();
        let trips = vec![start_trip(&trip, now()).unwrap()];
        let patch = TripPatch {
            destination: Some("Región de Coquimbo".to_string()),
            ..TripPatch::default()
        };
        let updated = update(&Limits::default(), 1, &patch, &trips).unwrap();
        assert_eq!(updated.destination, "Región de Coquimbo");
        assert_eq!(updated.state, TripState::InProgress);
        assert_eq!(updated.distance_km, 460.0);

        assert!(matches!(
            update(&Limits::default(), 2, &patch, &trips),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn transitions_are_monotonic() {
        let trip = create(&Limits::default(), &valid_input(), &[], now()).unwrap();
        let started = start_trip(&trip, now()).unwrap();
        let done = complete_trip(&started, now()).unwrap();
        assert_eq!(done.state, TripState::Completed);
        assert!(done.completed_at.is_some());
        assert!(start_trip(&done, now()).is_err());
        assert!(cancel_trip(&done, "late", now()).is_err());

        let cancelled = cancel_trip(&trip, "client withdrew", now()).unwrap();
        assert_eq!(cancelled.cancel_reason.as_deref(), Some("client withdrew"));
        assert!(complete_trip(&cancelled, now()).is_err());
    }

    #[test]
    fn ledger_applies_margin_then_tax() {
        let mut trip = create(&Limits::default(), &valid_input(), &[], now()).unwrap();
        trip.truck_class = TruckClass::Gc;
        trip.distance_km = 100.0;
        trip.trucks_required = 2;
        let ledger = calculate_cost(&trip);
        assert_eq!(ledger.base, 110_000);
        assert_eq!(ledger.fuel, 90_000);
        assert_eq!(ledger.tolls, 24_000);
        assert_eq!(ledger.maintenance, 36_000);
        assert_eq!(ledger.subtotal, 260_000);
        assert_eq!(ledger.margin, 46_800);
        assert_eq!(ledger.tax, 58_292);
        assert_eq!(ledger.total, 365_092);
    }

    #[test]
    fn progress_is_clamped_to_trip_totals() {
        let mut trip = create(&Limits::default(), &valid_input(), &[], now()).unwrap();
        trip.distance_km = 400.0;
        trip.duration_hours = 5.0;

        let halfway = progress(&trip, now() + Duration::minutes(150));
        assert_eq!(halfway.fraction, 0.5);
        assert_eq!(halfway.distance_done_km, 200.0);
        assert_eq!(halfway.distance_left_km, 200.0);
        assert_eq!(halfway.average_speed_kmh, 80.0);

        let late = progress(&trip, now() + Duration::hours(30));
        assert_eq!(late.fraction, 1.0);
        assert_eq!(late.distance_left_km, 0.0);
        assert_eq!(late.hours_left, 0.0);
    }
}
