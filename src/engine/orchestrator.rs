//! Cross-record policy: every operation here touches more than one
//! collection and keeps the cached driver state in step with trips,
//! calendar holds and blocks.
//!
//! All functions mutate a working copy of the fleet. Callers discard the
//! copy when an error is returned, which makes each operation
//! all-or-nothing.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::FleetRules;
use crate::engine::availability::{has_conflict, DateRange, Exclusions};
use crate::engine::capacity::calculate_trucks;
use crate::engine::cost::estimate_quote_cost;
use crate::engine::route::round1;
use crate::engine::validation::{required_text, REQUIRED_FIELD};
use crate::engine::{drivers, requests, trips};
use crate::error::{AppError, ValidationErrors};
use crate::models::calendar::{
    CalendarEvent, CalendarEventDraft, CalendarEventKind, CalendarEventState,
};
use crate::models::driver::{DriverBlock, DriverState};
use crate::models::fleet::{next_id, Fleet};
use crate::models::quote::{Quote, QuoteDraft, QuoteState};
use crate::models::request::RequestState;
use crate::models::trip::{Trip, TripInput, TripPatch, TripState};
use crate::models::truck::TruckClass;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalOutcome {
    pub quote: Quote,
    pub trip: Trip,
    pub removed_events: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectionOutcome {
    pub quote: Quote,
    pub removed_events: usize,
    pub driver_released: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TripAction {
    Start,
    Complete,
    Cancel,
}

/// Cargo details carried by a legacy request reservation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reservation {
    pub driver_id: u64,
    pub date: NaiveDate,
    pub truck_class: Option<String>,
    pub weight_kg: Option<f64>,
    pub volume_m3: Option<f64>,
    pub trucks_count: Option<u32>,
}

/// True while the driver still has an unfinished trip, a calendar hold or
/// a legacy block anywhere on the calendar.
pub fn has_open_commitment(fleet: &Fleet, driver_id: u64) -> bool {
    let open_trip = fleet
        .trips
        .iter()
        .any(|trip| trip.driver_id == Some(driver_id) && !trip.state.is_terminal());
    let hold = fleet
        .calendar_events
        .iter()
        .any(|event| event.driver_id == Some(driver_id));
    let blocked = fleet
        .drivers
        .iter()
        .any(|driver| driver.id == driver_id && !driver.blocks.is_empty());

    open_trip || hold || blocked
}

/// Frees a Busy driver once nothing holds them any more. Returns the
/// resulting state, or `None` when the driver does not exist.
pub fn reconcile_driver(fleet: &mut Fleet, driver_id: u64) -> Option<DriverState> {
    let committed = has_open_commitment(fleet, driver_id);
    let driver = fleet.drivers.iter_mut().find(|driver| driver.id == driver_id)?;

    if driver.state == DriverState::Busy && !committed {
        *driver = drivers::mark_available(driver);
        info!(driver_id, "driver released");
    }
    Some(driver.state)
}

fn hold_driver(fleet: &mut Fleet, driver_id: u64) -> Result<(), AppError> {
    let driver = fleet.driver_mut(driver_id)?;
    if driver.state == DriverState::Inactive {
        return Err(AppError::Conflict(format!("driver {driver_id} is inactive")));
    }
    *driver = drivers::assign_trip(driver);
    Ok(())
}

struct PricedDraft {
    origin: String,
    destination: String,
    distance_km: f64,
    duration_hours: f64,
    truck_class: TruckClass,
    weight_kg: f64,
    volume_m3: f64,
    trucks_required: u32,
}

fn validate_draft(rules: &FleetRules, draft: &QuoteDraft) -> Result<PricedDraft, AppError> {
    let limits = &rules.limits;
    let mut errors = ValidationErrors::new();

    let origin = required_text(&mut errors, "origin", draft.origin.as_deref());
    let destination = required_text(&mut errors, "destination", draft.destination.as_deref());

    let mut required_in = |field: &'static str, value: Option<f64>, (min, max): (f64, f64), unit: &str| {
        match value {
            Some(number) if number.is_finite() && number >= min && number <= max => round1(number),
            Some(_) => {
                errors.add(field, format!("must be between {min} and {max} {unit}"));
                0.0
            }
            None => {
                errors.add(field, REQUIRED_FIELD);
                0.0
            }
        }
    };
    let distance_km = required_in("distance_km", draft.distance_km, limits.distance_km, "km");
    let duration_hours = required_in("duration_hours", draft.duration_hours, limits.duration_hours, "hours");

    let weight_kg = draft.weight_kg.unwrap_or(0.0);
    let volume_m3 = draft.volume_m3.unwrap_or(0.0);
    if !(weight_kg.is_finite() && weight_kg >= 0.0) {
        errors.add("weight_kg", "must be zero or more");
    }
    if !(volume_m3.is_finite() && volume_m3 >= 0.0) {
        errors.add("volume_m3", "must be zero or more");
    }

    let truck_class = match draft.truck_class.as_deref() {
        None => TruckClass::default(),
        Some(raw) => raw.parse::<TruckClass>().unwrap_or_else(|err| {
            warn!(error = %err, "quote truck class defaulted");
            TruckClass::default()
        }),
    };

    let (min_trucks, max_trucks) = limits.trucks;
    let trucks_required = match draft.trucks_required {
        Some(trucks) if (min_trucks..=max_trucks).contains(&trucks) => trucks,
        Some(_) => {
            errors.add(
                "trucks_required",
                format!("must be between {min_trucks} and {max_trucks}"),
            );
            min_trucks
        }
        None => {
            calculate_trucks(
                &rules.capacities,
                limits,
                truck_class.code(),
                weight_kg,
                volume_m3,
            )
            .trucks_required
        }
    };

    if let (Some(from), Some(to)) = (draft.event_date, draft.return_date) {
        if to < from {
            errors.add("return_date", "must not be before the event date");
        }
    }

    if !errors.is_empty() {
        warn!(%errors, "quote validation failed");
        return Err(AppError::Validation(errors));
    }

    let (Some(origin), Some(destination)) = (origin, destination) else {
        return Err(AppError::Internal("quote validation lost a field".to_string()));
    };

    Ok(PricedDraft {
        origin,
        destination,
        distance_km,
        duration_hours,
        truck_class,
        weight_kg,
        volume_m3,
        trucks_required,
    })
}

/// Prices a draft, stores it as a Pending quote and places the provisional
/// calendar hold. A quote with a driver holds that driver immediately.
pub fn generate_quote(
    fleet: &mut Fleet,
    rules: &FleetRules,
    draft: &QuoteDraft,
    event: Option<&CalendarEventDraft>,
    now: DateTime<Utc>,
) -> Result<Quote, AppError> {
    let priced = validate_draft(rules, draft)?;

    if let Some(event) = event {
        if event.return_date.is_some_and(|to| to < event.date) {
            let mut errors = ValidationErrors::new();
            errors.add("event.return_date", "must not be before the event date");
            return Err(AppError::Validation(errors));
        }
    }

    let cost = estimate_quote_cost(
        priced.distance_km,
        priced.duration_hours,
        priced.truck_class,
        priced.trucks_required,
        rules.toll_rule,
    );

    let quote = Quote {
        id: fleet.next_quote_id(),
        request_id: draft.request_id,
        origin: priced.origin,
        destination: priced.destination,
        distance_km: priced.distance_km,
        duration_hours: priced.duration_hours,
        truck_class: priced.truck_class,
        weight_kg: priced.weight_kg,
        volume_m3: priced.volume_m3,
        trucks_required: priced.trucks_required,
        cost_breakdown: cost,
        total_cost: cost.total,
        driver_id: draft.driver_id,
        event_date: draft.event_date.or(event.map(|event| event.date)),
        return_date: draft.return_date.or(event.and_then(|event| event.return_date)),
        state: QuoteState::Pending,
        created_at: now,
    };

    if let Some(request_id) = quote.request_id {
        let request = fleet.request_mut(request_id)?;
        *request = requests::start(request)?;
    }

    if let Some(driver_id) = quote.driver_id {
        hold_driver(fleet, driver_id)?;
    }

    match event {
        Some(event) => {
            let hold = CalendarEvent {
                id: fleet.next_calendar_event_id(),
                quote_id: Some(quote.id),
                request_id: quote.request_id,
                driver_id: event.driver_id.or(quote.driver_id),
                date: event.date,
                return_date: event.return_date,
                origin: quote.origin.clone(),
                destination: quote.destination.clone(),
                truck_class: quote.truck_class,
                description: event.description.clone().unwrap_or_else(|| {
                    format!("Quote #{}: {} to {}", quote.id, quote.origin, quote.destination)
                }),
                kind: CalendarEventKind::Quote,
                state: CalendarEventState::Pending,
            };
            if let Some(driver_id) = hold.driver_id.filter(|id| Some(*id) != quote.driver_id) {
                hold_driver(fleet, driver_id)?;
            }
            fleet.calendar_events.push(hold);
        }
        None => {
            if let (Some(_), Some(request_id)) = (quote.event_date, quote.request_id) {
                let latest_unlinked = fleet
                    .calendar_events
                    .iter_mut()
                    .filter(|event| event.request_id == Some(request_id) && event.quote_id.is_none())
                    .max_by_key(|event| event.id);
                if let Some(event) = latest_unlinked {
                    event.quote_id = Some(quote.id);
                    info!(quote_id = quote.id, event_id = event.id, "linked existing calendar hold");
                }
            }
        }
    }

    info!(
        quote_id = quote.id,
        total = quote.total_cost,
        trucks = quote.trucks_required,
        "quote generated"
    );
    fleet.quotes.push(quote.clone());
    Ok(quote)
}

fn pending_quote(fleet: &Fleet, quote_id: u64) -> Result<Quote, AppError> {
    let quote = fleet.quote(quote_id)?;
    if quote.state != QuoteState::Pending {
        return Err(AppError::Conflict(format!(
            "quote {quote_id} is already {:?}",
            quote.state
        )));
    }
    Ok(quote.clone())
}

/// Turns a pending quote into exactly one in-progress trip and drops the
/// provisional calendar holds the trip now replaces.
pub fn approve_quote(
    fleet: &mut Fleet,
    quote_id: u64,
    now: DateTime<Utc>,
) -> Result<ApprovalOutcome, AppError> {
    let quote = pending_quote(fleet, quote_id)?;
    if let Some(driver_id) = quote.driver_id {
        hold_driver(fleet, driver_id)?;
    }

    let linked_event = fleet
        .calendar_events
        .iter()
        .find(|event| event.quote_id == Some(quote_id))
        .cloned();

    let approved = fleet.quote_mut(quote_id)?;
    approved.state = QuoteState::Approved;
    let approved = approved.clone();

    let trip = Trip {
        id: next_id(fleet.trips.iter().map(|trip| trip.id)),
        driver_id: quote.driver_id,
        origin: quote.origin.clone(),
        destination: quote.destination.clone(),
        departure_date: linked_event
            .as_ref()
            .map(|event| event.date)
            .or(quote.event_date)
            .unwrap_or_else(|| now.date_naive()),
        return_date: linked_event
            .as_ref()
            .and_then(|event| event.return_date)
            .or(quote.return_date),
        state: TripState::InProgress,
        distance_km: quote.distance_km,
        duration_hours: quote.duration_hours,
        weight_kg: quote.weight_kg,
        volume_m3: quote.volume_m3,
        trucks_required: quote.trucks_required,
        truck_class: quote.truck_class,
        quote_id: Some(quote.id),
        request_id: quote.request_id,
        started_at: Some(now),
        completed_at: None,
        cancelled_at: None,
        cancel_reason: None,
        quoted_cost: Some(quote.cost_breakdown),
    };
    fleet.trips.push(trip.clone());

    if let Some(request_id) = quote.request_id {
        let request = fleet.request_mut(request_id)?;
        if request.state == RequestState::Rejected {
            warn!(request_id, quote_id, "approved quote for a rejected request");
        } else {
            *request = requests::complete(request)?;
        }
    }

    let before = fleet.calendar_events.len();
    fleet
        .calendar_events
        .retain(|event| event.quote_id != Some(quote_id));
    let removed_events = before - fleet.calendar_events.len();

    info!(quote_id, trip_id = trip.id, removed_events, "quote approved");

    Ok(ApprovalOutcome {
        quote: approved,
        trip,
        removed_events,
    })
}

/// Rejects a pending quote, removes its calendar holds and undoes the
/// optimistic driver hold when nothing else overlaps the quoted dates.
pub fn reject_quote(fleet: &mut Fleet, quote_id: u64) -> Result<RejectionOutcome, AppError> {
    let quote = pending_quote(fleet, quote_id)?;

    let held_drivers: Vec<u64> = fleet
        .calendar_events
        .iter()
        .filter(|event| event.quote_id == Some(quote_id))
        .filter_map(|event| event.driver_id)
        .chain(quote.driver_id)
        .collect();

    let rejected = fleet.quote_mut(quote_id)?;
    rejected.state = QuoteState::Rejected;
    let rejected = rejected.clone();

    let before = fleet.calendar_events.len();
    fleet
        .calendar_events
        .retain(|event| event.quote_id != Some(quote_id));
    let removed_events = before - fleet.calendar_events.len();

    let mut driver_released = false;
    for driver_id in held_drivers {
        let still_committed = match quote.event_date {
            Some(start) => {
                let range = DateRange::new(start, quote.return_date);
                let driver = fleet.driver(driver_id)?;
                has_conflict(
                    driver,
                    &range,
                    &fleet.trips,
                    &fleet.calendar_events,
                    Exclusions::default(),
                )
            }
            None => has_open_commitment(fleet, driver_id),
        };

        let driver = fleet.driver_mut(driver_id)?;
        if driver.state == DriverState::Busy && !still_committed {
            *driver = drivers::mark_available(driver);
            driver_released = true;
        }
    }

    info!(quote_id, removed_events, driver_released, "quote rejected");

    Ok(RejectionOutcome {
        quote: rejected,
        removed_events,
        driver_released,
    })
}

/// Direct trip registration. The referenced driver must exist and is held
/// while the trip is open.
pub fn register_trip(
    fleet: &mut Fleet,
    rules: &FleetRules,
    input: &TripInput,
    now: DateTime<Utc>,
) -> Result<Trip, AppError> {
    let trip = trips::create(&rules.limits, input, &fleet.trips, now)?;
    if let Some(driver_id) = trip.driver_id {
        hold_driver(fleet, driver_id)?;
    }
    if let Some(request_id) = trip.request_id {
        let request = fleet.request_mut(request_id)?;
        *request = requests::start(request)?;
    }
    fleet.trips.push(trip.clone());
    Ok(trip)
}

/// Quick assignment from the driver list: the trip starts immediately.
pub fn quick_assign(
    fleet: &mut Fleet,
    rules: &FleetRules,
    driver_id: u64,
    input: &TripInput,
    now: DateTime<Utc>,
) -> Result<Trip, AppError> {
    let input = TripInput {
        driver_id: Some(driver_id as i64),
        ..input.clone()
    };
    let trip = register_trip(fleet, rules, &input, now)?;
    let started = trips::start_trip(&trip, now)?;
    *fleet.trip_mut(trip.id)? = started.clone();
    Ok(started)
}

pub fn update_trip(
    fleet: &mut Fleet,
    rules: &FleetRules,
    trip_id: u64,
    patch: &TripPatch,
) -> Result<Trip, AppError> {
    let updated = trips::update(&rules.limits, trip_id, patch, &fleet.trips)?;
    let previous_driver = fleet.trip(trip_id)?.driver_id;
    *fleet.trip_mut(trip_id)? = updated.clone();

    if updated.driver_id != previous_driver {
        if let Some(driver_id) = updated.driver_id.filter(|_| !updated.state.is_terminal()) {
            hold_driver(fleet, driver_id)?;
        }
        if let Some(driver_id) = previous_driver {
            reconcile_driver(fleet, driver_id);
        }
    }
    Ok(updated)
}

pub fn transition_trip(
    fleet: &mut Fleet,
    trip_id: u64,
    action: TripAction,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Trip, AppError> {
    let trip = fleet.trip(trip_id)?;
    let next = match action {
        TripAction::Start => trips::start_trip(trip, now)?,
        TripAction::Complete => trips::complete_trip(trip, now)?,
        TripAction::Cancel => trips::cancel_trip(trip, reason.unwrap_or_default(), now)?,
    };
    *fleet.trip_mut(trip_id)? = next.clone();

    if next.state.is_terminal() {
        if let Some(driver_id) = next.driver_id {
            reconcile_driver(fleet, driver_id);
        }
    }
    Ok(next)
}

/// Removes a trip outright and frees its driver if nothing else holds them.
pub fn delete_trip(fleet: &mut Fleet, trip_id: u64) -> Result<Trip, AppError> {
    let trip = fleet.trip(trip_id)?.clone();
    fleet.trips.retain(|candidate| candidate.id != trip_id);
    if let Some(driver_id) = trip.driver_id {
        reconcile_driver(fleet, driver_id);
    }
    info!(trip_id, "trip deleted");
    Ok(trip)
}

/// Legacy reservation: blocks the driver for one day on behalf of a
/// request and moves the request forward.
pub fn assign_request(
    fleet: &mut Fleet,
    request_id: u64,
    reservation: &Reservation,
) -> Result<(), AppError> {
    let request = fleet.request_mut(request_id)?;
    *request = requests::start(request)?;

    let driver = fleet.driver_mut(reservation.driver_id)?;
    if driver.state == DriverState::Inactive {
        return Err(AppError::Conflict(format!(
            "driver {} is inactive",
            reservation.driver_id
        )));
    }
    let block = DriverBlock {
        date: reservation.date,
        reason: format!("Request {request_id}"),
        truck_class: reservation
            .truck_class
            .as_deref()
            .map(|raw| TruckClass::parse_or_default(Some(raw))),
        weight_kg: reservation.weight_kg,
        volume_m3: reservation.volume_m3,
        trucks_count: reservation.trucks_count,
    };
    *driver = drivers::add_block(driver, block);
    Ok(())
}

pub fn release_block(fleet: &mut Fleet, driver_id: u64, date: NaiveDate) -> Result<DriverState, AppError> {
    let driver = fleet.driver_mut(driver_id)?;
    *driver = drivers::remove_block(driver, date);
    reconcile_driver(fleet, driver_id)
        .ok_or_else(|| AppError::NotFound(format!("driver {driver_id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::driver::{Driver, LicenseClass};
    use crate::models::request::Request;

    fn now() -> DateTime<Utc> {
        "2025-11-18T12:00:00Z".parse().unwrap()
    }

    fn date(raw: &str) -> NaiveDate {
        raw.parse().unwrap()
    }

    fn driver(id: u64, state: DriverState) -> Driver {
        Driver {
            id,
            name: format!("Conductor {id}"),
            license: LicenseClass::A5,
            phone: "+56 9 8100 0001".to_string(),
            origin_base: "Santiago".to_string(),
            truck_class: TruckClass::Gc,
            state,
            blocks: Vec::new(),
        }
    }

    fn fleet() -> Fleet {
        Fleet {
            drivers: vec![driver(1, DriverState::Available), driver(2, DriverState::Available)],
            requests: vec![Request {
                id: 1,
                title: "Traslado urgente retail".to_string(),
                origin: "Santiago".to_string(),
                destination: "Región de Valparaíso".to_string(),
                requested_date: Some(date("2025-11-21")),
                return_date: Some(date("2025-11-25")),
                weight_kg: Some(12_000.0),
                volume_m3: Some(25.0),
                state: RequestState::New,
            }],
            ..Fleet::default()
        }
    }

    fn draft(driver_id: Option<u64>, request_id: Option<u64>) -> QuoteDraft {
        QuoteDraft {
            request_id,
            origin: Some("Santiago".to_string()),
            destination: Some("Región de Valparaíso".to_string()),
            distance_km: Some(460.0),
            duration_hours: Some(5.8),
            truck_class: Some("GC".to_string()),
            weight_kg: Some(12_000.0),
            volume_m3: Some(25.0),
            trucks_required: None,
            driver_id,
            event_date: Some(date("2025-11-21")),
            return_date: Some(date("2025-11-25")),
        }
    }

    fn hold() -> CalendarEventDraft {
        CalendarEventDraft {
            date: date("2025-11-21"),
            return_date: Some(date("2025-11-25")),
            description: None,
            driver_id: None,
        }
    }

    #[test]
    fn generate_prices_holds_and_links_event() {
        let mut fleet = fleet();
        let quote = generate_quote(
            &mut fleet,
            &FleetRules::default(),
            &draft(Some(1), Some(1)),
            Some(&hold()),
            now(),
        )
        .unwrap();

        assert_eq!(quote.id, 1);
        assert_eq!(quote.state, QuoteState::Pending);
        assert_eq!(quote.trucks_required, 1);
        assert_eq!(quote.total_cost, 555_000);
        assert_eq!(fleet.driver(1).unwrap().state, DriverState::Busy);
        assert_eq!(fleet.request(1).unwrap().state, RequestState::InProgress);
        assert_eq!(fleet.calendar_events.len(), 1);
        assert_eq!(fleet.calendar_events[0].quote_id, Some(1));
        assert_eq!(fleet.calendar_events[0].driver_id, Some(1));
    }

    #[test]
    fn generate_links_latest_unlinked_request_event() {
        let mut fleet = fleet();
        for id in [1, 2] {
            fleet.calendar_events.push(CalendarEvent {
                id,
                quote_id: None,
                request_id: Some(1),
                driver_id: None,
                date: date("2025-11-21"),
                return_date: None,
                origin: "Santiago".to_string(),
                destination: "Región de Valparaíso".to_string(),
                truck_class: TruckClass::Gc,
                description: String::new(),
                kind: CalendarEventKind::Quote,
                state: CalendarEventState::Pending,
            });
        }

        let quote = generate_quote(&mut fleet, &FleetRules::default(), &draft(None, Some(1)), None, now()).unwrap();
        assert_eq!(fleet.calendar_events[0].quote_id, None);
        assert_eq!(fleet.calendar_events[1].quote_id, Some(quote.id));
    }

    #[test]
    fn generate_rejects_missing_route_numbers() {
        let mut fleet = fleet();
        let bad = QuoteDraft {
            distance_km: None,
            duration_hours: Some(100.0),
            ..draft(None, None)
        };
        let Err(AppError::Validation(errors)) =
            generate_quote(&mut fleet, &FleetRules::default(), &bad, None, now())
        else {
            panic!("expected validation error");
        };
        assert!(errors.has("distance_km"));
        assert!(errors.has("duration_hours"));
    }

    #[test]
    fn generate_for_unknown_driver_is_not_found() {
        let mut fleet = fleet();
        let err = generate_quote(&mut fleet, &FleetRules::default(), &draft(Some(99), None), None, now())
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn approval_creates_one_trip_and_cleans_calendar() {
        let mut fleet = fleet();
        let quote = generate_quote(
            &mut fleet,
            &FleetRules::default(),
            &draft(Some(1), Some(1)),
            Some(&hold()),
            now(),
        )
        .unwrap();

        let outcome = approve_quote(&mut fleet, quote.id, now()).unwrap();
        assert_eq!(outcome.quote.state, QuoteState::Approved);
        assert_eq!(outcome.removed_events, 1);
        assert_eq!(outcome.trip.state, TripState::InProgress);
        assert_eq!(outcome.trip.departure_date, date("2025-11-21"));
        assert_eq!(outcome.trip.return_date, Some(date("2025-11-25")));
        assert_eq!(outcome.trip.quote_id, Some(quote.id));
        assert_eq!(outcome.trip.quoted_cost.map(|cost| cost.total), Some(555_000));
        assert_eq!(fleet.trips.len(), 1);
        assert!(fleet.calendar_events.is_empty());
        assert_eq!(fleet.driver(1).unwrap().state, DriverState::Busy);
        assert_eq!(fleet.request(1).unwrap().state, RequestState::Completed);

        let again = approve_quote(&mut fleet, quote.id, now());
        assert!(matches!(again, Err(AppError::Conflict(_))));
        assert_eq!(fleet.trips.len(), 1);
    }

    #[test]
    fn approval_refuses_driver_deactivated_after_quoting() {
        let mut fleet = fleet();
        let quote = generate_quote(
            &mut fleet,
            &FleetRules::default(),
            &draft(Some(1), Some(1)),
            Some(&hold()),
            now(),
        )
        .unwrap();
        fleet.driver_mut(1).unwrap().state = DriverState::Inactive;

        let err = approve_quote(&mut fleet, quote.id, now()).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(fleet.driver(1).unwrap().state, DriverState::Inactive);
        assert_eq!(fleet.quote(quote.id).unwrap().state, QuoteState::Pending);
        assert!(fleet.trips.is_empty());
        assert_eq!(fleet.calendar_events.len(), 1);
    }

    #[test]
    fn approving_missing_quote_is_not_found() {
        let mut fleet = fleet();
        assert!(matches!(approve_quote(&mut fleet, 5, now()), Err(AppError::NotFound(_))));
    }

    #[test]
    fn rejection_removes_holds_and_frees_driver() {
        let mut fleet = fleet();
        let quote = generate_quote(
            &mut fleet,
            &FleetRules::default(),
            &draft(Some(1), None),
            Some(&hold()),
            now(),
        )
        .unwrap();

        let outcome = reject_quote(&mut fleet, quote.id).unwrap();
        assert_eq!(outcome.quote.state, QuoteState::Rejected);
        assert_eq!(outcome.removed_events, 1);
        assert!(outcome.driver_released);
        assert!(fleet
            .calendar_events
            .iter()
            .all(|event| event.quote_id != Some(quote.id)));
        assert_eq!(fleet.driver(1).unwrap().state, DriverState::Available);
    }

    #[test]
    fn rejection_keeps_driver_busy_with_overlapping_trip() {
        let mut fleet = fleet();
        let input = TripInput {
            driver_id: Some(1),
            origin: Some("Santiago".to_string()),
            destination: Some("Región de Coquimbo".to_string()),
            departure_date: Some(date("2025-11-24")),
            return_date: Some(date("2025-11-27")),
            ..TripInput::default()
        };
        register_trip(&mut fleet, &FleetRules::default(), &input, now()).unwrap();
        let quote = generate_quote(
            &mut fleet,
            &FleetRules::default(),
            &draft(Some(1), None),
            Some(&hold()),
            now(),
        )
        .unwrap();

        let outcome = reject_quote(&mut fleet, quote.id).unwrap();
        assert!(!outcome.driver_released);
        assert_eq!(fleet.driver(1).unwrap().state, DriverState::Busy);
    }

    #[test]
    fn deleting_last_trip_frees_driver() {
        let mut fleet = fleet();
        let input = TripInput {
            origin: Some("Osorno".to_string()),
            destination: Some("Región de Los Lagos".to_string()),
            ..TripInput::default()
        };
        let first = quick_assign(&mut fleet, &FleetRules::default(), 2, &input, now()).unwrap();
        let second = quick_assign(&mut fleet, &FleetRules::default(), 2, &input, now()).unwrap();
        assert_eq!(first.state, TripState::InProgress);

        delete_trip(&mut fleet, first.id).unwrap();
        assert_eq!(fleet.driver(2).unwrap().state, DriverState::Busy);
        delete_trip(&mut fleet, second.id).unwrap();
        assert_eq!(fleet.driver(2).unwrap().state, DriverState::Available);
    }

    #[test]
    fn completing_trip_reconciles_driver() {
        let mut fleet = fleet();
        let input = TripInput {
            origin: Some("Osorno".to_string()),
            destination: Some("Región de Los Lagos".to_string()),
            ..TripInput::default()
        };
        let trip = quick_assign(&mut fleet, &FleetRules::default(), 2, &input, now()).unwrap();
        transition_trip(&mut fleet, trip.id, TripAction::Complete, None, now()).unwrap();
        assert_eq!(fleet.driver(2).unwrap().state, DriverState::Available);
    }

    #[test]
    fn inactive_driver_cannot_be_assigned() {
        let mut fleet = fleet();
        fleet.drivers[0].state = DriverState::Inactive;
        let input = TripInput {
            origin: Some("Santiago".to_string()),
            destination: Some("Región del Maule".to_string()),
            ..TripInput::default()
        };
        let err = quick_assign(&mut fleet, &FleetRules::default(), 1, &input, now()).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn request_reservation_blocks_driver() {
        let mut fleet = fleet();
        let reservation = Reservation {
            driver_id: 2,
            date: date("2025-11-21"),
            truck_class: Some("gc".to_string()),
            weight_kg: Some(12_000.0),
            volume_m3: Some(25.0),
            trucks_count: Some(1),
        };
        assign_request(&mut fleet, 1, &reservation).unwrap();
        assert_eq!(fleet.request(1).unwrap().state, RequestState::InProgress);
        let driver = fleet.driver(2).unwrap();
        assert_eq!(driver.state, DriverState::Busy);
        assert_eq!(driver.blocks[0].reason, "Request 1");

        let state = release_block(&mut fleet, 2, date("2025-11-21")).unwrap();
        assert_eq!(state, DriverState::Available);
    }
}
