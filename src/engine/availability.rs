use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::calendar::CalendarEvent;
use crate::models::driver::{Driver, DriverState};
use crate::models::trip::Trip;

/// Inclusive date range; a missing end means a single day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> Self {
        Self {
            start,
            end: end.unwrap_or(start),
        }
    }

    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, None)
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

pub fn overlaps(
    start_a: NaiveDate,
    end_a: Option<NaiveDate>,
    start_b: NaiveDate,
    end_b: Option<NaiveDate>,
) -> bool {
    DateRange::new(start_a, end_a).overlaps(&DateRange::new(start_b, end_b))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilityReport {
    pub origin: String,
    pub total_origin: usize,
    pub available: usize,
    pub shortage: usize,
}

/// Commitments that should not count against a driver, e.g. the calendar
/// hold of the quote being evaluated.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exclusions {
    pub quote_id: Option<u64>,
    pub trip_id: Option<u64>,
}

/// True when a trip, calendar hold or legacy block of this driver overlaps
/// the range. Ignores the cached driver state.
pub fn has_conflict(
    driver: &Driver,
    range: &DateRange,
    trips: &[Trip],
    events: &[CalendarEvent],
    exclusions: Exclusions,
) -> bool {
    let trip_conflict = trips.iter().any(|trip| {
        trip.driver_id == Some(driver.id)
            && Some(trip.id) != exclusions.trip_id
            && !trip.state.is_terminal()
            && DateRange::new(trip.departure_date, trip.return_date).overlaps(range)
    });
    if trip_conflict {
        return true;
    }

    let event_conflict = events.iter().any(|event| {
        event.driver_id == Some(driver.id)
            && (exclusions.quote_id.is_none() || event.quote_id != exclusions.quote_id)
            && DateRange::new(event.date, event.return_date).overlaps(range)
    });
    if event_conflict {
        return true;
    }

    driver
        .blocks
        .iter()
        .any(|block| DateRange::day(block.date).overlaps(range))
}

/// Whether the driver can take work between `start` and `end`.
///
/// Without a start date every non-inactive driver counts as available, so
/// forms can list drivers before dates are picked.
pub fn is_available_for_range(
    driver: &Driver,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    trips: &[Trip],
    events: &[CalendarEvent],
) -> bool {
    is_available_excluding(driver, start, end, trips, events, Exclusions::default())
}

pub fn is_available_excluding(
    driver: &Driver,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    trips: &[Trip],
    events: &[CalendarEvent],
    exclusions: Exclusions,
) -> bool {
    if driver.state == DriverState::Inactive {
        return false;
    }
    let Some(start) = start else {
        return true;
    };

    !has_conflict(driver, &DateRange::new(start, end), trips, events, exclusions)
}

/// Advisory staffing check for an origin. A shortage never blocks approval.
#[allow(clippy::too_many_arguments)]
pub fn check_availability_by_origin(
    drivers: &[Driver],
    origin: &str,
    trucks_needed: u32,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    trips: &[Trip],
    events: &[CalendarEvent],
    exclusions: Exclusions,
) -> AvailabilityReport {
    let at_origin: Vec<&Driver> = drivers
        .iter()
        .filter(|driver| driver.origin_base == origin && driver.state != DriverState::Inactive)
        .collect();

    let available = at_origin
        .iter()
        .filter(|driver| is_available_excluding(driver, start, end, trips, events, exclusions))
        .count();

    AvailabilityReport {
        origin: origin.to_string(),
        total_origin: at_origin.len(),
        available,
        shortage: (trucks_needed as usize).saturating_sub(available),
    }
}

fn origin_rank(origin: &str) -> u32 {
    match origin {
        "Coquimbo" => 1,
        "Santiago" => 2,
        "Osorno" => 3,
        _ => 999,
    }
}

/// Stable presentation order: depot priority, then id.
pub fn compare_candidates(a: &Driver, b: &Driver) -> Ordering {
    origin_rank(&a.origin_base)
        .cmp(&origin_rank(&b.origin_base))
        .then(a.id.cmp(&b.id))
}

/// Drivers free for the range, optionally restricted to one depot, in
/// presentation order.
pub fn candidate_drivers<'a>(
    drivers: &'a [Driver],
    origin: Option<&str>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    trips: &[Trip],
    events: &[CalendarEvent],
) -> Vec<&'a Driver> {
    let mut candidates: Vec<&Driver> = drivers
        .iter()
        .filter(|driver| origin.is_none_or(|origin| driver.origin_base == origin))
        .filter(|driver| is_available_for_range(driver, start, end, trips, events))
        .collect();
    candidates.sort_by(|a, b| compare_candidates(a, b));
    candidates
}
