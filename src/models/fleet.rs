use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::calendar::CalendarEvent;
use crate::models::driver::Driver;
use crate::models::quote::Quote;
use crate::models::request::Request;
use crate::models::trip::Trip;

/// In-memory snapshot of every collection. Mutations work on a clone and
/// the clone replaces the snapshot only when the whole operation succeeds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Fleet {
    pub drivers: Vec<Driver>,
    pub trips: Vec<Trip>,
    pub requests: Vec<Request>,
    pub quotes: Vec<Quote>,
    pub calendar_events: Vec<CalendarEvent>,
}

/// Ids are dense per collection: one past the current maximum, or 1.
pub fn next_id(ids: impl Iterator<Item = u64>) -> u64 {
    ids.max().map_or(1, |max| max + 1)
}

impl Fleet {
    pub fn driver(&self, id: u64) -> Result<&Driver, AppError> {
        self.drivers
            .iter()
            .find(|driver| driver.id == id)
            .ok_or_else(|| AppError::NotFound(format!("driver {id} not found")))
    }

    pub fn driver_mut(&mut self, id: u64) -> Result<&mut Driver, AppError> {
        self.drivers
            .iter_mut()
            .find(|driver| driver.id == id)
            .ok_or_else(|| AppError::NotFound(format!("driver {id} not found")))
    }

    pub fn trip(&self, id: u64) -> Result<&Trip, AppError> {
        self.trips
            .iter()
            .find(|trip| trip.id == id)
            .ok_or_else(|| AppError::NotFound(format!("trip {id} not found")))
    }

    pub fn trip_mut(&mut self, id: u64) -> Result<&mut Trip, AppError> {
        self.trips
            .iter_mut()
            .find(|trip| trip.id == id)
            .ok_or_else(|| AppError::NotFound(format!("trip {id} not found")))
    }

    pub fn request(&self, id: u64) -> Result<&Request, AppError> {
        self.requests
            .iter()
            .find(|request| request.id == id)
            .ok_or_else(|| AppError::NotFound(format!("request {id} not found")))
    }

    pub fn request_mut(&mut self, id: u64) -> Result<&mut Request, AppError> {
        self.requests
            .iter_mut()
            .find(|request| request.id == id)
            .ok_or_else(|| AppError::NotFound(format!("request {id} not found")))
    }

    pub fn quote(&self, id: u64) -> Result<&Quote, AppError> {
        self.quotes
            .iter()
            .find(|quote| quote.id == id)
            .ok_or_else(|| AppError::NotFound(format!("quote {id} not found")))
    }

    pub fn quote_mut(&mut self, id: u64) -> Result<&mut Quote, AppError> {
        self.quotes
            .iter_mut()
            .find(|quote| quote.id == id)
            .ok_or_else(|| AppError::NotFound(format!("quote {id} not found")))
    }

    pub fn next_calendar_event_id(&self) -> u64 {
        next_id(self.calendar_events.iter().map(|event| event.id))
    }

    pub fn next_quote_id(&self) -> u64 {
        next_id(self.quotes.iter().map(|quote| quote.id))
    }
}
