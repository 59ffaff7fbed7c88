use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post};
use axum::Json;
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::rest::Saved;
use crate::engine::availability::is_available_for_range;
use crate::engine::{drivers, orchestrator};
use crate::error::AppError;
use crate::models::driver::{Driver, DriverBlock, DriverInput, DriverPatch, DriverState};
use crate::models::trip::{Trip, TripInput};
use crate::models::truck::TruckClass;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", post(create_driver).get(list_drivers))
        .route("/drivers/:id", get(get_driver).patch(update_driver))
        .route("/drivers/:id/availability", get(driver_availability))
        .route("/drivers/:id/blocks", post(add_block))
        .route("/drivers/:id/blocks/:date", delete(remove_block))
        .route("/drivers/:id/assign", post(quick_assign))
}

#[derive(Deserialize)]
pub struct DriverFilter {
    pub state: Option<DriverState>,
    pub origin: Option<String>,
}

#[derive(Deserialize)]
pub struct RangeQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub driver_id: u64,
    pub available: bool,
}

#[derive(Deserialize)]
pub struct BlockRequest {
    pub date: NaiveDate,
    pub reason: String,
    pub truck_class: Option<String>,
    pub weight_kg: Option<f64>,
    pub volume_m3: Option<f64>,
    pub trucks_count: Option<u32>,
}

async fn create_driver(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DriverInput>,
) -> Result<Saved<Driver>, AppError> {
    let limits = &state.config.rules.limits;
    let committed = state
        .commit("driver.create", |fleet| {
            let driver = drivers::create(limits, &payload, &fleet.drivers)?;
            fleet.drivers.push(driver.clone());
            Ok(driver)
        })
        .await?;

    state.publish("driver.created", &committed.value);
    Ok(Saved(committed))
}

async fn list_drivers(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<DriverFilter>,
) -> Json<Vec<Driver>> {
    let fleet = state.read().await;
    let drivers = fleet
        .drivers
        .iter()
        .filter(|driver| filter.state.is_none_or(|wanted| driver.state == wanted))
        .filter(|driver| {
            filter
                .origin
                .as_deref()
                .is_none_or(|origin| driver.origin_base == origin)
        })
        .cloned()
        .collect();
    Json(drivers)
}

async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Driver>, AppError> {
    let fleet = state.read().await;
    Ok(Json(fleet.driver(id)?.clone()))
}

async fn update_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<DriverPatch>,
) -> Result<Saved<Driver>, AppError> {
    let limits = &state.config.rules.limits;
    let committed = state
        .commit("driver.update", |fleet| {
            let updated = drivers::update(limits, id, &payload, &fleet.drivers)?;
            *fleet.driver_mut(id)? = updated.clone();
            Ok(updated)
        })
        .await?;

    state.publish("driver.updated", &committed.value);
    Ok(Saved(committed))
}

async fn driver_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let fleet = state.read().await;
    let driver = fleet.driver(id)?;
    let available = is_available_for_range(
        driver,
        range.start,
        range.end,
        &fleet.trips,
        &fleet.calendar_events,
    );
    Ok(Json(AvailabilityResponse {
        driver_id: id,
        available,
    }))
}

async fn add_block(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<BlockRequest>,
) -> Result<Saved<Driver>, AppError> {
    if payload.reason.trim().is_empty() {
        return Err(AppError::BadRequest("reason cannot be empty".to_string()));
    }

    let committed = state
        .commit("driver.block", |fleet| {
            let driver = fleet.driver_mut(id)?;
            let block = DriverBlock {
                date: payload.date,
                reason: payload.reason.trim().to_string(),
                truck_class: payload
                    .truck_class
                    .as_deref()
                    .map(|raw| TruckClass::parse_or_default(Some(raw))),
                weight_kg: payload.weight_kg,
                volume_m3: payload.volume_m3,
                trucks_count: payload.trucks_count,
            };
            *driver = drivers::add_block(driver, block);
            Ok(driver.clone())
        })
        .await?;

    state.publish("driver.blocked", &committed.value);
    Ok(Saved(committed))
}

async fn remove_block(
    State(state): State<Arc<AppState>>,
    Path((id, date)): Path<(u64, NaiveDate)>,
) -> Result<Saved<Driver>, AppError> {
    let committed = state
        .commit("driver.unblock", |fleet| {
            orchestrator::release_block(fleet, id, date)?;
            Ok(fleet.driver(id)?.clone())
        })
        .await?;

    state.publish("driver.unblocked", &committed.value);
    Ok(Saved(committed))
}

async fn quick_assign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<TripInput>,
) -> Result<Saved<Trip>, AppError> {
    let rules = &state.config.rules;
    let committed = state
        .commit("driver.assign", |fleet| {
            orchestrator::quick_assign(fleet, rules, id, &payload, Utc::now())
        })
        .await?;

    state.publish("trip.started", &committed.value);
    Ok(Saved(committed))
}
