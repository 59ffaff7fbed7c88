use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engine::availability::{
    candidate_drivers, check_availability_by_origin, AvailabilityReport, Exclusions,
};
use crate::engine::capacity::{calculate_trucks, check_load_fits, CapacityPlan, LoadFit};
use crate::engine::cost::estimate_quote_cost;
use crate::engine::route::{round1, RouteEstimate, RouteSource, Zone, DEPOTS, REGIONS};
use crate::engine::validation::bounded;
use crate::error::{AppError, ValidationErrors};
use crate::models::driver::Driver;
use crate::models::quote::CostBreakdown;
use crate::models::truck::TruckClass;
use crate::routing::resolve_route;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/planning/capacity", post(capacity))
        .route("/planning/load-fit", post(load_fit))
        .route("/planning/route", get(route))
        .route("/planning/cost", post(cost_preview))
        .route("/planning/availability", get(availability))
        .route("/planning/candidates", get(candidates))
        .route("/planning/depots", get(depots))
        .route("/planning/regions", get(regions))
}

#[derive(Deserialize)]
pub struct LoadRequest {
    pub truck_class: Option<String>,
    #[serde(default)]
    pub weight_kg: f64,
    #[serde(default)]
    pub volume_m3: f64,
}

#[derive(Deserialize)]
pub struct RouteQuery {
    pub origin: String,
    pub destination: String,
}

#[derive(Deserialize)]
pub struct CostRequest {
    pub distance_km: f64,
    pub duration_hours: f64,
    pub truck_class: Option<String>,
    pub trucks_required: Option<u32>,
}

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub origin: String,
    pub trucks: Option<u32>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub exclude_quote: Option<u64>,
}

#[derive(Deserialize)]
pub struct CandidateQuery {
    pub origin: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct Region {
    pub name: &'static str,
    pub zone: Zone,
}

async fn capacity(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoadRequest>,
) -> Json<CapacityPlan> {
    let rules = &state.config.rules;
    let class = payload.truck_class.as_deref().unwrap_or(TruckClass::default().code());
    Json(calculate_trucks(
        &rules.capacities,
        &rules.limits,
        class,
        payload.weight_kg,
        payload.volume_m3,
    ))
}

async fn load_fit(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoadRequest>,
) -> Result<Json<LoadFit>, AppError> {
    let class = match payload.truck_class.as_deref() {
        Some(raw) => raw.parse::<TruckClass>()?,
        None => TruckClass::default(),
    };
    Ok(Json(check_load_fits(
        &state.config.rules.capacities,
        class,
        payload.weight_kg,
        payload.volume_m3,
    )))
}

async fn route(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RouteQuery>,
) -> Json<RouteEstimate> {
    let estimate = resolve_route(
        state.routes.as_deref(),
        &state.config.rules.limits,
        &query.origin,
        &query.destination,
    )
    .await;

    let source = match estimate.source {
        RouteSource::Online => "online",
        RouteSource::Estimated => "estimated",
    };
    state
        .metrics
        .route_lookups_total
        .with_label_values(&[source])
        .inc();
    Json(estimate)
}

/// Price preview for the quote form. Same formula and bounds as quote
/// generation.
async fn cost_preview(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CostRequest>,
) -> Result<Json<CostBreakdown>, AppError> {
    let limits = &state.config.rules.limits;
    let mut errors = ValidationErrors::new();

    let distance_km = bounded(
        &mut errors,
        "distance_km",
        Some(payload.distance_km),
        limits.distance_km,
        0.0,
        "km",
    );
    let duration_hours = bounded(
        &mut errors,
        "duration_hours",
        Some(payload.duration_hours),
        limits.duration_hours,
        0.0,
        "hours",
    );
    let (min_trucks, max_trucks) = limits.trucks;
    let trucks_required = payload.trucks_required.unwrap_or(min_trucks);
    if !(min_trucks..=max_trucks).contains(&trucks_required) {
        errors.add(
            "trucks_required",
            format!("must be between {min_trucks} and {max_trucks}"),
        );
    }
    errors.into_result()?;

    let class = TruckClass::parse_or_default(payload.truck_class.as_deref());
    Ok(Json(estimate_quote_cost(
        round1(distance_km),
        round1(duration_hours),
        class,
        trucks_required,
        state.config.rules.toll_rule,
    )))
}

async fn availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Json<AvailabilityReport> {
    let fleet = state.read().await;
    Json(check_availability_by_origin(
        &fleet.drivers,
        &query.origin,
        query.trucks.unwrap_or(1),
        query.start,
        query.end,
        &fleet.trips,
        &fleet.calendar_events,
        Exclusions {
            quote_id: query.exclude_quote,
            trip_id: None,
        },
    ))
}

async fn candidates(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CandidateQuery>,
) -> Json<Vec<Driver>> {
    let fleet = state.read().await;
    let drivers = candidate_drivers(
        &fleet.drivers,
        query.origin.as_deref(),
        query.start,
        query.end,
        &fleet.trips,
        &fleet.calendar_events,
    )
    .into_iter()
    .cloned()
    .collect();
    Json(drivers)
}

async fn depots() -> Json<Vec<&'static str>> {
    Json(DEPOTS.to_vec())
}

async fn regions() -> Json<Vec<Region>> {
    Json(
        REGIONS
            .iter()
            .map(|(name, zone)| Region { name: *name, zone: *zone })
            .collect(),
    )
}
