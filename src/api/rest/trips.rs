use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;

use crate::api::rest::Saved;
use crate::engine::orchestrator::{self, TripAction};
use crate::engine::trips;
use crate::error::AppError;
use crate::models::trip::{Trip, TripInput, TripLedger, TripPatch, TripProgress, TripState};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/trips", post(create_trip).get(list_trips))
        .route(
            "/trips/:id",
            get(get_trip).patch(update_trip).delete(delete_trip),
        )
        .route("/trips/:id/start", post(start_trip))
        .route("/trips/:id/complete", post(complete_trip))
        .route("/trips/:id/cancel", post(cancel_trip))
        .route("/trips/:id/cost", get(trip_cost))
        .route("/trips/:id/progress", get(trip_progress))
}

#[derive(Deserialize)]
pub struct TripFilter {
    pub state: Option<TripState>,
    pub driver_id: Option<u64>,
}

#[derive(Deserialize, Default)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

async fn create_trip(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TripInput>,
) -> Result<Saved<Trip>, AppError> {
    let rules = &state.config.rules;
    let committed = state
        .commit("trip.create", |fleet| {
            orchestrator::register_trip(fleet, rules, &payload, Utc::now())
        })
        .await?;

    state.publish("trip.created", &committed.value);
    Ok(Saved(committed))
}

async fn list_trips(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<TripFilter>,
) -> Json<Vec<Trip>> {
    let fleet = state.read().await;
    let trips = fleet
        .trips
        .iter()
        .filter(|trip| filter.state.is_none_or(|wanted| trip.state == wanted))
        .filter(|trip| filter.driver_id.is_none_or(|id| trip.driver_id == Some(id)))
        .cloned()
        .collect();
    Json(trips)
}

async fn get_trip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Trip>, AppError> {
    let fleet = state.read().await;
    Ok(Json(fleet.trip(id)?.clone()))
}

async fn update_trip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<TripPatch>,
) -> Result<Saved<Trip>, AppError> {
    let rules = &state.config.rules;
    let committed = state
        .commit("trip.update", |fleet| {
            orchestrator::update_trip(fleet, rules, id, &payload)
        })
        .await?;

    state.publish("trip.updated", &committed.value);
    Ok(Saved(committed))
}

async fn delete_trip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Saved<Trip>, AppError> {
    let committed = state
        .commit("trip.delete", |fleet| orchestrator::delete_trip(fleet, id))
        .await?;

    state.publish("trip.deleted", &committed.value);
    Ok(Saved(committed))
}

async fn transition(
    state: &AppState,
    id: u64,
    action: TripAction,
    reason: Option<String>,
) -> Result<Saved<Trip>, AppError> {
    let (operation, event) = match action {
        TripAction::Start => ("trip.start", "trip.started"),
        TripAction::Complete => ("trip.complete", "trip.completed"),
        TripAction::Cancel => ("trip.cancel", "trip.cancelled"),
    };
    let committed = state
        .commit(operation, |fleet| {
            orchestrator::transition_trip(fleet, id, action, reason.as_deref(), Utc::now())
        })
        .await?;

    state.publish(event, &committed.value);
    Ok(Saved(committed))
}

async fn start_trip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Saved<Trip>, AppError> {
    transition(&state, id, TripAction::Start, None).await
}

async fn complete_trip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Saved<Trip>, AppError> {
    transition(&state, id, TripAction::Complete, None).await
}

async fn cancel_trip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    payload: Option<Json<CancelRequest>>,
) -> Result<Saved<Trip>, AppError> {
    let reason = payload.and_then(|Json(body)| body.reason);
    transition(&state, id, TripAction::Cancel, reason).await
}

async fn trip_cost(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<TripLedger>, AppError> {
    let fleet = state.read().await;
    Ok(Json(trips::calculate_cost(fleet.trip(id)?)))
}

async fn trip_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<TripProgress>, AppError> {
    let fleet = state.read().await;
    Ok(Json(trips::progress(fleet.trip(id)?, Utc::now())))
}
