use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;

use crate::api::rest::Saved;
use crate::engine::orchestrator::{self, Reservation};
use crate::engine::requests;
use crate::error::AppError;
use crate::models::request::{Request, RequestInput};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/requests", post(create_request).get(list_requests))
        .route("/requests/:id", get(get_request))
        .route("/requests/:id/assign", post(assign_request))
        .route("/requests/:id/complete", post(complete_request))
        .route("/requests/:id/reject", post(reject_request))
}

async fn create_request(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RequestInput>,
) -> Result<Saved<Request>, AppError> {
    let limits = &state.config.rules.limits;
    let committed = state
        .commit("request.create", |fleet| {
            let request = requests::create(limits, &payload, &fleet.requests)?;
            fleet.requests.push(request.clone());
            Ok(request)
        })
        .await?;

    state.publish("request.created", &committed.value);
    Ok(Saved(committed))
}

async fn list_requests(State(state): State<Arc<AppState>>) -> Json<Vec<Request>> {
    Json(state.read().await.requests.clone())
}

async fn get_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Request>, AppError> {
    let fleet = state.read().await;
    Ok(Json(fleet.request(id)?.clone()))
}

async fn assign_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<Reservation>,
) -> Result<Saved<Request>, AppError> {
    let committed = state
        .commit("request.assign", |fleet| {
            orchestrator::assign_request(fleet, id, &payload)?;
            Ok(fleet.request(id)?.clone())
        })
        .await?;

    state.publish("request.assigned", &committed.value);
    Ok(Saved(committed))
}

async fn complete_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Saved<Request>, AppError> {
    let committed = state
        .commit("request.complete", |fleet| {
            let request = fleet.request_mut(id)?;
            *request = requests::complete(request)?;
            Ok(request.clone())
        })
        .await?;

    state.publish("request.completed", &committed.value);
    Ok(Saved(committed))
}

async fn reject_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Saved<Request>, AppError> {
    let committed = state
        .commit("request.reject", |fleet| {
            let request = fleet.request_mut(id)?;
            *request = requests::reject(request)?;
            Ok(request.clone())
        })
        .await?;

    state.publish("request.rejected", &committed.value);
    Ok(Saved(committed))
}
