pub mod calendar;
pub mod drivers;
pub mod planning;
pub mod quotes;
pub mod reports;
pub mod requests;
pub mod trips;
pub mod ws;

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::state::{AppState, Committed};

pub const STORAGE_WARNING_HEADER: &str = "x-storage-warning";

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(drivers::router())
        .merge(trips::router())
        .merge(requests::router())
        .merge(quotes::router())
        .merge(calendar::router())
        .merge(planning::router())
        .merge(reports::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .fallback_service(ServeDir::new("static"))
}

/// JSON body of a committed mutation, plus the storage warning header when
/// the change could not be persisted.
pub struct Saved<T>(pub Committed<T>);

impl<T: Serialize> IntoResponse for Saved<T> {
    fn into_response(self) -> Response {
        let Committed { value, warning } = self.0;
        let mut response = Json(value).into_response();
        if let Some(value) = warning.and_then(|w| HeaderValue::from_str(&w).ok()) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(STORAGE_WARNING_HEADER), value);
        }
        response
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    drivers: usize,
    trips: usize,
    requests: usize,
    quotes: usize,
    calendar_events: usize,
    approval_in_flight: bool,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let fleet = state.read().await;
    Json(HealthResponse {
        status: "ok",
        drivers: fleet.drivers.len(),
        trips: fleet.trips.len(),
        requests: fleet.requests.len(),
        quotes: fleet.quotes.len(),
        calendar_events: fleet.calendar_events.len(),
        approval_in_flight: state.approvals.is_busy(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
