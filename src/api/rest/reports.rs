use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;
use axum::Router;

use crate::engine::reports::{driver_stats, trip_metrics, DriverStats, TripMetrics};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reports/trips", get(trips_report))
        .route("/reports/drivers", get(drivers_report))
}

async fn trips_report(State(state): State<Arc<AppState>>) -> Json<TripMetrics> {
    Json(trip_metrics(&state.read().await.trips))
}

async fn drivers_report(State(state): State<Arc<AppState>>) -> Json<Vec<DriverStats>> {
    let fleet = state.read().await;
    Json(driver_stats(&fleet.drivers, &fleet.trips))
}
