use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Json;
use axum::Router;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::engine::availability::DateRange;
use crate::models::calendar::CalendarEvent;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/calendar", get(list_events))
}

#[derive(Deserialize)]
pub struct CalendarQuery {
    pub driver_id: Option<u64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CalendarQuery>,
) -> Json<Vec<CalendarEvent>> {
    let window = query.from.map(|from| DateRange::new(from, query.to));
    let fleet = state.read().await;

    let mut events: Vec<CalendarEvent> = fleet
        .calendar_events
        .iter()
        .filter(|event| query.driver_id.is_none_or(|id| event.driver_id == Some(id)))
        .filter(|event| {
            window.is_none_or(|window| DateRange::new(event.date, event.return_date).overlaps(&window))
        })
        .cloned()
        .collect();
    events.sort_by_key(|event| (event.date, event.id));
    Json(events)
}
