use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::api::rest::Saved;
use crate::engine::availability::{check_availability_by_origin, AvailabilityReport, Exclusions};
use crate::engine::orchestrator::{self, ApprovalOutcome, RejectionOutcome};
use crate::error::AppError;
use crate::models::calendar::CalendarEventDraft;
use crate::models::quote::{Quote, QuoteDraft};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/quotes", post(create_quote).get(list_quotes))
        .route("/quotes/:id", get(get_quote))
        .route("/quotes/:id/approve", post(approve_quote))
        .route("/quotes/:id/reject", post(reject_quote))
        .route("/quotes/:id/staffing", get(quote_staffing))
}

#[derive(Deserialize)]
pub struct CreateQuoteRequest {
    #[serde(flatten)]
    pub quote: QuoteDraft,
    #[serde(default)]
    pub event: Option<CalendarEventDraft>,
}

async fn create_quote(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateQuoteRequest>,
) -> Result<Saved<Quote>, AppError> {
    let rules = &state.config.rules;
    let committed = state
        .commit("quote.generate", |fleet| {
            orchestrator::generate_quote(
                fleet,
                rules,
                &payload.quote,
                payload.event.as_ref(),
                Utc::now(),
            )
        })
        .await?;

    state.metrics.quotes_total.with_label_values(&["generated"]).inc();
    state.publish("quote.generated", &committed.value);
    Ok(Saved(committed))
}

async fn list_quotes(State(state): State<Arc<AppState>>) -> Json<Vec<Quote>> {
    Json(state.read().await.quotes.clone())
}

async fn get_quote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Quote>, AppError> {
    let fleet = state.read().await;
    Ok(Json(fleet.quote(id)?.clone()))
}

async fn approve_quote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Saved<ApprovalOutcome>, AppError> {
    let permit = match state.approvals.try_acquire() {
        Ok(permit) => permit,
        Err(err) => {
            state.metrics.quotes_total.with_label_values(&["duplicate"]).inc();
            return Err(err);
        }
    };

    let committed = state
        .commit("quote.approve", |fleet| {
            orchestrator::approve_quote(fleet, id, Utc::now())
        })
        .await;
    drop(permit);

    let committed = match committed {
        Ok(committed) => committed,
        Err(err) => {
            if matches!(err, AppError::Conflict(_)) {
                state.metrics.quotes_total.with_label_values(&["duplicate"]).inc();
            }
            return Err(err);
        }
    };

    info!(quote_id = id, trip_id = committed.value.trip.id, "approval committed");
    state.metrics.quotes_total.with_label_values(&["approved"]).inc();
    state.publish("quote.approved", &committed.value);
    Ok(Saved(committed))
}

async fn reject_quote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Saved<RejectionOutcome>, AppError> {
    let committed = state
        .commit("quote.reject", |fleet| orchestrator::reject_quote(fleet, id))
        .await?;

    state.metrics.quotes_total.with_label_values(&["rejected"]).inc();
    state.publish("quote.rejected", &committed.value);
    Ok(Saved(committed))
}

/// Advisory shortage report for the quote's origin and dates. The quote's
/// own calendar hold does not count against its drivers.
async fn quote_staffing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<AvailabilityReport>, AppError> {
    let fleet = state.read().await;
    let quote = fleet.quote(id)?;
    let report = check_availability_by_origin(
        &fleet.drivers,
        &quote.origin,
        quote.trucks_required,
        quote.event_date,
        quote.return_date,
        &fleet.trips,
        &fleet.calendar_events,
        Exclusions {
            quote_id: Some(quote.id),
            trip_id: None,
        },
    );
    Ok(Json(report))
}
