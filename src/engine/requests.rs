use tracing::{info, warn};

use crate::config::Limits;
use crate::engine::validation::{char_len, required_text};
use crate::error::{AppError, ValidationErrors};
use crate::models::fleet::next_id;
use crate::models::request::{Request, RequestInput, RequestState};

fn optional_bounded(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<f64>,
    (min, max): (f64, f64),
    unit: &str,
) -> Option<f64> {
    let value = value?;
    if value.is_finite() && value >= min && value <= max {
        Some(value)
    } else {
        errors.add(field, format!("must be between {min} and {max} {unit}"));
        None
    }
}

pub fn create(
    limits: &Limits,
    input: &RequestInput,
    existing: &[Request],
) -> Result<Request, AppError> {
    let mut errors = ValidationErrors::new();

    let title = required_text(&mut errors, "title", input.title.as_deref()).and_then(|title| {
        let len = char_len(&title);
        if len < limits.title_min_chars || len > limits.title_max_chars {
            errors.add(
                "title",
                format!(
                    "must be between {} and {} characters",
                    limits.title_min_chars, limits.title_max_chars
                ),
            );
            None
        } else {
            Some(title)
        }
    });
    let origin = required_text(&mut errors, "origin", input.origin.as_deref());
    let destination = required_text(&mut errors, "destination", input.destination.as_deref());
    let weight_kg = optional_bounded(&mut errors, "weight_kg", input.weight_kg, limits.weight_kg, "kg")
        .map(f64::round);
    let volume_m3 = optional_bounded(&mut errors, "volume_m3", input.volume_m3, limits.volume_m3, "m3")
        .map(|volume| (volume * 10.0).round() / 10.0);

    if let (Some(from), Some(to)) = (input.requested_date, input.return_date) {
        if to < from {
            errors.add("return_date", "must not be before the requested date");
        }
    }

    if !errors.is_empty() {
        warn!(%errors, "request validation failed");
        return Err(AppError::Validation(errors));
    }

    let (Some(title), Some(origin), Some(destination)) = (title, origin, destination) else {
        return Err(AppError::Internal("request validation lost a field".to_string()));
    };

    let id = next_id(existing.iter().map(|request| request.id));
    info!(request_id = id, "request created");

    Ok(Request {
        id,
        title,
        origin,
        destination,
        requested_date: input.requested_date,
        return_date: input.return_date,
        weight_kg,
        volume_m3,
        state: RequestState::New,
    })
}

fn transition(request: &Request, allowed: &[RequestState], target: RequestState) -> Result<Request, AppError> {
    if request.state == target {
        return Ok(request.clone());
    }
    if !allowed.contains(&request.state) {
        return Err(AppError::Conflict(format!(
            "request {} cannot move from {:?} to {:?}",
            request.id, request.state, target
        )));
    }
    Ok(Request {
        state: target,
        ..request.clone()
    })
}

/// A quote or direct assignment picked the request up.
pub fn start(request: &Request) -> Result<Request, AppError> {
    transition(request, &[RequestState::New], RequestState::InProgress)
}

pub fn complete(request: &Request) -> Result<Request, AppError> {
    transition(
        request,
        &[RequestState::New, RequestState::InProgress],
        RequestState::Completed,
    )
}

pub fn reject(request: &Request) -> Result<Request, AppError> {
    transition(
        request,
        &[RequestState::New, RequestState::InProgress],
        RequestState::Rejected,
    )
}
