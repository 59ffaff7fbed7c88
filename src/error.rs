use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("capacity error: {0}")]
    Capacity(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("external service error: {0}")]
    ExternalService(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// A single rejected field and the reason it was rejected.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Collects one message per invalid field so a record is either fully
/// accepted or not created at all.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|err| err.field == field)
    }

    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|err| format!("{}: {}", err.field, err.message))
            .collect::<Vec<_>>()
            .join(", ");
        f.write_str(&joined)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(errors) => {
                let body = Json(json!({
                    "error": format!("validation failed: {errors}"),
                    "fields": errors.0,
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Capacity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::Storage(msg) => (StatusCode::INSUFFICIENT_STORAGE, msg.clone()),
            AppError::ExternalService(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
