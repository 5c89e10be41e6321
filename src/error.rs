//! Error type for the HTTP handlers.
//!
//! Roster problems are the caller's fault and map to 422; anything else
//! that escapes a handler is reported as a 500 with a JSON body.

use crate::policy::PolicyLoadError;
use crate::validation::RosterError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("policy error: {0}")]
    Policy(#[from] PolicyLoadError),
    #[error("invalid roster: {0}")]
    Roster(#[from] RosterError),
    #[error("calculation task failed: {0}")]
    Task(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Roster(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Policy(_) | AppError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_errors_are_unprocessable() {
        let response = AppError::from(RosterError::DuplicateFirstAuthor).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = AppError::Task("worker panicked".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
