//! HTTP error handling and response types.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::db::repository::RepositoryError;
use crate::services::{AllocationError, AllocationErrorKind, DutyError};

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Structured diagnostics, when the error has any
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Value::Null,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Invalid request (validation error)
    BadRequest(String),
    /// Internal server error
    Internal(String),
    /// Repository error
    Repository(RepositoryError),
    /// Seat allocation failure
    Allocation(AllocationError),
    /// Invigilation or attendance failure
    Duty(DutyError),
}

fn allocation_status(kind: AllocationErrorKind) -> StatusCode {
    match kind {
        AllocationErrorKind::ValidationError
        | AllocationErrorKind::Empty
        | AllocationErrorKind::MissingRoomType
        | AllocationErrorKind::AllOccupied
        | AllocationErrorKind::InsufficientCapacity => StatusCode::BAD_REQUEST,
        AllocationErrorKind::NotFound => StatusCode::NOT_FOUND,
        AllocationErrorKind::DuplicateSeat | AllocationErrorKind::DuplicateStudentAssignment => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        AllocationErrorKind::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// `{"<entity>_id": "<id>"}` from the error context, when both are recorded.
fn entity_details(e: &RepositoryError) -> Value {
    let context = e.context();
    match (&context.entity, &context.entity_id) {
        (Some(entity), Some(id)) => {
            let mut details = Map::new();
            details.insert(format!("{}_id", entity), Value::String(id.clone()));
            Value::Object(details)
        }
        _ => Value::Null,
    }
}

fn repository_response(e: RepositoryError) -> (StatusCode, ApiError) {
    let msg = e.to_string();
    match &e {
        RepositoryError::NotFound { .. } => (
            StatusCode::NOT_FOUND,
            ApiError::new("NOT_FOUND", msg).with_details(entity_details(&e)),
        ),
        RepositoryError::ConstraintViolation { kind, .. } => (
            StatusCode::CONFLICT,
            ApiError::new("CONFLICT", msg).with_details(json!({ "constraint": kind })),
        ),
        RepositoryError::ValidationError { .. } => {
            (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
        }
        RepositoryError::ConnectionError { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            ApiError::new("STORE_UNAVAILABLE", msg),
        ),
        _ => {
            tracing::error!("Repository error: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("REPOSITORY_ERROR", msg),
            )
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
            AppError::Repository(e) => repository_response(e),
            AppError::Allocation(e) => {
                let kind = e.kind();
                let status = allocation_status(kind);
                if status.is_server_error() {
                    tracing::error!("Seat allocation failed: {}", e);
                }
                (
                    status,
                    ApiError::new(kind.as_str(), e.to_string()).with_details(e.diagnostics()),
                )
            }
            AppError::Duty(DutyError::Repository(e)) => repository_response(e),
            AppError::Duty(e @ DutyError::Invalid(_)) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", e.to_string()))
            }
            AppError::Duty(e @ DutyError::NotFound { .. }) => (
                StatusCode::NOT_FOUND,
                ApiError::new("NOT_FOUND", e.to_string()).with_details(e.details()),
            ),
        };

        (status, Json(error)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<AllocationError> for AppError {
    fn from(err: AllocationError) -> Self {
        AppError::Allocation(err)
    }
}

impl From<DutyError> for AppError {
    fn from(err: DutyError) -> Self {
        AppError::Duty(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::ConstraintKind;

    #[test]
    fn test_allocation_status_mapping() {
        assert_eq!(
            allocation_status(AllocationErrorKind::InsufficientCapacity),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            allocation_status(AllocationErrorKind::NotFound),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            allocation_status(AllocationErrorKind::DuplicateSeat),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            allocation_status(AllocationErrorKind::StoreUnavailable),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_repository_constraint_is_conflict() {
        let response = AppError::from(RepositoryError::constraint(
            ConstraintKind::DuplicateRoomNumber,
            "A101 exists",
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response =
            AppError::from(RepositoryError::not_found("Room 9 not found")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_not_found_details_name_the_entity() {
        let err = RepositoryError::not_found("Room 9 not found").with_entity("room", 9);
        assert_eq!(entity_details(&err), json!({ "room_id": "9" }));
        assert_eq!(
            entity_details(&RepositoryError::not_found("gone")),
            Value::Null
        );
    }
}
