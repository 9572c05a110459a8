//! HTTP error responses
//!
//! One JSON error shape for every endpoint: message, machine-readable code,
//! optional details. The code drives the status line.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use teamboard_core::services::ServiceError;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    /// Optional detailed error information for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: Some(details.into()),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = match self.code.as_str() {
            "RESOURCE_NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" | "NO_TEAM_MEMBERS" | "NO_UNASSIGNED_TASKS" => {
                StatusCode::BAD_REQUEST
            }
            "SUGGESTION_IN_PROGRESS" => StatusCode::CONFLICT,
            "ADVISOR_UNAVAILABLE" | "INVALID_PROPOSAL" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<ServiceError> for HttpError {
    fn from(err: ServiceError) -> Self {
        match &err {
            ServiceError::NotFound { .. } => HttpError::new(err.to_string(), "RESOURCE_NOT_FOUND"),
            ServiceError::ValidationFailed(_) => {
                HttpError::new(err.to_string(), "VALIDATION_ERROR")
            }
            ServiceError::NoTeamMembers => HttpError::new(err.to_string(), "NO_TEAM_MEMBERS"),
            ServiceError::NoUnassignedTasks => {
                HttpError::new(err.to_string(), "NO_UNASSIGNED_TASKS")
            }
            ServiceError::AdvisorUnavailable(details) => HttpError::with_details(
                "Assignment advisor is unavailable",
                "ADVISOR_UNAVAILABLE",
                details.clone(),
            ),
            ServiceError::InvalidProposal { reason } => HttpError::with_details(
                "Assignment advisor returned an invalid proposal",
                "INVALID_PROPOSAL",
                reason.clone(),
            ),
            ServiceError::SuggestionInProgress { .. } => {
                HttpError::new(err.to_string(), "SUGGESTION_IN_PROGRESS")
            }
            ServiceError::SyncFailed { .. } => HttpError::new(err.to_string(), "SYNC_FAILED"),
            ServiceError::DatabaseError(_) => {
                tracing::error!("Database failure surfaced to HTTP: {}", err);
                HttpError::new(err.to_string(), "DATABASE_ERROR")
            }
        }
    }
}
