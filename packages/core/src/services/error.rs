//! Service Layer Error Types
//!
//! High-level error types for business-logic failures, layered over the
//! database and advisor errors with proper chaining.

use crate::db::DatabaseError;
use crate::models::ValidationError;
use teamboard_advisor::AdvisorError;
use thiserror::Error;

/// Service operation errors
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Entity not found by ID
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Validation failed for an upsert payload
    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Database operation failed
    #[error("Database operation failed: {0}")]
    DatabaseError(#[from] DatabaseError),

    /// Mindmap rebuild failed; entity data is untouched
    #[error("Mindmap sync failed: {context}")]
    SyncFailed { context: String },

    /// Auto-assign preconditions not met
    #[error("No team members available to assign")]
    NoTeamMembers,

    /// Auto-assign preconditions not met
    #[error("Project has no unassigned tasks")]
    NoUnassignedTasks,

    /// The advisor could not be reached or returned no usable answer
    #[error("Advisor unavailable: {0}")]
    AdvisorUnavailable(String),

    /// The advisor answered, but the proposal failed validation
    #[error("Advisor proposal rejected: {reason}")]
    InvalidProposal { reason: String },

    /// A stack suggestion is already running for this task
    #[error("Tech stack suggestion already in progress for task {id}")]
    SuggestionInProgress { id: String },
}

impl ServiceError {
    /// Create a not found error for a project
    pub fn project_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Project",
            id: id.into(),
        }
    }

    /// Create a not found error for a team member
    pub fn member_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Team member",
            id: id.into(),
        }
    }

    /// Create a not found error for a task
    pub fn task_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Task",
            id: id.into(),
        }
    }

    /// Create a not found error for a mindmap node
    pub fn node_not_found(id: i64) -> Self {
        Self::NotFound {
            kind: "Node",
            id: id.to_string(),
        }
    }

    /// Create a not found error for a mindmap connection
    pub fn connection_not_found(id: i64) -> Self {
        Self::NotFound {
            kind: "Connection",
            id: id.to_string(),
        }
    }

    /// Create a sync failed error
    pub fn sync_failed(context: impl Into<String>) -> Self {
        Self::SyncFailed {
            context: context.into(),
        }
    }

    /// Create an invalid proposal error
    pub fn invalid_proposal(reason: impl Into<String>) -> Self {
        Self::InvalidProposal {
            reason: reason.into(),
        }
    }
}

impl From<AdvisorError> for ServiceError {
    fn from(err: AdvisorError) -> Self {
        if err.is_unavailable() {
            Self::AdvisorUnavailable(err.to_string())
        } else {
            Self::invalid_proposal(err.to_string())
        }
    }
}
