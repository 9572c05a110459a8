//! Entity Data Structures
//!
//! Relational entities of the dashboard: projects own tasks and membership
//! links, team members are independent and referenced weakly by tasks.
//!
//! # Lifecycle
//!
//! Entities are created/updated via upsert-by-id semantics: an upsert input
//! with a known id merges its provided fields over the stored record, an
//! unseen (or absent) id inserts a new record. Deletes cascade as follows:
//!
//! - Deleting a project removes its tasks and membership links
//! - Deleting a member nulls `Task::assigned_to` and removes links, but
//!   keeps the tasks
//!
//! # Examples
//!
//! ```rust
//! use teamboard_core::models::{Task, TaskPriority};
//!
//! let task = Task::new(
//!     "Implement REST API endpoints".to_string(),
//!     TaskPriority::High,
//!     "Dec 20".to_string(),
//!     "project-1".to_string(),
//! );
//! assert_eq!(task.priority.score(), 3);
//! assert!(task.assigned_to.is_none());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for entity operations
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field value for {field}: {reason}")]
    InvalidField { field: String, reason: String },
}

impl ValidationError {
    /// Create a missing field error
    pub fn missing_field(name: impl Into<String>) -> Self {
        Self::MissingField(name.into())
    }

    /// Create an invalid field error
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// A project groups tasks and member links under one dashboard entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique identifier (UUID unless supplied by the caller)
    pub id: String,

    /// Display name
    pub name: String,

    /// Tag color shown on the dashboard (e.g. "#7c5cff")
    pub color: String,

    /// Free-text description
    pub description: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new project with a generated UUID
    pub fn new(name: String, color: String, description: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            color,
            description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A team member. Independent entity, referenced weakly by `Task::assigned_to`
/// and by `ProjectMember` links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    /// Unique identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Free-text role label, used by the assignment advisor for skill matching
    pub role: String,

    /// Avatar glyph (single character or emoji)
    pub avatar: String,

    /// Avatar background color
    pub color: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl TeamMember {
    /// Create a new team member with a generated UUID
    pub fn new(name: String, role: String, avatar: String, color: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            role,
            avatar,
            color,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Task priority. Scored for advisor ordering: high outranks medium outranks
/// low.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    /// Numeric score used when sorting unassigned tasks for the advisor
    pub fn score(&self) -> u8 {
        match self {
            TaskPriority::High => 3,
            TaskPriority::Medium => 2,
            TaskPriority::Low => 1,
        }
    }

    /// Stable string form stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }

    /// Parse the stored string form
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(ValidationError::invalid_field(
                "priority",
                format!("expected low|medium|high, got '{}'", other),
            )),
        }
    }
}

/// A task belonging to exactly one project, optionally assigned to one member.
///
/// `deadline` is a display string ("Dec 20"), not a parsed date. The advisor
/// sorts it lexicographically; see `services::assignment_service` for the
/// rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier
    pub id: String,

    /// Title shown on the dashboard and in mindmap task nodes
    pub title: String,

    /// Priority (defaults to medium)
    #[serde(default)]
    pub priority: TaskPriority,

    /// Deadline display string
    pub deadline: String,

    /// Owning project id (strong reference, cascade-deleted with the project)
    pub project_id: String,

    /// Assigned member id (weak reference, nulled when the member is deleted)
    pub assigned_to: Option<String>,

    /// Structured tech-stack suggestion produced by the advisor, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<serde_json::Value>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new unassigned task with a generated UUID
    pub fn new(title: String, priority: TaskPriority, deadline: String, project_id: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            priority,
            deadline,
            project_id,
            assigned_to: None,
            tech_stack: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Join entity expressing "member works on project". The (project, member)
/// pair is unique; duplicate link requests are idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    pub project_id: String,
    pub member_id: String,
    pub created_at: DateTime<Utc>,
}

/// Partial project fields for merge-or-insert
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpsert {
    pub id: Option<String>,
    pub name: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
}

/// Partial team member fields for merge-or-insert
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberUpsert {
    pub id: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub avatar: Option<String>,
    pub color: Option<String>,
}

/// Partial task fields for merge-or-insert
///
/// `assigned_to` distinguishes three payloads: an absent field leaves the
/// assignment untouched, an explicit JSON `null` clears it, and a member id
/// assigns the task to that member. Insert requires `title`, `project_id`,
/// and `deadline`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpsert {
    pub id: Option<String>,
    pub title: Option<String>,
    pub priority: Option<TaskPriority>,
    pub deadline: Option<String>,
    pub project_id: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub assigned_to: Option<Option<String>>,
}

/// Deserialize a field so that `null` maps to `Some(None)` while an absent
/// field falls back to the `None` default.
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}
