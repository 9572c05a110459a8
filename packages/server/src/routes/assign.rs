//! Advisor-backed endpoints
//!
//! - `POST /api/projects/:id/auto-assign` - Propose and apply assignments
//!   for a project's unassigned tasks
//! - `POST /api/tasks/:id/suggest-stack` - Start a background tech-stack
//!   suggestion; clients poll the task's `techStack` field

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use serde_json::{json, Value};
use teamboard_core::services::AssignmentReport;

use crate::http_error::HttpError;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/projects/:id/auto-assign", post(auto_assign))
        .route("/api/tasks/:id/suggest-stack", post(suggest_stack))
        .with_state(state)
}

async fn auto_assign(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AssignmentReport>, HttpError> {
    let report = state.assignments.auto_assign(&id).await?;
    tracing::info!(
        "Auto-assigned {} task(s) in project {}",
        report.assignments_made,
        id
    );
    Ok(Json(report))
}

async fn suggest_stack(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Value>), HttpError> {
    state.assignments.spawn_tech_stack_suggestion(&id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "taskId": id, "status": "pending" })),
    ))
}
