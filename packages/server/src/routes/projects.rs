//! Project CRUD and membership endpoints
//!
//! - `GET /api/projects` - List all projects
//! - `POST /api/projects` - Create or update a project
//! - `DELETE /api/projects/:id` - Delete a project (cascades tasks + links)
//! - `GET /api/projects/:id/members` - List a project's linked members
//! - `POST /api/projects/:id/members` - Link a member (idempotent)
//! - `DELETE /api/projects/:id/members/:member_id` - Unlink a member

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{delete, get},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use teamboard_core::models::{Project, ProjectMember, ProjectUpsert, TeamMember};
use teamboard_core::services::Mutated;

use crate::http_error::HttpError;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/projects", get(list_projects).post(upsert_project))
        .route("/api/projects/:id", delete(delete_project))
        .route(
            "/api/projects/:id/members",
            get(list_members).post(link_member),
        )
        .route(
            "/api/projects/:id/members/:member_id",
            delete(unlink_member),
        )
        .with_state(state)
}

async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<Project>>, HttpError> {
    Ok(Json(state.entities.list_projects().await?))
}

async fn upsert_project(
    State(state): State<AppState>,
    Json(upsert): Json<ProjectUpsert>,
) -> Result<Json<Mutated<Project>>, HttpError> {
    let result = state.entities.upsert_project(upsert).await?;
    tracing::debug!("Upserted project {}", result.record.id);
    Ok(Json(result))
}

async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, HttpError> {
    let synced = state.entities.delete_project(&id).await?;
    Ok(Json(json!({ "deleted": true, "synced": synced })))
}

async fn list_members(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TeamMember>>, HttpError> {
    Ok(Json(state.entities.list_project_members(&id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkMemberInput {
    member_id: Option<String>,
}

async fn link_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<LinkMemberInput>,
) -> Result<Json<Mutated<ProjectMember>>, HttpError> {
    let member_id = input
        .member_id
        .ok_or_else(|| HttpError::new("Missing required field: memberId", "VALIDATION_ERROR"))?;
    Ok(Json(state.entities.link_member(&id, &member_id).await?))
}

async fn unlink_member(
    State(state): State<AppState>,
    Path((id, member_id)): Path<(String, String)>,
) -> Result<Json<Value>, HttpError> {
    let synced = state.entities.unlink_member(&id, &member_id).await?;
    Ok(Json(json!({ "deleted": true, "synced": synced })))
}
