//! Team member CRUD endpoints
//!
//! - `GET /api/team-members` - List all members
//! - `POST /api/team-members` - Create or update a member
//! - `DELETE /api/team-members/:id` - Delete a member (tasks revert to
//!   unassigned)

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{delete, get},
    Router,
};
use serde_json::{json, Value};
use teamboard_core::models::{MemberUpsert, TeamMember};
use teamboard_core::services::Mutated;

use crate::http_error::HttpError;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/team-members", get(list_members).post(upsert_member))
        .route("/api/team-members/:id", delete(delete_member))
        .with_state(state)
}

async fn list_members(State(state): State<AppState>) -> Result<Json<Vec<TeamMember>>, HttpError> {
    Ok(Json(state.entities.list_members().await?))
}

async fn upsert_member(
    State(state): State<AppState>,
    Json(upsert): Json<MemberUpsert>,
) -> Result<Json<Mutated<TeamMember>>, HttpError> {
    let result = state.entities.upsert_member(upsert).await?;
    tracing::debug!("Upserted member {}", result.record.id);
    Ok(Json(result))
}

async fn delete_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, HttpError> {
    let synced = state.entities.delete_member(&id).await?;
    Ok(Json(json!({ "deleted": true, "synced": synced })))
}
