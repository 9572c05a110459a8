//! Task CRUD endpoints
//!
//! - `GET /api/tasks` - List all tasks
//! - `POST /api/tasks` - Create or update a task
//! - `DELETE /api/tasks/:id` - Delete a task

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{delete, get},
    Router,
};
use serde_json::{json, Value};
use teamboard_core::models::{Task, TaskUpsert};
use teamboard_core::services::Mutated;

use crate::http_error::HttpError;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(upsert_task))
        .route("/api/tasks/:id", get(get_task).delete(delete_task))
        .with_state(state)
}

async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>, HttpError> {
    Ok(Json(state.entities.list_tasks().await?))
}

async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, HttpError> {
    Ok(Json(state.entities.get_task(&id).await?))
}

async fn upsert_task(
    State(state): State<AppState>,
    Json(upsert): Json<TaskUpsert>,
) -> Result<Json<Mutated<Task>>, HttpError> {
    let result = state.entities.upsert_task(upsert).await?;
    tracing::debug!("Upserted task {}", result.record.id);
    Ok(Json(result))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, HttpError> {
    let synced = state.entities.delete_task(&id).await?;
    Ok(Json(json!({ "deleted": true, "synced": synced })))
}
