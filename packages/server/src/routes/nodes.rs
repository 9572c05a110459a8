//! Standalone mindmap node and connection endpoints
//!
//! Nodes created here carry no entity tag, so the synchronizer leaves them
//! (and edges between them) in place across rebuilds.
//!
//! - `POST /api/nodes` - Create or move a standalone node
//! - `GET /api/nodes/:id` - Read a node
//! - `DELETE /api/nodes/:id` - Delete a standalone node and its edges
//! - `POST /api/connections` - Connect two nodes (idempotent per pair)
//! - `DELETE /api/connections/:id` - Remove a connection

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use teamboard_core::models::{MindmapConnection, MindmapNode, NodeUpsert};

use crate::http_error::HttpError;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/nodes", post(upsert_node))
        .route("/api/nodes/:id", get(get_node).delete(delete_node))
        .route("/api/connections", post(create_connection))
        .route("/api/connections/:id", delete(delete_connection))
        .with_state(state)
}

async fn upsert_node(
    State(state): State<AppState>,
    Json(upsert): Json<NodeUpsert>,
) -> Result<Json<MindmapNode>, HttpError> {
    let node = state.mindmap.upsert_node(upsert).await?;
    tracing::debug!("Upserted standalone node {}", node.id);
    Ok(Json(node))
}

async fn get_node(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MindmapNode>, HttpError> {
    Ok(Json(state.mindmap.get_node(id).await?))
}

async fn delete_node(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, HttpError> {
    state.mindmap.delete_node(id).await?;
    Ok(Json(json!({ "deleted": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionInput {
    from_node: Option<i64>,
    to_node: Option<i64>,
}

async fn create_connection(
    State(state): State<AppState>,
    Json(input): Json<ConnectionInput>,
) -> Result<Json<MindmapConnection>, HttpError> {
    let from_node = input
        .from_node
        .ok_or_else(|| HttpError::new("Missing required field: fromNode", "VALIDATION_ERROR"))?;
    let to_node = input
        .to_node
        .ok_or_else(|| HttpError::new("Missing required field: toNode", "VALIDATION_ERROR"))?;
    Ok(Json(state.mindmap.create_connection(from_node, to_node).await?))
}

async fn delete_connection(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, HttpError> {
    state.mindmap.delete_connection(id).await?;
    Ok(Json(json!({ "deleted": true })))
}
