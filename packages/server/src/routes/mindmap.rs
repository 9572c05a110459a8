//! Mindmap graph endpoints
//!
//! - `GET /api/mindmap` - Read the last committed graph generation
//! - `POST /api/sync-mindmap` - Rebuild the graph on demand

use axum::{extract::State, response::Json, routing::get, routing::post, Router};
use teamboard_core::models::MindmapLayout;

use crate::http_error::HttpError;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/mindmap", get(get_mindmap))
        .route("/api/sync-mindmap", post(sync_mindmap))
        .with_state(state)
}

async fn get_mindmap(State(state): State<AppState>) -> Result<Json<MindmapLayout>, HttpError> {
    Ok(Json(state.mindmap.layout().await?))
}

async fn sync_mindmap(State(state): State<AppState>) -> Result<Json<MindmapLayout>, HttpError> {
    let layout = state.mindmap.sync().await?;
    Ok(Json(layout))
}
