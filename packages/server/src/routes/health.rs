//! Health check endpoint

use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;
use teamboard_core::db::EntityCounts;

use crate::http_error::HttpError;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub counts: EntityCounts,
}

async fn health_check(State(state): State<AppState>) -> Result<Json<HealthStatus>, HttpError> {
    let counts = state
        .store
        .counts()
        .await
        .map_err(|e| HttpError::new(e.to_string(), "DATABASE_ERROR"))?;
    Ok(Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        counts,
    }))
}
