//! Teamboard REST API server
//!
//! Exposes the core services over HTTP for the dashboard frontend. Routing
//! is modular: each resource module contributes its own `routes()` Router
//! and they are merged here. CORS is open to the local frontend dev ports.

use axum::{
    http::{header, Method},
    Router,
};
use std::sync::Arc;
use teamboard_advisor::{AnthropicAdvisor, AssignmentAdvisor};
use teamboard_core::db::{DatabaseService, EntityStore, SqliteStore};
use teamboard_core::services::{AssignmentService, EntityService, MindmapService};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod http_error;
pub mod routes;
pub mod state;

mod unconfigured;

pub use http_error::HttpError;
pub use state::AppState;

/// Build the full application state over a database path.
///
/// When no advisor is configured (ANTHROPIC_API_KEY unset), the assignment
/// endpoints stay up but report the advisor as unavailable.
pub async fn build_state(
    db_path: &str,
    advisor: Option<Arc<dyn AssignmentAdvisor>>,
) -> anyhow::Result<AppState> {
    let db = Arc::new(DatabaseService::new(db_path).await?);
    let store: Arc<dyn EntityStore> = Arc::new(SqliteStore::new(db));
    let mindmap = Arc::new(MindmapService::new(store.clone()));
    let entities = Arc::new(EntityService::new(store.clone(), mindmap.clone()));

    let advisor = match advisor {
        Some(advisor) => advisor,
        None => match teamboard_advisor::AdvisorConfig::from_env() {
            Ok(config) => Arc::new(AnthropicAdvisor::new(config)?) as Arc<dyn AssignmentAdvisor>,
            Err(e) => {
                tracing::warn!("Advisor not configured ({}); AI endpoints will fail", e);
                Arc::new(unconfigured::UnconfiguredAdvisor)
            }
        },
    };
    let assignments = Arc::new(AssignmentService::new(
        store.clone(),
        advisor,
        mindmap.clone(),
    ));

    Ok(AppState {
        store,
        entities,
        mindmap,
        assignments,
    })
}

/// Create the main application router with all endpoint modules
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::routes(state.clone()))
        .merge(routes::projects::routes(state.clone()))
        .merge(routes::tasks::routes(state.clone()))
        .merge(routes::members::routes(state.clone()))
        .merge(routes::mindmap::routes(state.clone()))
        .merge(routes::nodes::routes(state.clone()))
        .merge(routes::assign::routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

/// CORS layer for the local dashboard frontend.
///
/// Default origins cover the common Vite dev ports; CORS_ALLOW_ORIGIN
/// overrides them with a single custom origin.
fn cors_layer() -> CorsLayer {
    let default_origins = ["http://localhost:5173", "http://localhost:3000"];

    let origins: Vec<header::HeaderValue> = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(custom_origin) => match custom_origin.parse::<header::HeaderValue>() {
            Ok(origin) => vec![origin],
            Err(_) => {
                tracing::warn!("Invalid CORS_ALLOW_ORIGIN, falling back to defaults");
                default_origins.iter().filter_map(|o| o.parse().ok()).collect()
            }
        },
        Err(_) => default_origins.iter().filter_map(|o| o.parse().ok()).collect(),
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any)
        .allow_credentials(false)
}

/// Bind and serve until shutdown
pub async fn start_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("127.0.0.1:{}", port);
    tracing::info!("Teamboard API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
