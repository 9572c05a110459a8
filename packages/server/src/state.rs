//! Shared application state

use std::sync::Arc;
use teamboard_core::db::EntityStore;
use teamboard_core::services::{AssignmentService, EntityService, MindmapService};

/// State handed to every route handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub entities: Arc<EntityService>,
    pub mindmap: Arc<MindmapService>,
    pub assignments: Arc<AssignmentService>,
}
