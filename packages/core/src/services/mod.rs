//! Service Layer
//!
//! Business logic over the entity store: CRUD with validation and cascades,
//! the mindmap synchronizer, and advisor-driven task assignment.

pub mod assignment_service;
pub mod entity_service;
pub mod error;
pub mod mindmap_service;

#[cfg(test)]
mod entity_service_test;

pub use assignment_service::{AssignmentReport, AssignmentService};
pub use entity_service::{EntityService, Mutated};
pub use error::ServiceError;
pub use mindmap_service::{build_layout, MindmapService};
