//! Teamboard Core Business Logic Layer
//!
//! This crate provides the data management, mindmap synchronization, and
//! service orchestration for the Teamboard project dashboard.
//!
//! # Architecture
//!
//! - **Relational entities**: Projects, team members, tasks, and membership
//!   links in an embedded libsql/Turso database
//! - **Derived mindmap**: A positioned graph of nodes and connections,
//!   rebuilt wholesale from entity state on every mutation
//! - **Advisor integration**: AI-assisted task assignment via the
//!   `teamboard-advisor` collaborator crate
//!
//! # Modules
//!
//! - [`models`] - Data structures (Project, TeamMember, Task, mindmap graph)
//! - [`db`] - Database layer with libsql integration and the EntityStore trait
//! - [`services`] - Business services (EntityService, MindmapService, AssignmentService)

pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use db::*;
pub use models::*;
pub use services::*;
