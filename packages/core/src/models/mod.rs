//! Data Models
//!
//! Core data structures for the Teamboard dashboard:
//!
//! - `Project`, `TeamMember`, `Task`, `ProjectMember` - relational entities
//! - `MindmapNode`, `MindmapConnection` - the derived layout graph
//! - `*Upsert` input types carrying partial fields for merge-or-insert
//!
//! All entities serialize as camelCase JSON, matching the dashboard's wire
//! format.

mod entity;
mod graph;

#[cfg(test)]
mod entity_test;

pub use entity::{
    MemberUpsert, Project, ProjectMember, ProjectUpsert, Task, TaskPriority, TaskUpsert,
    TeamMember, ValidationError,
};
pub use graph::{MindmapConnection, MindmapLayout, MindmapNode, NodeUpsert, NODE_LEVEL_MEMBER,
    NODE_LEVEL_PROJECT, NODE_LEVEL_TASK, NODE_LEVEL_TEAM};
