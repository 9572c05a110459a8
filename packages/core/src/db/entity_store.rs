//! EntityStore Trait - Database Abstraction Layer
//!
//! Abstracts persistence operations for the dashboard entities and the
//! derived mindmap graph, so business logic in the services does not depend
//! on a concrete backend.
//!
//! # Contract notes
//!
//! - List operations return rows in insertion order (creation timestamp with
//!   id tiebreak), which the synchronizer relies on for deterministic node
//!   ids.
//! - `get_*` returns `Ok(None)` for a missing id; translating that into a
//!   NotFound failure is the service layer's job.
//! - `link_member` is idempotent: relinking an existing pair returns the
//!   existing link.
//! - `replace_graph` and `apply_assignments` are atomic; on failure nothing
//!   is written.

use crate::models::{
    MindmapConnection, MindmapLayout, MindmapNode, Project, ProjectMember, Task, TaskPriority,
    TeamMember,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::DatabaseError;

/// Row counts per table, for the health endpoint
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityCounts {
    pub projects: u64,
    pub team_members: u64,
    pub tasks: u64,
    pub project_members: u64,
    pub mindmap_nodes: u64,
    pub mindmap_connections: u64,
}

/// Abstraction layer for dashboard persistence
///
/// Implementations must be `Send + Sync`; all methods are async to support
/// both embedded and networked backends.
#[async_trait]
pub trait EntityStore: Send + Sync {
    //
    // PROJECTS
    //

    /// Insert a new project row
    async fn create_project(&self, project: Project) -> Result<Project, DatabaseError>;

    /// Write all mutable fields of an existing project (merge happens in the
    /// service layer)
    async fn update_project(&self, project: Project) -> Result<Project, DatabaseError>;

    async fn get_project(&self, id: &str) -> Result<Option<Project>, DatabaseError>;

    /// All projects in insertion order
    async fn list_projects(&self) -> Result<Vec<Project>, DatabaseError>;

    /// Delete a project, cascading its tasks and membership links.
    /// Returns false if the id was unknown.
    async fn delete_project(&self, id: &str) -> Result<bool, DatabaseError>;

    //
    // TEAM MEMBERS
    //

    async fn create_member(&self, member: TeamMember) -> Result<TeamMember, DatabaseError>;

    async fn update_member(&self, member: TeamMember) -> Result<TeamMember, DatabaseError>;

    async fn get_member(&self, id: &str) -> Result<Option<TeamMember>, DatabaseError>;

    /// All members in insertion order
    async fn list_members(&self) -> Result<Vec<TeamMember>, DatabaseError>;

    /// Delete a member. Their tasks survive with `assigned_to` nulled;
    /// membership links are removed. Returns false if the id was unknown.
    async fn delete_member(&self, id: &str) -> Result<bool, DatabaseError>;

    //
    // TASKS
    //

    async fn create_task(&self, task: Task) -> Result<Task, DatabaseError>;

    async fn update_task(&self, task: Task) -> Result<Task, DatabaseError>;

    async fn get_task(&self, id: &str) -> Result<Option<Task>, DatabaseError>;

    /// All tasks in insertion order
    async fn list_tasks(&self) -> Result<Vec<Task>, DatabaseError>;

    /// Tasks of one project in insertion order
    async fn list_tasks_for_project(&self, project_id: &str) -> Result<Vec<Task>, DatabaseError>;

    /// Unassigned tasks of one project in insertion order
    async fn list_unassigned_tasks(&self, project_id: &str) -> Result<Vec<Task>, DatabaseError>;

    /// Tasks of one project assigned to one member, in insertion order
    async fn list_tasks_for_member(
        &self,
        project_id: &str,
        member_id: &str,
    ) -> Result<Vec<Task>, DatabaseError>;

    async fn delete_task(&self, id: &str) -> Result<bool, DatabaseError>;

    /// Store the advisor-produced tech stack payload and refresh the task's
    /// update timestamp. Returns false if the id was unknown.
    async fn set_task_tech_stack(
        &self,
        id: &str,
        stack: &serde_json::Value,
    ) -> Result<bool, DatabaseError>;

    //
    // PROJECT MEMBERSHIP
    //

    /// Link a member to a project. Idempotent: an existing (project, member)
    /// pair is returned unchanged.
    async fn link_member(
        &self,
        project_id: &str,
        member_id: &str,
    ) -> Result<ProjectMember, DatabaseError>;

    /// Remove a membership link. Returns false if no such link existed.
    async fn unlink_member(&self, project_id: &str, member_id: &str)
        -> Result<bool, DatabaseError>;

    /// Links of one project in insertion order
    async fn list_project_members(
        &self,
        project_id: &str,
    ) -> Result<Vec<ProjectMember>, DatabaseError>;

    //
    // ASSIGNMENT APPLICATION
    //

    /// Apply a validated advisor proposal in one transaction: create missing
    /// membership links for `team`, set `assigned_to` for each
    /// (task id, member id) pair, and refresh task update timestamps.
    async fn apply_assignments(
        &self,
        project_id: &str,
        team: &[String],
        assignments: &[(String, String)],
    ) -> Result<(), DatabaseError>;

    //
    // MINDMAP GRAPH
    //

    /// Atomically discard the synchronized part of the graph (every node
    /// with an `entity_type`, plus any connection touching one) and write a
    /// new generation. Standalone nodes and their connections survive. No
    /// reader ever observes a half-cleared graph; on failure the previous
    /// generation stays in place.
    async fn replace_graph(&self, layout: &MindmapLayout) -> Result<(), DatabaseError>;

    /// Current graph: the last synchronized generation plus standalone rows
    async fn list_graph(&self) -> Result<MindmapLayout, DatabaseError>;

    //
    // STANDALONE NODES AND CONNECTIONS
    //

    /// Insert a standalone node, allocating its id from the standalone
    /// range so synchronized ids never collide with it
    async fn create_node(
        &self,
        x: f64,
        y: f64,
        text: &str,
        level: i64,
    ) -> Result<MindmapNode, DatabaseError>;

    /// Write the mutable fields of an existing node (merge happens in the
    /// service layer)
    async fn update_node(&self, node: MindmapNode) -> Result<MindmapNode, DatabaseError>;

    async fn get_node(&self, id: i64) -> Result<Option<MindmapNode>, DatabaseError>;

    /// Delete a node together with every connection touching it.
    /// Returns false if the id was unknown.
    async fn delete_node(&self, id: i64) -> Result<bool, DatabaseError>;

    /// Connect two nodes. Idempotent: an existing (from, to) pair is
    /// returned unchanged instead of duplicated.
    async fn create_connection(
        &self,
        from_node: i64,
        to_node: i64,
    ) -> Result<MindmapConnection, DatabaseError>;

    /// Remove a connection. Returns false if the id was unknown.
    async fn delete_connection(&self, id: i64) -> Result<bool, DatabaseError>;

    //
    // HEALTH
    //

    /// Row counts per table
    async fn counts(&self) -> Result<EntityCounts, DatabaseError>;
}

/// Parse a stored timestamp - handles RFC3339 (what this crate writes) and
/// the bare SQLite CURRENT_TIMESTAMP format for data written out-of-band.
pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }

    Err(DatabaseError::sql_execution(format!(
        "Unable to parse timestamp '{}' as RFC3339 or SQLite format",
        s
    )))
}

/// Parse a stored priority string
pub(crate) fn parse_priority(s: &str) -> Result<TaskPriority, DatabaseError> {
    TaskPriority::parse(s)
        .map_err(|e| DatabaseError::sql_execution(format!("Invalid stored priority: {}", e)))
}
