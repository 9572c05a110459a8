//! SqliteStore - EntityStore Implementation for the libsql Backend
//!
//! Wraps `DatabaseService` and implements the `EntityStore` trait with
//! straight SQL. Row-to-model conversion is centralized here; the multi-step
//! operations (`replace_graph`, `apply_assignments`) run inside explicit
//! transactions so a failure never leaves partial state behind.

use crate::db::entity_store::{parse_priority, parse_timestamp, EntityCounts, EntityStore};
use crate::db::{DatabaseError, DatabaseService};
use crate::models::{
    MindmapConnection, MindmapLayout, MindmapNode, Project, ProjectMember, Task, TeamMember,
};
use async_trait::async_trait;
use chrono::Utc;
use libsql::Row;
use std::sync::Arc;

/// Standalone nodes and connections allocate ids at or above this base, so
/// the synchronizer's dense ids (counted up from 0) never collide with them.
const STANDALONE_ID_BASE: i64 = 1_000_000;

/// libsql-backed implementation of `EntityStore`
pub struct SqliteStore {
    db: Arc<DatabaseService>,
}

impl SqliteStore {
    /// Create a new store over an initialized database service
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    fn row_to_project(row: &Row) -> Result<Project, DatabaseError> {
        let created_at: String = row.get(4).map_err(DatabaseError::LibsqlError)?;
        let updated_at: String = row.get(5).map_err(DatabaseError::LibsqlError)?;
        Ok(Project {
            id: row.get(0).map_err(DatabaseError::LibsqlError)?,
            name: row.get(1).map_err(DatabaseError::LibsqlError)?,
            color: row.get(2).map_err(DatabaseError::LibsqlError)?,
            description: row.get(3).map_err(DatabaseError::LibsqlError)?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }

    fn row_to_member(row: &Row) -> Result<TeamMember, DatabaseError> {
        let created_at: String = row.get(5).map_err(DatabaseError::LibsqlError)?;
        let updated_at: String = row.get(6).map_err(DatabaseError::LibsqlError)?;
        Ok(TeamMember {
            id: row.get(0).map_err(DatabaseError::LibsqlError)?,
            name: row.get(1).map_err(DatabaseError::LibsqlError)?,
            role: row.get(2).map_err(DatabaseError::LibsqlError)?,
            avatar: row.get(3).map_err(DatabaseError::LibsqlError)?,
            color: row.get(4).map_err(DatabaseError::LibsqlError)?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }

    fn row_to_task(row: &Row) -> Result<Task, DatabaseError> {
        let priority: String = row.get(2).map_err(DatabaseError::LibsqlError)?;
        let tech_stack_json: Option<String> = row.get(6).map_err(DatabaseError::LibsqlError)?;
        let created_at: String = row.get(7).map_err(DatabaseError::LibsqlError)?;
        let updated_at: String = row.get(8).map_err(DatabaseError::LibsqlError)?;

        let tech_stack = match tech_stack_json {
            Some(json) => Some(serde_json::from_str(&json).map_err(|e| {
                DatabaseError::sql_execution(format!("Invalid stored tech_stack JSON: {}", e))
            })?),
            None => None,
        };

        Ok(Task {
            id: row.get(0).map_err(DatabaseError::LibsqlError)?,
            title: row.get(1).map_err(DatabaseError::LibsqlError)?,
            priority: parse_priority(&priority)?,
            deadline: row.get(3).map_err(DatabaseError::LibsqlError)?,
            project_id: row.get(4).map_err(DatabaseError::LibsqlError)?,
            assigned_to: row.get(5).map_err(DatabaseError::LibsqlError)?,
            tech_stack,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }

    fn row_to_node(row: &Row) -> Result<MindmapNode, DatabaseError> {
        Ok(MindmapNode {
            id: row.get(0).map_err(DatabaseError::LibsqlError)?,
            x: row.get(1).map_err(DatabaseError::LibsqlError)?,
            y: row.get(2).map_err(DatabaseError::LibsqlError)?,
            text: row.get(3).map_err(DatabaseError::LibsqlError)?,
            level: row.get(4).map_err(DatabaseError::LibsqlError)?,
            entity_type: row.get(5).map_err(DatabaseError::LibsqlError)?,
            entity_id: row.get(6).map_err(DatabaseError::LibsqlError)?,
        })
    }

    /// Next free id in the standalone range of `table`
    async fn next_standalone_id(
        conn: &libsql::Connection,
        table: &str,
    ) -> Result<i64, DatabaseError> {
        // Table names come from a fixed internal list, never from input
        let sql = format!(
            "SELECT COALESCE(MAX(id) + 1, {base}) FROM {table} WHERE id >= {base}",
            base = STANDALONE_ID_BASE,
            table = table
        );
        let mut stmt = conn.prepare(&sql).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to prepare id allocation: {}", e))
        })?;
        let mut rows = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to allocate standalone id: {}", e))
        })?;
        let row = rows
            .next()
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to allocate standalone id: {}", e))
            })?
            .ok_or_else(|| {
                DatabaseError::sql_execution(format!("Id allocation returned no row for {}", table))
            })?;
        row.get(0).map_err(DatabaseError::LibsqlError)
    }

    fn row_to_link(row: &Row) -> Result<ProjectMember, DatabaseError> {
        let created_at: String = row.get(2).map_err(DatabaseError::LibsqlError)?;
        Ok(ProjectMember {
            project_id: row.get(0).map_err(DatabaseError::LibsqlError)?,
            member_id: row.get(1).map_err(DatabaseError::LibsqlError)?,
            created_at: parse_timestamp(&created_at)?,
        })
    }

    async fn query_tasks(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Task>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut stmt = conn
            .prepare(sql)
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to prepare task query: {}", e)))?;
        let mut rows = stmt
            .query(params)
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to query tasks: {}", e)))?;

        let mut tasks = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to read task row: {}", e)))?
        {
            tasks.push(Self::row_to_task(&row)?);
        }
        Ok(tasks)
    }

    async fn count_table(
        conn: &libsql::Connection,
        table: &str,
    ) -> Result<u64, DatabaseError> {
        // Table names come from a fixed internal list, never from input
        let mut stmt = conn
            .prepare(&format!("SELECT COUNT(*) FROM {}", table))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to count {}: {}", table, e))
            })?;
        let mut rows = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to count {}: {}", table, e))
        })?;
        let row = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to count {}: {}", table, e)))?
            .ok_or_else(|| {
                DatabaseError::sql_execution(format!("COUNT(*) returned no row for {}", table))
            })?;
        let count: i64 = row.get(0).map_err(DatabaseError::LibsqlError)?;
        Ok(count as u64)
    }
}

const SELECT_TASK_COLUMNS: &str =
    "SELECT id, title, priority, deadline, project_id, assigned_to, tech_stack,
            created_at, updated_at
     FROM tasks";

#[async_trait]
impl EntityStore for SqliteStore {
    //
    // PROJECTS
    //

    async fn create_project(&self, project: Project) -> Result<Project, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "INSERT INTO projects (id, name, color, description, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                project.id.as_str(),
                project.name.as_str(),
                project.color.as_str(),
                project.description.as_str(),
                project.created_at.to_rfc3339(),
                project.updated_at.to_rfc3339(),
            ),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert project: {}", e)))?;
        Ok(project)
    }

    async fn update_project(&self, project: Project) -> Result<Project, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "UPDATE projects SET name = ?, color = ?, description = ?, updated_at = ?
             WHERE id = ?",
            (
                project.name.as_str(),
                project.color.as_str(),
                project.description.as_str(),
                project.updated_at.to_rfc3339(),
                project.id.as_str(),
            ),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to update project: {}", e)))?;
        Ok(project)
    }

    async fn get_project(&self, id: &str) -> Result<Option<Project>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut stmt = conn
            .prepare(
                "SELECT id, name, color, description, created_at, updated_at
                 FROM projects WHERE id = ?",
            )
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to prepare get_project: {}", e)))?;
        let mut rows = stmt
            .query([id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to get project: {}", e)))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to read project row: {}", e)))?
        {
            Some(row) => Ok(Some(Self::row_to_project(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_projects(&self) -> Result<Vec<Project>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut stmt = conn
            .prepare(
                "SELECT id, name, color, description, created_at, updated_at
                 FROM projects ORDER BY created_at, id",
            )
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to prepare list_projects: {}", e)))?;
        let mut rows = stmt
            .query(())
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to list projects: {}", e)))?;

        let mut projects = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to read project row: {}", e)))?
        {
            projects.push(Self::row_to_project(&row)?);
        }
        Ok(projects)
    }

    async fn delete_project(&self, id: &str) -> Result<bool, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        // ON DELETE CASCADE removes the project's tasks and membership links
        let affected = conn
            .execute("DELETE FROM projects WHERE id = ?", [id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to delete project: {}", e)))?;
        Ok(affected > 0)
    }

    //
    // TEAM MEMBERS
    //

    async fn create_member(&self, member: TeamMember) -> Result<TeamMember, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "INSERT INTO team_members (id, name, role, avatar, color, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                member.id.as_str(),
                member.name.as_str(),
                member.role.as_str(),
                member.avatar.as_str(),
                member.color.as_str(),
                member.created_at.to_rfc3339(),
                member.updated_at.to_rfc3339(),
            ),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert member: {}", e)))?;
        Ok(member)
    }

    async fn update_member(&self, member: TeamMember) -> Result<TeamMember, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "UPDATE team_members SET name = ?, role = ?, avatar = ?, color = ?, updated_at = ?
             WHERE id = ?",
            (
                member.name.as_str(),
                member.role.as_str(),
                member.avatar.as_str(),
                member.color.as_str(),
                member.updated_at.to_rfc3339(),
                member.id.as_str(),
            ),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to update member: {}", e)))?;
        Ok(member)
    }

    async fn get_member(&self, id: &str) -> Result<Option<TeamMember>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut stmt = conn
            .prepare(
                "SELECT id, name, role, avatar, color, created_at, updated_at
                 FROM team_members WHERE id = ?",
            )
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to prepare get_member: {}", e)))?;
        let mut rows = stmt
            .query([id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to get member: {}", e)))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to read member row: {}", e)))?
        {
            Some(row) => Ok(Some(Self::row_to_member(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_members(&self) -> Result<Vec<TeamMember>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut stmt = conn
            .prepare(
                "SELECT id, name, role, avatar, color, created_at, updated_at
                 FROM team_members ORDER BY created_at, id",
            )
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to prepare list_members: {}", e)))?;
        let mut rows = stmt
            .query(())
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to list members: {}", e)))?;

        let mut members = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to read member row: {}", e)))?
        {
            members.push(Self::row_to_member(&row)?);
        }
        Ok(members)
    }

    async fn delete_member(&self, id: &str) -> Result<bool, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        // ON DELETE SET NULL clears task assignments; links cascade away
        let affected = conn
            .execute("DELETE FROM team_members WHERE id = ?", [id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to delete member: {}", e)))?;
        Ok(affected > 0)
    }

    //
    // TASKS
    //

    async fn create_task(&self, task: Task) -> Result<Task, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let tech_stack_json = task
            .tech_stack
            .as_ref()
            .map(|v| v.to_string());
        conn.execute(
            "INSERT INTO tasks (id, title, priority, deadline, project_id, assigned_to,
                                tech_stack, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                task.id.as_str(),
                task.title.as_str(),
                task.priority.as_str(),
                task.deadline.as_str(),
                task.project_id.as_str(),
                task.assigned_to.as_deref(),
                tech_stack_json.as_deref(),
                task.created_at.to_rfc3339(),
                task.updated_at.to_rfc3339(),
            ),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert task: {}", e)))?;
        Ok(task)
    }

    async fn update_task(&self, task: Task) -> Result<Task, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let tech_stack_json = task
            .tech_stack
            .as_ref()
            .map(|v| v.to_string());
        conn.execute(
            "UPDATE tasks SET title = ?, priority = ?, deadline = ?, project_id = ?,
                              assigned_to = ?, tech_stack = ?, updated_at = ?
             WHERE id = ?",
            (
                task.title.as_str(),
                task.priority.as_str(),
                task.deadline.as_str(),
                task.project_id.as_str(),
                task.assigned_to.as_deref(),
                tech_stack_json.as_deref(),
                task.updated_at.to_rfc3339(),
                task.id.as_str(),
            ),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to update task: {}", e)))?;
        Ok(task)
    }

    async fn get_task(&self, id: &str) -> Result<Option<Task>, DatabaseError> {
        let mut tasks = self
            .query_tasks(&format!("{} WHERE id = ?", SELECT_TASK_COLUMNS), [id])
            .await?;
        Ok(tasks.pop())
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, DatabaseError> {
        self.query_tasks(
            &format!("{} ORDER BY created_at, id", SELECT_TASK_COLUMNS),
            (),
        )
        .await
    }

    async fn list_tasks_for_project(&self, project_id: &str) -> Result<Vec<Task>, DatabaseError> {
        self.query_tasks(
            &format!(
                "{} WHERE project_id = ? ORDER BY created_at, id",
                SELECT_TASK_COLUMNS
            ),
            [project_id],
        )
        .await
    }

    async fn list_unassigned_tasks(&self, project_id: &str) -> Result<Vec<Task>, DatabaseError> {
        self.query_tasks(
            &format!(
                "{} WHERE project_id = ? AND assigned_to IS NULL ORDER BY created_at, id",
                SELECT_TASK_COLUMNS
            ),
            [project_id],
        )
        .await
    }

    async fn list_tasks_for_member(
        &self,
        project_id: &str,
        member_id: &str,
    ) -> Result<Vec<Task>, DatabaseError> {
        self.query_tasks(
            &format!(
                "{} WHERE project_id = ? AND assigned_to = ? ORDER BY created_at, id",
                SELECT_TASK_COLUMNS
            ),
            [project_id, member_id],
        )
        .await
    }

    async fn delete_task(&self, id: &str) -> Result<bool, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let affected = conn
            .execute("DELETE FROM tasks WHERE id = ?", [id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to delete task: {}", e)))?;
        Ok(affected > 0)
    }

    async fn set_task_tech_stack(
        &self,
        id: &str,
        stack: &serde_json::Value,
    ) -> Result<bool, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let affected = conn
            .execute(
                "UPDATE tasks SET tech_stack = ?, updated_at = ? WHERE id = ?",
                (stack.to_string(), Utc::now().to_rfc3339(), id),
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to set task tech stack: {}", e))
            })?;
        Ok(affected > 0)
    }

    //
    // PROJECT MEMBERSHIP
    //

    async fn link_member(
        &self,
        project_id: &str,
        member_id: &str,
    ) -> Result<ProjectMember, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        // Idempotent on the (project, member) primary key
        conn.execute(
            "INSERT OR IGNORE INTO project_members (project_id, member_id, created_at)
             VALUES (?, ?, ?)",
            (project_id, member_id, Utc::now().to_rfc3339()),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to link member: {}", e)))?;

        let mut stmt = conn
            .prepare(
                "SELECT project_id, member_id, created_at FROM project_members
                 WHERE project_id = ? AND member_id = ?",
            )
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to prepare link lookup: {}", e)))?;
        let mut rows = stmt
            .query([project_id, member_id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to read link: {}", e)))?;
        let row = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to read link row: {}", e)))?
            .ok_or_else(|| {
                DatabaseError::sql_execution("Membership link missing after insert".to_string())
            })?;
        Self::row_to_link(&row)
    }

    async fn unlink_member(
        &self,
        project_id: &str,
        member_id: &str,
    ) -> Result<bool, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let affected = conn
            .execute(
                "DELETE FROM project_members WHERE project_id = ? AND member_id = ?",
                [project_id, member_id],
            )
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to unlink member: {}", e)))?;
        Ok(affected > 0)
    }

    async fn list_project_members(
        &self,
        project_id: &str,
    ) -> Result<Vec<ProjectMember>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut stmt = conn
            .prepare(
                "SELECT project_id, member_id, created_at FROM project_members
                 WHERE project_id = ? ORDER BY created_at, member_id",
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare list_project_members: {}", e))
            })?;
        let mut rows = stmt
            .query([project_id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to list links: {}", e)))?;

        let mut links = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to read link row: {}", e)))?
        {
            links.push(Self::row_to_link(&row)?);
        }
        Ok(links)
    }

    //
    // ASSIGNMENT APPLICATION
    //

    async fn apply_assignments(
        &self,
        project_id: &str,
        team: &[String],
        assignments: &[(String, String)],
    ) -> Result<(), DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let now = Utc::now().to_rfc3339();

        conn.execute("BEGIN IMMEDIATE", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to begin transaction: {}", e))
        })?;

        for member_id in team {
            if let Err(e) = conn
                .execute(
                    "INSERT OR IGNORE INTO project_members (project_id, member_id, created_at)
                     VALUES (?, ?, ?)",
                    (project_id, member_id.as_str(), now.as_str()),
                )
                .await
            {
                let _rollback = conn.execute("ROLLBACK", ()).await;
                return Err(DatabaseError::sql_execution(format!(
                    "Failed to link member {}: {}",
                    member_id, e
                )));
            }
        }

        for (task_id, member_id) in assignments {
            // The IS NULL guard rejects tasks assigned concurrently between
            // proposal validation and this transaction
            let result = conn
                .execute(
                    "UPDATE tasks SET assigned_to = ?, updated_at = ?
                     WHERE id = ? AND project_id = ? AND assigned_to IS NULL",
                    (member_id.as_str(), now.as_str(), task_id.as_str(), project_id),
                )
                .await;
            match result {
                Ok(affected) if affected > 0 => {}
                Ok(_) => {
                    let _rollback = conn.execute("ROLLBACK", ()).await;
                    return Err(DatabaseError::sql_execution(format!(
                        "Task {} in project {} is missing or already assigned",
                        task_id, project_id
                    )));
                }
                Err(e) => {
                    let _rollback = conn.execute("ROLLBACK", ()).await;
                    return Err(DatabaseError::sql_execution(format!(
                        "Failed to assign task {}: {}",
                        task_id, e
                    )));
                }
            }
        }

        conn.execute("COMMIT", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to commit assignments: {}", e))
        })?;

        Ok(())
    }

    //
    // MINDMAP GRAPH
    //

    async fn replace_graph(&self, layout: &MindmapLayout) -> Result<(), DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;

        conn.execute("BEGIN IMMEDIATE", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to begin transaction: {}", e))
        })?;

        // Clear only what the synchronizer owns: entity-tagged nodes and any
        // connection touching one. Standalone rows survive the rebuild.
        for sql in [
            "DELETE FROM mindmap_connections
             WHERE from_node IN (SELECT id FROM mindmap_nodes WHERE entity_type IS NOT NULL)
                OR to_node IN (SELECT id FROM mindmap_nodes WHERE entity_type IS NOT NULL)",
            "DELETE FROM mindmap_nodes WHERE entity_type IS NOT NULL",
        ] {
            if let Err(e) = conn.execute(sql, ()).await {
                let _rollback = conn.execute("ROLLBACK", ()).await;
                return Err(DatabaseError::sql_execution(format!(
                    "Failed to clear graph: {}",
                    e
                )));
            }
        }

        for node in &layout.nodes {
            if let Err(e) = conn
                .execute(
                    "INSERT INTO mindmap_nodes (id, x, y, text, level, entity_type, entity_id)
                     VALUES (?, ?, ?, ?, ?, ?, ?)",
                    (
                        node.id,
                        node.x,
                        node.y,
                        node.text.as_str(),
                        node.level,
                        node.entity_type.as_deref(),
                        node.entity_id.as_deref(),
                    ),
                )
                .await
            {
                let _rollback = conn.execute("ROLLBACK", ()).await;
                return Err(DatabaseError::sql_execution(format!(
                    "Failed to insert mindmap node {}: {}",
                    node.id, e
                )));
            }
        }

        for connection in &layout.connections {
            if let Err(e) = conn
                .execute(
                    "INSERT INTO mindmap_connections (id, from_node, to_node) VALUES (?, ?, ?)",
                    (connection.id, connection.from_node, connection.to_node),
                )
                .await
            {
                let _rollback = conn.execute("ROLLBACK", ()).await;
                return Err(DatabaseError::sql_execution(format!(
                    "Failed to insert mindmap connection {}: {}",
                    connection.id, e
                )));
            }
        }

        conn.execute("COMMIT", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to commit graph: {}", e))
        })?;

        Ok(())
    }

    async fn list_graph(&self) -> Result<MindmapLayout, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(
                "SELECT id, x, y, text, level, entity_type, entity_id
                 FROM mindmap_nodes ORDER BY id",
            )
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to prepare node query: {}", e)))?;
        let mut rows = stmt
            .query(())
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to query nodes: {}", e)))?;

        let mut nodes = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to read node row: {}", e)))?
        {
            nodes.push(Self::row_to_node(&row)?);
        }

        let mut stmt = conn
            .prepare(
                "SELECT id, from_node, to_node FROM mindmap_connections ORDER BY id",
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare connection query: {}", e))
            })?;
        let mut rows = stmt
            .query(())
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to query connections: {}", e)))?;

        let mut connections = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to read connection row: {}", e))
            })?
        {
            connections.push(MindmapConnection {
                id: row.get(0).map_err(DatabaseError::LibsqlError)?,
                from_node: row.get(1).map_err(DatabaseError::LibsqlError)?,
                to_node: row.get(2).map_err(DatabaseError::LibsqlError)?,
            });
        }

        Ok(MindmapLayout { nodes, connections })
    }

    //
    // STANDALONE NODES AND CONNECTIONS
    //

    async fn create_node(
        &self,
        x: f64,
        y: f64,
        text: &str,
        level: i64,
    ) -> Result<MindmapNode, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;

        // Id allocation and insert must be one write transaction, or two
        // concurrent creates could pick the same id
        conn.execute("BEGIN IMMEDIATE", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to begin transaction: {}", e))
        })?;

        let id = match Self::next_standalone_id(&conn, "mindmap_nodes").await {
            Ok(id) => id,
            Err(e) => {
                let _rollback = conn.execute("ROLLBACK", ()).await;
                return Err(e);
            }
        };

        if let Err(e) = conn
            .execute(
                "INSERT INTO mindmap_nodes (id, x, y, text, level, entity_type, entity_id)
                 VALUES (?, ?, ?, ?, ?, NULL, NULL)",
                (id, x, y, text, level),
            )
            .await
        {
            let _rollback = conn.execute("ROLLBACK", ()).await;
            return Err(DatabaseError::sql_execution(format!(
                "Failed to insert node: {}",
                e
            )));
        }

        conn.execute("COMMIT", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to commit node insert: {}", e))
        })?;

        Ok(MindmapNode {
            id,
            x,
            y,
            text: text.to_string(),
            level,
            entity_type: None,
            entity_id: None,
        })
    }

    async fn update_node(&self, node: MindmapNode) -> Result<MindmapNode, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "UPDATE mindmap_nodes SET x = ?, y = ?, text = ?, level = ? WHERE id = ?",
            (node.x, node.y, node.text.as_str(), node.level, node.id),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to update node: {}", e)))?;
        Ok(node)
    }

    async fn get_node(&self, id: i64) -> Result<Option<MindmapNode>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut stmt = conn
            .prepare(
                "SELECT id, x, y, text, level, entity_type, entity_id
                 FROM mindmap_nodes WHERE id = ?",
            )
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to prepare get_node: {}", e)))?;
        let mut rows = stmt
            .query([id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to get node: {}", e)))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to read node row: {}", e)))?
        {
            Some(row) => Ok(Some(Self::row_to_node(&row)?)),
            None => Ok(None),
        }
    }

    async fn delete_node(&self, id: i64) -> Result<bool, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;

        conn.execute("BEGIN IMMEDIATE", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to begin transaction: {}", e))
        })?;

        // Connections dangling off the node go with it
        if let Err(e) = conn
            .execute(
                "DELETE FROM mindmap_connections WHERE from_node = ? OR to_node = ?",
                [id, id],
            )
            .await
        {
            let _rollback = conn.execute("ROLLBACK", ()).await;
            return Err(DatabaseError::sql_execution(format!(
                "Failed to delete node connections: {}",
                e
            )));
        }

        let affected = match conn
            .execute("DELETE FROM mindmap_nodes WHERE id = ?", [id])
            .await
        {
            Ok(affected) => affected,
            Err(e) => {
                let _rollback = conn.execute("ROLLBACK", ()).await;
                return Err(DatabaseError::sql_execution(format!(
                    "Failed to delete node: {}",
                    e
                )));
            }
        };

        conn.execute("COMMIT", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to commit node delete: {}", e))
        })?;

        Ok(affected > 0)
    }

    async fn create_connection(
        &self,
        from_node: i64,
        to_node: i64,
    ) -> Result<MindmapConnection, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;

        conn.execute("BEGIN IMMEDIATE", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to begin transaction: {}", e))
        })?;

        // Dedup on the (from, to) pair: a repeat request returns the
        // existing edge
        let existing = async {
            let mut stmt = conn
                .prepare(
                    "SELECT id, from_node, to_node FROM mindmap_connections
                     WHERE from_node = ? AND to_node = ?",
                )
                .await
                .map_err(|e| {
                    DatabaseError::sql_execution(format!(
                        "Failed to prepare connection lookup: {}",
                        e
                    ))
                })?;
            let mut rows = stmt.query([from_node, to_node]).await.map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to look up connection: {}", e))
            })?;
            match rows.next().await.map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to read connection row: {}", e))
            })? {
                Some(row) => Ok(Some(MindmapConnection {
                    id: row.get(0).map_err(DatabaseError::LibsqlError)?,
                    from_node: row.get(1).map_err(DatabaseError::LibsqlError)?,
                    to_node: row.get(2).map_err(DatabaseError::LibsqlError)?,
                })),
                None => Ok(None),
            }
        }
        .await;

        match existing {
            Ok(Some(connection)) => {
                let _rollback = conn.execute("ROLLBACK", ()).await;
                return Ok(connection);
            }
            Ok(None) => {}
            Err(e) => {
                let _rollback = conn.execute("ROLLBACK", ()).await;
                return Err(e);
            }
        }

        let id = match Self::next_standalone_id(&conn, "mindmap_connections").await {
            Ok(id) => id,
            Err(e) => {
                let _rollback = conn.execute("ROLLBACK", ()).await;
                return Err(e);
            }
        };

        if let Err(e) = conn
            .execute(
                "INSERT INTO mindmap_connections (id, from_node, to_node) VALUES (?, ?, ?)",
                (id, from_node, to_node),
            )
            .await
        {
            let _rollback = conn.execute("ROLLBACK", ()).await;
            return Err(DatabaseError::sql_execution(format!(
                "Failed to insert connection: {}",
                e
            )));
        }

        conn.execute("COMMIT", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to commit connection insert: {}", e))
        })?;

        Ok(MindmapConnection {
            id,
            from_node,
            to_node,
        })
    }

    async fn delete_connection(&self, id: i64) -> Result<bool, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let affected = conn
            .execute("DELETE FROM mindmap_connections WHERE id = ?", [id])
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to delete connection: {}", e))
            })?;
        Ok(affected > 0)
    }

    //
    // HEALTH
    //

    async fn counts(&self) -> Result<EntityCounts, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        Ok(EntityCounts {
            projects: Self::count_table(&conn, "projects").await?,
            team_members: Self::count_table(&conn, "team_members").await?,
            tasks: Self::count_table(&conn, "tasks").await?,
            project_members: Self::count_table(&conn, "project_members").await?,
            mindmap_nodes: Self::count_table(&conn, "mindmap_nodes").await?,
            mindmap_connections: Self::count_table(&conn, "mindmap_connections").await?,
        })
    }
}
