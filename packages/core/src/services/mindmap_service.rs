//! Mindmap Synchronizer
//!
//! Rebuilds the derived mindmap graph from current entity data. The layout
//! itself is a pure function over (projects, tasks, members) so it can be
//! tested without a database; the service serializes rebuild passes and
//! commits each generation atomically through `EntityStore::replace_graph`.
//!
//! Layout geometry and node-id assignment are client-visible contract: the
//! dashboard renderer positions its canvas by these exact coordinates and
//! keys nodes by the dense sequential ids, so both are regenerated
//! deterministically on every pass.
//!
//! The service also owns the standalone node and connection surface:
//! user-created nodes without an entity tag, which rebuilds leave in place.

use crate::db::EntityStore;
use crate::models::{
    MindmapConnection, MindmapLayout, MindmapNode, NodeUpsert, Project, Task, TeamMember,
    ValidationError, NODE_LEVEL_MEMBER, NODE_LEVEL_PROJECT, NODE_LEVEL_TASK, NODE_LEVEL_TEAM,
};
use crate::services::error::ServiceError;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

const PROJECT_X: f64 = 150.0;
const TEAM_X: f64 = 550.0;
const MEMBER_X: f64 = 950.0;
const TASK_X: f64 = 1350.0;

const PROJECT_BASE_Y: f64 = 250.0;
const MEMBER_BASE_Y: f64 = 150.0;
const PROJECT_ROW_HEIGHT: f64 = 450.0;
const MEMBER_ROW_HEIGHT: f64 = 90.0;
const TASK_ROW_HEIGHT: f64 = 60.0;
const TASK_Y_OFFSET: f64 = -20.0;

const TITLE_MAX_CHARS: usize = 40;

/// Rebuilds the graph projection after entity mutations
pub struct MindmapService {
    store: Arc<dyn EntityStore>,
    // One rebuild at a time; concurrent passes would race on clear+insert
    sync_lock: Mutex<()>,
}

impl MindmapService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            sync_lock: Mutex::new(()),
        }
    }

    /// Rebuild the graph from current entity state
    pub async fn sync(&self) -> Result<MindmapLayout, ServiceError> {
        let _guard = self.sync_lock.lock().await;

        let projects = self.store.list_projects().await?;
        let tasks = self.store.list_tasks().await?;
        let members = self.store.list_members().await?;

        let layout = build_layout(&projects, &tasks, &members);
        self.store
            .replace_graph(&layout)
            .await
            .map_err(|e| ServiceError::sync_failed(e.to_string()))?;

        info!(
            nodes = layout.nodes.len(),
            connections = layout.connections.len(),
            "Mindmap rebuilt"
        );
        Ok(layout)
    }

    /// Read the last committed graph generation
    pub async fn layout(&self) -> Result<MindmapLayout, ServiceError> {
        Ok(self.store.list_graph().await?)
    }

    //
    // STANDALONE NODES AND CONNECTIONS
    //
    // User-draggable nodes without an entity tag. They live alongside the
    // synchronized generation but are never cleared by a rebuild, so these
    // paths do not take the sync lock.

    /// Create or move a standalone node
    pub async fn upsert_node(&self, upsert: NodeUpsert) -> Result<MindmapNode, ServiceError> {
        match upsert.id {
            Some(id) => {
                let mut node = self
                    .store
                    .get_node(id)
                    .await?
                    .ok_or_else(|| ServiceError::node_not_found(id))?;
                if node.entity_type.is_some() {
                    return Err(ValidationError::invalid_field(
                        "id",
                        "synchronized nodes are rebuilt from entity data and cannot be edited",
                    )
                    .into());
                }
                if let Some(x) = upsert.x {
                    node.x = x;
                }
                if let Some(y) = upsert.y {
                    node.y = y;
                }
                if let Some(text) = upsert.text {
                    node.text = text;
                }
                if let Some(level) = upsert.level {
                    node.level = level;
                }
                Ok(self.store.update_node(node).await?)
            }
            None => {
                let text = upsert
                    .text
                    .ok_or_else(|| ValidationError::missing_field("text"))?;
                Ok(self
                    .store
                    .create_node(
                        upsert.x.unwrap_or(0.0),
                        upsert.y.unwrap_or(0.0),
                        &text,
                        upsert.level.unwrap_or(0),
                    )
                    .await?)
            }
        }
    }

    pub async fn get_node(&self, id: i64) -> Result<MindmapNode, ServiceError> {
        self.store
            .get_node(id)
            .await?
            .ok_or_else(|| ServiceError::node_not_found(id))
    }

    /// Delete a standalone node and every connection touching it
    pub async fn delete_node(&self, id: i64) -> Result<(), ServiceError> {
        let node = self
            .store
            .get_node(id)
            .await?
            .ok_or_else(|| ServiceError::node_not_found(id))?;
        if node.entity_type.is_some() {
            return Err(ValidationError::invalid_field(
                "id",
                "synchronized nodes are rebuilt from entity data and cannot be deleted",
            )
            .into());
        }
        if !self.store.delete_node(id).await? {
            return Err(ServiceError::node_not_found(id));
        }
        Ok(())
    }

    /// Connect two nodes; a duplicate (from, to) pair returns the existing
    /// edge instead of a second one
    pub async fn create_connection(
        &self,
        from_node: i64,
        to_node: i64,
    ) -> Result<MindmapConnection, ServiceError> {
        for id in [from_node, to_node] {
            if self.store.get_node(id).await?.is_none() {
                return Err(ServiceError::node_not_found(id));
            }
        }
        Ok(self.store.create_connection(from_node, to_node).await?)
    }

    pub async fn delete_connection(&self, id: i64) -> Result<(), ServiceError> {
        if !self.store.delete_connection(id).await? {
            return Err(ServiceError::connection_not_found(id));
        }
        Ok(())
    }
}

/// Compute the full graph for the given entity snapshot.
///
/// Emission order (which also fixes node ids): all project nodes first, then
/// per project the team grouping node, its assigned members sorted by member
/// id, and each member's tasks in store enumeration order.
pub fn build_layout(projects: &[Project], tasks: &[Task], members: &[TeamMember]) -> MindmapLayout {
    let mut nodes = Vec::new();
    let mut connections = Vec::new();
    let mut next_node_id: i64 = 0;
    let mut next_connection_id: i64 = 0;

    let mut project_node_ids = Vec::with_capacity(projects.len());
    for (project_index, project) in projects.iter().enumerate() {
        let y = PROJECT_BASE_Y + PROJECT_ROW_HEIGHT * project_index as f64;
        project_node_ids.push(next_node_id);
        nodes.push(MindmapNode {
            id: next_node_id,
            x: PROJECT_X,
            y,
            text: project.name.clone(),
            level: NODE_LEVEL_PROJECT,
            entity_type: Some("project".to_string()),
            entity_id: Some(project.id.clone()),
        });
        next_node_id += 1;
    }

    for (project_index, project) in projects.iter().enumerate() {
        let project_tasks: Vec<&Task> = tasks
            .iter()
            .filter(|t| t.project_id == project.id)
            .collect();

        // Distinct assigned members, ascending by id for a stable tie-break
        let assigned_ids: BTreeSet<&str> = project_tasks
            .iter()
            .filter_map(|t| t.assigned_to.as_deref())
            .collect();
        if assigned_ids.is_empty() {
            debug!(project = %project.id, "No assigned members, skipping subtree");
            continue;
        }

        let project_y = PROJECT_BASE_Y + PROJECT_ROW_HEIGHT * project_index as f64;
        let team_node_id = next_node_id;
        nodes.push(MindmapNode {
            id: team_node_id,
            x: TEAM_X,
            y: project_y,
            text: "Team Members".to_string(),
            level: NODE_LEVEL_TEAM,
            // Tagged so the next rebuild reclaims it; it references no
            // single entity
            entity_type: Some("team".to_string()),
            entity_id: None,
        });
        next_node_id += 1;
        connections.push(MindmapConnection {
            id: next_connection_id,
            from_node: project_node_ids[project_index],
            to_node: team_node_id,
        });
        next_connection_id += 1;

        for (member_index, member_id) in assigned_ids.iter().enumerate() {
            let Some(member) = members.iter().find(|m| m.id == *member_id) else {
                continue;
            };

            let member_y = MEMBER_BASE_Y
                + PROJECT_ROW_HEIGHT * project_index as f64
                + MEMBER_ROW_HEIGHT * member_index as f64;
            let member_node_id = next_node_id;
            nodes.push(MindmapNode {
                id: member_node_id,
                x: MEMBER_X,
                y: member_y,
                text: format!("{} - {}", member.name, member.role),
                level: NODE_LEVEL_MEMBER,
                entity_type: Some("member".to_string()),
                entity_id: Some(member.id.clone()),
            });
            next_node_id += 1;
            connections.push(MindmapConnection {
                id: next_connection_id,
                from_node: team_node_id,
                to_node: member_node_id,
            });
            next_connection_id += 1;

            let member_tasks = project_tasks
                .iter()
                .filter(|t| t.assigned_to.as_deref() == Some(*member_id));
            for (task_index, task) in member_tasks.enumerate() {
                let task_node_id = next_node_id;
                nodes.push(MindmapNode {
                    id: task_node_id,
                    x: TASK_X,
                    y: member_y + TASK_ROW_HEIGHT * task_index as f64 + TASK_Y_OFFSET,
                    text: truncate_title(&task.title),
                    level: NODE_LEVEL_TASK,
                    entity_type: Some("task".to_string()),
                    entity_id: Some(task.id.clone()),
                });
                next_node_id += 1;
                connections.push(MindmapConnection {
                    id: next_connection_id,
                    from_node: member_node_id,
                    to_node: task_node_id,
                });
                next_connection_id += 1;
            }
        }
    }

    MindmapLayout { nodes, connections }
}

fn truncate_title(title: &str) -> String {
    let mut chars = title.chars();
    let truncated: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", truncated)
    } else {
        truncated
    }
}
