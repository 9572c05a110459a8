//! Entity Service - CRUD Business Logic
//!
//! Validates and applies entity mutations, then triggers a mindmap rebuild.
//! The rebuild is best effort: a failed projection never rolls back the
//! entity mutation, it only clears the `synced` flag on the response so
//! clients know the graph may be stale.

use crate::db::EntityStore;
use crate::models::{
    MemberUpsert, Project, ProjectMember, ProjectUpsert, Task, TaskUpsert, TeamMember,
    ValidationError,
};
use crate::services::error::ServiceError;
use crate::services::mindmap_service::MindmapService;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

const DEFAULT_PROJECT_COLOR: &str = "#6366f1";
const DEFAULT_MEMBER_COLOR: &str = "#3b82f6";
const DEFAULT_MEMBER_AVATAR: &str = "👤";

/// A mutation result plus whether the graph projection caught up
#[derive(Debug, Serialize)]
pub struct Mutated<T> {
    #[serde(flatten)]
    pub record: T,
    pub synced: bool,
}

/// CRUD operations over projects, tasks, and team members
pub struct EntityService {
    store: Arc<dyn EntityStore>,
    mindmap: Arc<MindmapService>,
}

impl EntityService {
    pub fn new(store: Arc<dyn EntityStore>, mindmap: Arc<MindmapService>) -> Self {
        Self { store, mindmap }
    }

    /// Rebuild the graph after a mutation; report rather than propagate
    async fn sync_after_mutation(&self) -> bool {
        match self.mindmap.sync().await {
            Ok(_) => true,
            Err(e) => {
                warn!("Mindmap rebuild after mutation failed: {}", e);
                false
            }
        }
    }

    //
    // PROJECTS
    //

    pub async fn list_projects(&self) -> Result<Vec<Project>, ServiceError> {
        Ok(self.store.list_projects().await?)
    }

    pub async fn get_project(&self, id: &str) -> Result<Project, ServiceError> {
        self.store
            .get_project(id)
            .await?
            .ok_or_else(|| ServiceError::project_not_found(id))
    }

    /// Merge-or-insert a project by id
    pub async fn upsert_project(
        &self,
        upsert: ProjectUpsert,
    ) -> Result<Mutated<Project>, ServiceError> {
        let existing = match &upsert.id {
            Some(id) => self.store.get_project(id).await?,
            None => None,
        };

        let record = match existing {
            Some(mut project) => {
                if let Some(name) = upsert.name {
                    project.name = name;
                }
                if let Some(color) = upsert.color {
                    project.color = color;
                }
                if let Some(description) = upsert.description {
                    project.description = description;
                }
                project.updated_at = Utc::now();
                self.store.update_project(project).await?
            }
            None => {
                let name = upsert
                    .name
                    .ok_or_else(|| ValidationError::missing_field("name"))?;
                let mut project = Project::new(
                    name,
                    upsert.color.unwrap_or_else(|| DEFAULT_PROJECT_COLOR.to_string()),
                    upsert.description.unwrap_or_default(),
                );
                if let Some(id) = upsert.id {
                    project.id = id;
                }
                self.store.create_project(project).await?
            }
        };

        let synced = self.sync_after_mutation().await;
        Ok(Mutated { record, synced })
    }

    /// Delete a project, cascading its tasks and membership links.
    /// Returns whether the graph projection caught up.
    pub async fn delete_project(&self, id: &str) -> Result<bool, ServiceError> {
        if !self.store.delete_project(id).await? {
            return Err(ServiceError::project_not_found(id));
        }
        Ok(self.sync_after_mutation().await)
    }

    //
    // TEAM MEMBERS
    //

    pub async fn list_members(&self) -> Result<Vec<TeamMember>, ServiceError> {
        Ok(self.store.list_members().await?)
    }

    pub async fn get_member(&self, id: &str) -> Result<TeamMember, ServiceError> {
        self.store
            .get_member(id)
            .await?
            .ok_or_else(|| ServiceError::member_not_found(id))
    }

    /// Merge-or-insert a team member by id
    pub async fn upsert_member(
        &self,
        upsert: MemberUpsert,
    ) -> Result<Mutated<TeamMember>, ServiceError> {
        let existing = match &upsert.id {
            Some(id) => self.store.get_member(id).await?,
            None => None,
        };

        let record = match existing {
            Some(mut member) => {
                if let Some(name) = upsert.name {
                    member.name = name;
                }
                if let Some(role) = upsert.role {
                    member.role = role;
                }
                if let Some(avatar) = upsert.avatar {
                    member.avatar = avatar;
                }
                if let Some(color) = upsert.color {
                    member.color = color;
                }
                member.updated_at = Utc::now();
                self.store.update_member(member).await?
            }
            None => {
                let name = upsert
                    .name
                    .ok_or_else(|| ValidationError::missing_field("name"))?;
                let role = upsert
                    .role
                    .ok_or_else(|| ValidationError::missing_field("role"))?;
                let mut member = TeamMember::new(
                    name,
                    role,
                    upsert.avatar.unwrap_or_else(|| DEFAULT_MEMBER_AVATAR.to_string()),
                    upsert.color.unwrap_or_else(|| DEFAULT_MEMBER_COLOR.to_string()),
                );
                if let Some(id) = upsert.id {
                    member.id = id;
                }
                self.store.create_member(member).await?
            }
        };

        let synced = self.sync_after_mutation().await;
        Ok(Mutated { record, synced })
    }

    /// Delete a member; their task assignments revert to unassigned
    pub async fn delete_member(&self, id: &str) -> Result<bool, ServiceError> {
        if !self.store.delete_member(id).await? {
            return Err(ServiceError::member_not_found(id));
        }
        Ok(self.sync_after_mutation().await)
    }

    //
    // TASKS
    //

    pub async fn list_tasks(&self) -> Result<Vec<Task>, ServiceError> {
        Ok(self.store.list_tasks().await?)
    }

    pub async fn get_task(&self, id: &str) -> Result<Task, ServiceError> {
        self.store
            .get_task(id)
            .await?
            .ok_or_else(|| ServiceError::task_not_found(id))
    }

    /// Merge-or-insert a task by id, checking entity references
    pub async fn upsert_task(&self, upsert: TaskUpsert) -> Result<Mutated<Task>, ServiceError> {
        if let Some(project_id) = &upsert.project_id {
            if self.store.get_project(project_id).await?.is_none() {
                return Err(ServiceError::project_not_found(project_id));
            }
        }
        if let Some(Some(member_id)) = &upsert.assigned_to {
            if self.store.get_member(member_id).await?.is_none() {
                return Err(ServiceError::member_not_found(member_id));
            }
        }

        let existing = match &upsert.id {
            Some(id) => self.store.get_task(id).await?,
            None => None,
        };

        let record = match existing {
            Some(mut task) => {
                if let Some(title) = upsert.title {
                    task.title = title;
                }
                if let Some(priority) = upsert.priority {
                    task.priority = priority;
                }
                if let Some(deadline) = upsert.deadline {
                    task.deadline = deadline;
                }
                if let Some(project_id) = upsert.project_id {
                    task.project_id = project_id;
                }
                // An explicit null clears the assignment, an absent field
                // leaves it alone
                if let Some(assigned_to) = upsert.assigned_to {
                    task.assigned_to = assigned_to;
                }
                task.updated_at = Utc::now();
                self.store.update_task(task).await?
            }
            None => {
                let title = upsert
                    .title
                    .ok_or_else(|| ValidationError::missing_field("title"))?;
                let project_id = upsert
                    .project_id
                    .ok_or_else(|| ValidationError::missing_field("projectId"))?;
                let deadline = upsert
                    .deadline
                    .ok_or_else(|| ValidationError::missing_field("deadline"))?;
                let mut task = Task::new(
                    title,
                    upsert.priority.unwrap_or_default(),
                    deadline,
                    project_id,
                );
                if let Some(id) = upsert.id {
                    task.id = id;
                }
                task.assigned_to = upsert.assigned_to.flatten();
                self.store.create_task(task).await?
            }
        };

        let synced = self.sync_after_mutation().await;
        Ok(Mutated { record, synced })
    }

    pub async fn delete_task(&self, id: &str) -> Result<bool, ServiceError> {
        if !self.store.delete_task(id).await? {
            return Err(ServiceError::task_not_found(id));
        }
        Ok(self.sync_after_mutation().await)
    }

    //
    // PROJECT MEMBERSHIP
    //

    /// Resolve a project's linked members to full records
    pub async fn list_project_members(
        &self,
        project_id: &str,
    ) -> Result<Vec<TeamMember>, ServiceError> {
        if self.store.get_project(project_id).await?.is_none() {
            return Err(ServiceError::project_not_found(project_id));
        }
        let links = self.store.list_project_members(project_id).await?;
        let mut members = Vec::with_capacity(links.len());
        for link in links {
            if let Some(member) = self.store.get_member(&link.member_id).await? {
                members.push(member);
            }
        }
        Ok(members)
    }

    /// Link a member to a project; duplicates return the existing link
    pub async fn link_member(
        &self,
        project_id: &str,
        member_id: &str,
    ) -> Result<Mutated<ProjectMember>, ServiceError> {
        if self.store.get_project(project_id).await?.is_none() {
            return Err(ServiceError::project_not_found(project_id));
        }
        if self.store.get_member(member_id).await?.is_none() {
            return Err(ServiceError::member_not_found(member_id));
        }
        let record = self.store.link_member(project_id, member_id).await?;
        let synced = self.sync_after_mutation().await;
        Ok(Mutated { record, synced })
    }

    pub async fn unlink_member(
        &self,
        project_id: &str,
        member_id: &str,
    ) -> Result<bool, ServiceError> {
        if !self.store.unlink_member(project_id, member_id).await? {
            return Err(ServiceError::NotFound {
                kind: "Project membership",
                id: format!("{}/{}", project_id, member_id),
            });
        }
        Ok(self.sync_after_mutation().await)
    }
}
