//! Integration tests for CRUD, cascades, and reference checks

use crate::db::{DatabaseService, EntityStore, SqliteStore};
use crate::models::{MemberUpsert, ProjectUpsert, TaskPriority, TaskUpsert};
use crate::services::entity_service::EntityService;
use crate::services::error::ServiceError;
use crate::services::mindmap_service::MindmapService;
use std::sync::Arc;
use tempfile::TempDir;

async fn fixture() -> (TempDir, Arc<SqliteStore>, EntityService) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");
    let db = DatabaseService::new(db_path.to_str().unwrap())
        .await
        .expect("Failed to create database");
    let store = Arc::new(SqliteStore::new(Arc::new(db)));
    let mindmap = Arc::new(MindmapService::new(store.clone() as Arc<dyn EntityStore>));
    let service = EntityService::new(store.clone() as Arc<dyn EntityStore>, mindmap);
    (temp_dir, store, service)
}

fn project_input(name: &str) -> ProjectUpsert {
    ProjectUpsert {
        name: Some(name.to_string()),
        ..ProjectUpsert::default()
    }
}

fn member_input(name: &str, role: &str) -> MemberUpsert {
    MemberUpsert {
        name: Some(name.to_string()),
        role: Some(role.to_string()),
        ..MemberUpsert::default()
    }
}

fn task_input(title: &str, project_id: &str) -> TaskUpsert {
    TaskUpsert {
        title: Some(title.to_string()),
        project_id: Some(project_id.to_string()),
        deadline: Some("Dec 20".to_string()),
        ..TaskUpsert::default()
    }
}

#[tokio::test]
async fn insert_requires_name() {
    let (_tmp, _store, service) = fixture().await;
    let err = service.upsert_project(ProjectUpsert::default()).await.unwrap_err();
    assert!(matches!(err, ServiceError::ValidationFailed(_)));
}

#[tokio::test]
async fn upsert_inserts_then_merges() {
    let (_tmp, _store, service) = fixture().await;

    let created = service.upsert_project(project_input("Apollo")).await.unwrap();
    assert!(created.synced);
    assert!(!created.record.id.is_empty());

    // Merge only the provided field; the rest is untouched
    let updated = service
        .upsert_project(ProjectUpsert {
            id: Some(created.record.id.clone()),
            description: Some("Relaunch of the dashboard".to_string()),
            ..ProjectUpsert::default()
        })
        .await
        .unwrap();
    assert_eq!(updated.record.name, "Apollo");
    assert_eq!(updated.record.description, "Relaunch of the dashboard");
    assert_eq!(updated.record.color, created.record.color);
    assert!(updated.record.updated_at >= created.record.updated_at);

    let listed = service.list_projects().await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn task_insert_requires_existing_project() {
    let (_tmp, _store, service) = fixture().await;
    let err = service
        .upsert_task(task_input("Orphan work", "missing-project"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { kind: "Project", .. }));
}

#[tokio::test]
async fn task_insert_requires_required_fields() {
    let (_tmp, _store, service) = fixture().await;
    let project = service.upsert_project(project_input("Apollo")).await.unwrap();

    let err = service
        .upsert_task(TaskUpsert {
            title: Some("No deadline".to_string()),
            project_id: Some(project.record.id),
            ..TaskUpsert::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationFailed(_)));
}

#[tokio::test]
async fn deleting_project_cascades_tasks_and_links() {
    let (_tmp, store, service) = fixture().await;
    let project = service.upsert_project(project_input("Apollo")).await.unwrap();
    let member = service.upsert_member(member_input("Dana", "Backend")).await.unwrap();
    service
        .upsert_task(task_input("Build login", &project.record.id))
        .await
        .unwrap();
    service
        .link_member(&project.record.id, &member.record.id)
        .await
        .unwrap();

    service.delete_project(&project.record.id).await.unwrap();

    assert!(service.list_tasks().await.unwrap().is_empty());
    assert!(store
        .list_project_members(&project.record.id)
        .await
        .unwrap()
        .is_empty());
    // The member survives the cascade
    assert_eq!(service.list_members().await.unwrap().len(), 1);
}

#[tokio::test]
async fn deleting_member_unassigns_their_tasks() {
    let (_tmp, _store, service) = fixture().await;
    let project = service.upsert_project(project_input("Apollo")).await.unwrap();
    let member = service.upsert_member(member_input("Dana", "Backend")).await.unwrap();
    let task = service
        .upsert_task(TaskUpsert {
            assigned_to: Some(Some(member.record.id.clone())),
            priority: Some(TaskPriority::High),
            ..task_input("Build login", &project.record.id)
        })
        .await
        .unwrap();
    assert_eq!(task.record.assigned_to.as_deref(), Some(member.record.id.as_str()));

    service.delete_member(&member.record.id).await.unwrap();

    let task = service.get_task(&task.record.id).await.unwrap();
    assert!(task.assigned_to.is_none());
    assert_eq!(task.priority, TaskPriority::High);
}

#[tokio::test]
async fn explicit_null_clears_the_assignment() {
    let (_tmp, _store, service) = fixture().await;
    let project = service.upsert_project(project_input("Apollo")).await.unwrap();
    let member = service.upsert_member(member_input("Dana", "Backend")).await.unwrap();
    let task = service
        .upsert_task(TaskUpsert {
            assigned_to: Some(Some(member.record.id.clone())),
            ..task_input("Build login", &project.record.id)
        })
        .await
        .unwrap();

    // An absent field leaves the assignment untouched
    let merged = service
        .upsert_task(TaskUpsert {
            id: Some(task.record.id.clone()),
            title: Some("Build login flow".to_string()),
            ..TaskUpsert::default()
        })
        .await
        .unwrap();
    assert_eq!(merged.record.assigned_to.as_deref(), Some(member.record.id.as_str()));

    // An explicit null unassigns without deleting anything
    let cleared = service
        .upsert_task(TaskUpsert {
            id: Some(task.record.id.clone()),
            assigned_to: Some(None),
            ..TaskUpsert::default()
        })
        .await
        .unwrap();
    assert!(cleared.record.assigned_to.is_none());
    assert_eq!(service.list_members().await.unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_links_are_idempotent() {
    let (_tmp, _store, service) = fixture().await;
    let project = service.upsert_project(project_input("Apollo")).await.unwrap();
    let member = service.upsert_member(member_input("Dana", "Backend")).await.unwrap();

    let first = service
        .link_member(&project.record.id, &member.record.id)
        .await
        .unwrap();
    let second = service
        .link_member(&project.record.id, &member.record.id)
        .await
        .unwrap();
    assert_eq!(first.record, second.record);

    let members = service.list_project_members(&project.record.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id, member.record.id);
}

#[tokio::test]
async fn delete_and_unlink_missing_targets_fail_with_not_found() {
    let (_tmp, _store, service) = fixture().await;
    assert!(matches!(
        service.delete_task("nope").await.unwrap_err(),
        ServiceError::NotFound { kind: "Task", .. }
    ));
    assert!(matches!(
        service.delete_member("nope").await.unwrap_err(),
        ServiceError::NotFound { kind: "Team member", .. }
    ));
    assert!(matches!(
        service.unlink_member("p", "m").await.unwrap_err(),
        ServiceError::NotFound { .. }
    ));
}

#[tokio::test]
async fn mutations_refresh_the_graph_projection() {
    let (_tmp, store, service) = fixture().await;
    let project = service.upsert_project(project_input("Apollo")).await.unwrap();
    let member = service.upsert_member(member_input("Dana", "Backend")).await.unwrap();
    let result = service
        .upsert_task(TaskUpsert {
            assigned_to: Some(Some(member.record.id.clone())),
            ..task_input("Build login", &project.record.id)
        })
        .await
        .unwrap();
    assert!(result.synced);

    let layout = store.list_graph().await.unwrap();
    // project + team + member + task
    assert_eq!(layout.nodes.len(), 4);
    assert_eq!(layout.connections.len(), 3);
}
