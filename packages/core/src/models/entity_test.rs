//! Unit tests for entity models

use crate::models::{Task, TaskPriority, TaskUpsert};

#[test]
fn priority_scores_order_high_to_low() {
    assert_eq!(TaskPriority::High.score(), 3);
    assert_eq!(TaskPriority::Medium.score(), 2);
    assert_eq!(TaskPriority::Low.score(), 1);
}

#[test]
fn priority_defaults_to_medium() {
    assert_eq!(TaskPriority::default(), TaskPriority::Medium);

    // A task payload without a priority field deserializes as medium
    let task: Task = serde_json::from_str(
        r#"{
            "id": "t1",
            "title": "Write docs",
            "deadline": "Nov 10",
            "projectId": "p1",
            "assignedTo": null,
            "createdAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-01-01T00:00:00Z"
        }"#,
    )
    .unwrap();
    assert_eq!(task.priority, TaskPriority::Medium);
}

#[test]
fn priority_round_trips_through_stored_form() {
    for p in [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High] {
        assert_eq!(TaskPriority::parse(p.as_str()).unwrap(), p);
    }
    assert!(TaskPriority::parse("urgent").is_err());
}

#[test]
fn task_upsert_distinguishes_null_from_absent_assignment() {
    let absent: TaskUpsert = serde_json::from_str(r#"{"id": "t1"}"#).unwrap();
    assert_eq!(absent.assigned_to, None);

    let cleared: TaskUpsert =
        serde_json::from_str(r#"{"id": "t1", "assignedTo": null}"#).unwrap();
    assert_eq!(cleared.assigned_to, Some(None));

    let assigned: TaskUpsert =
        serde_json::from_str(r#"{"id": "t1", "assignedTo": "m1"}"#).unwrap();
    assert_eq!(assigned.assigned_to, Some(Some("m1".to_string())));
}

#[test]
fn task_serializes_camel_case() {
    let task = Task::new(
        "Setup migrations".to_string(),
        TaskPriority::High,
        "Dec 18".to_string(),
        "p1".to_string(),
    );
    let json = serde_json::to_value(&task).unwrap();
    assert_eq!(json["projectId"], "p1");
    assert_eq!(json["priority"], "high");
    // Unset tech stack is omitted from the wire format
    assert!(json.get("techStack").is_none());
}
