//! End-to-end route tests over an in-process router

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use teamboard_advisor::{
    AdvisorError, AssignmentAdvisor, AssignmentContext, AssignmentProposal, ProposedAssignment,
    TechStackContext, TechStackSuggestion,
};
use tempfile::TempDir;
use tower::ServiceExt;

/// Replays one canned proposal; stands in for the network advisor
struct CannedAdvisor {
    proposal: Option<AssignmentProposal>,
}

#[async_trait]
impl AssignmentAdvisor for CannedAdvisor {
    async fn propose_assignments(
        &self,
        _context: &AssignmentContext,
    ) -> Result<AssignmentProposal, AdvisorError> {
        self.proposal
            .clone()
            .ok_or_else(|| AdvisorError::request_failed("canned outage"))
    }

    async fn suggest_tech_stack(
        &self,
        _context: &TechStackContext,
    ) -> Result<TechStackSuggestion, AdvisorError> {
        Err(AdvisorError::request_failed("canned outage"))
    }
}

async fn test_app(advisor: CannedAdvisor) -> (TempDir, Router) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");
    let state = teamboard_server::build_state(
        db_path.to_str().unwrap(),
        Some(Arc::new(advisor) as Arc<dyn AssignmentAdvisor>),
    )
    .await
    .expect("Failed to build state");
    (temp_dir, teamboard_server::create_router(state))
}

async fn app_without_proposal() -> (TempDir, Router) {
    test_app(CannedAdvisor { proposal: None }).await
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_counts() {
    let (_tmp, app) = app_without_proposal().await;

    let response = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["counts"]["projects"], 0);
    assert_eq!(body["counts"]["mindmapNodes"], 0);
}

#[tokio::test]
async fn project_crud_round_trip() {
    let (_tmp, app) = app_without_proposal().await;

    let response = app
        .clone()
        .oneshot(post("/api/projects", json!({"name": "Apollo", "color": "#fff"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    assert_eq!(created["name"], "Apollo");
    assert_eq!(created["synced"], true);
    let id = created["id"].as_str().unwrap().to_string();

    let response = app.clone().oneshot(get("/api/projects")).await.unwrap();
    let listed = body_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // Merge-upsert by id keeps unspecified fields
    let response = app
        .clone()
        .oneshot(post(
            "/api/projects",
            json!({"id": id, "description": "Relaunch"}),
        ))
        .await
        .unwrap();
    let updated = body_json(response).await;
    assert_eq!(updated["name"], "Apollo");
    assert_eq!(updated["description"], "Relaunch");

    let response = app
        .clone()
        .oneshot(delete(&format!("/api/projects/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/api/projects")).await.unwrap();
    assert!(body_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn task_insert_validates_required_fields() {
    let (_tmp, app) = app_without_proposal().await;

    let response = app
        .oneshot(post("/api/tasks", json!({"title": "No project"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn deleting_missing_project_is_not_found() {
    let (_tmp, app) = app_without_proposal().await;

    let response = app.oneshot(delete("/api/projects/ghost")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], "RESOURCE_NOT_FOUND");
}

#[tokio::test]
async fn membership_links_are_idempotent() {
    let (_tmp, app) = app_without_proposal().await;

    let project = body_json(
        app.clone()
            .oneshot(post("/api/projects", json!({"name": "Apollo"})))
            .await
            .unwrap(),
    )
    .await;
    let member = body_json(
        app.clone()
            .oneshot(post(
                "/api/team-members",
                json!({"name": "Dana", "role": "Backend"}),
            ))
            .await
            .unwrap(),
    )
    .await;
    let uri = format!("/api/projects/{}/members", project["id"].as_str().unwrap());
    let body = json!({"memberId": member["id"]});

    let first = app.clone().oneshot(post(&uri, body.clone())).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let second = app.clone().oneshot(post(&uri, body)).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);

    let listed = body_json(app.oneshot(get(&uri)).await.unwrap()).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn mindmap_reflects_assigned_tasks() {
    let (_tmp, app) = app_without_proposal().await;

    let project = body_json(
        app.clone()
            .oneshot(post("/api/projects", json!({"name": "Apollo"})))
            .await
            .unwrap(),
    )
    .await;
    let member = body_json(
        app.clone()
            .oneshot(post(
                "/api/team-members",
                json!({"name": "Dana", "role": "Backend"}),
            ))
            .await
            .unwrap(),
    )
    .await;
    let task = body_json(
        app.clone()
            .oneshot(post(
                "/api/tasks",
                json!({
                    "title": "Build login",
                    "projectId": project["id"],
                    "deadline": "Dec 20",
                    "assignedTo": member["id"],
                }),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(task["synced"], true);

    let layout = body_json(app.clone().oneshot(get("/api/mindmap")).await.unwrap()).await;
    let nodes = layout["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 4);
    assert_eq!(nodes[0]["x"], 150.0);
    assert_eq!(nodes[0]["level"], 0);
    assert_eq!(nodes[1]["text"], "Team Members");

    // On-demand rebuild returns the same generation
    let resynced = body_json(app.oneshot(post("/api/sync-mindmap", json!({}))).await.unwrap()).await;
    assert_eq!(resynced["nodes"], layout["nodes"]);
}

#[tokio::test]
async fn auto_assign_applies_canned_proposal() {
    let advisor = CannedAdvisor {
        proposal: Some(AssignmentProposal {
            team: vec!["m1".to_string()],
            assignments: vec![ProposedAssignment {
                task_id: "t1".to_string(),
                member_id: "m1".to_string(),
                reasoning: "role match".to_string(),
            }],
        }),
    };
    let (_tmp, app) = test_app(advisor).await;

    app.clone()
        .oneshot(post("/api/projects", json!({"id": "p1", "name": "Apollo"})))
        .await
        .unwrap();
    app.clone()
        .oneshot(post(
            "/api/team-members",
            json!({"id": "m1", "name": "Dana", "role": "Backend"}),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(post(
            "/api/tasks",
            json!({"id": "t1", "title": "Build login", "projectId": "p1", "deadline": "Dec 20"}),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post("/api/projects/p1/auto-assign", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["assignedBy"], "ai");
    assert_eq!(report["assignmentsMade"], 1);
    assert_eq!(report["team"], json!(["m1"]));

    let task = body_json(app.oneshot(get("/api/tasks/t1")).await.unwrap()).await;
    assert_eq!(task["assignedTo"], "m1");
}

#[tokio::test]
async fn auto_assign_without_members_is_rejected() {
    let (_tmp, app) = app_without_proposal().await;

    app.clone()
        .oneshot(post("/api/projects", json!({"id": "p1", "name": "Apollo"})))
        .await
        .unwrap();
    app.clone()
        .oneshot(post(
            "/api/tasks",
            json!({"id": "t1", "title": "Build login", "projectId": "p1", "deadline": "Dec 20"}),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(post("/api/projects/p1/auto-assign", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "NO_TEAM_MEMBERS");
}

#[tokio::test]
async fn advisor_outage_maps_to_bad_gateway() {
    let (_tmp, app) = app_without_proposal().await;

    app.clone()
        .oneshot(post("/api/projects", json!({"id": "p1", "name": "Apollo"})))
        .await
        .unwrap();
    app.clone()
        .oneshot(post(
            "/api/team-members",
            json!({"id": "m1", "name": "Dana", "role": "Backend"}),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(post(
            "/api/tasks",
            json!({"id": "t1", "title": "Build login", "projectId": "p1", "deadline": "Dec 20"}),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(post("/api/projects/p1/auto-assign", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["code"], "ADVISOR_UNAVAILABLE");
}

#[tokio::test]
async fn suggest_stack_is_accepted_and_missing_task_is_not_found() {
    let (_tmp, app) = app_without_proposal().await;

    let response = app
        .clone()
        .oneshot(post("/api/tasks/ghost/suggest-stack", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.clone()
        .oneshot(post("/api/projects", json!({"id": "p1", "name": "Apollo"})))
        .await
        .unwrap();
    app.clone()
        .oneshot(post(
            "/api/tasks",
            json!({"id": "t1", "title": "Build login", "projectId": "p1", "deadline": "Dec 20"}),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(post("/api/tasks/t1/suggest-stack", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["taskId"], "t1");
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn standalone_nodes_round_trip_and_survive_sync() {
    let (_tmp, app) = app_without_proposal().await;

    let note = body_json(
        app.clone()
            .oneshot(post(
                "/api/nodes",
                json!({"text": "Scratch note", "x": 10.0, "y": 20.0}),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(note["text"], "Scratch note");
    assert!(note.get("entityType").is_none());
    let idea = body_json(
        app.clone()
            .oneshot(post("/api/nodes", json!({"text": "Idea"})))
            .await
            .unwrap(),
    )
    .await;

    // Duplicate pair comes back as the same edge
    let edge_input = json!({"fromNode": note["id"], "toNode": idea["id"]});
    let first = body_json(
        app.clone()
            .oneshot(post("/api/connections", edge_input.clone()))
            .await
            .unwrap(),
    )
    .await;
    let second = body_json(
        app.clone()
            .oneshot(post("/api/connections", edge_input))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(first["id"], second["id"]);

    // A rebuild leaves user-created rows in place
    app.clone()
        .oneshot(post("/api/sync-mindmap", json!({})))
        .await
        .unwrap();
    let layout = body_json(app.clone().oneshot(get("/api/mindmap")).await.unwrap()).await;
    assert_eq!(layout["nodes"].as_array().unwrap().len(), 2);
    assert_eq!(layout["connections"].as_array().unwrap().len(), 1);

    // Moving a node merges over the stored record
    let moved = body_json(
        app.clone()
            .oneshot(post("/api/nodes", json!({"id": note["id"], "x": 400.0})))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(moved["x"], 400.0);
    assert_eq!(moved["text"], "Scratch note");

    let response = app
        .clone()
        .oneshot(delete(&format!("/api/nodes/{}", note["id"])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let layout = body_json(app.clone().oneshot(get("/api/mindmap")).await.unwrap()).await;
    assert_eq!(layout["nodes"].as_array().unwrap().len(), 1);
    assert!(layout["connections"].as_array().unwrap().is_empty());

    let response = app
        .oneshot(get(&format!("/api/nodes/{}", note["id"])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn connection_requires_both_endpoints() {
    let (_tmp, app) = app_without_proposal().await;

    let response = app
        .clone()
        .oneshot(post("/api/connections", json!({"fromNode": 1})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let response = app
        .oneshot(post("/api/connections", json!({"fromNode": 1, "toNode": 2})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn task_assignment_clears_with_explicit_null() {
    let (_tmp, app) = app_without_proposal().await;

    let project = body_json(
        app.clone()
            .oneshot(post("/api/projects", json!({"name": "Apollo"})))
            .await
            .unwrap(),
    )
    .await;
    let member = body_json(
        app.clone()
            .oneshot(post(
                "/api/team-members",
                json!({"name": "Dana", "role": "Backend"}),
            ))
            .await
            .unwrap(),
    )
    .await;
    let task = body_json(
        app.clone()
            .oneshot(post(
                "/api/tasks",
                json!({
                    "title": "Build login",
                    "projectId": project["id"],
                    "deadline": "Dec 20",
                    "assignedTo": member["id"],
                }),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(task["assignedTo"], member["id"]);

    let cleared = body_json(
        app.clone()
            .oneshot(post(
                "/api/tasks",
                json!({"id": task["id"], "assignedTo": null}),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(cleared["assignedTo"], Value::Null);

    // The member loses their subtree in the rebuilt graph
    let layout = body_json(app.oneshot(get("/api/mindmap")).await.unwrap()).await;
    assert_eq!(layout["nodes"].as_array().unwrap().len(), 1);
}
