use std::sync::Arc;

use axum::http::StatusCode;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use review_api::engine::AssignmentEngine;
use review_api::random::SeededRandom;
use review_api::router::build_router;
use review_api::state::AppStateInner;
use review_db::Database;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn app(dir: &TempDir) -> axum::Router {
    let db = Database::open(&dir.path().join("review.db")).unwrap();
    let engine = AssignmentEngine::new(Arc::new(db), Arc::new(SeededRandom::new(3)));
    build_router(AppStateInner::new(engine))
}

/// Send a GET request via `oneshot` and return (status, parsed JSON body).
async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let req = axum::http::Request::builder()
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    send(app, req).await
}

/// Send a POST request with a JSON body via `oneshot` and return (status, parsed JSON body).
async fn post_json(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    send(app, req).await
}

async fn send(app: &axum::Router, req: axum::http::Request<axum::body::Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn add_team(app: &axum::Router, name: &str, members: &[(&str, bool)]) -> (StatusCode, Value) {
    let members: Vec<Value> = members
        .iter()
        .map(|(id, active)| json!({ "user_id": id, "username": format!("{}-name", id), "is_active": active }))
        .collect();
    post_json(app, "/team/add", json!({ "team_name": name, "members": members })).await
}

fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Teams & users
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_ok() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn team_add_and_get() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = add_team(&app, "backend", &[("u2", true), ("u1", false)]).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["team"]["team_name"], "backend");
    assert_eq!(body["team"]["members"][0]["user_id"], "u1");
    assert_eq!(body["team"]["members"][0]["is_active"], false);

    let (status, body) = get(&app, "/team/get?team_name=backend").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["members"].as_array().unwrap().len(), 2);

    let (status, body) = add_team(&app, "backend", &[("u3", true)]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "TEAM_EXISTS");

    let (status, body) = get(&app, "/team/get?team_name=frontend").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");

    let (status, body) = get(&app, "/team/get").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_REQUEST");
}

#[tokio::test]
async fn malformed_payloads_are_invalid_requests() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = post_json(&app, "/team/add", json!({ "team_name": "x" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_REQUEST");

    let (status, body) = post_json(&app, "/pullRequest/create", json!({ "pull_request_id": 5 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_REQUEST");
}

#[tokio::test]
async fn set_is_active_and_missing_user() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    add_team(&app, "backend", &[("u1", true)]).await;

    let (status, body) = post_json(
        &app,
        "/users/setIsActive",
        json!({ "user_id": "u1", "is_active": false }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["team_name"], "backend");
    assert_eq!(body["user"]["is_active"], false);

    let (status, body) = post_json(
        &app,
        "/users/setIsActive",
        json!({ "user_id": "ghost", "is_active": true }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Pull request lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pull_request_lifecycle() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    add_team(&app, "core", &[("A", true), ("B", true), ("C", false)]).await;

    let create = json!({ "pull_request_id": "pr1", "pull_request_name": "Add search", "author_id": "A" });
    let (status, body) = post_json(&app, "/pullRequest/create", create.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["pr"]["status"], "OPEN");
    assert_eq!(body["pr"]["assigned_reviewers"], json!(["B"]));
    assert!(body["pr"].get("createdAt").is_some());
    assert!(body["pr"].get("mergedAt").is_none());

    let (status, body) = post_json(&app, "/pullRequest/create", create).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "PR_EXISTS");

    let (status, body) = get(&app, "/users/getReview?user_id=B").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "B");
    assert_eq!(body["pull_requests"][0]["pull_request_id"], "pr1");

    let merge = json!({ "pull_request_id": "pr1" });
    let (status, first) = post_json(&app, "/pullRequest/merge", merge.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["pr"]["status"], "MERGED");
    let (status, second) = post_json(&app, "/pullRequest/merge", merge).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["pr"]["mergedAt"], second["pr"]["mergedAt"]);

    let (status, body) = post_json(
        &app,
        "/pullRequest/reassign",
        json!({ "pull_request_id": "pr1", "old_user_id": "B" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "PR_MERGED");
}

#[tokio::test]
async fn create_with_unknown_author_is_not_found() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = post_json(
        &app,
        "/pullRequest/create",
        json!({ "pull_request_id": "pr1", "pull_request_name": "x", "author_id": "nobody" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");

    let (status, _) = post_json(&app, "/pullRequest/merge", json!({ "pull_request_id": "pr1" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reassign_success_and_conflicts() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    add_team(&app, "core", &[("a", true), ("b", true), ("c", true), ("d", true)]).await;

    let (_, body) = post_json(
        &app,
        "/pullRequest/create",
        json!({ "pull_request_id": "pr1", "pull_request_name": "x", "author_id": "a" }),
    )
    .await;
    let reviewers: Vec<String> = serde_json::from_value(body["pr"]["assigned_reviewers"].clone()).unwrap();
    assert_eq!(reviewers.len(), 2);
    let outgoing = reviewers[0].clone();

    let (status, body) = post_json(
        &app,
        "/pullRequest/reassign",
        json!({ "pull_request_id": "pr1", "old_user_id": outgoing }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let replaced_by = body["replaced_by"].as_str().unwrap().to_string();
    assert!(!reviewers.contains(&replaced_by));
    assert_ne!(replaced_by, "a");
    assert_eq!(body["pr"]["assigned_reviewers"][0], replaced_by.as_str());
    assert_eq!(body["pr"]["assigned_reviewers"][1], reviewers[1].as_str());

    let (status, body) = post_json(
        &app,
        "/pullRequest/reassign",
        json!({ "pull_request_id": "pr1", "old_user_id": outgoing }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "NOT_ASSIGNED");

    // Only the outgoing reviewer is left unassigned; taking them off duty empties the pool
    post_json(
        &app,
        "/users/setIsActive",
        json!({ "user_id": outgoing, "is_active": false }),
    )
    .await;
    let (status, body) = post_json(
        &app,
        "/pullRequest/reassign",
        json!({ "pull_request_id": "pr1", "old_user_id": replaced_by }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "NO_CANDIDATE");

    let (status, body) = get(&app, "/users/getReview?user_id=ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");
}
