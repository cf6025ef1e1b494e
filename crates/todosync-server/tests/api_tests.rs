//! Integration tests for the REST endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server, backed by the in-memory item store.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use todosync_db::MemoryItemStore;
use todosync_server::router::build_router;
use todosync_server::state::AppState;
use tower::ServiceExt;

async fn make_test_state() -> (Arc<AppState>, MemoryItemStore) {
    let store = MemoryItemStore::new();
    store.insert("buy milk", false).await.unwrap();
    store.insert("walk dog", true).await.unwrap();
    (Arc::new(AppState::new(store.clone())), store)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_health_reports_store_and_connections() {
    let (state, _store) = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["store"], "memory");
    assert_eq!(json["connections"], 0);
}

#[tokio::test]
async fn test_list_todos_ordered_by_id() {
    let (state, _store) = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/todos").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(
        json,
        json!([
            {"id": 1, "text": "buy milk", "complete": false},
            {"id": 2, "text": "walk dog", "complete": true},
        ])
    );
}

#[tokio::test]
async fn test_create_todo_returns_assigned_id() {
    let (state, store) = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(json_request("POST", "/todos", &json!({"text": "pay rent"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json, json!({"id": 3, "text": "pay rent", "complete": false}));
    assert_eq!(store.list_all().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_create_todo_rejects_missing_text() {
    let (state, _store) = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(json_request("POST", "/todos", &json!({"complete": true})))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_update_todo_overwrites_both_fields() {
    let (state, store) = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(json_request(
            "PATCH",
            "/todos/1",
            &json!({"text": "buy oat milk", "complete": true}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let item = store
        .get(todosync_types::ItemId(1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.text, "buy oat milk");
    assert!(item.complete);
}

#[tokio::test]
async fn test_update_missing_todo_returns_404() {
    let (state, _store) = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(json_request("PATCH", "/todos/99", &json!({"text": "x"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_invalid_id_returns_400() {
    let (state, _store) = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(
            Request::delete("/todos/not-a-number")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "Invalid ID format");
}

#[tokio::test]
async fn test_delete_todo_is_idempotent() {
    let (state, store) = make_test_state().await;

    for _ in 0..2 {
        let response = build_router(Arc::clone(&state))
            .oneshot(Request::delete("/todos/1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_to_json(response.into_body()).await;
        assert_eq!(json["message"], "Todo deleted successfully");
    }

    assert_eq!(store.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_store_failure_returns_500() {
    let (state, store) = make_test_state().await;
    store.set_offline(true);
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/todos").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_nonexistent_route_returns_404() {
    let (state, _store) = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/api/nonexistent").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
