use super::*;
use crate::types::CreateTaskRequest;
use axum::Json;
use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::TcpListener;

/// Serve a router on an ephemeral port and return its base URL.
async fn spawn_server(app: Router) -> (String, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let url = format!("http://{}", addr);

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (url, handle)
}

// Initialize crypto provider once for all tests
fn init_crypto() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

fn client(url: &str) -> ApiClient {
    init_crypto();
    ApiClient::new("test-token", Some(url.to_string())).unwrap()
}

fn task_json(id: &str, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "projectId": "p1",
        "title": title,
        "priority": 0,
        "status": 0,
        "isAllDay": false,
        "createdTime": "2024-01-01T00:00:00Z",
        "modifiedTime": "2024-01-01T00:00:00Z",
    })
}

#[test]
fn test_explicit_base_url_wins() {
    init_crypto();
    let client = ApiClient::new("tok", Some("http://custom:8080".to_string())).unwrap();
    assert_eq!(client.base_url(), "http://custom:8080");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bearer_token_is_sent() {
    let app = Router::new().route(
        "/project",
        get(|headers: HeaderMap| async move {
            let auth = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            if auth == "Bearer test-token" {
                (StatusCode::OK, Json(json!([]))).into_response()
            } else {
                StatusCode::UNAUTHORIZED.into_response()
            }
        }),
    );

    let (url, _handle) = spawn_server(app).await;
    let projects = client(&url).get_projects().await.unwrap();
    assert!(projects.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_codes_map_to_typed_errors() {
    let cases: [(u16, fn(&ApiError) -> bool); 7] = [
        (401, |e| matches!(e, ApiError::Authentication { .. })),
        (403, |e| matches!(e, ApiError::PermissionDenied { .. })),
        (404, |e| matches!(e, ApiError::NotFound { .. })),
        (429, |e| matches!(e, ApiError::RateLimited { .. })),
        (500, |e| matches!(e, ApiError::ServiceUnavailable { .. })),
        (503, |e| matches!(e, ApiError::ServiceUnavailable { .. })),
        (418, |e| matches!(e, ApiError::Status { status: 418, .. })),
    ];

    for (status, is_expected) in cases {
        let app = Router::new().route(
            "/project",
            get(move || async move {
                (
                    StatusCode::from_u16(status).unwrap(),
                    Json(json!({"errorMsg": "boom"})),
                )
            }),
        );
        let (url, _handle) = spawn_server(app).await;

        let err = client(&url).get_projects().await.unwrap_err();
        assert!(is_expected(&err), "status {} mapped to {:?}", status, err);
        assert!(
            err.to_string().contains("boom"),
            "errorMsg should surface in {:?}",
            err
        );
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_error_message_falls_back_to_body_text() {
    let app = Router::new().route(
        "/project/{id}",
        get(|| async { (StatusCode::NOT_FOUND, "gone") }),
    );
    let (url, _handle) = spawn_server(app).await;

    let err = client(&url).get_project("nope").await.unwrap_err();
    match err {
        ApiError::NotFound { message } => assert_eq!(message, "gone"),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_tasks_accepts_bare_array() {
    let app = Router::new().route(
        "/project/{id}/data",
        get(|| async { Json(json!([task_json("t1", "One")])) }),
    );
    let (url, _handle) = spawn_server(app).await;

    let tasks = client(&url).get_tasks("p1").await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "One");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_tasks_accepts_envelope_object() {
    let app = Router::new().route(
        "/project/{id}/data",
        get(|| async {
            Json(json!({
                "project": {"id": "p1", "name": "Work"},
                "tasks": [task_json("t1", "One"), task_json("t2", "Two")],
            }))
        }),
    );
    let (url, _handle) = spawn_server(app).await;

    let tasks = client(&url).get_tasks("p1").await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[1].id, "t2");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_tasks_unexpected_shape_is_empty() {
    let app = Router::new().route(
        "/project/{id}/data",
        get(|| async { Json(json!({"unexpected": true})) }),
    );
    let (url, _handle) = spawn_server(app).await;

    let tasks = client(&url).get_tasks("p1").await.unwrap();
    assert!(tasks.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_find_task_by_id_direct_hit() {
    let full_id = "64f1c2d3e4a5b6c7d8e9f0a1";
    let app = Router::new().route(
        "/project/{pid}/task/{tid}",
        get(|Path((_pid, tid)): Path<(String, String)>| async move {
            Json(task_json(&tid, "Found"))
        }),
    );
    let (url, _handle) = spawn_server(app).await;

    let task = client(&url)
        .find_task_by_id("p1", full_id)
        .await
        .unwrap()
        .expect("task expected");
    assert_eq!(task.id, full_id);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_find_task_by_id_short_prefix_falls_back_to_list() {
    let app = Router::new()
        .route(
            "/project/{pid}/task/{tid}",
            get(|| async { StatusCode::NOT_FOUND }),
        )
        .route(
            "/project/{pid}/data",
            get(|| async {
                Json(json!([
                    task_json("aaaa1111bbbb2222cccc3333", "First"),
                    task_json("64f1c2d3e4a5b6c7d8e9f0a1", "Second"),
                ]))
            }),
        );
    let (url, _handle) = spawn_server(app).await;

    let task = client(&url)
        .find_task_by_id("p1", "64f1c2d3")
        .await
        .unwrap()
        .expect("prefix should match");
    assert_eq!(task.id, "64f1c2d3e4a5b6c7d8e9f0a1");
    assert_eq!(task.title, "Second");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_find_task_by_id_prefix_miss_returns_none() {
    let app = Router::new()
        .route(
            "/project/{pid}/task/{tid}",
            get(|| async { StatusCode::NOT_FOUND }),
        )
        .route(
            "/project/{pid}/data",
            get(|| async { Json(json!([task_json("aaaa1111bbbb2222cccc3333", "Only")])) }),
        );
    let (url, _handle) = spawn_server(app).await;

    let found = client(&url).find_task_by_id("p1", "ffffffff").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_find_task_by_id_long_id_never_falls_back() {
    let list_calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&list_calls);

    let app = Router::new()
        .route(
            "/project/{pid}/task/{tid}",
            get(|| async { StatusCode::NOT_FOUND }),
        )
        .route(
            "/project/{pid}/data",
            get(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    // Would match if the fallback ran
                    Json(json!([task_json("123456789abcdef", "Decoy")]))
                }
            }),
        );
    let (url, _handle) = spawn_server(app).await;

    // Nine characters: one past the prefix threshold
    let found = client(&url).find_task_by_id("p1", "123456789").await.unwrap();
    assert!(found.is_none());
    assert_eq!(list_calls.load(Ordering::SeqCst), 0, "no list fetch expected");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_task_round_trip() {
    let app = Router::new().route(
        "/task",
        post(|Json(body): Json<serde_json::Value>| async move {
            let mut task = task_json("64f1c2d3e4a5b6c7d8e9f0a1", body["title"].as_str().unwrap());
            task["projectId"] = body["projectId"].clone();
            task["priority"] = body["priority"].clone();
            task["dueDate"] = body["dueDate"].clone();
            (StatusCode::CREATED, Json(task))
        }),
    );
    let (url, _handle) = spawn_server(app).await;

    let req = CreateTaskRequest {
        title: "Buy milk".to_string(),
        project_id: "p1".to_string(),
        content: None,
        due_date: Some("2024-06-01".to_string()),
        priority: Some(3),
        tags: None,
    };
    let task = client(&url).create_task(&req).await.unwrap();

    assert!(!task.id.is_empty());
    assert_eq!(task.title, "Buy milk");
    assert_eq!(task.project_id, "p1");
    assert_eq!(task.priority, 3);
    assert_eq!(task.due_date.as_deref(), Some("2024-06-01"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_complete_and_delete_accept_empty_bodies() {
    let app = Router::new()
        .route(
            "/project/{pid}/task/{tid}/complete",
            post(|| async { StatusCode::OK }),
        )
        .route(
            "/project/{pid}/task/{tid}",
            axum::routing::delete(|| async { StatusCode::NO_CONTENT }),
        )
        .route(
            "/project/{pid}",
            axum::routing::delete(|| async { StatusCode::OK }),
        );
    let (url, _handle) = spawn_server(app).await;

    let c = client(&url);
    c.complete_task("p1", "t1").await.unwrap();
    c.delete_task("p1", "t1").await.unwrap();
    c.delete_project("p1").await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_project_posts_the_request() {
    let app = Router::new().route(
        "/project",
        post(|Json(body): Json<serde_json::Value>| async move {
            Json(json!({
                "id": "newproj12345",
                "name": body["name"],
                "sortOrder": 0,
                "closed": false,
                "modifiedTime": "2024-01-01T00:00:00Z",
            }))
        }),
    );
    let (url, _handle) = spawn_server(app).await;

    let project = client(&url)
        .create_project(&crate::types::CreateProjectRequest {
            name: "Fresh".to_string(),
            color: None,
            view_mode: None,
        })
        .await
        .unwrap();

    assert_eq!(project.id, "newproj12345");
    assert_eq!(project.name, "Fresh");
}
