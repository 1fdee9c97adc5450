#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use inventory_api::{
    AppConfig, AppState, MemoryRepository, create_router,
    repository::RepositoryState,
};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;

pub const TEST_SECRET: &str = "router-test-secret";

/// Router over an in-memory repository. The repository handle is returned so
/// tests can seed or inspect rows directly.
pub fn memory_app() -> (Router, Arc<MemoryRepository>) {
    let repo = Arc::new(MemoryRepository::new());
    (app_with(repo.clone()), repo)
}

pub fn app_with(repo: RepositoryState) -> Router {
    let config = AppConfig {
        jwt_secret: TEST_SECRET.to_string(),
        ..AppConfig::default()
    };
    create_router(AppState {
        repo,
        config,
    })
}

/// Sends one request and returns the status with the decoded JSON body
/// (`Value::Null` for an empty body).
pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Registers an account through the API and logs in, returning the token.
pub async fn register_and_login(router: &Router, email: &str) -> String {
    let (status, _) = send(
        router,
        "POST",
        "/api/productos/auth/register",
        Some(serde_json::json!({
            "name": "Tester",
            "email": email,
            "password": "password123"
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, token) = send(
        router,
        "POST",
        "/api/productos/auth/login",
        Some(serde_json::json!({ "email": email, "password": "password123" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    token.as_str().unwrap().to_string()
}

/// The `message` of every entry in a 400 response, in order.
pub fn error_messages(body: &Value) -> Vec<String> {
    body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["message"].as_str().unwrap().to_string())
        .collect()
}
