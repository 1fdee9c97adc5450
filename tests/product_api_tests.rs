mod common;

use axum::http::StatusCode;
use common::{error_messages, memory_app, register_and_login, send};
use inventory_api::messages;
use serde_json::json;

// --- Creation ---

#[tokio::test]
async fn test_create_product_round_trip() {
    let (app, _repo) = memory_app();
    let token = register_and_login(&app, "owner@correo.com").await;

    let (status, created) = send(
        &app,
        "POST",
        "/api/productos",
        Some(json!({ "name": "Monitor Curvo", "price": 300 })),
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let product = &created["data"];
    assert_eq!(product["name"], "Monitor Curvo");
    assert_eq!(product["price"].as_f64(), Some(300.0));
    assert_eq!(product["availability"], true);
    assert!(product["created_at"].is_string());

    let id = product["id"].as_i64().unwrap();
    let (status, fetched) = send(&app, "GET", &format!("/api/productos/{id}"), None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"], created["data"]);
}

#[tokio::test]
async fn test_create_product_accepts_explicit_availability() {
    let (app, _repo) = memory_app();
    let token = register_and_login(&app, "owner@correo.com").await;

    let (status, created) = send(
        &app,
        "POST",
        "/api/productos",
        Some(json!({ "name": "Audifonos", "price": "99.9", "availability": false })),
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["price"].as_f64(), Some(99.9));
    assert_eq!(created["data"]["availability"], false);
}

#[tokio::test]
async fn test_create_product_empty_body_fails_validation_before_auth() {
    let (app, _repo) = memory_app();

    let (status, body) = send(&app, "POST", "/api/productos", None, None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_create_product_invalid_price() {
    let (app, _repo) = memory_app();
    let token = register_and_login(&app, "owner@correo.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/productos",
        Some(json!({ "name": "Monitor", "price": "Hola" })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_messages(&body),
        vec![messages::PRICE_NOT_NUMERIC, messages::PRICE_NOT_POSITIVE]
    );

    let (status, body) = send(
        &app,
        "POST",
        "/api/productos",
        Some(json!({ "name": "Monitor", "price": 0 })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_messages(&body), vec![messages::PRICE_NOT_POSITIVE]);
    assert_eq!(body["errors"][0]["field"], "price");
    assert_eq!(body["errors"][0]["location"], "body");
}

#[tokio::test]
async fn test_malformed_json_is_a_validation_error() {
    let (app, _repo) = memory_app();

    let request = axum::http::Request::builder()
        .method("PUT")
        .uri("/api/productos/1")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{ not json"))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_product_accepts_large_integer_price() {
    let (app, _repo) = memory_app();
    let token = register_and_login(&app, "owner@correo.com").await;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/productos")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(axum::body::Body::from(
            r#"{"name":"Servidor","price":100000000000000000000}"#,
        ))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let created: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(created["data"]["price"].as_f64(), Some(1e20));
}

#[tokio::test]
async fn test_create_product_rejects_price_beyond_float_range() {
    let (app, _repo) = memory_app();
    let token = register_and_login(&app, "owner@correo.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/productos",
        Some(json!({ "name": "Servidor", "price": "9".repeat(400) })),
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_messages(&body), vec![messages::PRICE_NOT_POSITIVE]);
    assert_eq!(body["errors"][0]["field"], "price");
}

#[tokio::test]
async fn test_oversized_body_is_413() {
    let (app, _repo) = memory_app();
    let padding = "x".repeat(inventory_api::validation::MAX_BODY_BYTES + 1);

    let (status, body) = send(
        &app,
        "PUT",
        "/api/productos/1",
        Some(json!({ "name": padding, "price": 300, "availability": true })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], messages::BODY_TOO_LARGE);
}

// --- Listing and lookup ---

#[tokio::test]
async fn test_list_is_newest_first() {
    let (app, _repo) = memory_app();
    let token = register_and_login(&app, "owner@correo.com").await;

    for name in ["Primero", "Segundo", "Tercero"] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/productos",
            Some(json!({ "name": name, "price": 10 })),
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, "GET", "/api/productos", None, None).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Tercero", "Segundo", "Primero"]);
}

#[tokio::test]
async fn test_empty_list() {
    let (app, _repo) = memory_app();

    let (status, body) = send(&app, "GET", "/api/productos", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "data": [] }));
}

#[tokio::test]
async fn test_unknown_id_is_404_on_every_method() {
    let (app, _repo) = memory_app();
    let update = json!({ "name": "Monitor", "price": 300, "availability": true });

    for (method, body) in [
        ("GET", None),
        ("PUT", Some(update)),
        ("PATCH", None),
        ("DELETE", None),
    ] {
        let (status, response) = send(&app, method, "/api/productos/2000", body, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method}");
        assert_eq!(response["error"], messages::PRODUCT_NOT_FOUND);
    }
}

#[tokio::test]
async fn test_non_integer_id_is_400() {
    let (app, _repo) = memory_app();

    let update = json!({ "name": "Monitor", "price": 300, "availability": true });

    for (method, payload) in [
        ("GET", None),
        ("PUT", Some(update)),
        ("PATCH", None),
        ("DELETE", None),
    ] {
        let (status, body) =
            send(&app, method, "/api/productos/not-valid-url", payload, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method}");
        assert_eq!(error_messages(&body), vec![messages::INVALID_ID]);
        assert_eq!(body["errors"][0]["location"], "params");
    }
}

// --- Updates ---

#[tokio::test]
async fn test_update_product_replaces_fields() {
    let (app, _repo) = memory_app();
    let token = register_and_login(&app, "owner@correo.com").await;
    let (_, created) = send(
        &app,
        "POST",
        "/api/productos",
        Some(json!({ "name": "Monitor", "price": 300 })),
        Some(&token),
    )
    .await;
    let id = created["data"]["id"].as_i64().unwrap();

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/api/productos/{id}"),
        Some(json!({ "name": "Monitor 4K", "price": 450.5, "availability": false })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["id"].as_i64(), Some(id));
    assert_eq!(updated["data"]["name"], "Monitor 4K");
    assert_eq!(updated["data"]["price"].as_f64(), Some(450.5));
    assert_eq!(updated["data"]["availability"], false);
}

#[tokio::test]
async fn test_update_product_empty_body() {
    let (app, _repo) = memory_app();

    let (status, body) = send(&app, "PUT", "/api/productos/1", Some(json!({})), None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"].as_array().unwrap().len(), 5);
    assert_eq!(error_messages(&body)[0], messages::PRODUCT_NAME_EMPTY_UPDATE);
}

#[tokio::test]
async fn test_update_product_rejects_non_positive_price() {
    let (app, _repo) = memory_app();

    let (status, body) = send(
        &app,
        "PUT",
        "/api/productos/1",
        Some(json!({ "name": "Monitor", "price": 0, "availability": true })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_messages(&body), vec![messages::PRICE_NOT_POSITIVE]);
}

#[tokio::test]
async fn test_toggle_availability_twice_restores_value() {
    let (app, _repo) = memory_app();
    let token = register_and_login(&app, "owner@correo.com").await;
    let (_, created) = send(
        &app,
        "POST",
        "/api/productos",
        Some(json!({ "name": "Teclado", "price": 80 })),
        Some(&token),
    )
    .await;
    let uri = format!("/api/productos/{}", created["data"]["id"]);

    let (status, first) = send(&app, "PATCH", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["availability"], false);

    // The body is ignored by the toggle.
    let (status, second) = send(
        &app,
        "PATCH",
        &uri,
        Some(json!({ "availability": false })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["data"]["availability"], true);
    assert_eq!(second["data"]["name"], "Teclado");
}

// --- Deletion ---

#[tokio::test]
async fn test_delete_product() {
    let (app, _repo) = memory_app();
    let token = register_and_login(&app, "owner@correo.com").await;
    let (_, created) = send(
        &app,
        "POST",
        "/api/productos",
        Some(json!({ "name": "Mouse", "price": 25 })),
        Some(&token),
    )
    .await;
    let uri = format!("/api/productos/{}", created["data"]["id"]);

    let (status, body) = send(&app, "DELETE", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "data": messages::PRODUCT_DELETED }));

    let (status, _) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
