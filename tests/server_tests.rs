//! Integration tests for the public endpoints and the outer layers.

mod common;

use axum::http::StatusCode;

use common::{create_test_config, get, send, test_app, API_KEY};

#[tokio::test]
async fn test_health() {
    let (app, _) = test_app(create_test_config(None));

    let response = send(&app, get("/api/health")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["status"], "ok");
    assert_eq!(response.json["version"], env!("CARGO_PKG_VERSION"));
    let timestamp = response.json["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
}

#[tokio::test]
async fn test_public_config_has_no_secrets() {
    let (app, _) = test_app(create_test_config(None));

    let response = send(&app, get("/api/config")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["apiKey"], API_KEY);
    assert_eq!(response.json["host"], "https://popup.example.com");
    assert_eq!(response.json["scopes"], "write_themes");
    let text = response.json.to_string();
    assert!(!text.contains(common::API_SECRET));
    assert!(!text.contains(common::SESSION_SECRET));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (app, _) = test_app(create_test_config(None));

    assert_eq!(send(&app, get("/nope")).await.status, StatusCode::NOT_FOUND);
}
