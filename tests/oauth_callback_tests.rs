//! Integration tests for the install flow.
//!
//! These tests drive `/api/auth` and `/api/auth/callback` through the router
//! with the Shopify token endpoint mocked by wiremock.

mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use shopify_popup::server::SESSION_COOKIE_NAME;
use shopify_popup::ShopDomain;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{
    begin_install, create_test_config, get, send, signed_query, test_app, API_KEY, API_SECRET,
};

const SHOP: &str = "demo.myshopify.com";

fn callback_uri(code: Option<&str>, state: &str) -> String {
    let mut pairs = vec![
        ("shop", SHOP),
        ("state", state),
        ("host", "ZGVtby5teXNob3BpZnkuY29tL2FkbWlu"),
        ("timestamp", "1700000000"),
    ];
    if let Some(code) = code {
        pairs.push(("code", code));
    }
    format!("/api/auth/callback?{}", signed_query(&pairs, API_SECRET))
}

fn token_endpoint() -> wiremock::MockBuilder {
    Mock::given(method("POST")).and(path("/admin/oauth/access_token"))
}

#[tokio::test]
async fn test_begin_redirects_to_authorize_page() {
    let (app, _) = test_app(create_test_config(None));

    let response = send(&app, get("/api/auth?shop=demo")).await;

    assert_eq!(response.status, StatusCode::FOUND);
    let location = response.header("location").unwrap();
    assert!(location.starts_with("https://demo.myshopify.com/admin/oauth/authorize?"));
    assert!(location.contains(&format!("client_id={API_KEY}")));
    assert!(location.contains("scope=write_themes"));
    assert!(location.contains("redirect_uri=https%3A%2F%2Fpopup.example.com%2Fapi%2Fauth%2Fcallback"));
}

#[tokio::test]
async fn test_begin_rejects_invalid_shop() {
    let (app, _) = test_app(create_test_config(None));

    let missing = send(&app, get("/api/auth")).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let invalid = send(&app, get("/api/auth?shop=evil.example.com")).await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert!(invalid.json["error"].is_string());
}

#[tokio::test]
async fn test_successful_install_stores_session_and_redirects() {
    let server = MockServer::start().await;
    token_endpoint()
        .and(body_json(json!({
            "client_id": API_KEY,
            "client_secret": API_SECRET,
            "code": "auth-code"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "shpat_installed",
            "scope": "write_themes"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (app, state) = test_app(create_test_config(Some(&server.uri())));
    let nonce = begin_install(&app, "demo").await;

    let response = send(&app, get(&callback_uri(Some("auth-code"), &nonce))).await;

    assert_eq!(response.status, StatusCode::FOUND);
    let location = response.header("location").unwrap();
    assert!(location.starts_with("https://popup.example.com/?shop=demo.myshopify.com&host="));

    let cookie = response.header("set-cookie").unwrap();
    assert!(cookie.starts_with(&format!("{SESSION_COOKIE_NAME}=")));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=None"));
    assert!(!cookie.contains("demo.myshopify.com"));
    assert!(!cookie.contains("shpat_installed"));

    // The browser is now signed in to the merchant API
    let pair = cookie.split(';').next().unwrap();
    let request = Request::builder()
        .uri("/api/settings")
        .header(header::COOKIE, pair)
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.status, StatusCode::OK);

    let session = state
        .sessions()
        .get(&ShopDomain::new(SHOP).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.access_token, "shpat_installed");
    assert_eq!(session.id, "offline_demo.myshopify.com");
}

#[tokio::test]
async fn test_missing_code_creates_no_session() {
    let server = MockServer::start().await;
    token_endpoint()
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (app, state) = test_app(create_test_config(Some(&server.uri())));
    let nonce = begin_install(&app, "demo").await;

    let response = send(&app, get(&callback_uri(None, &nonce))).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.header("set-cookie").is_none());
    assert!(state
        .sessions()
        .get(&ShopDomain::new(SHOP).unwrap())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_tampered_query_is_rejected_before_exchange() {
    let server = MockServer::start().await;
    token_endpoint()
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (app, _) = test_app(create_test_config(Some(&server.uri())));
    let nonce = begin_install(&app, "demo").await;

    let uri = callback_uri(Some("auth-code"), &nonce).replace("timestamp=1700000000", "timestamp=1700000001");
    let response = send(&app, get(&uri)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unissued_state_is_rejected() {
    let (app, _) = test_app(create_test_config(Some("http://127.0.0.1:9")));

    let response = send(&app, get(&callback_uri(Some("auth-code"), "notissued12345"))).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_state_issued_for_another_shop_is_rejected() {
    let server = MockServer::start().await;
    token_endpoint()
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (app, state) = test_app(create_test_config(Some(&server.uri())));
    let nonce = begin_install(&app, "other-shop").await;

    let response = send(&app, get(&callback_uri(Some("auth-code"), &nonce))).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.header("set-cookie").is_none());
    assert!(state
        .sessions()
        .get(&ShopDomain::new(SHOP).unwrap())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_reused_code_fails_without_panic() {
    let server = MockServer::start().await;
    token_endpoint()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "shpat_first",
            "scope": "write_themes"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    token_endpoint()
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_request",
            "error_description": "The authorization code was not found or was already used"
        })))
        .mount(&server)
        .await;

    let (app, state) = test_app(create_test_config(Some(&server.uri())));
    let nonce = begin_install(&app, "demo").await;
    let uri = callback_uri(Some("auth-code"), &nonce);

    let first = send(&app, get(&uri)).await;
    assert_eq!(first.status, StatusCode::FOUND);

    let second = send(&app, get(&uri)).await;
    assert_eq!(second.status, StatusCode::BAD_REQUEST);
    assert!(second.header("set-cookie").is_none());

    // The first session survives the failed replay
    let session = state
        .sessions()
        .get(&ShopDomain::new(SHOP).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.access_token, "shpat_first");
}

#[tokio::test]
async fn test_unreachable_token_endpoint_is_500() {
    // Nothing listens on the discard port
    let (app, _) = test_app(create_test_config(Some("http://127.0.0.1:9")));
    let nonce = begin_install(&app, "demo").await;

    let response = send(&app, get(&callback_uri(Some("auth-code"), &nonce))).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json, json!({ "error": "Internal server error" }));
}

#[tokio::test]
async fn test_unparseable_token_body_is_502() {
    let server = MockServer::start().await;
    token_endpoint()
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let (app, _) = test_app(create_test_config(Some(&server.uri())));
    let nonce = begin_install(&app, "demo").await;

    let response = send(&app, get(&callback_uri(Some("auth-code"), &nonce))).await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_slow_token_endpoint_is_504() {
    let server = MockServer::start().await;
    token_endpoint()
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "late", "scope": "" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = shopify_popup::AppConfig::builder()
        .api_key(shopify_popup::ApiKey::new(API_KEY).unwrap())
        .api_secret_key(shopify_popup::ApiSecretKey::new(API_SECRET).unwrap())
        .host(shopify_popup::HostUrl::new(common::APP_HOST).unwrap())
        .session_secret(shopify_popup::SessionSecret::new(common::SESSION_SECRET).unwrap())
        .oauth_base_url(shopify_popup::HostUrl::new(server.uri()).unwrap())
        .request_timeout(Duration::from_millis(300))
        .build()
        .unwrap();
    let (app, _) = test_app(config);
    let nonce = begin_install(&app, "demo").await;

    let response = send(&app, get(&callback_uri(Some("auth-code"), &nonce))).await;

    assert_eq!(response.status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(response.json["error"], "Request timed out");
}
