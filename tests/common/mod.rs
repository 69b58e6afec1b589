//! Shared helpers for the router integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use shopify_popup::auth::oauth::hmac::{canonical_query, compute_signature};
use shopify_popup::server::{router, AppState};
use shopify_popup::settings::PopupSettings;
use shopify_popup::{
    ApiKey, ApiSecretKey, AppConfig, AuthScopes, HostUrl, Session, SessionSecret, ShopDomain,
};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_KEY: &str = "test-api-key";
pub const API_SECRET: &str = "test-secret";
pub const SESSION_SECRET: &str = "0123456789abcdef0123456789abcdef";
pub const APP_HOST: &str = "https://popup.example.com";

/// Creates a test configuration, optionally pointing the token endpoint at a
/// mock server.
pub fn create_test_config(oauth_base: Option<&str>) -> AppConfig {
    let mut builder = AppConfig::builder()
        .api_key(ApiKey::new(API_KEY).unwrap())
        .api_secret_key(ApiSecretKey::new(API_SECRET).unwrap())
        .host(HostUrl::new(APP_HOST).unwrap())
        .session_secret(SessionSecret::new(SESSION_SECRET).unwrap())
        .scopes("write_themes".parse().unwrap());
    if let Some(base) = oauth_base {
        builder = builder.oauth_base_url(HostUrl::new(base).unwrap());
    }
    builder.build().unwrap()
}

/// Builds the router over fresh in-memory stores.
pub fn test_app(config: AppConfig) -> (Router, AppState) {
    let state = AppState::in_memory(config).unwrap();
    (router(state.clone()), state)
}

/// A response with its body parsed as JSON (`Null` for an empty body).
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: serde_json::Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// Sends one request through the router.
pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    TestResponse {
        status,
        headers,
        json,
    }
}

/// Builds a GET request.
pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Encodes `pairs` plus a valid `hmac` as a query string.
pub fn signed_query(pairs: &[(&str, &str)], secret: &str) -> String {
    let mut params: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    let hmac = compute_signature(&canonical_query(&params), secret);
    params.insert("hmac".to_string(), hmac);

    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Starts the install for `shop` and returns the issued `state` nonce.
pub async fn begin_install(app: &Router, shop: &str) -> String {
    let response = send(app, get(&format!("/api/auth?shop={shop}"))).await;
    assert_eq!(response.status, StatusCode::FOUND);

    let location = response.header("location").unwrap();
    location
        .split(|c| c == '?' || c == '&')
        .find_map(|pair| pair.strip_prefix("state="))
        .unwrap()
        .to_string()
}

/// Starts a token endpoint that grants every code.
pub async fn granting_token_endpoint() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "shpat_installed",
            "scope": "write_themes"
        })))
        .mount(&server)
        .await;
    server
}

/// Runs the whole install for `shop` (short name) and returns the browser
/// session cookie as a `name=value` pair.
///
/// The app's token endpoint must grant the code.
pub async fn install(app: &Router, shop: &str) -> String {
    let nonce = begin_install(app, shop).await;
    let domain = format!("{shop}.myshopify.com");
    let query = signed_query(
        &[
            ("code", "install-code"),
            ("shop", &domain),
            ("state", &nonce),
            ("timestamp", "1700000000"),
        ],
        API_SECRET,
    );

    let response = send(app, get(&format!("/api/auth/callback?{query}"))).await;
    assert_eq!(response.status, StatusCode::FOUND);

    response
        .header("set-cookie")
        .and_then(|cookie| cookie.split(';').next())
        .unwrap()
        .to_string()
}

/// A complete settings payload: the defaults with `overrides` applied.
pub fn settings_json(overrides: serde_json::Value) -> serde_json::Value {
    let mut value = serde_json::to_value(PopupSettings::default()).unwrap();
    let base = value.as_object_mut().unwrap();
    for (key, field) in overrides.as_object().unwrap() {
        base.insert(key.clone(), field.clone());
    }
    value
}

/// Stores an active offline session for `shop`.
pub async fn seed_session(state: &AppState, shop: &str) -> ShopDomain {
    let shop = ShopDomain::new(shop).unwrap();
    state
        .sessions()
        .put(Session::new(
            Session::offline_id(&shop),
            shop.clone(),
            "shpat_seeded".to_string(),
            AuthScopes::new(),
            None,
        ))
        .await
        .unwrap();
    shop
}

#[derive(Serialize)]
struct SessionTokenClaims {
    iss: String,
    dest: String,
    aud: String,
    sub: Option<String>,
    exp: i64,
    nbf: i64,
    iat: i64,
    jti: String,
    sid: Option<String>,
}

fn current_timestamp() -> i64 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs();
    i64::try_from(secs).unwrap()
}

/// Creates an App Bridge session token for `shop` signed with `secret`.
pub fn session_token(shop: &str, secret: &str) -> String {
    let now = current_timestamp();
    let claims = SessionTokenClaims {
        iss: format!("https://{shop}/admin"),
        dest: format!("https://{shop}"),
        aud: API_KEY.to_string(),
        sub: Some("42".to_string()),
        exp: now + 60,
        nbf: now - 5,
        iat: now,
        jti: format!("jti-{now}"),
        sid: None,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to encode JWT")
}
