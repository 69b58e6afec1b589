//! Integration tests for the settings API and the session gate.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::Utc;
use serde_json::{json, Value};
use shopify_popup::settings::PopupSettings;

use common::{
    create_test_config, get, granting_token_endpoint, install, seed_session, send, session_token,
    settings_json, test_app, API_SECRET,
};

const SHOP: &str = "demo.myshopify.com";

fn bearer(request: Request<Body>, token: &str) -> Request<Body> {
    let (mut parts, body) = request.into_parts();
    parts.headers.insert(
        header::AUTHORIZATION,
        format!("Bearer {token}").parse().unwrap(),
    );
    Request::from_parts(parts, body)
}

fn post_settings(body: &Value, token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/settings")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_settings_require_session() {
    let (app, state) = test_app(create_test_config(None));

    let anonymous = send(&app, get("/api/settings")).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.json, json!({ "error": "Unauthorized" }));

    let post = Request::builder()
        .method("POST")
        .uri("/api/settings")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "title": "Hi" }).to_string()))
        .unwrap();
    assert_eq!(send(&app, post).await.status, StatusCode::UNAUTHORIZED);

    // Nothing was written
    let shop = shopify_popup::ShopDomain::new(SHOP).unwrap();
    assert_eq!(
        state.settings().get(&shop).await.unwrap(),
        PopupSettings::default()
    );
}

#[tokio::test]
async fn test_valid_token_without_installed_session_is_rejected() {
    let (app, _) = test_app(create_test_config(None));

    let request = bearer(get("/api/settings"), &session_token(SHOP, API_SECRET));
    let response = send(&app, request).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let (app, state) = test_app(create_test_config(None));
    seed_session(&state, SHOP).await;

    let request = bearer(get("/api/settings"), &session_token(SHOP, "not-the-secret"));
    let response = send(&app, request).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(!response.json.to_string().contains("shpat"));
}

#[tokio::test]
async fn test_unknown_shop_gets_defaults() {
    let (app, state) = test_app(create_test_config(None));
    seed_session(&state, SHOP).await;

    let request = bearer(get("/api/settings"), &session_token(SHOP, API_SECRET));
    let response = send(&app, request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["enabled"], true);
    assert_eq!(response.json["title"], "We value your privacy");
    assert_eq!(response.json["position"], "bottom");
    assert_eq!(response.json["delaySeconds"], 0);
    assert_eq!(response.json["acceptButtonColor"], "#008060");
}

#[tokio::test]
async fn test_settings_round_trip() {
    let (app, state) = test_app(create_test_config(None));
    seed_session(&state, SHOP).await;
    let token = session_token(SHOP, API_SECRET);

    let saved = send(
        &app,
        post_settings(
            &settings_json(json!({
                "enabled": true,
                "title": "Cookies",
                "bodyText": "We use cookies.",
                "position": "top",
                "delaySeconds": 3,
                "showDecline": false,
                "privacyPolicyUrl": "https://demo.example.com/privacy",
                "backgroundColor": "#000"
            })),
            &token,
        ),
    )
    .await;
    assert_eq!(saved.status, StatusCode::OK);
    assert_eq!(saved.json["success"], true);
    assert_eq!(saved.json["settings"]["position"], "top");

    let read = send(&app, bearer(get("/api/settings"), &token)).await;
    assert_eq!(read.status, StatusCode::OK);
    assert_eq!(read.json, saved.json["settings"]);
    assert_eq!(read.json["title"], "Cookies");
    assert_eq!(read.json["delaySeconds"], 3);
    assert_eq!(read.json["showDecline"], false);
}

#[tokio::test]
async fn test_invalid_settings_leave_store_unchanged() {
    let (app, state) = test_app(create_test_config(None));
    seed_session(&state, SHOP).await;
    let token = session_token(SHOP, API_SECRET);

    let first = send(
        &app,
        post_settings(&settings_json(json!({ "title": "Kept" })), &token),
    )
    .await;
    assert_eq!(first.status, StatusCode::OK);

    for bad in [
        json!({ "position": "diagonal" }),
        json!({ "delaySeconds": -5 }),
        json!({ "textColor": "red" }),
    ] {
        let response = send(&app, post_settings(&settings_json(bad.clone()), &token)).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "payload {bad}");
        assert!(response.json["error"].is_string());
    }

    let read = send(&app, bearer(get("/api/settings"), &token)).await;
    assert_eq!(read.json["title"], "Kept");
    assert_eq!(read.json["position"], "bottom");
}

#[tokio::test]
async fn test_partial_settings_are_rejected_field_by_field() {
    let (app, state) = test_app(create_test_config(None));
    seed_session(&state, SHOP).await;
    let token = session_token(SHOP, API_SECRET);

    let full = settings_json(json!({ "title": "Stored", "position": "center", "delaySeconds": 9 }));
    assert_eq!(send(&app, post_settings(&full, &token)).await.status, StatusCode::OK);

    let response = send(&app, post_settings(&json!({ "title": "x" }), &token)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = response.json["fields"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|error| error["field"].as_str())
        .collect();
    for field in ["enabled", "bodyText", "position", "delaySeconds", "textColor"] {
        assert!(fields.contains(&field), "{field} missing from {fields:?}");
    }
    assert!(!fields.contains(&"title"));
    assert!(!fields.contains(&"privacyPolicyUrl"));

    let read = send(&app, bearer(get("/api/settings"), &token)).await;
    assert_eq!(read.json["title"], "Stored");
    assert_eq!(read.json["position"], "center");
    assert_eq!(read.json["delaySeconds"], 9);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (app, state) = test_app(create_test_config(None));
    seed_session(&state, SHOP).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/settings")
        .header(header::CONTENT_TYPE, "application/json")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", session_token(SHOP, API_SECRET)),
        )
        .body(Body::from("{not json"))
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json["error"].is_string());
}

#[tokio::test]
async fn test_session_cookie_authenticates() {
    let server = granting_token_endpoint().await;
    let (app, _) = test_app(create_test_config(Some(&server.uri())));
    let cookie = install(&app, "demo").await;

    let request = Request::builder()
        .uri("/api/settings")
        .header(header::COOKIE, format!("other=1; {cookie}"))
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["title"], "We value your privacy");
}

#[tokio::test]
async fn test_forged_cookie_is_rejected() {
    let server = granting_token_endpoint().await;
    let (app, _) = test_app(create_test_config(Some(&server.uri())));
    let cookie = install(&app, "demo").await;

    // A made-up value and a tampered copy of the real one
    let mut tampered = cookie.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'B' } else { 'A' });

    for forged in ["shopify_app_session=demo.myshopify.com".to_string(), tampered] {
        let request = Request::builder()
            .uri("/api/settings")
            .header(header::COOKIE, forged.as_str())
            .body(Body::empty())
            .unwrap();

        assert_eq!(
            send(&app, request).await.status,
            StatusCode::UNAUTHORIZED,
            "cookie {forged}"
        );
    }
}

#[tokio::test]
async fn test_cookie_for_uninstalled_shop_is_rejected() {
    let server = granting_token_endpoint().await;
    let (app, state) = test_app(create_test_config(Some(&server.uri())));
    let cookie = install(&app, "demo").await;

    let shop = shopify_popup::ShopDomain::new(SHOP).unwrap();
    state.sessions().delete(&shop).await.unwrap();

    let request = Request::builder()
        .uri("/api/settings")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_session_is_rejected() {
    let (app, state) = test_app(create_test_config(None));
    let shop = shopify_popup::ShopDomain::new(SHOP).unwrap();
    state
        .sessions()
        .put(shopify_popup::Session::new(
            shopify_popup::Session::offline_id(&shop),
            shop,
            "shpat_old".to_string(),
            shopify_popup::AuthScopes::new(),
            Some(Utc::now() - chrono::Duration::minutes(1)),
        ))
        .await
        .unwrap();

    let request = bearer(get("/api/settings"), &session_token(SHOP, API_SECRET));
    assert_eq!(send(&app, request).await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_storefront_reads_settings_without_session() {
    let (app, state) = test_app(create_test_config(None));
    seed_session(&state, SHOP).await;
    let token = session_token(SHOP, API_SECRET);
    let saved = send(
        &app,
        post_settings(&settings_json(json!({ "title": "Public" })), &token),
    )
    .await;
    assert_eq!(saved.status, StatusCode::OK);

    let response = send(&app, get("/api/storefront/settings?shop=demo.myshopify.com")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["title"], "Public");
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));

    let bad = send(&app, get("/api/storefront/settings?shop=not%20a%20shop")).await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}
