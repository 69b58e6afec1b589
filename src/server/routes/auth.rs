//! Install flow handlers.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;

use super::CALLBACK_PATH;
use crate::auth::oauth::{begin_auth, handle_callback};
use crate::config::ShopDomain;
use crate::server::session::remember_shop;
use crate::server::{ApiError, AppState};

/// `GET /api/auth?shop=` redirects the merchant to the authorize page.
pub async fn begin(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let raw_shop = query
        .get("shop")
        .map(|shop| shop.trim())
        .filter(|shop| !shop.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing required parameter: shop".to_string()))?;
    let shop = ShopDomain::new(raw_shop).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let result = begin_auth(state.config(), &shop, CALLBACK_PATH, None);
    state
        .oauth_states()
        .remember(&result.state, &shop, Utc::now())
        .await;
    tracing::info!(shop = %shop, "starting oauth");

    Ok((StatusCode::FOUND, [(header::LOCATION, result.auth_url)]).into_response())
}

/// `GET /api/auth/callback` finishes the install, binds the shop to the
/// browser session and redirects into the embedded admin.
pub async fn callback(
    State(state): State<AppState>,
    browser: tower_sessions::Session,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let outcome = handle_callback(
        state.config(),
        state.http(),
        state.oauth_states(),
        state.sessions(),
        &params,
    )
    .await?;

    remember_shop(&browser, &outcome.session.shop).await?;

    Ok((StatusCode::FOUND, [(header::LOCATION, outcome.redirect_url)]).into_response())
}
