//! Session gate for the merchant API.
//!
//! A request is authenticated by either an App Bridge session token in
//! `Authorization: Bearer <jwt>` or the browser session that the install
//! callback bound to a shop. Both only name the shop; the shop must also
//! hold an active session in the [`SessionStore`](crate::auth::SessionStore).

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use crate::auth::oauth::JwtPayload;
use crate::auth::Session;
use crate::config::ShopDomain;
use crate::server::session::session_shop;
use crate::server::{ApiError, AppState};

/// Paths reachable without a session.
const PUBLIC_PATHS: [&str; 4] = ["/api/health", "/api/config", "/api/auth", "/api/auth/callback"];

/// Path prefixes reachable without a session.
const PUBLIC_PREFIXES: [&str; 2] = ["/api/webhooks/", "/api/storefront/"];

/// Returns `true` if `path` is served without a session.
#[must_use]
pub fn is_public_path(path: &str) -> bool {
    !path.starts_with("/api/")
        || PUBLIC_PATHS.contains(&path)
        || PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Extractor that requires an authenticated shop.
///
/// Rejects with 401 `{"error":"Unauthorized"}` when the request carries no
/// valid credential or the shop has no active session.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireSession(session): RequireSession) -> String {
///     session.shop.to_string()
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireSession(pub Session);

impl FromRequestParts<AppState> for RequireSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Already resolved by the gate
        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(Self(session.clone()));
        }

        let shop = identify_shop(parts, state).await?;
        let session = state
            .sessions()
            .get(&shop)
            .await?
            .filter(Session::is_active)
            .ok_or_else(|| {
                tracing::debug!(shop = %shop, "no active session for shop");
                ApiError::Unauthenticated
            })?;

        parts.extensions.insert(session.clone());
        Ok(Self(session))
    }
}

/// Names the shop from the bearer token or, failing that, the browser session.
///
/// A bearer token that is present but invalid is not retried as a cookie.
async fn identify_shop(parts: &Parts, state: &AppState) -> Result<ShopDomain, ApiError> {
    let headers = &parts.headers;

    if let Some(authorization) = headers.get(header::AUTHORIZATION) {
        let token = authorization
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthenticated)?;

        return JwtPayload::decode(token.trim(), state.config())
            .and_then(|payload| payload.shop())
            .map_err(|e| {
                tracing::debug!(error = %e, "session token rejected");
                ApiError::Unauthenticated
            });
    }

    let session = parts
        .extensions
        .get::<tower_sessions::Session>()
        .cloned()
        .ok_or_else(|| ApiError::Internal("session layer is not installed".to_string()))?;

    session_shop(&session).await?.ok_or(ApiError::Unauthenticated)
}

/// Middleware applying [`RequireSession`] to every non-public API route.
///
/// # Errors
///
/// Returns [`ApiError::Unauthenticated`] for protected paths without a valid
/// session.
pub async fn session_gate(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if is_public_path(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let (mut parts, body) = request.into_parts();
    RequireSession::from_request_parts(&mut parts, &state).await?;
    Ok(next.run(Request::from_parts(parts, body)).await)
}
