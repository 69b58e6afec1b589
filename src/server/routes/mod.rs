//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /api/health                     - Liveness check
//! GET  /api/config                     - Public app configuration
//!
//! # Install (OAuth)
//! GET  /api/auth?shop=                 - Redirect to the Shopify authorize page
//! GET  /api/auth/callback              - Exchange the code, store the session
//!
//! # Webhooks (HMAC verified)
//! POST /api/webhooks/app/uninstalled   - Forget the shop
//!
//! # Merchant API (session required)
//! GET  /api/settings                   - Current popup settings
//! POST /api/settings                   - Replace popup settings
//!
//! # Storefront (public)
//! GET  /api/storefront/settings?shop=  - Settings for the theme extension
//! ```

mod auth;
mod health;
mod settings;
mod storefront;
mod webhooks;

use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

/// Path of the OAuth callback, relative to the app host.
pub const CALLBACK_PATH: &str = "/api/auth/callback";

/// Build the API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/config", get(health::app_config))
        .route("/api/auth", get(auth::begin))
        .route(CALLBACK_PATH, get(auth::callback))
        .route(
            "/api/webhooks/app/uninstalled",
            post(webhooks::app_uninstalled),
        )
        .route("/api/settings", get(settings::show).post(settings::update))
        .route("/api/storefront/settings", get(storefront::settings))
}
