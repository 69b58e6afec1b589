//! # Shopify Popup App
//!
//! Backend of a Shopify app that shows a configurable consent popup on the
//! merchant's storefront.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - Type-safe configuration via [`AppConfig`] and [`AppConfigBuilder`]
//! - HMAC-SHA256 verification of OAuth callbacks and webhooks via
//!   [`auth::oauth::hmac`]
//! - The OAuth install flow via [`auth::oauth`]
//! - Session storage behind the [`SessionStore`] trait
//! - Per-shop popup settings with validation via [`settings`]
//! - `app/uninstalled` webhook handling via [`webhooks`]
//! - The storefront popup as a state machine via [`widget`]
//! - The axum HTTP surface via [`server`]
//!
//! ## Quick Start
//!
//! ```rust
//! use shopify_popup::{AppConfig, ApiKey, ApiSecretKey, HostUrl, SessionSecret};
//!
//! let config = AppConfig::builder()
//!     .api_key(ApiKey::new("your-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("your-api-secret").unwrap())
//!     .host(HostUrl::new("https://popup.example.com").unwrap())
//!     .session_secret(SessionSecret::new("0123456789abcdef0123456789abcdef").unwrap())
//!     .scopes("write_themes".parse().unwrap())
//!     .build()
//!     .unwrap();
//! ```
//!
//! ## Install flow
//!
//! ```rust,ignore
//! use shopify_popup::auth::oauth::{begin_auth, handle_callback, StateRegistry};
//!
//! // Step 1: send the merchant to the authorize page
//! let result = begin_auth(&config, &shop, "/api/auth/callback", None);
//! states.remember(&result.state, &shop, Utc::now()).await;
//! // Redirect to result.auth_url
//!
//! // Step 2: Shopify redirects back with code, shop, state, hmac
//! let outcome = handle_callback(&config, &client, &states, &sessions, &query).await?;
//! // Redirect to outcome.redirect_url
//! ```
//!
//! ## Popup settings
//!
//! ```rust
//! use shopify_popup::settings::{InMemorySettingsStore, PopupSettings, SettingsStore};
//! use shopify_popup::ShopDomain;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = InMemorySettingsStore::new();
//! let shop = ShopDomain::new("my-store").unwrap();
//!
//! // Unknown shops get the defaults
//! let settings = store.get(&shop).await.unwrap();
//! assert_eq!(settings, PopupSettings::default());
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! All public types are `Send + Sync`; the stores are shared between
//! handlers behind `Arc`.

pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod settings;
pub mod webhooks;
pub mod widget;

// Re-export public types at crate root for convenience
pub use auth::{AccessTokenResponse, AuthScopes, InMemorySessionStore, Session, SessionStore, StoreError};
pub use config::{
    ApiKey, ApiSecretKey, AppConfig, AppConfigBuilder, HostUrl, SessionSecret, ShopDomain,
};
pub use error::ConfigError;

// Re-export OAuth types for convenience
pub use auth::oauth::{begin_auth, handle_callback, BeginAuthResult, OAuthError, StateParam};
