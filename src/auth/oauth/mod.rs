//! OAuth 2.0 install flow for the app.
//!
//! Installing the app for a shop is the authorization code grant:
//!
//! 1. **Authorization Initiation** ([`begin_auth`]): build the Shopify
//!    authorization URL and remember its `state` nonce in a [`StateRegistry`].
//!
//! 2. **Callback** ([`handle_callback`]): verify the signed query, exchange the
//!    code for an offline access token and store the resulting session.
//!
//! After install, the embedded admin authenticates API calls with App Bridge
//! session tokens, decoded by [`JwtPayload`].
//!
//! # Security
//!
//! - Callbacks are verified with HMAC-SHA256 before anything is sent upstream
//! - Signature comparisons are constant-time
//! - An old API secret can be configured so signatures made before a key
//!   rotation still verify
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use shopify_popup::auth::oauth::hmac::{canonical_query, compute_signature, validate_hmac};
//! use shopify_popup::{AppConfig, ApiKey, ApiSecretKey, HostUrl, SessionSecret};
//!
//! let config = AppConfig::builder()
//!     .api_key(ApiKey::new("api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("secret").unwrap())
//!     .host(HostUrl::new("https://popup.example.com").unwrap())
//!     .session_secret(SessionSecret::new("0123456789abcdef0123456789abcdef").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let mut params = HashMap::new();
//! params.insert("code".to_string(), "abc".to_string());
//! params.insert("shop".to_string(), "demo.myshopify.com".to_string());
//! let hmac = compute_signature(&canonical_query(&params), "secret");
//! params.insert("hmac".to_string(), hmac);
//!
//! assert!(validate_hmac(&params, &config));
//! ```

mod begin_auth;
pub mod callback;
mod error;
pub mod hmac;
mod jwt_payload;
mod state;

pub use begin_auth::{begin_auth, BeginAuthResult};
pub use callback::{exchange_code, handle_callback, CallbackOutcome, CallbackState};
pub use error::OAuthError;
pub use hmac::{compute_signature, constant_time_compare, validate_hmac, verify, verify_oauth_params};
pub use jwt_payload::JwtPayload;
pub use state::{StateParam, StateRegistry, MAX_PENDING_STATES, STATE_TTL_SECS};
