//! Authorization URL generation, the first step of the install flow.
//!
//! The app requests offline access tokens only: the popup settings are
//! shop-wide, so no per-user grant is needed.

use crate::auth::oauth::state::StateParam;
use crate::auth::AuthScopes;
use crate::config::{AppConfig, ShopDomain};

/// Result of initiating OAuth authorization.
///
/// The caller must record `state` (see
/// [`StateRegistry`](crate::auth::oauth::StateRegistry)) before redirecting
/// the merchant to `auth_url`.
#[derive(Clone, Debug)]
pub struct BeginAuthResult {
    /// The Shopify authorization URL to redirect the merchant to.
    pub auth_url: String,

    /// The state parameter embedded in `auth_url`.
    pub state: StateParam,
}

/// Builds the authorization URL for `shop`.
///
/// `redirect_path` is appended to the configured app host to form the
/// `redirect_uri`. `scope_override` replaces the configured scopes.
///
/// # Example
///
/// ```rust
/// use shopify_popup::{AppConfig, ApiKey, ApiSecretKey, HostUrl, SessionSecret, ShopDomain};
/// use shopify_popup::auth::oauth::begin_auth;
///
/// let config = AppConfig::builder()
///     .api_key(ApiKey::new("api-key").unwrap())
///     .api_secret_key(ApiSecretKey::new("secret").unwrap())
///     .host(HostUrl::new("https://popup.example.com").unwrap())
///     .session_secret(SessionSecret::new("0123456789abcdef0123456789abcdef").unwrap())
///     .scopes("write_themes".parse().unwrap())
///     .build()
///     .unwrap();
///
/// let shop = ShopDomain::new("test-shop").unwrap();
/// let result = begin_auth(&config, &shop, "/api/auth/callback", None);
/// assert!(result
///     .auth_url
///     .starts_with("https://test-shop.myshopify.com/admin/oauth/authorize?"));
/// ```
#[must_use]
pub fn begin_auth(
    config: &AppConfig,
    shop: &ShopDomain,
    redirect_path: &str,
    scope_override: Option<&AuthScopes>,
) -> BeginAuthResult {
    let state = StateParam::new();
    let scopes = scope_override.unwrap_or_else(|| config.scopes());
    let redirect_uri = config.host().join(redirect_path);

    let params = [
        ("client_id", config.api_key().as_ref().to_string()),
        ("scope", scopes.to_string()),
        ("redirect_uri", redirect_uri),
        ("state", state.to_string()),
    ];

    let query_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let auth_url = format!(
        "https://{}/admin/oauth/authorize?{}",
        shop.as_ref(),
        query_string
    );

    BeginAuthResult { auth_url, state }
}
