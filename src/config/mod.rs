//! Application configuration.
//!
//! The configuration is built once at startup, either with
//! [`AppConfig::builder`] or from the process environment with
//! [`AppConfig::from_env`], and then shared read-only by every handler.
//!
//! # Overview
//!
//! - [`AppConfig`]: validated settings for the server
//! - [`AppConfigBuilder`]: fluent builder with fail-fast validation
//! - [`ApiKey`], [`ApiSecretKey`], [`SessionSecret`]: credential newtypes
//! - [`ShopDomain`]: a validated `*.myshopify.com` domain
//! - [`HostUrl`]: the public URL of this app
//!
//! # Environment
//!
//! | Variable | Required | Default |
//! |----------|----------|---------|
//! | `SHOPIFY_API_KEY` | yes | |
//! | `SHOPIFY_API_SECRET` | yes | |
//! | `SHOPIFY_API_SECRET_OLD` | no | |
//! | `SCOPES` | no | empty |
//! | `HOST` | yes | |
//! | `SESSION_SECRET` | yes | |
//! | `BIND_ADDR` | no | `0.0.0.0` |
//! | `PORT` | no | `3000` |
//! | `REQUEST_TIMEOUT_SECS` | no | `25` |
//!
//! # Example
//!
//! ```rust
//! use shopify_popup::{AppConfig, ApiKey, ApiSecretKey, HostUrl, SessionSecret};
//!
//! let config = AppConfig::builder()
//!     .api_key(ApiKey::new("my-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("my-secret").unwrap())
//!     .host(HostUrl::new("https://popup.example.com").unwrap())
//!     .session_secret(SessionSecret::new("0123456789abcdef0123456789abcdef").unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.request_timeout().as_secs(), 25);
//! ```

mod newtypes;

pub use newtypes::{ApiKey, ApiSecretKey, HostUrl, SessionSecret, ShopDomain};

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::auth::AuthScopes;
use crate::error::ConfigError;

/// Default upper bound for a whole request, including the token exchange.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(25);

const DEFAULT_PORT: u16 = 3000;

/// Validated configuration for the app server.
///
/// `AppConfig` is `Clone + Send + Sync`; secrets are masked in `Debug`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    api_key: ApiKey,
    api_secret_key: ApiSecretKey,
    old_api_secret_key: Option<ApiSecretKey>,
    scopes: AuthScopes,
    host: HostUrl,
    session_secret: SessionSecret,
    bind_addr: SocketAddr,
    request_timeout: Duration,
    oauth_base_url: Option<HostUrl>,
}

impl AppConfig {
    /// Creates a new builder for constructing an `AppConfig`.
    #[must_use]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::new()
    }

    /// Loads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first missing or invalid variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first missing or invalid variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::MissingEnvVar { name });

        let mut builder = Self::builder()
            .api_key(ApiKey::new(require("SHOPIFY_API_KEY")?)?)
            .api_secret_key(ApiSecretKey::new(require("SHOPIFY_API_SECRET")?)?)
            .host(HostUrl::new(require("HOST")?)?)
            .session_secret(SessionSecret::new(require("SESSION_SECRET")?)?);

        if let Some(old) = get("SHOPIFY_API_SECRET_OLD") {
            builder = builder.old_api_secret_key(ApiSecretKey::new(old)?);
        }

        if let Some(scopes) = get("SCOPES") {
            builder = builder.scopes(scopes.parse()?);
        }

        let ip: IpAddr = match get("BIND_ADDR") {
            Some(raw) => raw.parse().map_err(|e| ConfigError::InvalidEnvVar {
                name: "BIND_ADDR",
                reason: format!("{e}"),
            })?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        let port: u16 = match get("PORT") {
            Some(raw) => raw.parse().map_err(|e| ConfigError::InvalidEnvVar {
                name: "PORT",
                reason: format!("{e}"),
            })?,
            None => DEFAULT_PORT,
        };
        builder = builder.bind_addr(SocketAddr::new(ip, port));

        if let Some(raw) = get("REQUEST_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|e| ConfigError::InvalidEnvVar {
                name: "REQUEST_TIMEOUT_SECS",
                reason: format!("{e}"),
            })?;
            if secs == 0 {
                return Err(ConfigError::InvalidEnvVar {
                    name: "REQUEST_TIMEOUT_SECS",
                    reason: "must be greater than zero".to_string(),
                });
            }
            builder = builder.request_timeout(Duration::from_secs(secs));
        }

        builder.build()
    }

    /// Returns the API key.
    #[must_use]
    pub const fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Returns the API secret key.
    #[must_use]
    pub const fn api_secret_key(&self) -> &ApiSecretKey {
        &self.api_secret_key
    }

    /// Returns the old API secret key, if configured.
    ///
    /// Used during key rotation to validate signatures created with the
    /// previous secret.
    #[must_use]
    pub const fn old_api_secret_key(&self) -> Option<&ApiSecretKey> {
        self.old_api_secret_key.as_ref()
    }

    /// Returns the OAuth scopes requested at install time.
    #[must_use]
    pub const fn scopes(&self) -> &AuthScopes {
        &self.scopes
    }

    /// Returns the public URL of this app.
    #[must_use]
    pub const fn host(&self) -> &HostUrl {
        &self.host
    }

    /// Returns the secret used to sign session cookies.
    #[must_use]
    pub const fn session_secret(&self) -> &SessionSecret {
        &self.session_secret
    }

    /// Returns the socket address the server binds to.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns the origin used for the token endpoint instead of
    /// `https://{shop}`, if configured.
    #[must_use]
    pub const fn oauth_base_url(&self) -> Option<&HostUrl> {
        self.oauth_base_url.as_ref()
    }

    /// Returns every secret that may have signed an inbound request, primary first.
    pub fn signing_secrets(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.api_secret_key.as_ref())
            .chain(self.old_api_secret_key.as_ref().map(AsRef::as_ref))
    }
}

// Verify AppConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AppConfig>();
};

/// Builder for constructing [`AppConfig`] instances.
///
/// Required fields are `api_key`, `api_secret_key`, `host` and
/// `session_secret`.
///
/// # Defaults
///
/// - `scopes`: Empty
/// - `old_api_secret_key`: `None`
/// - `bind_addr`: `0.0.0.0:3000`
/// - `request_timeout`: 25 seconds
/// - `oauth_base_url`: `None`
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    api_key: Option<ApiKey>,
    api_secret_key: Option<ApiSecretKey>,
    old_api_secret_key: Option<ApiSecretKey>,
    scopes: Option<AuthScopes>,
    host: Option<HostUrl>,
    session_secret: Option<SessionSecret>,
    bind_addr: Option<SocketAddr>,
    request_timeout: Option<Duration>,
    oauth_base_url: Option<HostUrl>,
}

impl AppConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the API secret key (required).
    #[must_use]
    pub fn api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.api_secret_key = Some(key);
        self
    }

    /// Sets the old API secret key for key rotation support.
    #[must_use]
    pub fn old_api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.old_api_secret_key = Some(key);
        self
    }

    /// Sets the OAuth scopes.
    #[must_use]
    pub fn scopes(mut self, scopes: AuthScopes) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Sets the public URL of the app (required).
    #[must_use]
    pub fn host(mut self, host: HostUrl) -> Self {
        self.host = Some(host);
        self
    }

    /// Sets the session cookie signing secret (required).
    #[must_use]
    pub fn session_secret(mut self, secret: SessionSecret) -> Self {
        self.session_secret = Some(secret);
        self
    }

    /// Sets the bind address.
    #[must_use]
    pub const fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = Some(addr);
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Routes token exchange requests to `base` instead of the shop's own domain.
    #[must_use]
    pub fn oauth_base_url(mut self, base: HostUrl) -> Self {
        self.oauth_base_url = Some(base);
        self
    }

    /// Builds the [`AppConfig`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if a required field is not set.
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let api_key = self
            .api_key
            .ok_or(ConfigError::MissingRequiredField { field: "api_key" })?;
        let api_secret_key = self
            .api_secret_key
            .ok_or(ConfigError::MissingRequiredField {
                field: "api_secret_key",
            })?;
        let host = self
            .host
            .ok_or(ConfigError::MissingRequiredField { field: "host" })?;
        let session_secret = self
            .session_secret
            .ok_or(ConfigError::MissingRequiredField {
                field: "session_secret",
            })?;

        Ok(AppConfig {
            api_key,
            api_secret_key,
            old_api_secret_key: self.old_api_secret_key,
            scopes: self.scopes.unwrap_or_default(),
            host,
            session_secret,
            bind_addr: self
                .bind_addr
                .unwrap_or_else(|| SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT)),
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            oauth_base_url: self.oauth_base_url,
        })
    }
}
