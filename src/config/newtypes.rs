//! Checked string types for the app's settings.
//!
//! Credentials, the app's public URL and shop domains all arrive as plain
//! strings from the environment or from request parameters. Each one gets a
//! type here that can only be built from an acceptable value, so code past
//! the config layer never re-checks them.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn non_blank(value: String, error: ConfigError) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        Err(error)
    } else {
        Ok(value)
    }
}

/// Client id of the app in the Partner Dashboard (`SHOPIFY_API_KEY`).
///
/// Sent in the authorize URL and as the expected `aud` of App Bridge
/// session tokens.
///
/// ```rust
/// use shopify_popup::ApiKey;
///
/// let key = ApiKey::new("popup-client-id").unwrap();
/// assert_eq!(key.as_ref(), "popup-client-id");
/// assert!(ApiKey::new("  ").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a client id.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EmptyApiKey`] for an empty or all-whitespace value.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        non_blank(key.into(), ConfigError::EmptyApiKey).map(Self)
    }
}

impl AsRef<str> for ApiKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Client secret of the app (`SHOPIFY_API_SECRET`).
///
/// Keys every HMAC the app checks (OAuth callbacks and webhooks) and signs
/// App Bridge session tokens. Never printed: `Debug` shows `ApiSecretKey(*****)`.
///
/// ```rust
/// use shopify_popup::ApiSecretKey;
///
/// let secret = ApiSecretKey::new("shpss_example").unwrap();
/// assert_eq!(format!("{secret:?}"), "ApiSecretKey(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ApiSecretKey(String);

impl ApiSecretKey {
    /// Wraps a client secret.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EmptyApiSecretKey`] for an empty or all-whitespace value.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        non_blank(key.into(), ConfigError::EmptyApiSecretKey).map(Self)
    }
}

impl AsRef<str> for ApiSecretKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiSecretKey(*****)")
    }
}

/// Key material for the browser session cookie (`SESSION_SECRET`).
///
/// Must be at least [`SessionSecret::MIN_LENGTH`] characters. Masked in `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionSecret(String);

impl SessionSecret {
    /// Shortest secret accepted.
    pub const MIN_LENGTH: usize = 32;

    /// Wraps a session secret.
    ///
    /// # Errors
    ///
    /// [`ConfigError::WeakSessionSecret`] if `secret` has fewer than
    /// [`Self::MIN_LENGTH`] characters.
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.chars().count() < Self::MIN_LENGTH {
            return Err(ConfigError::WeakSessionSecret {
                min_length: Self::MIN_LENGTH,
            });
        }
        Ok(Self(secret))
    }
}

impl AsRef<str> for SessionSecret {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionSecret(*****)")
    }
}

/// A merchant's `*.myshopify.com` domain.
///
/// The key of every per-shop record in the app. Input is lowercased, and a
/// bare store handle gets the `.myshopify.com` suffix, so `Demo` and
/// `demo.myshopify.com` name the same shop. Any other host is refused, which
/// keeps callbacks and token requests pinned to Shopify.
///
/// Serializes as the full domain string.
///
/// ```rust
/// use shopify_popup::ShopDomain;
///
/// let shop = ShopDomain::new("Popup-Demo").unwrap();
/// assert_eq!(shop.as_ref(), "popup-demo.myshopify.com");
/// assert_eq!(shop.shop_name(), "popup-demo");
/// assert_eq!(serde_json::to_value(&shop).unwrap(), "popup-demo.myshopify.com");
///
/// assert!(ShopDomain::new("popup-demo.example.com").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShopDomain(String);

impl ShopDomain {
    const SUFFIX: &'static str = ".myshopify.com";

    /// Normalizes and checks a shop domain or store handle.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidShopDomain`] unless the input is a store handle
    /// or a `<handle>.myshopify.com` domain.
    pub fn new(domain: impl Into<String>) -> Result<Self, ConfigError> {
        let domain = domain.into().trim().to_lowercase();

        let handle = match domain.strip_suffix(Self::SUFFIX) {
            Some(handle) => handle,
            None if domain.contains('.') => "",
            None => domain.as_str(),
        };

        if !Self::is_handle(handle) {
            return Err(ConfigError::InvalidShopDomain { domain });
        }

        let full = format!("{handle}{}", Self::SUFFIX);
        Ok(Self(full))
    }

    /// The store handle, e.g. `popup-demo` for `popup-demo.myshopify.com`.
    #[must_use]
    pub fn shop_name(&self) -> &str {
        self.0.strip_suffix(Self::SUFFIX).unwrap_or(&self.0)
    }

    // ASCII lowercase, digits and inner hyphens
    fn is_handle(handle: &str) -> bool {
        !handle.is_empty()
            && !handle.starts_with('-')
            && !handle.ends_with('-')
            && handle
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ShopDomain {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ShopDomain> for String {
    fn from(shop: ShopDomain) -> Self {
        shop.0
    }
}

/// Public base URL of the app (`HOST`).
///
/// OAuth redirect URIs and the post-install redirect are built on it with
/// [`HostUrl::join`], so trailing slashes are dropped. Also used for the
/// token endpoint base in tests.
///
/// ```rust
/// use shopify_popup::HostUrl;
///
/// let host = HostUrl::new("https://popup.example.com/").unwrap();
/// assert_eq!(host.scheme(), "https");
/// assert_eq!(host.host_name(), Some("popup.example.com"));
/// assert_eq!(host.join("/api/auth/callback"), "https://popup.example.com/api/auth/callback");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostUrl {
    url: String,
    host: Range<usize>,
}

impl HostUrl {
    /// Checks and normalizes a base URL.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidHostUrl`] without an alphabetic scheme followed
    /// by `://` and a non-empty host.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into().trim().trim_end_matches('/').to_string();

        let Some((scheme, rest)) = url.split_once("://") else {
            return Err(ConfigError::InvalidHostUrl { url });
        };
        let host_len = rest.find([':', '/', '?', '#']).unwrap_or(rest.len());
        if scheme.is_empty() || !scheme.bytes().all(|b| b.is_ascii_alphabetic()) || host_len == 0 {
            return Err(ConfigError::InvalidHostUrl { url });
        }

        let start = scheme.len() + "://".len();
        Ok(Self {
            host: start..start + host_len,
            url,
        })
    }

    /// `http` or `https`, as given.
    #[must_use]
    pub fn scheme(&self) -> &str {
        self.url.split_once("://").map_or("", |(scheme, _)| scheme)
    }

    /// Host without port or path.
    #[must_use]
    pub fn host_name(&self) -> Option<&str> {
        self.url.get(self.host.clone())
    }

    /// Appends `path`, which should start with `/`.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        format!("{}{path}", self.url)
    }
}

impl AsRef<str> for HostUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}
