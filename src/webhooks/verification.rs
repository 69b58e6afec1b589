//! Webhook signature verification.
//!
//! Shopify signs every webhook body with the app's API secret and sends the
//! base64 HMAC-SHA256 in `X-Shopify-Hmac-SHA256`. The signature must be
//! checked over the raw body bytes, before the body is parsed.
//!
//! # Example
//!
//! ```rust
//! use shopify_popup::webhooks::{verify_webhook, WebhookRequest, WebhookTopic};
//! use shopify_popup::auth::oauth::hmac::compute_signature_base64;
//! use shopify_popup::{AppConfig, ApiKey, ApiSecretKey, HostUrl, SessionSecret};
//!
//! let config = AppConfig::builder()
//!     .api_key(ApiKey::new("key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("secret").unwrap())
//!     .host(HostUrl::new("https://popup.example.com").unwrap())
//!     .session_secret(SessionSecret::new("0123456789abcdef0123456789abcdef").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let body = br#"{"myshopify_domain":"demo.myshopify.com"}"#.to_vec();
//! let signature = compute_signature_base64(&body, "secret");
//! let request = WebhookRequest::new(
//!     body,
//!     signature,
//!     Some("app/uninstalled".to_string()),
//!     Some("demo.myshopify.com".to_string()),
//!     None,
//! );
//!
//! let context = verify_webhook(&config, &request).unwrap();
//! assert_eq!(context.topic(), &WebhookTopic::AppUninstalled);
//! assert_eq!(context.shop().unwrap().as_ref(), "demo.myshopify.com");
//! ```

use std::fmt;

use serde::Deserialize;

use crate::auth::oauth::hmac::verify;
use crate::config::{AppConfig, ShopDomain};
use crate::webhooks::WebhookError;

/// HTTP header containing the HMAC signature.
pub const HEADER_HMAC: &str = "X-Shopify-Hmac-SHA256";

/// HTTP header containing the webhook topic.
pub const HEADER_TOPIC: &str = "X-Shopify-Topic";

/// HTTP header containing the shop domain.
pub const HEADER_SHOP_DOMAIN: &str = "X-Shopify-Shop-Domain";

/// HTTP header containing the unique delivery id.
pub const HEADER_WEBHOOK_ID: &str = "X-Shopify-Webhook-Id";

/// Webhook topics this app handles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookTopic {
    /// `app/uninstalled`
    AppUninstalled,
    /// Any other topic, kept verbatim.
    Other(String),
}

impl WebhookTopic {
    fn parse(raw: &str) -> Self {
        match raw.trim() {
            "app/uninstalled" => Self::AppUninstalled,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for WebhookTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AppUninstalled => f.write_str("app/uninstalled"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

/// An inbound webhook as received, before verification.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    body: Vec<u8>,
    hmac_header: String,
    topic: Option<String>,
    shop_domain: Option<String>,
    webhook_id: Option<String>,
}

impl WebhookRequest {
    /// Creates a request from the raw body and header values.
    #[must_use]
    pub const fn new(
        body: Vec<u8>,
        hmac_header: String,
        topic: Option<String>,
        shop_domain: Option<String>,
        webhook_id: Option<String>,
    ) -> Self {
        Self {
            body,
            hmac_header,
            topic,
            shop_domain,
            webhook_id,
        }
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the HMAC header value.
    #[must_use]
    pub fn hmac_header(&self) -> &str {
        &self.hmac_header
    }
}

/// A verified webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookContext {
    topic: WebhookTopic,
    shop: Option<ShopDomain>,
    webhook_id: Option<String>,
}

impl WebhookContext {
    /// Returns the topic.
    #[must_use]
    pub const fn topic(&self) -> &WebhookTopic {
        &self.topic
    }

    /// Returns the shop the webhook is about, if it could be determined.
    #[must_use]
    pub const fn shop(&self) -> Option<&ShopDomain> {
        self.shop.as_ref()
    }

    /// Returns the delivery id.
    #[must_use]
    pub fn webhook_id(&self) -> Option<&str> {
        self.webhook_id.as_deref()
    }
}

#[derive(Deserialize)]
struct ShopPayload {
    myshopify_domain: Option<String>,
}

/// Takes the shop from the header, or from the `myshopify_domain` field of a
/// shop-shaped body when the header is absent.
fn resolve_shop(request: &WebhookRequest) -> Option<ShopDomain> {
    let from_header = request
        .shop_domain
        .as_deref()
        .and_then(|domain| ShopDomain::new(domain).ok());

    from_header.or_else(|| {
        serde_json::from_slice::<ShopPayload>(&request.body)
            .ok()?
            .myshopify_domain
            .and_then(|domain| ShopDomain::new(domain).ok())
    })
}

/// Verifies a webhook against the configured API secrets.
///
/// The primary secret is tried first, then the old secret if configured.
///
/// # Errors
///
/// - [`WebhookError::MissingHeader`] if the HMAC header is empty
/// - [`WebhookError::InvalidHmac`] if no secret produces the signature
pub fn verify_webhook(
    config: &AppConfig,
    request: &WebhookRequest,
) -> Result<WebhookContext, WebhookError> {
    if request.hmac_header.trim().is_empty() {
        return Err(WebhookError::MissingHeader { name: HEADER_HMAC });
    }

    let verified = config
        .signing_secrets()
        .any(|secret| verify(&request.body, &request.hmac_header, secret));
    if !verified {
        return Err(WebhookError::InvalidHmac);
    }

    Ok(WebhookContext {
        topic: WebhookTopic::parse(request.topic.as_deref().unwrap_or_default()),
        shop: resolve_shop(request),
        webhook_id: request.webhook_id.clone(),
    })
}
