//! Webhook error types.

use thiserror::Error;

/// Errors that can occur while verifying an inbound webhook.
///
/// # Example
///
/// ```rust
/// use shopify_popup::webhooks::WebhookError;
///
/// let error = WebhookError::InvalidHmac;
/// assert_eq!(error.to_string(), "Webhook signature verification failed");
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WebhookError {
    /// The HMAC header is absent or empty.
    #[error("Missing webhook header: {name}")]
    MissingHeader {
        /// The header name.
        name: &'static str,
    },

    /// The body was not signed with any configured API secret.
    #[error("Webhook signature verification failed")]
    InvalidHmac,

    /// The webhook does not identify a valid shop.
    #[error("Webhook does not identify a shop")]
    UnknownShop,
}
