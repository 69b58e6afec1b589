//! Inbound webhooks.
//!
//! # Overview
//!
//! - [`verify_webhook`]: checks the HMAC of a [`WebhookRequest`] and yields a
//!   [`WebhookContext`]
//! - [`handle_app_uninstalled`]: forgets everything stored for a shop
//!
//! Once a webhook is verified it is always acknowledged, even if local
//! cleanup fails; failures are logged. An unacknowledged webhook is only
//! redelivered, which would not make the cleanup succeed.

mod errors;
mod verification;

pub use errors::WebhookError;
pub use verification::{
    verify_webhook, WebhookContext, WebhookRequest, WebhookTopic, HEADER_HMAC, HEADER_SHOP_DOMAIN,
    HEADER_TOPIC, HEADER_WEBHOOK_ID,
};

use crate::auth::SessionStore;
use crate::settings::SettingsStore;

/// Deletes the session and settings of the shop named by a verified
/// `app/uninstalled` webhook.
///
/// Store failures are logged and do not stop the remaining cleanup.
///
/// # Errors
///
/// Returns [`WebhookError::UnknownShop`] if the webhook names no valid shop.
pub async fn handle_app_uninstalled(
    context: &WebhookContext,
    sessions: &dyn SessionStore,
    settings: &dyn SettingsStore,
) -> Result<(), WebhookError> {
    let shop = context.shop().ok_or(WebhookError::UnknownShop)?;

    match sessions.delete(shop).await {
        Ok(existed) => tracing::info!(shop = %shop, existed, "session removed on uninstall"),
        Err(e) => tracing::error!(shop = %shop, error = %e, "failed to remove session on uninstall"),
    }

    if let Err(e) = settings.delete(shop).await {
        tracing::error!(shop = %shop, error = %e, "failed to remove settings on uninstall");
    }

    Ok(())
}
