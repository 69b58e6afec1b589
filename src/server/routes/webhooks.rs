//! Webhook receivers.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};

use crate::server::{ApiError, AppState};
use crate::webhooks::{
    handle_app_uninstalled, verify_webhook, WebhookRequest, WebhookTopic, HEADER_HMAC,
    HEADER_SHOP_DOMAIN, HEADER_TOPIC, HEADER_WEBHOOK_ID,
};

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// `POST /api/webhooks/app/uninstalled`
///
/// The body is taken as raw bytes so the HMAC covers exactly what Shopify
/// signed. Once verified the delivery is acknowledged with 200.
pub async fn app_uninstalled(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let request = WebhookRequest::new(
        body.to_vec(),
        header_value(&headers, HEADER_HMAC).unwrap_or_default(),
        header_value(&headers, HEADER_TOPIC),
        header_value(&headers, HEADER_SHOP_DOMAIN),
        header_value(&headers, HEADER_WEBHOOK_ID),
    );

    let context = verify_webhook(state.config(), &request).inspect_err(|e| {
        tracing::warn!(error = %e, "webhook rejected");
    })?;

    // A missing topic header is taken to mean this route's topic.
    if let WebhookTopic::Other(topic) = context.topic() {
        if !topic.is_empty() {
            tracing::warn!(topic = %topic, "unexpected topic on uninstall route, ignoring");
            return Ok(StatusCode::OK);
        }
    }

    if let Err(e) = handle_app_uninstalled(&context, state.sessions(), state.settings()).await {
        tracing::warn!(
            error = %e,
            webhook_id = context.webhook_id().unwrap_or_default(),
            "uninstall webhook not applied"
        );
    }

    Ok(StatusCode::OK)
}
