//! HTTP error responses.
//!
//! Every failure leaves the server as `{"error": "..."}` JSON. Messages of
//! 5xx responses are generic; the detail goes to the log only.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::oauth::OAuthError;
use crate::auth::StoreError;
use crate::settings::{FieldError, SettingsError};
use crate::webhooks::WebhookError;

/// Error type of every handler.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A settings payload failed validation.
    #[error("Invalid settings")]
    Validation(Vec<FieldError>),

    /// The request is malformed.
    #[error("{0}")]
    BadRequest(String),

    /// No valid session for the request.
    #[error("Unauthorized")]
    Unauthenticated,

    /// An HMAC signature did not verify.
    #[error("Invalid signature")]
    SignatureInvalid,

    /// Shopify refused the token exchange.
    #[error("Token exchange was rejected by Shopify")]
    UpstreamRejected(String),

    /// Shopify could not be reached.
    #[error("Upstream request failed: {0}")]
    UpstreamUnavailable(String),

    /// Shopify answered with something unusable.
    #[error("Bad upstream response: {0}")]
    BadGateway(String),

    /// The request did not finish in time.
    #[error("Request timed out")]
    Timeout,

    /// Anything else.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::BadRequest(_)
            | Self::SignatureInvalid
            | Self::UpstreamRejected(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::UpstreamUnavailable(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        } else if let Self::UpstreamRejected(detail) = &self {
            tracing::warn!(detail = %detail, "token exchange rejected");
        }

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Validation(fields) => json!({
                "error": self.to_string(),
                "fields": fields,
            }),
            Self::UpstreamUnavailable(_) | Self::Internal(_) => {
                json!({ "error": "Internal server error" })
            }
            Self::BadGateway(_) => json!({ "error": "Bad response from Shopify" }),
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<OAuthError> for ApiError {
    fn from(error: OAuthError) -> Self {
        match error {
            OAuthError::MissingParameter { .. }
            | OAuthError::InvalidCallback { .. }
            | OAuthError::StateMismatch => Self::BadRequest(error.to_string()),
            OAuthError::InvalidHmac => Self::SignatureInvalid,
            OAuthError::TokenExchangeFailed { status, message } => {
                Self::UpstreamRejected(format!("status {status}: {message}"))
            }
            OAuthError::Network(message) => Self::UpstreamUnavailable(message),
            OAuthError::Timeout => Self::Timeout,
            OAuthError::InvalidTokenResponse { reason } => Self::BadGateway(reason),
            OAuthError::SessionStorage(e) => Self::Internal(e.to_string()),
            OAuthError::InvalidJwt { .. } => Self::Unauthenticated,
        }
    }
}

impl From<SettingsError> for ApiError {
    fn from(error: SettingsError) -> Self {
        match error {
            SettingsError::Validation(fields) => Self::Validation(fields),
            SettingsError::Store(e) => e.into(),
        }
    }
}

impl From<WebhookError> for ApiError {
    fn from(error: WebhookError) -> Self {
        match error {
            WebhookError::InvalidHmac => Self::SignatureInvalid,
            WebhookError::MissingHeader { .. } | WebhookError::UnknownShop => {
                Self::BadRequest(error.to_string())
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        Self::Internal(error.to_string())
    }
}

impl From<tower_sessions::session::Error> for ApiError {
    fn from(error: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("browser session: {error}"))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
