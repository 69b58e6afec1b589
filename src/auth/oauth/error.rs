//! Errors of the OAuth install flow.
//!
//! Each variant maps to one failure of the callback handler; the HTTP layer
//! turns them into status codes (see `server::error`).
//!
//! # Example
//!
//! ```rust
//! use shopify_popup::auth::oauth::OAuthError;
//!
//! let error = OAuthError::MissingParameter { name: "code" };
//! assert_eq!(error.to_string(), "Missing required parameter: code");
//!
//! let error = OAuthError::TokenExchangeFailed {
//!     status: 400,
//!     message: "invalid_request".to_string(),
//! };
//! assert!(error.to_string().contains("400"));
//! ```

use thiserror::Error;

use crate::auth::session_store::StoreError;

/// Errors that can occur while installing the app for a shop.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// A required callback parameter was absent or empty.
    #[error("Missing required parameter: {name}")]
    MissingParameter {
        /// The parameter name.
        name: &'static str,
    },

    /// HMAC signature validation failed.
    ///
    /// The callback query was not signed with the app's API secret (or the
    /// old secret during rotation).
    #[error("HMAC signature validation failed")]
    InvalidHmac,

    /// Callback parameters are malformed.
    #[error("Invalid callback: {reason}")]
    InvalidCallback {
        /// Description of what's invalid about the callback.
        reason: String,
    },

    /// The `state` parameter was not issued by this process or has expired.
    #[error("State parameter was not issued by this app or has expired")]
    StateMismatch,

    /// The token endpoint answered with a non-success status.
    ///
    /// This includes a code that has already been exchanged.
    #[error("Token exchange failed with status {status}: {message}")]
    TokenExchangeFailed {
        /// The HTTP status code returned.
        status: u16,
        /// The error message from the response.
        message: String,
    },

    /// The token endpoint could not be reached.
    #[error("Token exchange request failed: {0}")]
    Network(String),

    /// The token endpoint did not answer within the request timeout.
    #[error("Token exchange timed out")]
    Timeout,

    /// The token endpoint answered 2xx with a body that is not a token.
    #[error("Invalid token response: {reason}")]
    InvalidTokenResponse {
        /// Why the body was rejected.
        reason: String,
    },

    /// The session could not be persisted after a successful exchange.
    #[error("Failed to store session: {0}")]
    SessionStorage(#[from] StoreError),

    /// An App Bridge session token failed decoding or validation.
    #[error("Invalid session token: {reason}")]
    InvalidJwt {
        /// Why the token was rejected.
        reason: String,
    },
}

impl From<reqwest::Error> for OAuthError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(error.to_string())
        }
    }
}

// Verify OAuthError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OAuthError>();
};
