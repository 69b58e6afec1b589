//! Configuration error types.
//!
//! All configuration constructors return `Result<T, ConfigError>` so the
//! server can fail fast at startup instead of running with silent defaults.
//!
//! # Example
//!
//! ```rust
//! use shopify_popup::{ApiKey, ConfigError};
//!
//! let result = ApiKey::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyApiKey)));
//! ```

use thiserror::Error;

/// Errors that can occur while building the application configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// API key cannot be empty.
    #[error("API key cannot be empty. Please provide a valid Shopify API key.")]
    EmptyApiKey,

    /// API secret key cannot be empty.
    #[error("API secret key cannot be empty. Please provide a valid Shopify API secret key.")]
    EmptyApiSecretKey,

    /// Shop domain is invalid.
    #[error("Invalid shop domain '{domain}'. Expected format: 'shop-name' or 'shop-name.myshopify.com'.")]
    InvalidShopDomain {
        /// The invalid domain that was provided.
        domain: String,
    },

    /// Scopes are invalid.
    #[error("Invalid scopes: {reason}")]
    InvalidScopes {
        /// The reason the scopes are invalid.
        reason: String,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// Host URL is invalid.
    #[error("Invalid host URL '{url}'. Please provide a valid URL with scheme (e.g., 'https://myapp.example.com').")]
    InvalidHostUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// Session secret is too short to sign cookies safely.
    #[error("Session secret must be at least {min_length} characters long.")]
    WeakSessionSecret {
        /// Minimum accepted length.
        min_length: usize,
    },

    /// A required environment variable is not set.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// The variable name.
        name: &'static str,
    },

    /// An environment variable is set but cannot be parsed.
    #[error("Invalid environment variable {name}: {reason}")]
    InvalidEnvVar {
        /// The variable name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}
