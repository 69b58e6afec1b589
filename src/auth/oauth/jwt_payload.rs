//! App Bridge session tokens.
//!
//! The embedded admin sends a short-lived HS256 JWT in the `Authorization`
//! header of every API request. It is signed with the app's API secret and
//! names the shop in its `dest` claim.
//!
//! Decoding tries the primary API secret first, then the old secret if one is
//! configured, so tokens keep working through a secret rotation. Time-based
//! claims are checked with a 10 second leeway.

use crate::auth::oauth::OAuthError;
use crate::config::{AppConfig, ShopDomain};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

/// Leeway for JWT time-based claims validation.
const JWT_LEEWAY_SECS: u64 = 10;

/// Claims of an App Bridge session token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JwtPayload {
    /// Issuer, e.g. `https://shop.myshopify.com/admin`.
    pub iss: String,

    /// Destination shop, e.g. `https://shop.myshopify.com`.
    pub dest: String,

    /// Audience; must equal the app's API key.
    pub aud: String,

    /// Subject, the admin user id for online tokens.
    pub sub: Option<String>,

    /// Expiration timestamp (Unix timestamp).
    pub exp: i64,

    /// Not before timestamp (Unix timestamp).
    pub nbf: i64,

    /// Issued at timestamp (Unix timestamp).
    pub iat: i64,

    /// JWT ID.
    pub jti: String,

    /// Shopify session ID.
    pub sid: Option<String>,
}

impl JwtPayload {
    /// Decodes and validates a session token.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::InvalidJwt`] if the signature, expiry or audience
    /// check fails under every configured secret.
    pub fn decode(token: &str, config: &AppConfig) -> Result<Self, OAuthError> {
        let mut first_error = None;
        let mut payload = None;

        for secret in config.signing_secrets() {
            match Self::decode_with_key(token, secret) {
                Ok(decoded) => {
                    payload = Some(decoded);
                    break;
                }
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        let payload = payload.ok_or_else(|| OAuthError::InvalidJwt {
            reason: first_error.map_or_else(
                || "Error decoding session token".to_string(),
                |e| format!("Error decoding session token: {e}"),
            ),
        })?;

        if payload.aud != config.api_key().as_ref() {
            return Err(OAuthError::InvalidJwt {
                reason: "Session token had invalid API key".to_string(),
            });
        }

        Ok(payload)
    }

    fn decode_with_key(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = JWT_LEEWAY_SECS;
        // aud is compared by hand after decoding
        validation.validate_aud = false;
        validation.validate_nbf = true;

        let key = DecodingKey::from_secret(secret.as_bytes());
        let token_data = decode::<Self>(token, &key, &validation)?;

        Ok(token_data.claims)
    }

    /// Returns the shop named by the `dest` claim.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::InvalidJwt`] if `dest` is not a shop domain.
    pub fn shop(&self) -> Result<ShopDomain, OAuthError> {
        let host = self
            .dest
            .strip_prefix("https://")
            .unwrap_or(self.dest.as_str());

        ShopDomain::new(host).map_err(|_| OAuthError::InvalidJwt {
            reason: "Session token destination is not a shop".to_string(),
        })
    }
}

// Verify JwtPayload is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<JwtPayload>();
};
