//! HMAC-SHA256 signatures for OAuth callbacks and webhooks.
//!
//! Shopify signs two kinds of inbound traffic with the app's API secret:
//!
//! - OAuth callback query strings, as a lowercase hex digest in the `hmac`
//!   parameter, computed over the remaining parameters sorted by key
//! - Webhook bodies, as a base64 digest in the `X-Shopify-Hmac-SHA256` header
//!
//! Every comparison is constant-time. The verification functions return
//! `bool` and never panic; malformed input simply fails verification.
//!
//! # Example
//!
//! ```rust
//! use shopify_popup::auth::oauth::hmac::{compute_signature_base64, verify};
//!
//! let body = br#"{"id":1}"#;
//! let signature = compute_signature_base64(body, "my-api-secret");
//!
//! assert!(verify(body, &signature, "my-api-secret"));
//! assert!(!verify(body, &signature, "another-secret"));
//! ```

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::AppConfig;

type HmacSha256 = Hmac<Sha256>;

/// Query parameters excluded from the canonical OAuth message.
const UNSIGNED_PARAMS: [&str; 2] = ["hmac", "signature"];

#[allow(clippy::missing_panics_doc)] // HMAC accepts any key size, so this never panics
fn digest(message: &[u8], secret: &str) -> Vec<u8> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Computes an HMAC-SHA256 signature as a lowercase hex string.
///
/// This is the format Shopify uses for the `hmac` OAuth query parameter.
///
/// ```rust
/// use shopify_popup::auth::oauth::hmac::compute_signature;
///
/// let sig = compute_signature("test-message", "secret-key");
/// assert_eq!(sig.len(), 64);
/// ```
#[must_use]
pub fn compute_signature(message: &str, secret: &str) -> String {
    hex::encode(digest(message.as_bytes(), secret))
}

/// Computes an HMAC-SHA256 signature over raw bytes as standard base64.
///
/// This is the format of the `X-Shopify-Hmac-SHA256` webhook header. Takes
/// bytes so the body is signed exactly as received.
#[must_use]
pub fn compute_signature_base64(message: &[u8], secret: &str) -> String {
    STANDARD.encode(digest(message, secret))
}

/// Constant-time string equality.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn digest_matches(message: &[u8], provided: &[u8], secret: &str) -> bool {
    if secret.is_empty() || provided.is_empty() {
        return false;
    }
    digest(message, secret).ct_eq(provided).into()
}

/// Verifies a base64 HMAC-SHA256 signature over a raw payload.
///
/// Returns `false` for an empty payload, signature or secret, and for a
/// signature that is not valid base64.
#[must_use]
pub fn verify(raw_payload: &[u8], provided_signature_b64: &str, secret: &str) -> bool {
    if raw_payload.is_empty() || provided_signature_b64.is_empty() {
        return false;
    }
    let Ok(provided) = STANDARD.decode(provided_signature_b64.trim()) else {
        return false;
    };
    digest_matches(raw_payload, &provided, secret)
}

/// Builds the string Shopify signs for an OAuth query.
///
/// All pairs except `hmac` and `signature`, sorted by key, joined as
/// `key=value` with `&`.
///
/// ```rust
/// use std::collections::HashMap;
/// use shopify_popup::auth::oauth::hmac::canonical_query;
///
/// let params: HashMap<String, String> = [("shop", "a.myshopify.com"), ("code", "x"), ("hmac", "ff")]
///     .into_iter()
///     .map(|(k, v)| (k.to_string(), v.to_string()))
///     .collect();
/// assert_eq!(canonical_query(&params), "code=x&shop=a.myshopify.com");
/// ```
#[must_use]
pub fn canonical_query(params: &HashMap<String, String>) -> String {
    let mut pairs: Vec<(&str, &str)> = params
        .iter()
        .filter(|(key, _)| !UNSIGNED_PARAMS.contains(&key.as_str()))
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();
    pairs.sort_unstable();

    pairs
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Verifies the `hmac` parameter of an OAuth query against `secret`.
///
/// Returns `false` without computing a digest when `hmac` is absent. The
/// result does not depend on parameter order.
#[must_use]
pub fn verify_oauth_params(params: &HashMap<String, String>, secret: &str) -> bool {
    let Some(provided) = params.get("hmac") else {
        return false;
    };
    let Ok(provided) = hex::decode(provided.trim()) else {
        return false;
    };
    digest_matches(canonical_query(params).as_bytes(), &provided, secret)
}

/// Verifies an OAuth query with key rotation.
///
/// Tries the primary API secret first, then the old secret if one is
/// configured.
#[must_use]
pub fn validate_hmac(params: &HashMap<String, String>, config: &AppConfig) -> bool {
    config
        .signing_secrets()
        .any(|secret| verify_oauth_params(params, secret))
}
