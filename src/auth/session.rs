//! Authenticated shop sessions.
//!
//! A [`Session`] binds a shop to the access token obtained during OAuth. It
//! is created by the callback handler after a successful token exchange and
//! kept in a [`SessionStore`](crate::auth::SessionStore).

use crate::auth::AuthScopes;
use crate::config::ShopDomain;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Successful response body of the access token endpoint.
#[derive(Clone, Deserialize)]
pub struct AccessTokenResponse {
    /// The access token.
    pub access_token: String,
    /// Comma-separated granted scopes.
    #[serde(default)]
    pub scope: String,
    /// Lifetime in seconds, only present for expiring tokens.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl fmt::Debug for AccessTokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokenResponse")
            .field("access_token", &"*****")
            .field("scope", &self.scope)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// An authenticated session for one shop.
///
/// `Debug` never prints the access token.
///
/// # Example
///
/// ```rust
/// use shopify_popup::{Session, ShopDomain};
///
/// let shop = ShopDomain::new("my-store").unwrap();
/// let session = Session::new(
///     Session::offline_id(&shop),
///     shop,
///     "shpat_token".to_string(),
///     "read_themes".parse().unwrap(),
///     None,
/// );
///
/// assert_eq!(session.id, "offline_my-store.myshopify.com");
/// assert!(session.is_active());
/// assert!(!format!("{session:?}").contains("shpat_token"));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier for this session.
    pub id: String,

    /// The shop this session is for.
    pub shop: ShopDomain,

    /// The access token for Admin API calls.
    pub access_token: String,

    /// The OAuth scopes granted to this session.
    pub scopes: AuthScopes,

    /// When this session expires, if ever.
    pub expires: Option<DateTime<Utc>>,
}

impl Session {
    /// Creates a new session with the specified parameters.
    #[must_use]
    pub const fn new(
        id: String,
        shop: ShopDomain,
        access_token: String,
        scopes: AuthScopes,
        expires: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            shop,
            access_token,
            scopes,
            expires,
        }
    }

    /// Returns the offline session id for `shop`.
    #[must_use]
    pub fn offline_id(shop: &ShopDomain) -> String {
        format!("offline_{}", shop.as_ref())
    }

    /// Builds an offline session from a token endpoint response.
    ///
    /// An unparseable scope string yields an empty scope set rather than an
    /// error; the token itself is still valid.
    #[must_use]
    pub fn from_access_token_response(shop: ShopDomain, response: &AccessTokenResponse) -> Self {
        let scopes = response.scope.parse().unwrap_or_default();
        let expires = response
            .expires_in
            .filter(|secs| *secs > 0)
            .map(|secs| Utc::now() + Duration::seconds(secs));

        Self::new(
            Self::offline_id(&shop),
            shop,
            response.access_token.clone(),
            scopes,
            expires,
        )
    }

    /// Returns `true` if this session has expired.
    ///
    /// Sessions without an expiration time never expire.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.expires.is_some_and(|expires| Utc::now() > expires)
    }

    /// Returns `true` if this session has a token and has not expired.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.access_token.is_empty() && !self.expired()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("shop", &self.shop)
            .field("access_token", &"*****")
            .field("scopes", &self.scopes)
            .field("expires", &self.expires)
            .finish()
    }
}

// Verify Session is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Session>();
};

#[cfg(test)]
mod tests {
    use super::*;

    fn session_expiring(expires: Option<DateTime<Utc>>) -> Session {
        Session::new(
            "id".to_string(),
            ShopDomain::new("shop").unwrap(),
            "token".to_string(),
            AuthScopes::new(),
            expires,
        )
    }

    #[test]
    fn test_session_expired() {
        assert!(session_expiring(Some(Utc::now() - Duration::hours(1))).expired());
        assert!(!session_expiring(Some(Utc::now() + Duration::hours(1))).expired());
        assert!(!session_expiring(None).expired());
    }

    #[test]
    fn test_session_is_active_requires_token() {
        let mut session = session_expiring(None);
        assert!(session.is_active());

        session.access_token.clear();
        assert!(!session.is_active());
    }

    #[test]
    fn test_from_access_token_response_builds_offline_session() {
        let response: AccessTokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "shpat_abc",
            "scope": "write_themes"
        }))
        .unwrap();

        let session =
            Session::from_access_token_response(ShopDomain::new("demo").unwrap(), &response);

        assert_eq!(session.id, "offline_demo.myshopify.com");
        assert_eq!(session.access_token, "shpat_abc");
        assert!(session.scopes.iter().any(|s| s == "read_themes"));
        assert!(session.expires.is_none());
    }

    #[test]
    fn test_from_access_token_response_with_expiry() {
        let response = AccessTokenResponse {
            access_token: "token".to_string(),
            scope: String::new(),
            expires_in: Some(3600),
        };
        let session =
            Session::from_access_token_response(ShopDomain::new("demo").unwrap(), &response);
        assert!(session.expires.is_some());
        assert!(session.is_active());
    }

    #[test]
    fn test_debug_hides_access_token() {
        let session = session_expiring(None);
        let debug = format!("{session:?}");
        assert!(!debug.contains("\"token\""));
        assert!(debug.contains("*****"));

        let response = AccessTokenResponse {
            access_token: "shpat_secret".to_string(),
            scope: String::new(),
            expires_in: None,
        };
        assert!(!format!("{response:?}").contains("shpat_secret"));
    }
}
