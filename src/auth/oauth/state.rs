//! OAuth `state` nonces.
//!
//! [`begin_auth`](crate::auth::oauth::begin_auth) issues a fresh
//! [`StateParam`] for every install redirect and records it in the
//! [`StateRegistry`] together with the shop it was issued for. The callback
//! handler only accepts a `state` issued for the same shop within the last
//! [`STATE_TTL_SECS`].
//!
//! The install entry point is public, so the registry holds at most
//! [`MAX_PENDING_STATES`] nonces; past that the oldest are dropped.
//!
//! A nonce is not removed when a callback presents it. A replayed callback
//! therefore passes this check and fails later, at the token exchange, when
//! Shopify refuses the already-used code.
//!
//! # Example
//!
//! ```rust
//! use shopify_popup::auth::oauth::StateParam;
//!
//! let state = StateParam::new();
//! assert_eq!(state.nonce().len(), 15);
//! assert!(state.nonce().chars().all(|c| c.is_ascii_alphanumeric()));
//! ```

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::sync::Mutex;

use crate::config::ShopDomain;

/// How long an issued nonce is accepted, in seconds.
pub const STATE_TTL_SECS: i64 = 10 * 60;

/// Most nonces held at once.
pub const MAX_PENDING_STATES: usize = 10_000;

fn within_ttl(issued_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - issued_at <= Duration::seconds(STATE_TTL_SECS)
}

/// OAuth state parameter for CSRF protection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateParam {
    value: String,
}

// Verify StateParam is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StateParam>();
};

impl StateParam {
    const NONCE_LENGTH: usize = 15;

    /// Creates a state parameter with a cryptographically secure random nonce.
    #[must_use]
    pub fn new() -> Self {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(Self::NONCE_LENGTH)
            .map(char::from)
            .collect();

        Self { value: nonce }
    }

    /// Returns the nonce.
    #[must_use]
    pub fn nonce(&self) -> &str {
        &self.value
    }
}

impl Default for StateParam {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StateParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl AsRef<str> for StateParam {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

#[derive(Debug)]
struct Issued {
    shop: ShopDomain,
    at: DateTime<Utc>,
}

/// Nonces issued by this process, with the shop and time they were issued for.
#[derive(Debug)]
pub struct StateRegistry {
    issued: Mutex<HashMap<String, Issued>>,
    capacity: usize,
}

impl Default for StateRegistry {
    fn default() -> Self {
        Self::with_capacity(MAX_PENDING_STATES)
    }
}

impl StateRegistry {
    /// Creates an empty registry holding up to [`MAX_PENDING_STATES`] nonces.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry holding up to `capacity` nonces (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            issued: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Records `state` as issued for `shop` at `now`.
    ///
    /// Nonces past their TTL are dropped first; if the registry is still
    /// full, the oldest nonces make room.
    pub async fn remember(&self, state: &StateParam, shop: &ShopDomain, now: DateTime<Utc>) {
        let mut issued = self.issued.lock().await;
        issued.retain(|_, entry| within_ttl(entry.at, now));

        while issued.len() >= self.capacity {
            let Some(oldest) = issued
                .iter()
                .min_by_key(|(_, entry)| entry.at)
                .map(|(nonce, _)| nonce.clone())
            else {
                break;
            };
            issued.remove(&oldest);
        }

        issued.insert(
            state.nonce().to_string(),
            Issued {
                shop: shop.clone(),
                at: now,
            },
        );
    }

    /// Returns `true` if `nonce` was issued for `shop` no more than
    /// [`STATE_TTL_SECS`] before `now`.
    pub async fn is_valid(&self, nonce: &str, shop: &ShopDomain, now: DateTime<Utc>) -> bool {
        self.issued
            .lock()
            .await
            .get(nonce)
            .is_some_and(|entry| entry.shop == *shop && within_ttl(entry.at, now))
    }

    /// Number of nonces currently held.
    pub async fn len(&self) -> usize {
        self.issued.lock().await.len()
    }

    /// Returns `true` if no nonce is held.
    pub async fn is_empty(&self) -> bool {
        self.issued.lock().await.is_empty()
    }
}
