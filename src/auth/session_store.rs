//! Session persistence.
//!
//! Handlers only see the [`SessionStore`] trait, so the in-memory map used
//! here can be swapped for any durable keyed storage.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::auth::Session;
use crate::config::ShopDomain;

/// Failure reported by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not complete the operation.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Keyed storage of one [`Session`] per shop.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the session stored for `shop`, if any.
    async fn get(&self, shop: &ShopDomain) -> Result<Option<Session>, StoreError>;

    /// Stores `session`, replacing any previous session for the same shop.
    async fn put(&self, session: Session) -> Result<(), StoreError>;

    /// Removes the session for `shop`. Returns `true` if one existed.
    async fn delete(&self, shop: &ShopDomain) -> Result<bool, StoreError>;
}

/// Process-lifetime session storage.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<ShopDomain, Session>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, shop: &ShopDomain) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.read().await.get(shop).cloned())
    }

    async fn put(&self, session: Session) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(session.shop.clone(), session);
        Ok(())
    }

    async fn delete(&self, shop: &ShopDomain) -> Result<bool, StoreError> {
        Ok(self.sessions.write().await.remove(shop).is_some())
    }
}
