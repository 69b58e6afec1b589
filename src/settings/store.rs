//! Settings persistence.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::PopupSettings;
use crate::auth::StoreError;
use crate::config::ShopDomain;

/// Keyed storage of one [`PopupSettings`] record per shop.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Returns the record for `shop`, or [`PopupSettings::default`] if none
    /// was ever stored.
    async fn get(&self, shop: &ShopDomain) -> Result<PopupSettings, StoreError>;

    /// Replaces the record for `shop`.
    async fn set(&self, shop: &ShopDomain, settings: PopupSettings) -> Result<(), StoreError>;

    /// Removes the record for `shop`. Returns `true` if one existed.
    async fn delete(&self, shop: &ShopDomain) -> Result<bool, StoreError>;
}

type ShopSlot = Arc<RwLock<PopupSettings>>;

/// Process-lifetime settings storage.
///
/// Each shop has its own lock: reads run concurrently, writes to one shop are
/// serialized, and writes to different shops never wait on each other. A
/// record is swapped whole under its lock, so a reader sees either the old or
/// the new record.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    shops: RwLock<HashMap<ShopDomain, ShopSlot>>,
}

impl InMemorySettingsStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, shop: &ShopDomain) -> Option<ShopSlot> {
        self.shops.read().await.get(shop).cloned()
    }

    async fn slot_or_insert(&self, shop: &ShopDomain) -> ShopSlot {
        if let Some(slot) = self.slot(shop).await {
            return slot;
        }
        self.shops
            .write()
            .await
            .entry(shop.clone())
            .or_default()
            .clone()
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn get(&self, shop: &ShopDomain) -> Result<PopupSettings, StoreError> {
        Ok(match self.slot(shop).await {
            Some(slot) => slot.read().await.clone(),
            None => PopupSettings::default(),
        })
    }

    async fn set(&self, shop: &ShopDomain, settings: PopupSettings) -> Result<(), StoreError> {
        let slot = self.slot_or_insert(shop).await;
        *slot.write().await = settings;
        Ok(())
    }

    async fn delete(&self, shop: &ShopDomain) -> Result<bool, StoreError> {
        Ok(self.shops.write().await.remove(shop).is_some())
    }
}
