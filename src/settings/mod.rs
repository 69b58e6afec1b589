//! Per-shop popup settings.
//!
//! # Overview
//!
//! - [`PopupSettings`]: the validated record the storefront widget renders
//! - [`SettingsPayload`]: the same record as submitted, before validation
//! - [`SettingsStore`]: storage keyed by shop, with an in-memory implementation
//! - [`save`]: validate a payload and replace the stored record
//!
//! A shop that never saved anything reads the default record. Saving replaces
//! the whole record, so a payload must carry every field; there are no
//! partial updates.
//!
//! # Example
//!
//! ```rust
//! use shopify_popup::settings::{
//!     save, InMemorySettingsStore, PopupSettings, SettingsError, SettingsPayload, SettingsStore,
//! };
//! use shopify_popup::ShopDomain;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = InMemorySettingsStore::new();
//! let shop = ShopDomain::new("demo").unwrap();
//!
//! let mut payload = SettingsPayload::from(PopupSettings::default());
//! payload.position = Some("top".to_string());
//! let saved = save(&store, &shop, payload).await.unwrap();
//! assert_eq!(store.get(&shop).await.unwrap(), saved);
//!
//! // Omitted fields are reported, not defaulted
//! let partial: SettingsPayload = serde_json::from_str(r#"{"title":"Hi"}"#).unwrap();
//! let result = save(&store, &shop, partial).await;
//! assert!(matches!(result, Err(SettingsError::Validation(_))));
//! # }
//! ```

mod model;
mod store;

pub use model::{FieldError, PopupSettings, Position, SettingsPayload};
pub use store::{InMemorySettingsStore, SettingsStore};

use thiserror::Error;

use crate::auth::StoreError;
use crate::config::ShopDomain;

/// Errors of the settings API.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The payload has one or more invalid fields.
    #[error("Invalid settings: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validates `payload` and stores it as the settings of `shop`.
///
/// The store is left untouched when validation fails.
///
/// # Errors
///
/// Returns [`SettingsError::Validation`] for an invalid payload and
/// [`SettingsError::Store`] if the store fails.
pub async fn save(
    store: &dyn SettingsStore,
    shop: &ShopDomain,
    payload: SettingsPayload,
) -> Result<PopupSettings, SettingsError> {
    let settings = PopupSettings::try_from(payload)?;
    store.set(shop, settings.clone()).await?;
    tracing::info!(shop = %shop, "popup settings saved");
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> SettingsPayload {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_save_rejects_invalid_payload_and_keeps_store() {
        let store = InMemorySettingsStore::new();
        let shop = ShopDomain::new("demo").unwrap();
        let mut kept = SettingsPayload::from(PopupSettings::default());
        kept.title = Some("Kept".to_string());
        let saved = save(&store, &shop, kept).await.unwrap();

        for (field, bad) in [("position", json!("diagonal")), ("delaySeconds", json!(-1))] {
            let mut value = serde_json::to_value(&saved).unwrap();
            value[field] = bad;
            let result = save(&store, &shop, payload(value)).await;
            assert!(matches!(result, Err(SettingsError::Validation(_))));
            assert_eq!(store.get(&shop).await.unwrap(), saved);
        }
    }

    #[tokio::test]
    async fn test_save_rejects_partial_payload_and_keeps_store() {
        let store = InMemorySettingsStore::new();
        let shop = ShopDomain::new("demo").unwrap();
        let mut kept = SettingsPayload::from(PopupSettings::default());
        kept.position = Some("top".to_string());
        kept.delay_seconds = Some(7);
        let saved = save(&store, &shop, kept).await.unwrap();

        let result = save(&store, &shop, payload(json!({"title": "x"}))).await;

        let Err(SettingsError::Validation(errors)) = result else {
            panic!("partial payload was saved");
        };
        assert!(errors.iter().any(|e| e.field == "position"));
        let stored = store.get(&shop).await.unwrap();
        assert_eq!(stored, saved);
        assert_eq!(stored.delay_seconds, 7);
    }

    #[test]
    fn test_validation_message_lists_fields() {
        let error = SettingsError::Validation(vec![
            FieldError {
                field: "position",
                message: "bad".to_string(),
            },
            FieldError {
                field: "textColor",
                message: "worse".to_string(),
            },
        ]);
        assert_eq!(
            error.to_string(),
            "Invalid settings: position: bad; textColor: worse"
        );
    }
}
